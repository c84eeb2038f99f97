//! Legacy format detection
//!
//! The explicit template name wins; documents without one (or with a name
//! this converter does not know) are matched on the shape of `values`.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classic story template family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegacyFormat {
    /// Sections with a side or floating panel over main stage media
    MapJournal,
    /// Tabbed, accordion or bulleted entries
    MapSeries,
    /// Full-screen scrolling sections
    Cascade,
    /// Numbered places with photos
    MapTour,
    /// Tabs of places for exploration
    Shortlist,
    /// Two maps compared side by side (recognized, not converted)
    Swipe,
    /// Single-map template (recognized, not converted)
    Basic,
}

impl LegacyFormat {
    /// All formats, in classification priority order
    pub const ALL: [Self; 7] = [
        Self::MapJournal,
        Self::MapSeries,
        Self::Cascade,
        Self::MapTour,
        Self::Shortlist,
        Self::Swipe,
        Self::Basic,
    ];

    /// Stable tag, as serialized
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::MapJournal => "map-journal",
            Self::MapSeries => "map-series",
            Self::Cascade => "cascade",
            Self::MapTour => "map-tour",
            Self::Shortlist => "shortlist",
            Self::Swipe => "swipe",
            Self::Basic => "basic",
        }
    }

    /// Whether a conversion strategy exists for this format
    #[must_use]
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Swipe | Self::Basic)
    }

    fn from_template_name(name: &str) -> Option<Self> {
        let squashed: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match squashed.as_str() {
            "mapjournal" => Some(Self::MapJournal),
            "mapseries" => Some(Self::MapSeries),
            "cascade" => Some(Self::Cascade),
            "maptour" => Some(Self::MapTour),
            "shortlist" => Some(Self::Shortlist),
            "swipe" | "spyglass" | "swipespyglass" => Some(Self::Swipe),
            "basic" => Some(Self::Basic),
            _ => None,
        }
    }
}

impl fmt::Display for LegacyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The `values` payload of a classic document
pub(crate) fn values(document: &Value) -> Result<&Value, ConvertError> {
    let object = document
        .as_object()
        .ok_or_else(|| ConvertError::InvalidDocument("document is not a JSON object".into()))?;
    object
        .get("values")
        .filter(|v| v.is_object())
        .ok_or_else(|| ConvertError::InvalidDocument("document has no \"values\" object".into()))
}

/// Detect the legacy format of a classic document
///
/// Unsupported but recognized formats are returned as-is; rejecting them
/// is the caller's decision.
pub fn classify(document: &Value) -> Result<LegacyFormat, ConvertError> {
    let values = values(document)?;
    let template = values
        .pointer("/template/name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty());

    if let Some(format) = template.and_then(LegacyFormat::from_template_name) {
        tracing::debug!(%format, "classified by template name");
        return Ok(format);
    }

    match by_structure(values) {
        Some(format) => {
            tracing::debug!(%format, ?template, "classified by structure");
            Ok(format)
        }
        None => Err(ConvertError::UnrecognizedFormat {
            tag: template.unwrap_or("unknown").to_string(),
        }),
    }
}

fn by_structure(values: &Value) -> Option<LegacyFormat> {
    let has_array = |pointer: &str| values.pointer(pointer).is_some_and(Value::is_array);

    if has_array("/story/sections") {
        return Some(LegacyFormat::MapJournal);
    }
    if has_array("/story/entries") {
        return Some(LegacyFormat::MapSeries);
    }
    if has_array("/sections") {
        return Some(LegacyFormat::Cascade);
    }
    if has_array("/tabs") {
        return Some(LegacyFormat::Shortlist);
    }
    if has_array("/places") || has_array("/order") || values.get("sourceLayer").is_some() {
        return Some(LegacyFormat::MapTour);
    }
    match values.get("dataModel").and_then(Value::as_str) {
        Some("TWO_WEBMAPS" | "TWO_LAYERS") => Some(LegacyFormat::Swipe),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_name_wins() {
        let doc = json!({"values": {"template": {"name": "Map Series"}, "story": {"sections": []}}});
        assert_eq!(classify(&doc).unwrap(), LegacyFormat::MapSeries);
    }

    #[test]
    fn test_template_name_is_loose() {
        let doc = json!({"values": {"template": {"name": "  map-JOURNAL "}}});
        assert_eq!(classify(&doc).unwrap(), LegacyFormat::MapJournal);
    }

    #[test]
    fn test_structural_fallback() {
        let cases = [
            (json!({"story": {"sections": []}}), LegacyFormat::MapJournal),
            (json!({"story": {"entries": []}}), LegacyFormat::MapSeries),
            (json!({"sections": []}), LegacyFormat::Cascade),
            (json!({"tabs": []}), LegacyFormat::Shortlist),
            (json!({"places": []}), LegacyFormat::MapTour),
            (json!({"sourceLayer": "abc"}), LegacyFormat::MapTour),
            (json!({"dataModel": "TWO_WEBMAPS"}), LegacyFormat::Swipe),
        ];
        for (values, expected) in cases {
            assert_eq!(classify(&json!({ "values": values })).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_template_falls_back_then_reports_name() {
        let doc = json!({"values": {"template": {"name": "Crowdsource"}, "tabs": []}});
        assert_eq!(classify(&doc).unwrap(), LegacyFormat::Shortlist);

        let doc = json!({"values": {"template": {"name": "Crowdsource"}}});
        match classify(&doc).unwrap_err() {
            ConvertError::UnrecognizedFormat { tag } => assert_eq!(tag, "Crowdsource"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_values_is_unknown() {
        match classify(&json!({"values": {}})).unwrap_err() {
            ConvertError::UnrecognizedFormat { tag } => assert_eq!(tag, "unknown"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_object_is_invalid() {
        assert!(matches!(
            classify(&json!([1, 2])),
            Err(ConvertError::InvalidDocument(_))
        ));
        assert!(matches!(
            classify(&json!({"item": {}})),
            Err(ConvertError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_unsupported_formats_are_recognized() {
        let swipe = classify(&json!({"values": {"template": {"name": "Swipe"}}})).unwrap();
        assert!(!swipe.is_supported());
        assert!(LegacyFormat::MapTour.is_supported());
        assert_eq!(LegacyFormat::MapTour.to_string(), "map-tour");
    }
}
