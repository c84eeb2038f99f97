//! Map Series: entries shown as tabs, accordion panels or bullets

use super::{array, BuildContext, FormatStrategy};
use crate::classify::LegacyFormat;
use crate::content::TextStyle;
use crate::error::ConvertError;
use crate::media::str_field;
use serde_json::Value;
use story_graph::Group;

#[derive(Debug)]
pub(crate) struct MapSeries;

impl FormatStrategy for MapSeries {
    fn format(&self) -> LegacyFormat {
        LegacyFormat::MapSeries
    }

    fn build(&self, values: &Value, ctx: &mut BuildContext<'_>) -> Result<(), ConvertError> {
        let title = ctx.text_field(values, "title").unwrap_or_default();
        let subtitle = ctx.text_field(values, "subtitle");
        ctx.cover(&title, subtitle.as_deref(), None, None)?;
        ctx.navigation()?;

        // accordion entries read as a docked panel, tabs and bullets float
        let subtype = match values.pointer("/settings/layout/id").and_then(Value::as_str) {
            Some("accordion") => "docked-panel",
            _ => "floating-panel",
        };

        let entries = array(values, "/story/entries");
        let mut slides = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let heading = ctx
                .text_field(entry, "title")
                .unwrap_or_else(|| format!("Entry {}", index + 1));
            let mut contents = vec![ctx.heading(TextStyle::Heading, &heading)];
            contents.extend(ctx.content(str_field(entry, "description").unwrap_or_default()));

            let media = entry.get("media").and_then(|m| ctx.media(m));
            let slide = ctx.builder().compose_group(Group::Slide { contents, media })?;
            ctx.nav_entry(slide.clone(), heading);
            tracing::debug!(entry = index + 1, %slide, "series entry built");
            slides.push(slide);
        }

        if !slides.is_empty() {
            let sidecar = ctx.builder().compose_group(Group::Sidecar {
                subtype: subtype.to_string(),
                slides,
            })?;
            ctx.place(&sidecar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use serde_json::json;
    use story_graph::{node_type, StructuralValidator};

    #[test]
    fn test_entries_become_slides_in_order() {
        let values = json!({
            "title": "Coasts",
            "subtitle": "<i>Three shores</i>",
            "settings": {"layout": {"id": "accordion"}},
            "story": {"entries": [
                {"title": "North", "description": "<p>Cliffs</p>",
                 "media": {"type": "webmap", "webmap": {"id": "m1"}}},
                {"description": "<p>Dunes</p>",
                 "media": {"type": "video", "video": {"url": "https://youtu.be/x"}}}
            ]}
        });
        let config = ConvertConfig::default();
        let mut ctx = BuildContext::new(&config, &Value::Null).unwrap();
        MapSeries.build(&values, &mut ctx).unwrap();
        let graph = ctx.finish().0.build().unwrap();

        let (_, sidecar) = graph.nodes_of(node_type::SIDECAR).next().unwrap();
        assert_eq!(sidecar.data_str("subtype"), Some("docked-panel"));
        let slides = sidecar.child_ids();
        assert_eq!(slides.len(), 2);

        let panel = graph.node(&graph.node(&slides[1]).unwrap().child_ids()[0]).unwrap();
        let heading = graph.node(&panel.child_ids()[0]).unwrap();
        assert_eq!(heading.data_str("text"), Some("Entry 2"));

        let (_, nav) = graph.nodes_of(node_type::NAVIGATION).next().unwrap();
        assert_eq!(nav.data["links"].as_array().unwrap().len(), 2);
        assert!(StructuralValidator::new().validate(&graph).is_clean());
    }
}
