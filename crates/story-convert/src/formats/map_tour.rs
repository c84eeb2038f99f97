//! Map Tour: numbered places, each with a photo or video and a caption

use super::{array, BuildContext, FormatStrategy};
use crate::classify::LegacyFormat;
use crate::content::TextStyle;
use crate::error::ConvertError;
use crate::media::{self, str_field};
use serde_json::{json, Map, Value};
use story_graph::{node_type, Node, NodeId};

#[derive(Debug)]
pub(crate) struct MapTour;

impl FormatStrategy for MapTour {
    fn format(&self) -> LegacyFormat {
        LegacyFormat::MapTour
    }

    fn build(&self, values: &Value, ctx: &mut BuildContext<'_>) -> Result<(), ConvertError> {
        let title = ctx.text_field(values, "title").unwrap_or_default();
        let subtitle = ctx.text_field(values, "subtitle");
        ctx.cover(&title, subtitle.as_deref(), None, None)?;

        let places = ordered_places(values);
        if values.get("sourceLayer").is_some() && places.is_empty() {
            ctx.note_dropped("tour places stored in a feature layer");
        }
        let tour = build_tour(ctx, TourKind::Guided, str_field(values, "webmap"), &places)?;
        ctx.place(&tour)
    }
}

/// Places in presentation order, hidden places removed
///
/// `order` lists place ids with a `visible` flag; without it the `places`
/// array order is used as-is.
fn ordered_places(values: &Value) -> Vec<&Value> {
    let places = array(values, "/places");
    let order = array(values, "/order");
    if order.is_empty() {
        return places.iter().collect();
    }
    order
        .iter()
        .filter(|entry| entry.get("visible").and_then(Value::as_bool).unwrap_or(true))
        .filter_map(|entry| {
            let id = entry.get("id")?;
            places.iter().find(|place| place.get("id") == Some(id))
        })
        .collect()
}

/// Tour flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TourKind {
    /// Step-by-step, one place at a time
    Guided,
    /// Grid of places explored freely
    Explorer,
}

impl TourKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Guided => "guided",
            Self::Explorer => "explorer",
        }
    }

    fn subtype(self) -> &'static str {
        match self {
            Self::Guided => "media-focused",
            Self::Explorer => "grid",
        }
    }
}

/// Detached tour node with its tour map as the only child
///
/// Each classic place (`name`, `description`, `pic_url`, `is_video`,
/// `geometry`) becomes a place entry whose `title`, `media` and `contents`
/// point at detached nodes.
pub(super) fn build_tour(
    ctx: &mut BuildContext<'_>,
    kind: TourKind,
    webmap: Option<&str>,
    places: &[&Value],
) -> Result<NodeId, ConvertError> {
    let mut map_node = Node::new(node_type::TOUR_MAP);
    if let Some(item_id) = webmap {
        let config = ctx.config();
        if let Some(map) = media::webmap_resource(ctx.builder(), config, &json!({ "id": item_id }), false) {
            map_node = map_node.with_data("map", map.as_str());
        }
    }
    let map = ctx.builder().create_detached(map_node);

    let mut entries = Vec::with_capacity(places.len());
    for (index, place) in places.iter().enumerate() {
        let mut entry = Map::new();
        entry.insert("id".into(), json!(format!("place-{}", index + 1)));
        if let Some(feature) = place.get("id") {
            entry.insert("featureId".into(), feature.clone());
        }

        let name = ctx
            .text_field(place, "name")
            .unwrap_or_else(|| format!("Place {}", index + 1));
        let title = ctx.heading(TextStyle::Subheading, &name);
        entry.insert("title".into(), json!(title.as_str()));

        let contents: Vec<Value> = ctx
            .content(str_field(place, "description").unwrap_or_default())
            .iter()
            .map(|id| json!(id.as_str()))
            .collect();
        entry.insert("contents".into(), Value::Array(contents));

        if let Some(url) = str_field(place, "pic_url") {
            let descriptor = if place.get("is_video").and_then(Value::as_bool).unwrap_or(false) {
                json!({"type": "video", "video": {"url": url, "caption": name}})
            } else {
                json!({"type": "image", "image": {"url": url, "altText": name}})
            };
            if let Some(media) = ctx.media(&descriptor) {
                entry.insert("media".into(), json!(media.as_str()));
            }
        }
        if let Some(geometry) = place.get("geometry").filter(|g| g.is_object()) {
            entry.insert("geometry".into(), geometry.clone());
        }
        entries.push(Value::Object(entry));
    }

    tracing::debug!(kind = kind.as_str(), places = entries.len(), "tour built");
    Ok(ctx.builder().create_detached(
        Node::container(node_type::TOUR)
            .with_data("type", kind.as_str())
            .with_data("subtype", kind.subtype())
            .with_data("map", map.as_str())
            .with_data("places", Value::Array(entries))
            .with_children(vec![map]),
    ))
}
