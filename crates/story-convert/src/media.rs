//! Classic media descriptors to story nodes
//!
//! A classic media descriptor is `{"type": kind, kind: {...}}` with `kind`
//! one of `webmap`, `webscene`, `image`, `video` or `webpage`. Every node
//! produced here is detached; callers decide where it goes.

use crate::config::ConvertConfig;
use serde_json::{json, Map, Value};
use story_graph::{node_type, resource_type, GraphBuilder, MediaContext, Node, NodeId, Resource, ResourceId};

/// Trimmed, non-empty string field
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Detached node for a classic media descriptor
///
/// Unknown kinds and descriptors missing their source yield `None`.
pub(crate) fn media_node(builder: &mut GraphBuilder, config: &ConvertConfig, media: &Value) -> Option<NodeId> {
    let Some(kind) = str_field(media, "type") else {
        tracing::warn!("dropping classic media without a type");
        return None;
    };
    let payload = media.get(kind).unwrap_or(&Value::Null);
    let node = match kind {
        "webmap" | "webscene" => webmap_node(builder, config, payload, kind == "webscene"),
        "image" => image_node(builder, payload),
        "video" => video_node(builder, payload),
        "webpage" => webpage_node(builder, payload),
        other => {
            tracing::warn!(media_type = other, "dropping unsupported classic media");
            return None;
        }
    };
    if node.is_none() {
        tracing::warn!(media_type = kind, "dropping classic media without a source");
    }
    node
}

/// Webmap resource carrying the classic map state
///
/// Legacy `scale` never reaches the resource: it becomes
/// `initialState.viewpoint.scale`. With scene enrichment, a camera marks
/// the item as a web scene and is copied into the viewpoint.
pub(crate) fn webmap_resource(
    builder: &mut GraphBuilder,
    config: &ConvertConfig,
    webmap: &Value,
    scene: bool,
) -> Option<ResourceId> {
    let item_id = str_field(webmap, "id")?;
    let mut state = Map::new();

    let extent = webmap.get("extent").filter(|e| e.is_object());
    if let Some(extent) = extent {
        state.insert("extent".into(), extent.clone());
    }
    if let Some(layers) = webmap.get("layers").and_then(Value::as_array) {
        let map_layers: Vec<Value> = layers
            .iter()
            .filter_map(|layer| {
                let id = layer.get("id")?;
                let visible = layer.get("visibility").and_then(Value::as_bool).unwrap_or(true);
                Some(json!({ "id": id, "visible": visible }))
            })
            .collect();
        state.insert("mapLayers".into(), Value::Array(map_layers));
    }

    let mut viewpoint = Map::new();
    if let Some(scale) = webmap.get("scale").filter(|s| s.is_number()) {
        viewpoint.insert("scale".into(), scale.clone());
        if let Some(target) = webmap.get("center").filter(|c| c.is_object()).or(extent) {
            viewpoint.insert("targetGeometry".into(), target.clone());
        }
    }

    let camera = webmap.get("camera").filter(|c| c.is_object());
    let declared_scene = scene || str_field(webmap, "itemType") == Some("Web Scene");
    let is_scene = declared_scene || (config.enrich_scenes && camera.is_some());
    if config.enrich_scenes && is_scene {
        if let Some(camera) = camera {
            viewpoint.insert("camera".into(), camera.clone());
        }
    }
    if !viewpoint.is_empty() {
        state.insert("viewpoint".into(), Value::Object(viewpoint));
    }

    let mut resource = Resource::new(resource_type::WEBMAP)
        .with_data("itemId", item_id)
        .with_data("itemType", if is_scene { "Web Scene" } else { "Web Map" })
        .with_data("type", "minimal");
    if !state.is_empty() {
        resource = resource.with_data("initialState", Value::Object(state));
    }
    Some(builder.add_resource(resource))
}

fn webmap_node(builder: &mut GraphBuilder, config: &ConvertConfig, webmap: &Value, scene: bool) -> Option<NodeId> {
    let map = webmap_resource(builder, config, webmap, scene)?;
    let mut node = Node::new(node_type::WEBMAP)
        .with_data("map", map.as_str())
        .with_config("size", config.default_map_size.as_str());
    if let Some(caption) = str_field(webmap, "caption") {
        node = node.with_data("caption", caption);
    }
    if let Some(alt) = str_field(webmap, "altText") {
        node = node.with_data("alt", alt);
    }
    Some(builder.create_detached(node))
}

/// Detached image node for `url`, sharing the resource of repeated URLs
pub(crate) fn image_from_url(
    builder: &mut GraphBuilder,
    url: &str,
    caption: Option<&str>,
    alt: Option<&str>,
    size: &str,
) -> NodeId {
    let label = caption.or(alt).unwrap_or("image");
    let image = builder.image_resource(url, MediaContext::image(label));
    let mut node = Node::new(node_type::IMAGE)
        .with_data("image", image.as_str())
        .with_config("size", size);
    if let Some(caption) = caption {
        node = node.with_data("caption", caption);
    }
    if let Some(alt) = alt {
        node = node.with_data("alt", alt);
    }
    builder.create_detached(node)
}

fn image_node(builder: &mut GraphBuilder, image: &Value) -> Option<NodeId> {
    let url = str_field(image, "url")?;
    let size = match str_field(image, "display") {
        Some("fill" | "stretch") => "full",
        _ => "standard",
    };
    let caption = str_field(image, "caption").or_else(|| str_field(image, "title"));
    Some(image_from_url(builder, url, caption, str_field(image, "altText"), size))
}

/// Where a classic video lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VideoSource {
    /// Hosting service player (`youtube`, `vimeo`)
    Hosted(&'static str),
    /// Directly addressable media file
    File,
    /// Anything else, shown as an embedded page
    Page,
}

pub(crate) fn classify_video(url: &str) -> VideoSource {
    let without_scheme = url
        .trim()
        .split_once("//")
        .map_or(url.trim(), |(_, rest)| rest);
    let (host, path) = without_scheme
        .split_once('/')
        .unwrap_or((without_scheme, ""));
    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    match host {
        "youtube.com" | "m.youtube.com" | "youtu.be" | "youtube-nocookie.com" => return VideoSource::Hosted("youtube"),
        "vimeo.com" | "player.vimeo.com" => return VideoSource::Hosted("vimeo"),
        _ => {}
    }

    let path = path.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    if [".mp4", ".webm", ".mov", ".m4v"].iter().any(|ext| path.ends_with(ext)) {
        VideoSource::File
    } else {
        VideoSource::Page
    }
}

fn video_node(builder: &mut GraphBuilder, video: &Value) -> Option<NodeId> {
    let url = str_field(video, "url")?;
    let caption = str_field(video, "caption").or_else(|| str_field(video, "title"));

    let mut node = match classify_video(url) {
        VideoSource::Hosted(provider) => Node::new(node_type::VIDEO)
            .with_data("url", url)
            .with_data("provider", provider),
        VideoSource::File => {
            let resource = builder.video_resource(url, MediaContext::video(caption.unwrap_or("video")));
            Node::new(node_type::VIDEO).with_data("video", resource.as_str())
        }
        VideoSource::Page => Node::new(node_type::EMBED)
            .with_data("url", url)
            .with_data("embedType", "video"),
    };
    if let Some(caption) = caption {
        node = node.with_data("caption", caption);
    }
    Some(builder.create_detached(node))
}

fn webpage_node(builder: &mut GraphBuilder, page: &Value) -> Option<NodeId> {
    let url = str_field(page, "url");
    let frame = str_field(page, "frameTag");
    if url.is_none() && frame.is_none() {
        return None;
    }
    Some(embed_node(builder, url, frame, str_field(page, "caption")))
}

/// Detached embed node; `frame` is raw iframe markup
pub(crate) fn embed_node(
    builder: &mut GraphBuilder,
    url: Option<&str>,
    frame: Option<&str>,
    caption: Option<&str>,
) -> NodeId {
    let mut node = Node::new(node_type::EMBED).with_data("embedType", if frame.is_some() { "frame" } else { "link" });
    if let Some(url) = url {
        node = node.with_data("url", url);
    }
    if let Some(frame) = frame {
        node = node.with_data("embedSrc", frame);
    }
    if let Some(caption) = caption {
        node = node.with_data("caption", caption);
    }
    builder.create_detached(node)
}
