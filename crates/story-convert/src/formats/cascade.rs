//! Cascade: full-screen sections read top to bottom
//!
//! Section types: `cover`, `sequence` (blocks flowing down the page),
//! `immersive` (views with floating panels), `title` and `credits`.

use super::{array, BuildContext, FormatStrategy};
use crate::classify::LegacyFormat;
use crate::content::TextStyle;
use crate::error::ConvertError;
use crate::media::{self, str_field};
use serde_json::Value;
use story_graph::{node_type, Group, Node, NodeId};

#[derive(Debug)]
pub(crate) struct Cascade;

impl FormatStrategy for Cascade {
    fn format(&self) -> LegacyFormat {
        LegacyFormat::Cascade
    }

    fn build(&self, values: &Value, ctx: &mut BuildContext<'_>) -> Result<(), ConvertError> {
        let sections = array(values, "/sections");
        let section_type = |section: &Value| str_field(section, "type").unwrap_or_default().to_string();

        let cover = sections.iter().find(|s| section_type(s) == "cover");
        let title = cover.and_then(|c| ctx.text_field(c, "title")).unwrap_or_default();
        let subtitle = cover.and_then(|c| ctx.text_field(c, "subtitle"));
        let byline = cover.and_then(|c| ctx.text_field(c, "byline"));
        let cover_media = cover.and_then(|c| c.get("background")).and_then(|m| ctx.media(m));
        ctx.cover(&title, subtitle.as_deref(), byline.as_deref(), cover_media)?;
        ctx.navigation()?;

        for (index, section) in sections.iter().enumerate() {
            match section_type(section).as_str() {
                "cover" => {}
                "sequence" => sequence(ctx, section)?,
                "immersive" => immersive(ctx, section)?,
                "title" => title_section(ctx, section)?,
                "credits" => credits(ctx, section)?,
                other => {
                    tracing::debug!(section = index, section_type = other, "unknown cascade section");
                    ctx.note_dropped("cascade section");
                }
            }
        }
        Ok(())
    }
}

fn sequence(ctx: &mut BuildContext<'_>, section: &Value) -> Result<(), ConvertError> {
    for block in array(section, "/foreground/blocks") {
        for id in block_nodes(ctx, block)? {
            ctx.place(&id)?;
        }
    }
    Ok(())
}

/// Detached nodes for one foreground block
fn block_nodes(ctx: &mut BuildContext<'_>, block: &Value) -> Result<Vec<NodeId>, ConvertError> {
    match str_field(block, "type") {
        Some("text") => {
            let html = block.pointer("/text/value").and_then(Value::as_str).unwrap_or_default();
            Ok(ctx.content(html))
        }
        Some("image-gallery") => {
            let images: Vec<NodeId> = array(block, "/image-gallery/images")
                .iter()
                .filter_map(|image| {
                    let url = str_field(image, "url")?;
                    let caption = str_field(image, "caption");
                    let alt = str_field(image, "altText");
                    Some(media::image_from_url(ctx.builder(), url, caption, alt, "standard"))
                })
                .collect();
            if images.is_empty() {
                ctx.note_dropped("empty gallery");
                return Ok(Vec::new());
            }
            Ok(vec![ctx.builder().compose_group(Group::Gallery { images })?])
        }
        _ => Ok(ctx.media(block).into_iter().collect()),
    }
}

fn immersive(ctx: &mut BuildContext<'_>, section: &Value) -> Result<(), ConvertError> {
    let mut slides = Vec::new();
    for view in array(section, "/views") {
        let mut contents = Vec::new();
        for panel in array(view, "/foreground/panels") {
            for block in array(panel, "/blocks") {
                contents.extend(block_nodes(ctx, block)?);
            }
        }
        let media = view.get("background").and_then(|m| ctx.media(m));
        slides.push(ctx.builder().compose_group(Group::Slide { contents, media })?);
    }
    if slides.is_empty() {
        ctx.note_dropped("empty immersive section");
        return Ok(());
    }
    let sidecar = ctx.builder().compose_group(Group::Sidecar {
        subtype: "floating-panel".to_string(),
        slides,
    })?;
    ctx.place(&sidecar)
}

fn title_section(ctx: &mut BuildContext<'_>, section: &Value) -> Result<(), ConvertError> {
    let separator = ctx.builder().create_detached(Node::new(node_type::SEPARATOR));
    ctx.place(&separator)?;

    let Some(text) = section
        .pointer("/foreground/title/value")
        .and_then(Value::as_str)
        .map(|html| ctx.plain_text(html))
        .filter(|t| !t.is_empty())
    else {
        return Ok(());
    };
    let heading = ctx.heading(TextStyle::Heading, &text);
    ctx.place(&heading)?;
    ctx.nav_entry(heading, text);

    if let Some(media) = section.get("background").and_then(|m| ctx.media(m)) {
        ctx.place(&media)?;
    }
    Ok(())
}

fn credits(ctx: &mut BuildContext<'_>, section: &Value) -> Result<(), ConvertError> {
    for credit in array(section, "/foreground/credits") {
        let Some(content) = ctx.text_field(credit, "content") else {
            continue;
        };
        let attribution = ctx.text_field(credit, "attribution");
        ctx.credit(&content, attribution.as_deref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use serde_json::json;
    use story_graph::StructuralValidator;

    fn cascade() -> Value {
        json!({"sections": [
            {"type": "title", "foreground": {"title": {"value": "Chapter <b>one</b>"}}},
            {"type": "cover", "title": "Forests", "byline": "A. Writer",
             "background": {"type": "image", "image": {"url": "https://a.test/bg.jpg"}}},
            {"type": "sequence", "foreground": {"blocks": [
                {"type": "text", "text": {"value": "<p>Trees</p><h3>Roots</h3>"}},
                {"type": "image-gallery", "image-gallery": {"images": [
                    {"url": "https://a.test/1.jpg"}, {"url": "https://a.test/2.jpg", "caption": "Two"}
                ]}},
                {"type": "webmap", "webmap": {"id": "m1"}}
            ]}},
            {"type": "immersive", "views": [
                {"background": {"type": "webmap", "webmap": {"id": "m2"}},
                 "foreground": {"panels": [{"blocks": [{"type": "text", "text": {"value": "<p>Panel</p>"}}]}]}}
            ]},
            {"type": "credits", "foreground": {"credits": [
                {"content": "Photos", "attribution": "Archive"}, {"content": ""}
            ]}},
            {"type": "swipe"}
        ]})
    }

    #[test]
    fn test_sections_in_reading_order() {
        let config = ConvertConfig::default();
        let mut ctx = BuildContext::new(&config, &Value::Null).unwrap();
        Cascade.build(&cascade(), &mut ctx).unwrap();
        let (builder, dropped) = ctx.finish();
        assert_eq!(dropped, 1);
        let graph = builder.build().unwrap();

        let kinds: Vec<_> = graph
            .root_node()
            .unwrap()
            .child_ids()
            .iter()
            .map(|id| graph.node(id).unwrap().kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "storycover",
                "navigation",
                "separator",
                "text",
                "text",
                "text",
                "gallery",
                "webmap",
                "immersive",
                "credits"
            ]
        );

        let cover = graph.nodes_of(node_type::STORY_COVER).next().unwrap().1;
        assert_eq!(cover.data_str("byline"), Some("A. Writer"));
        let credits = graph.nodes_of(node_type::CREDITS).next().unwrap().1;
        assert_eq!(credits.child_ids().len(), 1);

        let report = StructuralValidator::new().validate(&graph);
        assert!(report.is_empty(), "{report:?}");
    }
}
