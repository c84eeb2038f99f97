//! Map Journal: a home section plus narrative sections over stage media
//!
//! The home section becomes the cover. Every other section becomes a slide
//! of one sidecar; media content actions become action buttons that swap
//! the slide media.

use super::{array, BuildContext, FormatStrategy};
use crate::classify::LegacyFormat;
use crate::content::TextStyle;
use crate::error::ConvertError;
use crate::media::str_field;
use serde_json::Value;
use story_graph::{node_type, Action, Group, Node};

#[derive(Debug)]
pub(crate) struct MapJournal;

impl FormatStrategy for MapJournal {
    fn format(&self) -> LegacyFormat {
        LegacyFormat::MapJournal
    }

    fn build(&self, values: &Value, ctx: &mut BuildContext<'_>) -> Result<(), ConvertError> {
        let sections = array(values, "/story/sections");
        let subtype = match values.pointer("/settings/layout/id").and_then(Value::as_str) {
            Some("float") => "floating-panel",
            _ => "docked-panel",
        };

        let (home, sections) = match sections.split_first() {
            Some((home, rest)) => (Some(home), rest),
            None => (None, sections),
        };
        let title = home.and_then(|h| ctx.text_field(h, "title")).unwrap_or_default();
        let summary = home.and_then(|h| ctx.text_field(h, "content"));
        let cover_media = home.and_then(|h| h.get("media")).and_then(|m| ctx.media(m));
        ctx.cover(&title, summary.as_deref(), None, cover_media)?;
        ctx.navigation()?;

        let mut slides = Vec::with_capacity(sections.len());
        for (index, section) in sections.iter().enumerate() {
            let mut contents = Vec::new();
            let heading = ctx.text_field(section, "title");
            if let Some(heading) = &heading {
                contents.push(ctx.heading(TextStyle::Heading, heading));
            }
            contents.extend(ctx.content(str_field(section, "content").unwrap_or_default()));

            let mut swaps = Vec::new();
            for action in array(section, "/contentActions") {
                if str_field(action, "type") != Some("media") {
                    ctx.note_dropped("journal content action");
                    continue;
                }
                let Some(media) = action.get("media").and_then(|m| ctx.media(m)) else {
                    continue;
                };
                let label = str_field(action, "text").unwrap_or("Show media");
                let button = ctx
                    .builder()
                    .create_detached(Node::new(node_type::ACTION_BUTTON).with_data("text", label));
                contents.push(button.clone());
                swaps.push((button, media));
            }

            let media = section.get("media").and_then(|m| ctx.media(m));
            let slide = ctx.builder().compose_group(Group::Slide { contents, media })?;
            for (button, media) in swaps {
                ctx.builder()
                    .add_action(Action::replace_media(button, slide.clone(), media));
            }
            if let Some(heading) = heading {
                ctx.nav_entry(slide.clone(), heading);
            }
            tracing::debug!(section = index + 1, %slide, "journal section built");
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
