//! Shortlist: tabs of places, each tab an explorer tour under its own heading

use super::map_tour::{build_tour, TourKind};
use super::{array, BuildContext, FormatStrategy};
use crate::classify::LegacyFormat;
use crate::content::TextStyle;
use crate::error::ConvertError;
use crate::media::str_field;
use serde_json::Value;

#[derive(Debug)]
pub(crate) struct Shortlist;

impl FormatStrategy for Shortlist {
    fn format(&self) -> LegacyFormat {
        LegacyFormat::Shortlist
    }

    fn build(&self, values: &Value, ctx: &mut BuildContext<'_>) -> Result<(), ConvertError> {
        let title = ctx.text_field(values, "title").unwrap_or_default();
        let subtitle = ctx.text_field(values, "subtitle");
        ctx.cover(&title, subtitle.as_deref(), None, None)?;
        ctx.navigation()?;

        let webmap = str_field(values, "webmap");
        for (index, tab) in array(values, "/tabs").iter().enumerate() {
            let label = ctx
                .text_field(tab, "title")
                .unwrap_or_else(|| format!("Tab {}", index + 1));
            let heading = ctx.heading(TextStyle::Heading, &label);
            ctx.place(&heading)?;
            ctx.nav_entry(heading, label);

            let places: Vec<&Value> = array(tab, "/places").iter().collect();
            let tour = build_tour(ctx, TourKind::Explorer, webmap, &places)?;
            ctx.place(&tour)?;
            tracing::debug!(tab = index + 1, places = places.len(), "shortlist tab built");
        }
        Ok(())
    }
}
