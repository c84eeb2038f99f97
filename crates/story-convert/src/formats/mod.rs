//! Per-format conversion strategies
//!
//! Classification yields a closed [`LegacyFormat`]; [`strategy_for`] maps it
//! onto the strategy that builds the graph. Strategies only see the
//! [`BuildContext`], which owns the builder for the duration of the build.

mod cascade;
mod map_journal;
mod map_series;
mod map_tour;
mod shortlist;

use crate::classify::LegacyFormat;
use crate::config::ConvertConfig;
use crate::content::{ContentBlock, HtmlSplitter, TextStyle};
use crate::error::ConvertError;
use crate::media;
use serde_json::{json, Value};
use story_graph::{node_type, resource_type, GraphBuilder, Node, NodeId, Resource};

/// Builds the story graph for one legacy format
pub(crate) trait FormatStrategy: Send + Sync + std::fmt::Debug {
    /// Format handled by this strategy
    fn format(&self) -> LegacyFormat;

    /// Populate the graph from the classic `values` payload
    fn build(&self, values: &Value, ctx: &mut BuildContext<'_>) -> Result<(), ConvertError>;

    /// Strategy name for logs
    fn name(&self) -> &'static str {
        self.format().tag()
    }
}

static STRATEGIES: [&dyn FormatStrategy; 5] = [
    &map_journal::MapJournal,
    &map_series::MapSeries,
    &cascade::Cascade,
    &map_tour::MapTour,
    &shortlist::Shortlist,
];

/// Strategy for `format`, `None` when the format is not convertible
pub(crate) fn strategy_for(format: LegacyFormat) -> Option<&'static dyn FormatStrategy> {
    STRATEGIES.iter().copied().find(|s| s.format() == format)
}

/// Mutable state shared by the strategies while a graph is built
///
/// Creates the story root, its theme resource and the trailing credits
/// block up front, so every top-level insertion lands before the credits.
pub(crate) struct BuildContext<'a> {
    builder: GraphBuilder,
    config: &'a ConvertConfig,
    splitter: HtmlSplitter,
    item_title: Option<String>,
    credits: NodeId,
    navigation: Option<NodeId>,
    nav_entries: Vec<(NodeId, String)>,
    dropped: usize,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(config: &'a ConvertConfig, item: &Value) -> Result<Self, ConvertError> {
        let mut builder = GraphBuilder::new(config.id_strategy);
        let theme = builder.add_resource(
            Resource::new(resource_type::STORY_THEME).with_data("themeId", config.theme.as_str()),
        );
        builder.create_root(Node::container(node_type::STORY).with_data("storyTheme", theme.as_str()))?;
        let credits = builder.attach_terminal(Node::container(node_type::CREDITS))?;

        Ok(Self {
            builder,
            config,
            splitter: HtmlSplitter::new()?,
            item_title: media::str_field(item, "title").map(String::from),
            credits,
            navigation: None,
            nav_entries: Vec::new(),
            dropped: 0,
        })
    }

    pub(crate) fn builder(&mut self) -> &mut GraphBuilder {
        &mut self.builder
    }

    pub(crate) fn config(&self) -> &'a ConvertConfig {
        self.config
    }

    pub(crate) fn plain_text(&self, html: &str) -> String {
        self.splitter.plain_text(html)
    }

    /// Plain text of an HTML field, `None` when empty
    pub(crate) fn text_field(&self, value: &Value, key: &str) -> Option<String> {
        media::str_field(value, key)
            .map(|html| self.plain_text(html))
            .filter(|text| !text.is_empty())
    }

    /// Detached text node holding plain `text`
    pub(crate) fn heading(&mut self, style: TextStyle, text: &str) -> NodeId {
        self.builder.create_detached(text_node(style, text, "start"))
    }

    /// Detached nodes for each block of an HTML narrative
    pub(crate) fn content(&mut self, html: &str) -> Vec<NodeId> {
        let blocks = self.splitter.split(html);
        let mut nodes = Vec::with_capacity(blocks.len());
        for block in blocks {
            let id = match block {
                ContentBlock::Text {
                    style,
                    html,
                    alignment,
                } => self.builder.create_detached(text_node(style, &html, alignment)),
                ContentBlock::Image { src, alt, caption } => media::image_from_url(
                    &mut self.builder,
                    &src,
                    caption.as_deref(),
                    alt.as_deref(),
                    "standard",
                ),
                ContentBlock::Embed { url, frame } => {
                    media::embed_node(&mut self.builder, url.as_deref(), Some(&frame), None)
                }
                ContentBlock::Separator => self.builder.create_detached(Node::new(node_type::SEPARATOR)),
            };
            nodes.push(id);
        }
        nodes
    }

    /// Detached node for a classic media descriptor; `null` is skipped silently
    pub(crate) fn media(&mut self, descriptor: &Value) -> Option<NodeId> {
        if descriptor.is_null() {
            return None;
        }
        let node = media::media_node(&mut self.builder, self.config, descriptor);
        if node.is_none() {
            self.dropped += 1;
        }
        node
    }

    /// Attach the story cover as the first top-level node
    pub(crate) fn cover(
        &mut self,
        title: &str,
        summary: Option<&str>,
        byline: Option<&str>,
        media: Option<NodeId>,
    ) -> Result<NodeId, ConvertError> {
        let title = if title.is_empty() {
            self.item_title.clone().unwrap_or_default()
        } else {
            title.to_string()
        };
        let mut cover = Node::new(node_type::STORY_COVER)
            .with_data("type", "minimal")
            .with_data("title", title);
        if let Some(summary) = summary.filter(|s| !s.is_empty()) {
            cover = cover.with_data("summary", summary);
        }
        if let Some(byline) = byline.filter(|s| !s.is_empty()) {
            cover = cover.with_data("byline", byline);
        }
        if let Some(media) = media {
            cover = cover.with_data("media", media.as_str());
        }
        Ok(self.builder.attach(cover, None)?)
    }

    /// Attach the navigation node when configured; links are filled in by [`Self::finish`]
    pub(crate) fn navigation(&mut self) -> Result<(), ConvertError> {
        if self.config.include_navigation && self.navigation.is_none() {
            let id = self
                .builder
                .attach(Node::new(node_type::NAVIGATION).with_data("links", json!([])), None)?;
            self.navigation = Some(id);
        }
        Ok(())
    }

    /// Register a navigation target
    pub(crate) fn nav_entry(&mut self, target: NodeId, label: impl Into<String>) {
        self.nav_entries.push((target, label.into()));
    }

    /// Append a credit line to the credits block
    pub(crate) fn credit(&mut self, content: &str, attribution: Option<&str>) -> Result<(), ConvertError> {
        let mut line = Node::new(node_type::ATTRIBUTION).with_data("content", content);
        if let Some(attribution) = attribution {
            line = line.with_data("attribution", attribution);
        }
        let credits = self.credits.clone();
        self.builder.attach(line, Some(&credits))?;
        Ok(())
    }

    /// Splice a detached node into the top level
    pub(crate) fn place(&mut self, id: &NodeId) -> Result<(), ConvertError> {
        Ok(self.builder.place(id, None)?)
    }

    /// Count a piece of classic content that has no story counterpart
    pub(crate) fn note_dropped(&mut self, what: &str) {
        tracing::warn!(what, "dropping classic content without a story counterpart");
        self.dropped += 1;
    }

    /// Fill navigation links and hand the builder back
    ///
    /// Returns the builder and the number of dropped classic items.
    pub(crate) fn finish(mut self) -> (GraphBuilder, usize) {
        if let Some(navigation) = &self.navigation {
            let links: Vec<Value> = self
                .nav_entries
                .iter()
                .map(|(target, label)| json!({ "nodeId": target.as_str(), "text": label }))
                .collect();
            if let Some(node) = self.builder.node_mut(navigation) {
                node.data.insert("links".into(), Value::Array(links));
            }
        }
        (self.builder, self.dropped)
    }
}

impl std::fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("nodes", &self.builder.node_count())
            .field("resources", &self.builder.resource_count())
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

fn text_node(style: TextStyle, text: &str, alignment: &str) -> Node {
    Node::new(node_type::TEXT)
        .with_data("type", style.as_str())
        .with_data("text", text)
        .with_data("textAlignment", alignment)
}

/// Array field as a slice, empty when absent
pub(crate) fn array<'v>(value: &'v Value, pointer: &str) -> &'v [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::StructuralValidator;

    #[test]
    fn test_every_supported_format_has_a_strategy() {
        for format in LegacyFormat::ALL {
            let strategy = strategy_for(format);
            assert_eq!(strategy.is_some(), format.is_supported(), "{format}");
            if let Some(strategy) = strategy {
                assert_eq!(strategy.name(), format.tag());
            }
        }
    }

    #[test]
    fn test_context_skeleton_is_valid() {
        let config = ConvertConfig::default();
        let mut ctx = BuildContext::new(&config, &json!({"title": "Item"})).unwrap();
        ctx.cover("", Some("Summary"), None, None).unwrap();
        ctx.navigation().unwrap();
        let heading = ctx.heading(TextStyle::Heading, "Part one");
        ctx.place(&heading).unwrap();
        ctx.nav_entry(heading.clone(), "Part one");
        ctx.credit("Photos", Some("Archive")).unwrap();

        let (builder, dropped) = ctx.finish();
        assert_eq!(dropped, 0);
        let graph = builder.build().unwrap();
        let root = graph.root_node().unwrap();
        let kinds: Vec<_> = root
            .child_ids()
            .iter()
            .map(|id| graph.node(id).unwrap().kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["storycover", "navigation", "text", "credits"]);

        let cover = graph.node(&root.child_ids()[0]).unwrap();
        assert_eq!(cover.data_str("title"), Some("Item"));
        let nav = graph.node(&root.child_ids()[1]).unwrap();
        assert_eq!(nav.data["links"][0]["nodeId"], heading.as_str());

        let credits = graph.node(&root.child_ids()[3]).unwrap();
        assert_eq!(credits.child_ids().len(), 1);
        assert!(StructuralValidator::new().validate(&graph).is_empty());
    }

    #[test]
    fn test_navigation_can_be_disabled() {
        let config = ConvertConfig::default().with_navigation(false);
        let mut ctx = BuildContext::new(&config, &Value::Null).unwrap();
        ctx.navigation().unwrap();
        let (builder, _) = ctx.finish();
        assert_eq!(builder.build().unwrap().nodes_of(node_type::NAVIGATION).count(), 0);
    }

    #[test]
    fn test_content_nodes_and_dropped_media() {
        let config = ConvertConfig::default();
        let mut ctx = BuildContext::new(&config, &Value::Null).unwrap();
        let nodes = ctx.content(r#"<p>Hello</p><img src="https://a.test/i.png"><hr><iframe src="https://e.test"></iframe>"#);
        assert_eq!(nodes.len(), 4);
        assert!(ctx.media(&Value::Null).is_none());
        assert!(ctx.media(&json!({"type": "chart"})).is_none());

        let (builder, dropped) = ctx.finish();
        assert_eq!(dropped, 1);
        assert_eq!(builder.media_requests().len(), 1);
        let text = builder.node(&nodes[0]).unwrap();
        assert_eq!(text.data_str("text"), Some("Hello"));
        assert_eq!(text.data_str("textAlignment"), Some("start"));
    }
}
