//! Structural Validator
//!
//! Walks a finished [`Graph`] and reports must-fix `errors` and should-fix
//! `warnings`. Validation is read-only. Nodes and resources are visited in
//! key order, so two runs over the same graph produce identical reports.
//!
//! This is the internal invariant check. Validation against the published
//! JSON schema happens elsewhere and may run independently.

use crate::ids::{NodeId, ResourceId};
use crate::model::{node_type, resource_type, Action, Graph, Node, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What an issue is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    /// The graph as a whole (root resolution)
    Graph,
    /// A node
    Node(NodeId),
    /// A resource
    Resource(ResourceId),
    /// An action, by index in `actions`
    Action(usize),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph => f.write_str("graph"),
            Self::Node(id) => write!(f, "node {id}"),
            Self::Resource(id) => write!(f, "resource {id}"),
            Self::Action(idx) => write!(f, "action #{idx}"),
        }
    }
}

/// Rule that produced an issue
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    MissingRoot,
    RootNotStory,
    DeprecatedField,
    MissingType,
    DanglingChild,
    WrongNamespace,
    MissingSize,
    UnknownSize,
    LegacyField,
    MissingResource,
    DanglingResource,
    EmptyText,
    MissingAlignment,
    MissingEmbedSource,
    MissingTourField,
    DanglingNode,
    EmptyPlaces,
    MissingNarrativePanel,
    EmptyContainer,
    MissingItemId,
    UnexpectedItemType,
    MissingImageSource,
    DanglingActionEndpoint,
    MissingActionMedia,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Entity the finding is about
    pub subject: Subject,
    /// Rule that fired
    pub code: IssueCode,
    /// Human-readable explanation naming the offending ids
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Validation report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Violations that must block publishing
    pub errors: Vec<Issue>,
    /// Suspicious but non-blocking conditions
    pub warnings: Vec<Issue>,
}

impl Diagnostics {
    /// Whether the graph is publishable
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any finding (error or warning) was reported
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Errors raised by one rule
    pub fn errors_with(&self, code: IssueCode) -> impl Iterator<Item = &Issue> {
        self.errors.iter().filter(move |i| i.code == code)
    }

    /// Warnings raised by one rule
    pub fn warnings_with(&self, code: IssueCode) -> impl Iterator<Item = &Issue> {
        self.warnings.iter().filter(move |i| i.code == code)
    }

    fn error(&mut self, subject: Subject, code: IssueCode, message: String) {
        self.errors.push(Issue {
            subject,
            code,
            message,
        });
    }

    fn warn(&mut self, subject: Subject, code: IssueCode, message: String) {
        self.warnings.push(Issue {
            subject,
            code,
            message,
        });
    }
}

/// Tunables for the rule table
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Recognized `config.size` values for map nodes
    pub map_sizes: Vec<String>,
    /// Recognized `itemType` values for webmap resources
    pub item_types: Vec<String>,
    /// Fields that must no longer appear in the root story's data
    pub deprecated_story_fields: Vec<String>,
    /// Fields every tour node must carry
    pub tour_fields: Vec<String>,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            map_sizes: ["small", "medium", "standard", "wide", "full"]
                .map(String::from)
                .to_vec(),
            item_types: ["Web Map", "Web Scene"].map(String::from).to_vec(),
            deprecated_story_fields: vec!["settings".to_string()],
            tour_fields: ["type", "map", "places"].map(String::from).to_vec(),
        }
    }
}

/// Post-build graph invariant checker
#[derive(Debug, Clone, Default)]
pub struct StructuralValidator {
    context: ValidationContext,
}

impl StructuralValidator {
    /// Validator with the default rule context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator with a custom rule context
    #[must_use]
    pub fn with_context(context: ValidationContext) -> Self {
        Self { context }
    }

    /// Validate a complete graph
    ///
    /// Order of findings: root checks, then nodes, resources and actions,
    /// each in key order.
    #[must_use]
    pub fn validate(&self, graph: &Graph) -> Diagnostics {
        let mut report = Diagnostics::default();

        self.check_root(graph, &mut report);
        for (id, node) in &graph.nodes {
            self.check_node(graph, id, node, &mut report);
        }
        for (id, resource) in &graph.resources {
            self.check_resource(id, resource, &mut report);
        }
        for (idx, action) in graph.actions.iter().enumerate() {
            Self::check_action(graph, idx, action, &mut report);
        }

        tracing::debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "structural validation finished"
        );
        report
    }

    fn check_root(&self, graph: &Graph, report: &mut Diagnostics) {
        if graph.root.as_str().is_empty() {
            report.error(Subject::Graph, IssueCode::MissingRoot, "root is missing".into());
            return;
        }
        let Some(root) = graph.root_node() else {
            report.error(
                Subject::Graph,
                IssueCode::MissingRoot,
                format!("root {} not found in nodes", graph.root),
            );
            return;
        };

        let subject = Subject::Node(graph.root.clone());
        if !root.is(node_type::STORY) {
            report.error(
                subject.clone(),
                IssueCode::RootNotStory,
                format!("root type is \"{}\", expected \"story\"", root.kind),
            );
        }
        for field in &self.context.deprecated_story_fields {
            if root.data.contains_key(field) {
                report.error(
                    subject.clone(),
                    IssueCode::DeprecatedField,
                    format!("deprecated field \"{field}\" in story data"),
                );
            }
        }
        if let Some(theme) = root.data_str("storyTheme") {
            if !graph.resources.contains_key(&ResourceId::new(theme)) {
                report.error(
                    subject,
                    IssueCode::DanglingResource,
                    format!("story theme resource {theme} not found"),
                );
            }
        }
    }

    fn check_node(&self, graph: &Graph, id: &NodeId, node: &Node, report: &mut Diagnostics) {
        let subject = || Subject::Node(id.clone());

        if !id.has_node_prefix() {
            report.error(
                subject(),
                IssueCode::WrongNamespace,
                format!("node id {id} is not in the node namespace"),
            );
        }
        if node.kind.is_empty() {
            report.error(subject(), IssueCode::MissingType, "node type is missing".into());
        }
        for child in node.child_ids() {
            if !graph.nodes.contains_key(child) {
                report.error(
                    subject(),
                    IssueCode::DanglingChild,
                    format!("child {child} not found"),
                );
            }
        }

        match node.kind.as_str() {
            node_type::WEBMAP => self.check_webmap_node(graph, id, node, report),
            node_type::TEXT => {
                if node.data_str("text").map_or(true, |t| t.trim().is_empty()) {
                    report.warn(subject(), IssueCode::EmptyText, "text content is empty".into());
                }
                if !node.data.contains_key("textAlignment") {
                    report.warn(
                        subject(),
                        IssueCode::MissingAlignment,
                        "textAlignment is missing".into(),
                    );
                }
            }
            node_type::IMAGE => match node.data_str("image") {
                None => report.error(
                    subject(),
                    IssueCode::MissingResource,
                    "image resource reference is missing".into(),
                ),
                Some(r) if !graph.resources.contains_key(&ResourceId::new(r)) => report.error(
                    subject(),
                    IssueCode::DanglingResource,
                    format!("image resource {r} not found"),
                ),
                Some(_) => {}
            },
            node_type::VIDEO => {
                if let Some(r) = node.data_str("video") {
                    if !graph.resources.contains_key(&ResourceId::new(r)) {
                        report.warn(
                            subject(),
                            IssueCode::DanglingResource,
                            format!("video resource {r} not found"),
                        );
                    }
                }
            }
            node_type::EMBED => {
                if node.data_str("url").is_none() && node.data_str("embedSrc").is_none() {
                    report.warn(
                        subject(),
                        IssueCode::MissingEmbedSource,
                        "embed has neither url nor embedSrc".into(),
                    );
                }
            }
            node_type::TOUR => self.check_tour(graph, id, node, report),
            node_type::TOUR_MAP => {
                if let Some(r) = node.data_str("map") {
                    if !graph.resources.contains_key(&ResourceId::new(r)) {
                        report.error(
                            subject(),
                            IssueCode::DanglingResource,
                            format!("tour map resource {r} not found"),
                        );
                    }
                }
            }
            node_type::STORY_COVER => {
                if let Some(media) = node.data_str("media") {
                    if !graph.nodes.contains_key(&NodeId::new(media)) {
                        report.error(
                            subject(),
                            IssueCode::DanglingNode,
                            format!("cover media node {media} not found"),
                        );
                    }
                }
            }
            node_type::NAVIGATION => {
                let targets = node
                    .data
                    .get("links")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|link| link.get("nodeId").and_then(Value::as_str));
                for target in targets {
                    if !graph.nodes.contains_key(&NodeId::new(target)) {
                        report.error(
                            subject(),
                            IssueCode::DanglingNode,
                            format!("navigation link target {target} not found"),
                        );
                    }
                }
            }
            node_type::SLIDE => {
                let has_panel = node
                    .child_ids()
                    .iter()
                    .filter_map(|c| graph.nodes.get(c))
                    .any(|c| c.is(node_type::NARRATIVE_PANEL));
                if !has_panel {
                    report.warn(
                        subject(),
                        IssueCode::MissingNarrativePanel,
                        "slide has no narrative panel".into(),
                    );
                }
            }
            node_type::SIDECAR | node_type::GALLERY => {
                if node.child_ids().is_empty() {
                    report.warn(
                        subject(),
                        IssueCode::EmptyContainer,
                        format!("{} has no children", node.kind),
                    );
                }
            }
            _ => {}
        }
    }

    fn check_webmap_node(&self, graph: &Graph, id: &NodeId, node: &Node, report: &mut Diagnostics) {
        let subject = || Subject::Node(id.clone());

        match node.config.get("size").and_then(Value::as_str) {
            None => report.error(subject(), IssueCode::MissingSize, "config.size is missing".into()),
            Some(size) if !self.context.map_sizes.iter().any(|s| s == size) => report.warn(
                subject(),
                IssueCode::UnknownSize,
                format!("config.size \"{size}\" is not a recognized size"),
            ),
            Some(_) => {}
        }
        if node.data.contains_key("scale") && node.data.contains_key("viewpoint") {
            report.error(
                subject(),
                IssueCode::LegacyField,
                "legacy scale present alongside viewpoint".into(),
            );
        }
        match node.data_str("map") {
            None => report.error(
                subject(),
                IssueCode::MissingResource,
                "map resource reference is missing".into(),
            ),
            Some(r) if !graph.resources.contains_key(&ResourceId::new(r)) => report.error(
                subject(),
                IssueCode::DanglingResource,
                format!("map resource {r} not found"),
            ),
            Some(_) => {}
        }
    }

    fn check_tour(&self, graph: &Graph, id: &NodeId, node: &Node, report: &mut Diagnostics) {
        let subject = || Subject::Node(id.clone());

        for field in &self.context.tour_fields {
            if !node.data.contains_key(field) {
                report.error(
                    subject(),
                    IssueCode::MissingTourField,
                    format!("tour field \"{field}\" is missing"),
                );
            }
        }
        if let Some(map) = node.data_str("map") {
            if !graph.nodes.contains_key(&NodeId::new(map)) {
                report.error(
                    subject(),
                    IssueCode::DanglingNode,
                    format!("tour map node {map} not found"),
                );
            }
        }

        let Some(places) = node.data.get("places").and_then(Value::as_array) else {
            return;
        };
        if places.is_empty() {
            report.warn(subject(), IssueCode::EmptyPlaces, "tour has no places".into());
        }
        for place in places {
            for referenced in place_refs(place) {
                if !graph.nodes.contains_key(&NodeId::new(referenced)) {
                    report.warn(
                        subject(),
                        IssueCode::DanglingNode,
                        format!("place references missing node {referenced}"),
                    );
                }
            }
        }
    }

    fn check_resource(&self, id: &ResourceId, resource: &Resource, report: &mut Diagnostics) {
        let subject = || Subject::Resource(id.clone());

        if !id.has_resource_prefix() {
            report.error(
                subject(),
                IssueCode::WrongNamespace,
                format!("resource id {id} is not in the resource namespace"),
            );
        }

        match resource.kind.as_str() {
            resource_type::WEBMAP => {
                if resource.data_str("itemId").map_or(true, str::is_empty) {
                    report.error(subject(), IssueCode::MissingItemId, "itemId is missing".into());
                }
                let legacy_scale = resource
                    .data
                    .get("initialState")
                    .and_then(Value::as_object)
                    .is_some_and(|state| state.contains_key("scale"));
                if legacy_scale {
                    report.error(
                        subject(),
                        IssueCode::LegacyField,
                        "initialState still carries legacy scale".into(),
                    );
                }
                let item_type = resource.data_str("itemType").unwrap_or_default();
                if !self.context.item_types.iter().any(|t| t == item_type) {
                    report.warn(
                        subject(),
                        IssueCode::UnexpectedItemType,
                        format!("unexpected itemType \"{item_type}\""),
                    );
                }
            }
            resource_type::IMAGE => {
                if resource.data_str("src").is_none() && resource.data_str("resourceId").is_none() {
                    report.warn(
                        subject(),
                        IssueCode::MissingImageSource,
                        "image has neither src nor resourceId".into(),
                    );
                }
            }
            _ => {}
        }
    }

    fn check_action(graph: &Graph, idx: usize, action: &Action, report: &mut Diagnostics) {
        for (role, endpoint) in [("origin", &action.origin), ("target", &action.target)] {
            if !graph.nodes.contains_key(endpoint) {
                report.error(
                    Subject::Action(idx),
                    IssueCode::DanglingActionEndpoint,
                    format!("{role} {endpoint} not found"),
                );
            }
        }
        if action.is_replace_media() {
            match &action.data.media {
                None => report.error(
                    Subject::Action(idx),
                    IssueCode::MissingActionMedia,
                    "media replacement without media node".into(),
                ),
                Some(media) if !graph.nodes.contains_key(media) => report.error(
                    Subject::Action(idx),
                    IssueCode::DanglingActionEndpoint,
                    format!("media {media} not found"),
                ),
                Some(_) => {}
            }
        }
    }
}

/// Node ids referenced by one tour place (`title`, `description`, `media`, `contents[]`)
fn place_refs(place: &Value) -> Vec<&str> {
    let mut refs: Vec<&str> = ["title", "description", "media"]
        .iter()
        .filter_map(|key| place.get(*key).and_then(Value::as_str))
        .collect();
    if let Some(contents) = place.get("contents").and_then(Value::as_array) {
        refs.extend(contents.iter().filter_map(Value::as_str));
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, ActionData, Node, Resource, REPLACE_MEDIA_EVENT};
    use serde_json::json;

    fn story(children: &[&str]) -> Graph {
        let mut graph = Graph {
            root: NodeId::new("n-1"),
            ..Graph::default()
        };
        graph.nodes.insert(
            NodeId::new("n-1"),
            Node::container(node_type::STORY)
                .with_children(children.iter().map(|c| NodeId::new(*c)).collect()),
        );
        graph
    }

    fn insert(graph: &mut Graph, id: &str, node: Node) {
        graph.nodes.insert(NodeId::new(id), node);
    }

    fn codes(issues: &[Issue]) -> Vec<IssueCode> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_minimal_story_is_clean() {
        let report = StructuralValidator::new().validate(&story(&[]));
        assert!(report.is_empty(), "{report:?}");
    }

    #[test]
    fn test_dangling_child_single_error() {
        let report = StructuralValidator::new().validate(&story(&["n-missing"]));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::DanglingChild);
        assert!(report.errors[0].message.contains("n-missing"));
    }

    #[test]
    fn test_root_must_be_story() {
        let mut graph = story(&[]);
        graph.nodes.get_mut(&NodeId::new("n-1")).unwrap().kind = "text".into();
        let report = StructuralValidator::new().validate(&graph);
        assert!(codes(&report.errors).contains(&IssueCode::RootNotStory));
    }

    #[test]
    fn test_missing_root() {
        let mut graph = story(&[]);
        graph.root = NodeId::new("n-9");
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(codes(&report.errors), vec![IssueCode::MissingRoot]);
    }

    #[test]
    fn test_deprecated_story_settings() {
        let mut graph = story(&[]);
        graph
            .nodes
            .get_mut(&NodeId::new("n-1"))
            .unwrap()
            .data
            .insert("settings".into(), json!({"layout": "side"}));
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(codes(&report.errors), vec![IssueCode::DeprecatedField]);
    }

    #[test]
    fn test_dangling_story_theme_is_an_error() {
        let mut graph = story(&[]);
        graph
            .nodes
            .get_mut(&NodeId::new("n-1"))
            .unwrap()
            .data
            .insert("storyTheme".into(), json!("r-404"));
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(codes(&report.errors), vec![IssueCode::DanglingResource]);
        assert!(report.errors[0].message.contains("r-404"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_type() {
        let mut graph = story(&["n-2"]);
        insert(&mut graph, "n-2", Node::default());
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(codes(&report.errors), vec![IssueCode::MissingType]);
    }

    #[test]
    fn test_webmap_rules() {
        let mut graph = story(&["n-2", "n-3"]);
        insert(
            &mut graph,
            "n-2",
            Node::new(node_type::WEBMAP)
                .with_data("map", "r-404")
                .with_data("scale", 5000)
                .with_data("viewpoint", json!({})),
        );
        insert(
            &mut graph,
            "n-3",
            Node::new(node_type::WEBMAP)
                .with_data("map", "r-1")
                .with_config("size", "gigantic"),
        );
        graph.resources.insert(
            ResourceId::new("r-1"),
            Resource::new(resource_type::WEBMAP)
                .with_data("itemId", "abc")
                .with_data("itemType", "Web Map"),
        );

        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(
            codes(&report.errors),
            vec![
                IssueCode::MissingSize,
                IssueCode::LegacyField,
                IssueCode::DanglingResource
            ]
        );
        assert_eq!(codes(&report.warnings), vec![IssueCode::UnknownSize]);
    }

    #[test]
    fn test_text_warnings() {
        let mut graph = story(&["n-2"]);
        insert(&mut graph, "n-2", Node::new(node_type::TEXT).with_data("text", "  "));
        let report = StructuralValidator::new().validate(&graph);
        assert!(report.errors.is_empty());
        assert_eq!(
            codes(&report.warnings),
            vec![IssueCode::EmptyText, IssueCode::MissingAlignment]
        );
    }

    #[test]
    fn test_image_and_video_references() {
        let mut graph = story(&["n-2", "n-3", "n-4"]);
        insert(&mut graph, "n-2", Node::new(node_type::IMAGE));
        insert(&mut graph, "n-3", Node::new(node_type::VIDEO).with_data("video", "r-9"));
        insert(
            &mut graph,
            "n-4",
            Node::new(node_type::VIDEO).with_data("url", "https://youtu.be/x"),
        );
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(codes(&report.errors), vec![IssueCode::MissingResource]);
        assert_eq!(codes(&report.warnings), vec![IssueCode::DanglingResource]);
    }

    #[test]
    fn test_tour_rules() {
        let mut graph = story(&["n-2"]);
        insert(
            &mut graph,
            "n-2",
            Node::new(node_type::TOUR)
                .with_data("map", "n-77")
                .with_data("places", json!([])),
        );
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(
            codes(&report.errors),
            vec![IssueCode::MissingTourField, IssueCode::DanglingNode]
        );
        assert_eq!(codes(&report.warnings), vec![IssueCode::EmptyPlaces]);
    }

    #[test]
    fn test_tour_map_resource_must_resolve() {
        let mut graph = story(&["n-2"]);
        insert(
            &mut graph,
            "n-2",
            Node::container(node_type::TOUR)
                .with_data("type", "guided")
                .with_data("map", "n-3")
                .with_data("places", json!([{"id": "place-1", "title": "n-4"}]))
                .with_children(vec![NodeId::new("n-3")]),
        );
        insert(&mut graph, "n-3", Node::new(node_type::TOUR_MAP).with_data("map", "r-404"));
        insert(
            &mut graph,
            "n-4",
            Node::new(node_type::TEXT)
                .with_data("text", "Stone bridge")
                .with_data("textAlignment", "start"),
        );

        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(codes(&report.errors), vec![IssueCode::DanglingResource]);
        assert_eq!(report.errors[0].subject, Subject::Node(NodeId::new("n-3")));
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_cover_and_navigation_targets_must_resolve() {
        let mut graph = story(&["n-2", "n-3"]);
        insert(&mut graph, "n-2", Node::new(node_type::STORY_COVER).with_data("media", "n-50"));
        insert(
            &mut graph,
            "n-3",
            Node::new(node_type::NAVIGATION)
                .with_data("links", json!([{"nodeId": "n-2", "text": "Top"}, {"nodeId": "n-51", "text": "Gone"}])),
        );

        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(
            codes(&report.errors),
            vec![IssueCode::DanglingNode, IssueCode::DanglingNode]
        );
        assert!(report.errors[0].message.contains("n-50"));
        assert!(report.errors[1].message.contains("n-51"));
    }

    #[test]
    fn test_webmap_resource_rules() {
        let mut graph = story(&[]);
        graph.resources.insert(
            ResourceId::new("r-1"),
            Resource::new(resource_type::WEBMAP)
                .with_data("itemType", "Feature Service")
                .with_data("initialState", json!({"scale": 1000})),
        );
        graph
            .resources
            .insert(ResourceId::new("r-2"), Resource::new(resource_type::IMAGE));

        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(
            codes(&report.errors),
            vec![IssueCode::MissingItemId, IssueCode::LegacyField]
        );
        assert_eq!(
            codes(&report.warnings),
            vec![IssueCode::UnexpectedItemType, IssueCode::MissingImageSource]
        );
    }

    #[test]
    fn test_action_rules() {
        let mut graph = story(&["n-2"]);
        insert(&mut graph, "n-2", Node::new(node_type::ACTION_BUTTON));
        graph.actions.push(Action {
            origin: NodeId::new("n-2"),
            trigger: "ActionButton_Apply".into(),
            target: NodeId::new("n-3"),
            event: REPLACE_MEDIA_EVENT.into(),
            data: ActionData::default(),
        });
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(
            codes(&report.errors),
            vec![IssueCode::DanglingActionEndpoint, IssueCode::MissingActionMedia]
        );
    }

    #[test]
    fn test_namespace_checks() {
        let mut graph = story(&["r-2"]);
        insert(&mut graph, "r-2", Node::new(node_type::SEPARATOR));
        graph
            .resources
            .insert(ResourceId::new("n-5"), Resource::new(resource_type::STORY_THEME));
        let report = StructuralValidator::new().validate(&graph);
        assert_eq!(
            codes(&report.errors),
            vec![IssueCode::WrongNamespace, IssueCode::WrongNamespace]
        );
    }

    #[test]
    fn test_validation_is_deterministic() {
        let mut graph = story(&["n-2", "n-x"]);
        insert(&mut graph, "n-2", Node::new(node_type::TEXT));
        let validator = StructuralValidator::new();
        assert_eq!(validator.validate(&graph), validator.validate(&graph));
    }
}
