//! Story graph data model
//!
//! A [`Graph`] is a root node id plus flat maps of nodes and resources and an
//! ordered list of actions. The maps are `BTreeMap`s so serialization and
//! validation walk entries in a stable order.

use crate::ids::{NodeId, ResourceId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Open JSON object used for `data`, `config` and `states`
pub type DataMap = Map<String, Value>;

/// Node type tags
#[allow(missing_docs)]
pub mod node_type {
    pub const STORY: &str = "story";
    pub const STORY_COVER: &str = "storycover";
    pub const NAVIGATION: &str = "navigation";
    pub const CREDITS: &str = "credits";
    pub const TEXT: &str = "text";
    pub const IMAGE: &str = "image";
    pub const WEBMAP: &str = "webmap";
    pub const EMBED: &str = "embed";
    pub const VIDEO: &str = "video";
    pub const TOUR: &str = "tour";
    pub const TOUR_MAP: &str = "tour-map";
    pub const GALLERY: &str = "gallery";
    pub const SIDECAR: &str = "immersive";
    pub const SLIDE: &str = "immersive-slide";
    pub const NARRATIVE_PANEL: &str = "immersive-narrative-panel";
    pub const SEPARATOR: &str = "separator";
    pub const ACTION_BUTTON: &str = "action-button";
    pub const ATTRIBUTION: &str = "attribution";
}

/// Resource type tags
#[allow(missing_docs)]
pub mod resource_type {
    pub const WEBMAP: &str = "webmap";
    pub const IMAGE: &str = "image";
    pub const VIDEO: &str = "video";
    pub const STORY_THEME: &str = "story-theme";
    pub const CONVERTER_METADATA: &str = "converter-metadata";
}

/// Action event that swaps the media of a sidecar slide
pub const REPLACE_MEDIA_EVENT: &str = "ImmersiveSlide_ReplaceMedia";

/// One renderable unit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Type tag; empty when the source omitted it
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Type-specific fields
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: DataMap,

    /// Layout directives such as `size`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: DataMap,

    /// Ordered child ids; `None` for leaf types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeId>>,

    /// UI-only scratch fields, never persisted
    #[serde(skip)]
    pub states: DataMap,
}

impl Node {
    /// Leaf node of the given type
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Container node of the given type with no children yet
    #[must_use]
    pub fn container(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            children: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Set a `data` field
    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Set a `config` field
    #[must_use]
    pub fn with_config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    /// Replace the children list
    #[must_use]
    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = Some(children);
        self
    }

    /// Whether the node has the given type tag
    #[inline]
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Children as a slice, empty for leaves
    #[inline]
    #[must_use]
    pub fn child_ids(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// String field from `data`
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Non-node payload referenced from node data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Type tag
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Type-specific payload
    #[serde(default)]
    pub data: DataMap,
}

impl Resource {
    /// Resource of the given type with empty data
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: DataMap::new(),
        }
    }

    /// Set a `data` field
    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// String field from `data`
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Extra payload carried by an action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionData {
    /// Media node swapped in by media-replacement actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<NodeId>,
}

/// Interaction record wiring an origin node to a target node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Node the reader interacts with
    pub origin: NodeId,
    /// Trigger on the origin, e.g. `ActionButton_Apply`
    pub trigger: String,
    /// Node affected by the action
    pub target: NodeId,
    /// Event fired on the target
    pub event: String,
    /// Event payload
    #[serde(default)]
    pub data: ActionData,
}

impl Action {
    /// Button-driven media replacement on a sidecar slide
    #[must_use]
    pub fn replace_media(origin: NodeId, slide: NodeId, media: NodeId) -> Self {
        Self {
            origin,
            trigger: "ActionButton_Apply".to_string(),
            target: slide,
            event: REPLACE_MEDIA_EVENT.to_string(),
            data: ActionData { media: Some(media) },
        }
    }

    /// Whether this is a media-replacement action
    #[inline]
    #[must_use]
    pub fn is_replace_media(&self) -> bool {
        self.event == REPLACE_MEDIA_EVENT
    }
}

/// Conversion output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Root node id, expected to be a `story` node
    #[serde(default)]
    pub root: NodeId,
    /// All nodes by id
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, Node>,
    /// All resources by id
    #[serde(default)]
    pub resources: BTreeMap<ResourceId, Resource>,
    /// Ordered interaction records
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Graph {
    /// Parse the JSON interchange format
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to the JSON interchange format
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Root node, if it resolves
    #[must_use]
    pub fn root_node(&self) -> Option<&Node> {
        self.nodes.get(&self.root)
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a resource
    #[inline]
    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of resources
    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Nodes of one type, in id order
    pub fn nodes_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = (&'a NodeId, &'a Node)> + 'a {
        self.nodes.iter().filter(move |(_, n)| n.is(kind))
    }

    /// Resources of one type, in id order
    pub fn resources_of<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a ResourceId, &'a Resource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.kind == kind)
    }

    /// Ids reachable from the root through `children`
    ///
    /// Detached nodes referenced only from data (tour places, action media)
    /// are not included.
    #[must_use]
    pub fn reachable_from_root(&self) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![self.root.clone()];

        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.child_ids().iter().cloned());
            }
        }

        seen.retain(|id| self.nodes.contains_key(id));
        seen
    }
}
