//! Graph Builder
//!
//! Owns the in-progress graph exclusively until [`GraphBuilder::build`]
//! hands it over. Per-format conversion code only ever mutates the graph
//! through this type.
//!
//! # Ordering
//!
//! Top-level content attached without an explicit parent lands in the root's
//! children immediately before the designated terminal node (the trailing
//! credits block) when one exists, and at the end otherwise.

use crate::error::BuilderError;
use crate::ids::{IdAllocator, IdStrategy, NodeId, ResourceId};
use crate::media::{normalize_url, MediaContext, MediaKind, MediaRequest, TransferOutcome};
use crate::model::{node_type, resource_type, Action, Graph, Node, Resource};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Fixed multi-node templates produced by [`GraphBuilder::compose_group`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    /// Sidecar slide: a narrative panel holding `contents`, plus optional media
    Slide {
        /// Nodes shown in the narrative panel, in order
        contents: Vec<NodeId>,
        /// Media node shown behind the panel
        media: Option<NodeId>,
    },
    /// Sidecar container holding slides
    Sidecar {
        /// Layout subtype, e.g. `docked-panel`
        subtype: String,
        /// Slide nodes, in order
        slides: Vec<NodeId>,
    },
    /// Image gallery
    Gallery {
        /// Image nodes, in order
        images: Vec<NodeId>,
    },
}

/// Builder for story graphs
///
/// Usage:
/// ```rust
/// use story_graph::{GraphBuilder, IdStrategy, Node};
///
/// let mut builder = GraphBuilder::new(IdStrategy::Sequential);
/// builder.create_root(Node::container("story")).unwrap();
/// builder.attach_terminal(Node::container("credits")).unwrap();
/// let text = builder.attach(Node::new("text"), None).unwrap();
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.root_node().unwrap().children.as_ref().unwrap()[0], text);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    ids: IdAllocator,
    root: Option<NodeId>,
    terminal: Option<NodeId>,
    nodes: BTreeMap<NodeId, Node>,
    resources: BTreeMap<ResourceId, Resource>,
    actions: Vec<Action>,
    // normalized url + kind -> resource created for it
    media_resources: HashMap<(MediaKind, String), ResourceId>,
    media_requests: Vec<MediaRequest>,
}

impl GraphBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            ids: IdAllocator::new(strategy),
            root: None,
            terminal: None,
            nodes: BTreeMap::new(),
            resources: BTreeMap::new(),
            actions: Vec::new(),
            media_resources: HashMap::new(),
            media_requests: Vec::new(),
        }
    }

    /// Root node id, once created
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    /// Terminal node id, if designated
    #[inline]
    #[must_use]
    pub fn terminal(&self) -> Option<&NodeId> {
        self.terminal.as_ref()
    }

    /// Number of nodes created so far
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of resources created so far
    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Get a node
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node for in-place edits
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Get a resource
    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Get a resource for in-place edits
    pub fn resource_mut(&mut self, id: &ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    /// Create the root story node
    ///
    /// The node is forced to be a container.
    pub fn create_root(&mut self, mut node: Node) -> Result<NodeId, BuilderError> {
        if let Some(existing) = &self.root {
            return Err(BuilderError::RootAlreadySet(existing.clone()));
        }
        node.children.get_or_insert_with(Vec::new);
        let id = self.create_detached(node);
        self.root = Some(id.clone());
        Ok(id)
    }

    /// Append a node at the very end of the root and designate it as the
    /// terminal marker new top-level content is inserted before
    pub fn attach_terminal(&mut self, node: Node) -> Result<NodeId, BuilderError> {
        if let Some(existing) = &self.terminal {
            return Err(BuilderError::TerminalAlreadySet(existing.clone()));
        }
        let root = self.root.clone().ok_or(BuilderError::MissingRoot)?;
        let id = self.create_detached(node);
        self.children_of(&root)?.push(id.clone());
        self.terminal = Some(id.clone());
        Ok(id)
    }

    /// Create a node and position it
    ///
    /// With a parent the id is appended to the parent's children. Without
    /// one it is inserted into the root using the terminal ordering rule.
    pub fn attach(&mut self, node: Node, parent: Option<&NodeId>) -> Result<NodeId, BuilderError> {
        // check first so a failed attach leaves no orphan behind
        self.check_parent(parent)?;
        let id = self.create_detached(node);
        self.place(&id, parent)?;
        Ok(id)
    }

    /// Create a node without positioning it
    pub fn create_detached(&mut self, node: Node) -> NodeId {
        let id = self.ids.next_node_id();
        self.nodes.insert(id.clone(), node);
        id
    }

    /// Position an existing node, using the same policy as [`Self::attach`]
    pub fn place(&mut self, id: &NodeId, parent: Option<&NodeId>) -> Result<(), BuilderError> {
        if !self.nodes.contains_key(id) {
            return Err(BuilderError::NodeNotFound(id.clone()));
        }
        self.check_parent(parent)?;

        match parent {
            Some(parent) => self.children_of(parent)?.push(id.clone()),
            None => {
                let root = self.root.clone().ok_or(BuilderError::MissingRoot)?;
                let terminal = self.terminal.clone();
                let children = self.children_of(&root)?;
                let at = terminal
                    .and_then(|t| children.iter().position(|c| *c == t))
                    .unwrap_or(children.len());
                children.insert(at, id.clone());
            }
        }
        Ok(())
    }

    /// Create a resource
    pub fn add_resource(&mut self, resource: Resource) -> ResourceId {
        let id = self.ids.next_resource_id();
        self.resources.insert(id.clone(), resource);
        id
    }

    /// Record an interaction
    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Build a fixed template from existing member nodes
    ///
    /// Returns the detached group root; splice it with [`Self::place`].
    pub fn compose_group(&mut self, group: Group) -> Result<NodeId, BuilderError> {
        match group {
            Group::Slide { contents, media } => {
                self.require_all(&contents)?;
                if let Some(media) = &media {
                    self.require_all(std::slice::from_ref(media))?;
                }
                let panel = self.create_detached(
                    Node::container(node_type::NARRATIVE_PANEL)
                        .with_data("position", "start")
                        .with_children(contents),
                );
                let mut children = vec![panel];
                children.extend(media);
                Ok(self.create_detached(Node::container(node_type::SLIDE).with_children(children)))
            }
            Group::Sidecar { subtype, slides } => {
                self.require_all(&slides)?;
                Ok(self.create_detached(
                    Node::container(node_type::SIDECAR)
                        .with_data("type", "sidecar")
                        .with_data("subtype", subtype)
                        .with_data("narrativePanelPosition", "start")
                        .with_children(slides),
                ))
            }
            Group::Gallery { images } => {
                self.require_all(&images)?;
                Ok(self.create_detached(
                    Node::container(node_type::GALLERY)
                        .with_config("size", "standard")
                        .with_children(images),
                ))
            }
        }
    }

    /// Image resource for an external URL, reused for repeated URLs
    ///
    /// Every call queues a [`MediaRequest`] for the transfer phase.
    pub fn image_resource(&mut self, url: &str, context: MediaContext) -> ResourceId {
        self.media_resource(resource_type::IMAGE, url, context)
    }

    /// Video resource for a directly hosted video file
    pub fn video_resource(&mut self, url: &str, context: MediaContext) -> ResourceId {
        self.media_resource(resource_type::VIDEO, url, context)
    }

    fn media_resource(&mut self, kind: &str, url: &str, context: MediaContext) -> ResourceId {
        let key = (context.kind, normalize_url(url));
        self.media_requests.push(MediaRequest::new(url, context));

        if let Some(id) = self.media_resources.get(&key) {
            return id.clone();
        }

        let id = self.add_resource(
            Resource::new(kind)
                .with_data("src", url.trim())
                .with_data("provider", "uri"),
        );
        self.media_resources.insert(key, id.clone());
        id
    }

    /// Media references queued so far, in discovery order
    #[must_use]
    pub fn media_requests(&self) -> &[MediaRequest] {
        &self.media_requests
    }

    /// Fold transfer outcomes into media resources
    ///
    /// Transferred media switch to `resourceId` + `item-resource` and lose
    /// `src`. Everything else keeps its remote `src`. Returns the number of
    /// resources that were switched to a local resource.
    pub fn apply_transfers(&mut self, outcomes: &HashMap<String, TransferOutcome>) -> usize {
        let mut applied = 0;
        for ((_, key), id) in &self.media_resources {
            let Some(resource) = self.resources.get_mut(id) else {
                continue;
            };
            match outcomes.get(key) {
                Some(TransferOutcome {
                    transferred: true,
                    resource_name: Some(name),
                    ..
                }) => {
                    resource.data.remove("src");
                    resource
                        .data
                        .insert("resourceId".into(), Value::String(name.clone()));
                    resource
                        .data
                        .insert("provider".into(), Value::String("item-resource".into()));
                    applied += 1;
                }
                _ => {
                    resource
                        .data
                        .insert("provider".into(), Value::String("uri".into()));
                }
            }
        }
        tracing::debug!(applied, total = self.media_resources.len(), "applied transfer outcomes");
        applied
    }

    /// Finish construction and hand the graph over
    pub fn build(self) -> Result<Graph, BuilderError> {
        let root = self.root.ok_or(BuilderError::MissingRoot)?;
        Ok(Graph {
            root,
            nodes: self.nodes,
            resources: self.resources,
            actions: self.actions,
        })
    }

    fn check_parent(&self, parent: Option<&NodeId>) -> Result<(), BuilderError> {
        match parent {
            Some(parent) => match self.nodes.get(parent) {
                None => Err(BuilderError::ParentNotFound(parent.clone())),
                Some(node) if node.children.is_none() => {
                    Err(BuilderError::NotAContainer(parent.clone()))
                }
                Some(_) => Ok(()),
            },
            None if self.root.is_none() => Err(BuilderError::MissingRoot),
            None => Ok(()),
        }
    }

    fn children_of(&mut self, id: &NodeId) -> Result<&mut Vec<NodeId>, BuilderError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| BuilderError::ParentNotFound(id.clone()))?
            .children
            .as_mut()
            .ok_or_else(|| BuilderError::NotAContainer(id.clone()))
    }

    fn require_all(&self, ids: &[NodeId]) -> Result<(), BuilderError> {
        match ids.iter().find(|id| !self.nodes.contains_key(*id)) {
            Some(missing) => Err(BuilderError::NodeNotFound(missing.clone())),
            None => Ok(()),
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(IdStrategy::Sequential)
    }
}
