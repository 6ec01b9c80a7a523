//! Flat JSON form of a tree: every node listed once under its id, edges by id.
//!
//! Both directions walk the tree with an explicit stack, so depth is bounded only by memory.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use avatar_core::{NodeId, TreeId};

use crate::node::{walk, Category};
use crate::registry::{BuildError, NodeRegistry, NodeSpec};
use crate::tree::BehaviorTree;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("node {0} is referenced but not defined")]
    MissingNode(NodeId),

    #[error("node {0} is referenced by more than one parent")]
    SharedNode(NodeId),

    #[error("node {0} is its own ancestor")]
    Cycle(NodeId),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub id: TreeId,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub root: Option<NodeId>,
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeDocument>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<NodeId>,
}

fn default_title() -> String {
    "Untitled Tree".to_string()
}

impl NodeDocument {
    fn edges(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.children
            .iter()
            .flatten()
            .copied()
            .chain(self.child)
    }
}

impl TreeDocument {
    pub fn from_tree(tree: &BehaviorTree) -> Self {
        let mut nodes = BTreeMap::new();
        if let Some(root) = tree.root() {
            for node in walk(root) {
                let meta = node.meta();
                let child_ids = node.children().iter().map(|c| c.id());
                let (children, child) = match meta.category {
                    Category::Composite => (Some(child_ids.collect()), None),
                    Category::Decorator => (None, node.children().first().map(|c| c.id())),
                    Category::Action | Category::Condition => (None, None),
                };
                nodes.insert(
                    meta.id,
                    NodeDocument {
                        name: meta.name.to_string(),
                        title: Some(meta.title.clone()),
                        description: meta.description.clone(),
                        properties: meta.properties.clone(),
                        children,
                        child,
                    },
                );
            }
        }

        Self {
            id: tree.id(),
            title: tree.title.clone(),
            description: tree.description.clone(),
            root: tree.root().map(|r| r.id()),
            nodes,
            properties: tree.properties.clone(),
        }
    }

    /// Rebuilds the tree bottom-up through `registry`, keeping every recorded id.
    pub fn build(&self, registry: &NodeRegistry) -> Result<BehaviorTree, SerializationError> {
        let mut tree = BehaviorTree::empty().with_id(self.id).with_title(self.title.clone());
        tree.description = self.description.clone();
        tree.properties = self.properties.clone();

        let Some(root_id) = self.root else {
            return Ok(tree);
        };

        #[derive(PartialEq)]
        enum Visit {
            InProgress,
            Done,
        }

        let mut visits: HashMap<NodeId, Visit> = HashMap::new();
        let mut built = HashMap::new();
        let mut stack = vec![(root_id, false)];

        while let Some((id, expanded)) = stack.pop() {
            let doc = self
                .nodes
                .get(&id)
                .ok_or(SerializationError::MissingNode(id))?;

            if !expanded {
                match visits.get(&id) {
                    Some(Visit::InProgress) => return Err(SerializationError::Cycle(id)),
                    Some(Visit::Done) => return Err(SerializationError::SharedNode(id)),
                    None => {}
                }
                visits.insert(id, Visit::InProgress);
                stack.push((id, true));
                stack.extend(doc.edges().rev().map(|child| (child, false)));
                continue;
            }

            let mut spec = NodeSpec::new(doc.name.clone());
            spec.id = Some(id);
            spec.title = doc.title.clone();
            spec.description = Some(doc.description.clone());
            spec.properties = doc.properties.clone();
            for child in doc.children.iter().flatten() {
                let node = built
                    .remove(child)
                    .ok_or(SerializationError::SharedNode(*child))?;
                spec.children.push(node);
            }
            if let Some(child) = doc.child {
                let node = built
                    .remove(&child)
                    .ok_or(SerializationError::SharedNode(child))?;
                spec.child = Some(node);
            }

            built.insert(id, registry.build(spec)?);
            visits.insert(id, Visit::Done);
        }

        if let Some(root) = built.remove(&root_id) {
            tree.set_root(root);
        }
        Ok(tree)
    }

    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl BehaviorTree {
    pub fn to_document(&self) -> TreeDocument {
        TreeDocument::from_tree(self)
    }

    pub fn from_document(
        document: &TreeDocument,
        registry: &NodeRegistry,
    ) -> Result<Self, SerializationError> {
        document.build(registry)
    }
}
