// src/models/tree.rs

//! Arena-backed jurisdiction tree.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::models::{Jurisdiction, Level};

/// Index of a node in a [`JurisdictionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JurisdictionId(usize);

impl JurisdictionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    jurisdiction: Jurisdiction,
    parent: Option<JurisdictionId>,
    children: Vec<JurisdictionId>,
}

/// A root jurisdiction and every descendant discovered for it.
///
/// Nodes are only ever appended; a node's children keep their scrape order.
#[derive(Debug, Clone)]
pub struct JurisdictionTree {
    nodes: Vec<Node>,
}

impl JurisdictionTree {
    /// Create a tree holding only the root.
    pub fn new(root: Jurisdiction) -> Self {
        Self {
            nodes: vec![Node {
                jurisdiction: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> JurisdictionId {
        JurisdictionId(0)
    }

    pub fn get(&self, id: JurisdictionId) -> Option<&Jurisdiction> {
        self.nodes.get(id.0).map(|n| &n.jurisdiction)
    }

    pub fn parent(&self, id: JurisdictionId) -> Option<JurisdictionId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: JurisdictionId) -> &[JurisdictionId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a child below `parent`. States are only ever roots.
    pub(crate) fn add_child(
        &mut self,
        parent: JurisdictionId,
        jurisdiction: Jurisdiction,
    ) -> JurisdictionId {
        debug_assert!(jurisdiction.level() != Level::State);

        let id = JurisdictionId(self.nodes.len());
        self.nodes.push(Node {
            jurisdiction,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Node ids in pre-order: parent before children, children in scrape order.
    pub fn walk(&self) -> Vec<JurisdictionId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }

        order
    }

    /// Jurisdictions in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (JurisdictionId, &Jurisdiction)> {
        self.walk().into_iter().map(move |id| (id, &self[id]))
    }
}

impl Index<JurisdictionId> for JurisdictionTree {
    type Output = Jurisdiction;

    fn index(&self, id: JurisdictionId) -> &Jurisdiction {
        &self.nodes[id.0].jurisdiction
    }
}
