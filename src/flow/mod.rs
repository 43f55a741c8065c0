//! Flow Model
//!
//! The monolithic flow document is a flat list of node records. Tabs and
//! subflows are header records that own every node whose `z` points at them;
//! everything else is a config node.

pub mod codec;
pub mod manager;

use crate::types::NodeRecord;
use std::fmt;

pub use codec::FileFormat;
pub use manager::{FileTreeManager, FlowSetManager};

/// The monolithic flow document
pub type MonolithDocument = Vec<NodeRecord>;

pub const TAB_TYPE: &str = "tab";
pub const SUBFLOW_TYPE: &str = "subflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tab,
    Subflow,
}

impl EntityKind {
    pub fn of(header: &NodeRecord) -> Option<Self> {
        match header.node_type() {
            Some(TAB_TYPE) => Some(EntityKind::Tab),
            Some(SUBFLOW_TYPE) => Some(EntityKind::Subflow),
            _ => None,
        }
    }

    /// Directory under the destination folder holding this category
    pub fn dir_name(self) -> &'static str {
        match self {
            EntityKind::Tab => "tabs",
            EntityKind::Subflow => "subflows",
        }
    }

    /// Header field carrying the human label
    fn label_field(self) -> &'static str {
        match self {
            EntityKind::Tab => "label",
            EntityKind::Subflow => "name",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Tab => f.write_str("tab"),
            EntityKind::Subflow => f.write_str("subflow"),
        }
    }
}

/// A tab or subflow with the nodes it owns
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub header: NodeRecord,
    pub nodes: Vec<NodeRecord>,
    /// Basename of the file this entity was read from, when read from disk
    pub file_stem: Option<String>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, header: NodeRecord) -> Self {
        Self {
            kind,
            header,
            nodes: Vec::new(),
            file_stem: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.header.id()
    }

    pub fn label(&self) -> Option<&str> {
        self.header.str_field(self.kind.label_field())
    }
}

/// The decomposed flow graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSet {
    pub tabs: Vec<EntityRecord>,
    pub subflows: Vec<EntityRecord>,
    pub config_nodes: Vec<NodeRecord>,
}

impl FlowSet {
    pub fn entities(&self, kind: EntityKind) -> &[EntityRecord] {
        match kind {
            EntityKind::Tab => &self.tabs,
            EntityKind::Subflow => &self.subflows,
        }
    }

    pub fn entities_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityRecord> {
        match kind {
            EntityKind::Tab => &mut self.tabs,
            EntityKind::Subflow => &mut self.subflows,
        }
    }

    pub fn node_count(&self) -> usize {
        self.tabs
            .iter()
            .chain(self.subflows.iter())
            .map(|e| e.nodes.len() + 1)
            .sum::<usize>()
            + self.config_nodes.len()
    }
}
