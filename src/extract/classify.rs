//! Decides whether a node carries extractable code.

use crate::types::NodeRecord;

pub const FUNCTION_TYPE: &str = "function";
pub const TEMPLATE_TYPE: &str = "ui-template";

pub const FIELD_FUNC: &str = "func";
pub const FIELD_INITIALIZE: &str = "initialize";
pub const FIELD_FINALIZE: &str = "finalize";
pub const FIELD_FORMAT: &str = "format";
pub const FIELD_INFO: &str = "info";
/// Older template nodes mirror `format` here
pub const FIELD_LEGACY_TEMPLATE: &str = "template";

/// Extraction policy for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `ui-template` whose `format` holds single-file-component markup
    Markup,
    /// `function` with at least one non-empty script field
    Script,
    NotExtractable,
}

impl NodeKind {
    pub fn is_extractable(self) -> bool {
        !matches!(self, NodeKind::NotExtractable)
    }
}

/// `format` is non-empty and contains a `<template>` or `<script>` block
pub fn looks_like_markup(node: &NodeRecord) -> bool {
    match node.str_field(FIELD_FORMAT) {
        Some(format) if !format.trim().is_empty() => {
            format.contains("<template>") || format.contains("<script>")
        }
        _ => false,
    }
}

pub fn has_script(node: &NodeRecord) -> bool {
    node.has_text(FIELD_FUNC) || node.has_text(FIELD_INITIALIZE) || node.has_text(FIELD_FINALIZE)
}

pub fn classify(node: &NodeRecord) -> NodeKind {
    let markup = looks_like_markup(node);
    match node.node_type() {
        Some(TEMPLATE_TYPE) if markup => NodeKind::Markup,
        // Markup wins: a markup-looking node is never treated as script.
        Some(FUNCTION_TYPE) if !markup && has_script(node) => NodeKind::Script,
        _ => NodeKind::NotExtractable,
    }
}
