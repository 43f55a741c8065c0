//! Restoration Engine
//!
//! Reads side files back into node records, resolving files only through the
//! manifest. Never writes to disk.

use super::classify::{
    FIELD_FINALIZE, FIELD_FORMAT, FIELD_FUNC, FIELD_INFO, FIELD_INITIALIZE, FIELD_LEGACY_TEMPLATE,
};
use super::files::{from_host_line_endings, FileAccess};
use super::manifest::ManifestStore;
use crate::types::{NodeId, NodeRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of restoring one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub manifest_found: bool,
    /// Fields whose value actually changed
    pub changed_fields: usize,
    /// Manifest entries with no matching node
    pub missing_nodes: Vec<NodeId>,
}

pub struct RestorationEngine<'a> {
    files: &'a dyn FileAccess,
}

impl<'a> RestorationEngine<'a> {
    pub fn new(files: &'a dyn FileAccess) -> Self {
        Self { files }
    }

    /// Overwrite code fields of `nodes` from `<entity_parent>/<entity_name>/`.
    pub fn restore(
        &self,
        nodes: &mut [NodeRecord],
        entity_name: &str,
        entity_parent: &Path,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();
        if nodes.is_empty() {
            return report;
        }

        let directory = entity_parent.join(entity_name);
        let manifest = match ManifestStore::new(self.files).read(&directory) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => return report,
            Err(e) => {
                warn!(entity = entity_name, error = %e, "Ignoring unreadable manifest");
                return report;
            }
        };
        report.manifest_found = true;

        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.id().map(|id| (id.to_string(), i)))
            .collect();

        for entry in manifest.iter() {
            let Some(&i) = index.get(&entry.node_id) else {
                warn!(
                    entity = entity_name,
                    node_id = %entry.node_id,
                    "Manifest references a node that no longer exists"
                );
                report.missing_nodes.push(entry.node_id.clone());
                continue;
            };
            let node = &mut nodes[i];

            if entry.has_code {
                if let Some(code) = self.read_side_file(&directory.join(entry.code_file())) {
                    if entry.is_markup {
                        // Both fields carry the markup for older and newer hosts.
                        report.changed_fields += usize::from(node.set_str(FIELD_FORMAT, &code));
                        report.changed_fields +=
                            usize::from(node.set_str(FIELD_LEGACY_TEMPLATE, &code));
                    } else {
                        report.changed_fields += usize::from(node.set_str(FIELD_FUNC, &code));
                    }
                }
            }

            let lifecycle = [
                (entry.has_initialize, entry.initialize_file(), FIELD_INITIALIZE),
                (entry.has_finalize, entry.finalize_file(), FIELD_FINALIZE),
                (entry.has_info, entry.info_file(), FIELD_INFO),
            ];
            for (flagged, file, field) in lifecycle {
                if !flagged {
                    continue;
                }
                if let Some(text) = self.read_side_file(&directory.join(file)) {
                    report.changed_fields += usize::from(node.set_str(field, &text));
                }
            }
        }

        info!(
            entity = entity_name,
            entries = manifest.len(),
            changed = report.changed_fields,
            missing = report.missing_nodes.len(),
            "Restored entity"
        );
        report
    }

    /// A missing file is an expected steady state and is skipped without a warning.
    fn read_side_file(&self, path: &Path) -> Option<String> {
        if !self.files.exists(path) {
            debug!(path = %path.display(), "Side file absent");
            return None;
        }
        match self.files.read_to_string(path) {
            Ok(text) => Some(from_host_line_endings(&text)),
            Err(e) => {
                warn!(error = %e, "Failed to read side file");
                None
            }
        }
    }
}
