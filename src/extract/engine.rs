//! Extraction Engine
//!
//! Writes the code fields of an entity's extractable nodes into side files,
//! records them in a freshly written manifest and garbage-collects whatever
//! the manifest no longer accounts for.

use super::classify::{
    classify, NodeKind, FIELD_FINALIZE, FIELD_FORMAT, FIELD_FUNC, FIELD_INFO, FIELD_INITIALIZE,
};
use super::files::{to_host_line_endings, FileAccess};
use super::manifest::{Manifest, ManifestEntry, ManifestStore};
use super::naming::NameAllocator;
use super::reconcile::OrphanReconciler;
use crate::error::ApiError;
use crate::types::NodeRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of extracting one entity
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub directory: PathBuf,
    pub manifest: Manifest,
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Per-file failures; the pass carried on past each of them
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    pub fn extracted_nodes(&self) -> usize {
        self.manifest.len()
    }
}

#[derive(Debug, Clone, Copy)]
enum SideFile {
    Code,
    Initialize,
    Finalize,
    Info,
}

pub struct ExtractionEngine<'a> {
    files: &'a dyn FileAccess,
}

impl<'a> ExtractionEngine<'a> {
    pub fn new(files: &'a dyn FileAccess) -> Self {
        Self { files }
    }

    /// Extract `nodes` into `<entity_parent>/<entity_name>/`.
    ///
    /// Only a failure to create the extraction directory is an error; every
    /// other failure is recorded in the report.
    pub fn extract(
        &self,
        nodes: &[NodeRecord],
        entity_name: &str,
        entity_parent: &Path,
    ) -> Result<ExtractionReport, ApiError> {
        let directory = entity_parent.join(entity_name);
        let mut report = ExtractionReport {
            directory: directory.clone(),
            ..Default::default()
        };
        let mut dir_ready = self.files.is_dir(&directory);
        if nodes.is_empty() && !dir_ready {
            return Ok(report);
        }

        let mut names = NameAllocator::for_side_files();
        for node in nodes {
            let kind = classify(node);
            if !kind.is_extractable() {
                continue;
            }
            let Some(node_id) = node.id() else {
                warn!(entity = entity_name, "Skipping extractable node without id");
                report
                    .warnings
                    .push(format!("node without id in {}", entity_name));
                continue;
            };

            let allocated = names.allocate(node.name());
            let mut entry = ManifestEntry {
                node_id: node_id.to_string(),
                name: node.name().map(str::to_string),
                sanitized_name: allocated.sanitized,
                file_name: allocated.file_name,
                is_markup: kind == NodeKind::Markup,
                is_script: kind == NodeKind::Script,
                has_code: false,
                has_initialize: false,
                has_finalize: false,
                has_info: false,
            };

            for &(side, field) in side_files(kind) {
                if !node.has_text(field) {
                    continue;
                }
                let Some(content) = node.str_field(field) else {
                    continue;
                };
                if !dir_ready {
                    self.files.create_dir_all(&directory).map_err(|source| {
                        ApiError::ExtractionDirectory {
                            path: directory.clone(),
                            source,
                        }
                    })?;
                    dir_ready = true;
                }
                let path = directory.join(file_for(&entry, side));
                match self.write_if_changed(&path, content) {
                    Ok(()) => {
                        set_flag(&mut entry, side);
                        report.written.push(path);
                    }
                    Err(e) => {
                        warn!(node_id, error = %e, "Failed to write side file");
                        report.warnings.push(e.to_string());
                    }
                }
            }

            report.manifest.insert(entry);
        }

        let store = ManifestStore::new(self.files);
        let reconciler = OrphanReconciler::new(self.files);

        if !report.manifest.is_empty() {
            if let Err(e) = store.write(&directory, &report.manifest) {
                // Without a manifest on disk nothing can be proven orphaned.
                warn!(entity = entity_name, error = %e, "Failed to write manifest");
                report.warnings.push(e.to_string());
                return Ok(report);
            }
        } else if dir_ready {
            if let Err(e) = store.remove(&directory) {
                warn!(entity = entity_name, error = %e, "Failed to remove stale manifest");
                report.warnings.push(e.to_string());
            }
        }

        if dir_ready {
            match reconciler.collect_garbage(&directory, &report.manifest) {
                Ok(removed) => report.removed = removed,
                Err(e) => {
                    warn!(entity = entity_name, error = %e, "Failed to scan extraction directory");
                    report.warnings.push(e.to_string());
                }
            }
            if report.manifest.is_empty() {
                match reconciler.remove_if_empty(&directory) {
                    Ok(true) => report.removed.push(directory.clone()),
                    Ok(false) => {}
                    Err(e) => report.warnings.push(e.to_string()),
                }
            }
        }

        info!(
            entity = entity_name,
            extracted = report.extracted_nodes(),
            written = report.written.len(),
            removed = report.removed.len(),
            warnings = report.warnings.len(),
            "Extracted entity"
        );
        Ok(report)
    }

    /// Leaves the file untouched when it already holds `content`
    fn write_if_changed(&self, path: &Path, content: &str) -> Result<(), crate::error::StorageError> {
        let text = to_host_line_endings(content);
        if self.files.exists(path) {
            if let Ok(current) = self.files.read_to_string(path) {
                if current == text {
                    debug!(path = %path.display(), "Side file unchanged");
                    return Ok(());
                }
            }
        }
        self.files.write(path, &text)?;
        debug!(path = %path.display(), "Wrote side file");
        Ok(())
    }
}

fn side_files(kind: NodeKind) -> &'static [(SideFile, &'static str)] {
    match kind {
        NodeKind::Markup => &[(SideFile::Code, FIELD_FORMAT), (SideFile::Info, FIELD_INFO)],
        NodeKind::Script => &[
            (SideFile::Code, FIELD_FUNC),
            (SideFile::Initialize, FIELD_INITIALIZE),
            (SideFile::Finalize, FIELD_FINALIZE),
            (SideFile::Info, FIELD_INFO),
        ],
        NodeKind::NotExtractable => &[],
    }
}

fn file_for(entry: &ManifestEntry, side: SideFile) -> String {
    match side {
        SideFile::Code => entry.code_file(),
        SideFile::Initialize => entry.initialize_file(),
        SideFile::Finalize => entry.finalize_file(),
        SideFile::Info => entry.info_file(),
    }
}

fn set_flag(entry: &mut ManifestEntry, side: SideFile) {
    match side {
        SideFile::Code => entry.has_code = true,
        SideFile::Initialize => entry.has_initialize = true,
        SideFile::Finalize => entry.has_finalize = true,
        SideFile::Info => entry.has_info = true,
    }
}
