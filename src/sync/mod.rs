//! Sync Orchestrator
//!
//! Runs whole passes over the flow graph. A split pass takes the monolithic
//! document as truth: it decomposes it into entity files and extracts code
//! into side files. A rebuild pass takes the tree as truth: it restores code
//! from side files and hands the rebuilt document to the host. Passes are
//! serialized so that a manual reload never interleaves with an automatic pass.

pub mod host;

use crate::config::{ConfigLoader, SplitterConfig};
use crate::error::ApiError;
use crate::extract::files::FileAccess;
use crate::extract::manifest::ManifestStore;
use crate::extract::{ExtractionEngine, OrphanReconciler, RestorationEngine};
use crate::flow::{EntityKind, FlowSetManager, MonolithDocument};
use crate::types::NodeRecord;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub use host::{FlowsFileHost, HostRuntime};

const CATEGORIES: [EntityKind; 2] = [EntityKind::Tab, EntityKind::Subflow];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassMode {
    Split,
    Rebuild,
}

/// Summary of one pass
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub mode: PassMode,
    pub entities: usize,
    pub nodes: usize,
    pub extracted_nodes: usize,
    pub restored_fields: usize,
    pub removed_paths: usize,
    pub warnings: Vec<String>,
}

impl PassSummary {
    fn new(mode: PassMode) -> Self {
        Self {
            mode,
            entities: 0,
            nodes: 0,
            extracted_nodes: 0,
            restored_fields: 0,
            removed_paths: 0,
            warnings: Vec::new(),
        }
    }

    pub fn message(&self) -> String {
        match self.mode {
            PassMode::Split => format!(
                "Split {} entities, extracted {} nodes, removed {} orphaned paths",
                self.entities, self.extracted_nodes, self.removed_paths
            ),
            PassMode::Rebuild => format!(
                "Rebuilt {} nodes from {} entities, restored {} fields",
                self.nodes, self.entities, self.restored_fields
            ),
        }
    }
}

/// Extraction state of one entity on disk
#[derive(Debug, Clone, Serialize)]
pub struct EntityStatus {
    pub kind: String,
    pub id: Option<String>,
    pub file_stem: String,
    pub directory: PathBuf,
    pub nodes: usize,
    /// Manifest entry count; None when never extracted
    pub extracted: Option<usize>,
    pub manifest_error: bool,
}

pub struct SyncService {
    project_root: PathBuf,
    config: RwLock<SplitterConfig>,
    manager: Arc<dyn FlowSetManager>,
    host: Arc<dyn HostRuntime>,
    files: Arc<dyn FileAccess>,
    pass_lock: Mutex<()>,
    persist_config: bool,
    config_path: PathBuf,
}

impl SyncService {
    pub fn new(
        project_root: PathBuf,
        config: SplitterConfig,
        manager: Arc<dyn FlowSetManager>,
        host: Arc<dyn HostRuntime>,
        files: Arc<dyn FileAccess>,
    ) -> Self {
        Self {
            config_path: ConfigLoader::project_config_path(&project_root),
            project_root,
            config: RwLock::new(config),
            manager,
            host,
            files,
            pass_lock: Mutex::new(()),
            persist_config: true,
        }
    }

    /// Keep config changes (tab order) in memory only
    pub fn without_config_persistence(mut self) -> Self {
        self.persist_config = false;
        self
    }

    /// Persist config changes to `path` instead of the project config file
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = path;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> SplitterConfig {
        self.config.read().clone()
    }

    /// Entry point for the host's "flows started" event.
    ///
    /// An empty document means the host has nothing loaded and wants the
    /// flows rebuilt from the tree.
    pub fn on_flows_started(&self, monolith: &[NodeRecord]) -> Result<PassSummary, ApiError> {
        let result = if monolith.is_empty() {
            self.reload()
        } else {
            self.split(monolith)
        };
        if let Err(e) = &result {
            error!(error = %e, "Sync pass aborted");
        }
        result
    }

    /// Decompose `monolith` into the tree and extract code into side files
    pub fn split(&self, monolith: &[NodeRecord]) -> Result<PassSummary, ApiError> {
        let _guard = self.pass_lock.lock();
        let config = self.config();
        let dest = config.destination_dir(&self.project_root);
        let mut summary = PassSummary::new(PassMode::Split);

        let flow_set = self.manager.build_tree(monolith)?;
        summary.nodes = monolith.len();
        let files = self.files.as_ref();
        let reconciler = OrphanReconciler::new(files);
        let engine = ExtractionEngine::new(files);

        let mut planned: HashMap<EntityKind, Vec<String>> = HashMap::new();
        for kind in CATEGORIES {
            let basenames = self.manager.planned_basenames(&flow_set, kind);
            let by_id: HashMap<String, String> = flow_set
                .entities(kind)
                .iter()
                .zip(&basenames)
                .filter_map(|(e, b)| e.id().map(|id| (id.to_string(), b.clone())))
                .collect();
            let category_dir = dest.join(kind.dir_name());
            match reconciler.remove_renamed_entities(
                &category_dir,
                &by_id,
                config.file_format.extension(),
            ) {
                Ok(removed) => summary.removed_paths += removed.len(),
                Err(e) => {
                    warn!(category = kind.dir_name(), error = %e, "Renamed-entity cleanup failed");
                    summary.warnings.push(e.to_string());
                }
            }
            planned.insert(kind, basenames);
        }

        if config.extract_functions_templates {
            for kind in CATEGORIES {
                let category_dir = dest.join(kind.dir_name());
                for (entity, basename) in flow_set.entities(kind).iter().zip(&planned[&kind]) {
                    summary.entities += 1;
                    match engine.extract(&entity.nodes, basename, &category_dir) {
                        Ok(report) => {
                            summary.extracted_nodes += report.extracted_nodes();
                            summary.removed_paths += report.removed.len();
                            summary.warnings.extend(report.warnings);
                        }
                        Err(e) => {
                            warn!(entity = %basename, error = %e, "Skipping entity extraction");
                            summary.warnings.push(e.to_string());
                        }
                    }
                }
            }
        } else {
            summary.entities = flow_set.tabs.len() + flow_set.subflows.len();
        }

        let updated = self.manager.write_tree(&flow_set, &config, &self.project_root)?;

        for kind in CATEGORIES {
            let live: HashSet<String> = planned[&kind].iter().cloned().collect();
            match reconciler.remove_orphan_dirs(&dest.join(kind.dir_name()), &live) {
                Ok(removed) => summary.removed_paths += removed.len(),
                Err(e) => {
                    warn!(category = kind.dir_name(), error = %e, "Orphan directory cleanup failed");
                    summary.warnings.push(e.to_string());
                }
            }
        }

        self.store_config(updated);
        info!(
            entities = summary.entities,
            extracted = summary.extracted_nodes,
            removed = summary.removed_paths,
            warnings = summary.warnings.len(),
            "Split pass complete"
        );
        Ok(summary)
    }

    /// Rebuild the monolithic document from the tree and hand it to the host
    pub fn reload(&self) -> Result<PassSummary, ApiError> {
        let _guard = self.pass_lock.lock();
        let config = self.config();
        let dest = config.destination_dir(&self.project_root);
        let mut summary = PassSummary::new(PassMode::Rebuild);

        let mut flow_set = self.manager.read_tree(&config, &self.project_root)?;

        if config.extract_functions_templates {
            let engine = RestorationEngine::new(self.files.as_ref());
            for kind in CATEGORIES {
                let basenames = self.manager.planned_basenames(&flow_set, kind);
                let category_dir = dest.join(kind.dir_name());
                for (entity, planned) in flow_set.entities_mut(kind).iter_mut().zip(basenames) {
                    let stem = entity.file_stem.clone().unwrap_or(planned);
                    let report = engine.restore(&mut entity.nodes, &stem, &category_dir);
                    summary.restored_fields += report.changed_fields;
                    summary.warnings.extend(
                        report
                            .missing_nodes
                            .iter()
                            .map(|id| format!("{}: manifest references missing node {}", stem, id)),
                    );
                }
            }
        }
        summary.entities = flow_set.tabs.len() + flow_set.subflows.len();

        let monolith: MonolithDocument = self.manager.build_monolith(&flow_set)?;
        summary.nodes = monolith.len();
        self.host.load_flows(&monolith)?;

        info!(
            entities = summary.entities,
            nodes = summary.nodes,
            restored = summary.restored_fields,
            "Rebuild pass complete"
        );
        Ok(summary)
    }

    /// Extraction state of every entity in the tree
    pub fn status(&self) -> Result<Vec<EntityStatus>, ApiError> {
        let _guard = self.pass_lock.lock();
        let config = self.config();
        let dest = config.destination_dir(&self.project_root);
        let flow_set = self.manager.read_tree(&config, &self.project_root)?;
        let store = ManifestStore::new(self.files.as_ref());

        let mut rows = Vec::new();
        for kind in CATEGORIES {
            let basenames = self.manager.planned_basenames(&flow_set, kind);
            for (entity, planned) in flow_set.entities(kind).iter().zip(basenames) {
                let stem = entity.file_stem.clone().unwrap_or(planned);
                let directory = dest.join(kind.dir_name()).join(&stem);
                let (extracted, manifest_error) = match store.read(&directory) {
                    Ok(manifest) => (manifest.map(|m| m.len()), false),
                    Err(_) => (None, true),
                };
                rows.push(EntityStatus {
                    kind: kind.to_string(),
                    id: entity.id().map(str::to_string),
                    file_stem: stem,
                    directory,
                    nodes: entity.nodes.len(),
                    extracted,
                    manifest_error,
                });
            }
        }
        Ok(rows)
    }

    fn store_config(&self, updated: SplitterConfig) {
        let changed = *self.config.read() != updated;
        if changed && self.persist_config {
            if let Err(e) = ConfigLoader::save_to(&self.config_path, &updated) {
                warn!(path = %self.config_path.display(), error = %e, "Failed to persist config");
            }
        }
        *self.config.write() = updated;
    }
}
