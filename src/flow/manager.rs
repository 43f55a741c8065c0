//! Flow-set manager: converts between the monolithic document and the tree
//! of per-entity files.

use super::codec::{self, ConfigNodesDocument, EntityDocument, FileFormat};
use super::{EntityKind, EntityRecord, FlowSet, MonolithDocument};
use crate::config::SplitterConfig;
use crate::error::{ApiError, StorageError};
use crate::extract::files::FileAccess;
use crate::extract::naming::NameAllocator;
use crate::types::NodeRecord;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Basename of the config-node file, without extension
pub const CONFIG_NODES_STEM: &str = "config-nodes";

/// Builds and persists the decomposed flow tree
pub trait FlowSetManager: Send + Sync {
    fn build_tree(&self, monolith: &[NodeRecord]) -> Result<FlowSet, ApiError>;
    fn build_monolith(&self, flow_set: &FlowSet) -> Result<MonolithDocument, ApiError>;
    /// Writes every entity file and returns the config with `tabs_order` updated
    fn write_tree(
        &self,
        flow_set: &FlowSet,
        config: &SplitterConfig,
        project_root: &Path,
    ) -> Result<SplitterConfig, ApiError>;
    fn read_tree(&self, config: &SplitterConfig, project_root: &Path) -> Result<FlowSet, ApiError>;
    /// Basenames entities of `kind` will be written under, aligned with `flow_set.entities(kind)`
    fn planned_basenames(&self, flow_set: &FlowSet, kind: EntityKind) -> Vec<String>;
}

/// An entity file found on disk
#[derive(Debug, Clone)]
pub struct EntityFile {
    pub path: PathBuf,
    pub stem: String,
    pub entity_id: Option<String>,
}

/// List entity files in a category directory and read their entity ids.
///
/// Files that fail to decode are reported with no id.
pub fn scan_entity_files(
    files: &dyn FileAccess,
    category_dir: &Path,
) -> Result<Vec<EntityFile>, StorageError> {
    let mut found = Vec::new();
    for entry in files.list_dir(category_dir)? {
        if entry.is_dir {
            continue;
        }
        let Some(format) = FileFormat::from_path(&entry.path) else {
            continue;
        };
        let Some(stem) = entry
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
        else {
            continue;
        };
        let entity_id = match files.read_to_string(&entry.path) {
            Ok(text) => match codec::decode::<EntityDocument>(format, &text) {
                Ok(doc) => doc.entity.id().map(str::to_string),
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "Unreadable entity file");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read entity file");
                None
            }
        };
        found.push(EntityFile {
            path: entry.path,
            stem,
            entity_id,
        });
    }
    Ok(found)
}

/// [`FlowSetManager`] storing one file per tab and subflow under the destination folder
pub struct FileTreeManager {
    files: Arc<dyn FileAccess>,
}

impl FileTreeManager {
    pub fn new(files: Arc<dyn FileAccess>) -> Self {
        Self { files }
    }

    fn write_document<T: serde::Serialize>(
        &self,
        path: &Path,
        format: FileFormat,
        value: &T,
    ) -> Result<(), ApiError> {
        let text = codec::encode(format, value).map_err(|message| ApiError::Codec {
            path: path.to_path_buf(),
            message,
        })?;
        self.files.write(path, &text)?;
        debug!(path = %path.display(), "Wrote entity file");
        Ok(())
    }

    fn read_document<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<T, ApiError> {
        let format = FileFormat::from_path(path).ok_or_else(|| ApiError::Codec {
            path: path.to_path_buf(),
            message: "unknown file extension".to_string(),
        })?;
        let text = self.files.read_to_string(path)?;
        codec::decode(format, &text).map_err(|message| ApiError::Codec {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Remove files of a known format in `dir` that were not written this pass
    fn remove_stale_files(&self, dir: &Path, keep: &HashSet<PathBuf>) -> Result<(), ApiError> {
        for entry in self.files.list_dir(dir)? {
            if entry.is_dir || keep.contains(&entry.path) {
                continue;
            }
            if FileFormat::from_path(&entry.path).is_none() {
                continue;
            }
            match self.files.remove_file(&entry.path) {
                Ok(()) => debug!(path = %entry.path.display(), "Removed stale entity file"),
                Err(e) => warn!(error = %e, "Failed to remove stale entity file"),
            }
        }
        Ok(())
    }

    fn read_category(&self, dir: &Path, kind: EntityKind) -> Result<Vec<EntityRecord>, ApiError> {
        let mut entities = Vec::new();
        for entry in self.files.list_dir(dir)? {
            if entry.is_dir || FileFormat::from_path(&entry.path).is_none() {
                continue;
            }
            let doc: EntityDocument = self.read_document(&entry.path)?;
            let mut entity = EntityRecord::new(kind, doc.entity);
            entity.nodes = doc.nodes;
            entity.file_stem = entry
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string);
            entities.push(entity);
        }
        Ok(entities)
    }
}

impl FlowSetManager for FileTreeManager {
    fn build_tree(&self, monolith: &[NodeRecord]) -> Result<FlowSet, ApiError> {
        let mut flow_set = FlowSet::default();
        let mut owners: HashMap<String, (EntityKind, usize)> = HashMap::new();

        for node in monolith {
            let Some(kind) = EntityKind::of(node) else {
                continue;
            };
            let id = node.id().ok_or_else(|| {
                ApiError::Collaborator(format!("{} definition without an id", kind))
            })?;
            if owners.contains_key(id) {
                return Err(ApiError::Collaborator(format!(
                    "duplicate {} id {}",
                    kind, id
                )));
            }
            let entities = flow_set.entities_mut(kind);
            owners.insert(id.to_string(), (kind, entities.len()));
            entities.push(EntityRecord::new(kind, node.clone()));
        }

        for node in monolith {
            if EntityKind::of(node).is_some() {
                continue;
            }
            match node.z().and_then(|z| owners.get(z)) {
                Some(&(kind, index)) => flow_set.entities_mut(kind)[index].nodes.push(node.clone()),
                // Unowned nodes, including ones whose owner is gone, stay with the config nodes.
                None => flow_set.config_nodes.push(node.clone()),
            }
        }

        Ok(flow_set)
    }

    fn build_monolith(&self, flow_set: &FlowSet) -> Result<MonolithDocument, ApiError> {
        let mut monolith = Vec::with_capacity(flow_set.node_count());
        monolith.extend(flow_set.tabs.iter().map(|t| t.header.clone()));
        for subflow in &flow_set.subflows {
            monolith.push(subflow.header.clone());
            monolith.extend(subflow.nodes.iter().cloned());
        }
        monolith.extend(flow_set.config_nodes.iter().cloned());
        for tab in &flow_set.tabs {
            monolith.extend(tab.nodes.iter().cloned());
        }
        Ok(monolith)
    }

    fn write_tree(
        &self,
        flow_set: &FlowSet,
        config: &SplitterConfig,
        project_root: &Path,
    ) -> Result<SplitterConfig, ApiError> {
        let dest = config.destination_dir(project_root);
        let format = config.file_format;

        for kind in [EntityKind::Tab, EntityKind::Subflow] {
            let dir = dest.join(kind.dir_name());
            self.files.create_dir_all(&dir)?;
            let basenames = self.planned_basenames(flow_set, kind);
            let mut written = HashSet::new();
            for (entity, basename) in flow_set.entities(kind).iter().zip(basenames) {
                let path = dir.join(format!("{}.{}", basename, format.extension()));
                let doc = EntityDocument {
                    entity: entity.header.clone(),
                    nodes: entity.nodes.clone(),
                };
                self.write_document(&path, format, &doc)?;
                written.insert(path);
            }
            self.remove_stale_files(&dir, &written)?;
        }

        let config_path = dest.join(format!("{}.{}", CONFIG_NODES_STEM, format.extension()));
        let doc = ConfigNodesDocument {
            nodes: flow_set.config_nodes.clone(),
        };
        self.write_document(&config_path, format, &doc)?;
        for other in [FileFormat::Yaml, FileFormat::Json] {
            let stale = dest.join(format!("{}.{}", CONFIG_NODES_STEM, other.extension()));
            if other != format && self.files.exists(&stale) {
                if let Err(e) = self.files.remove_file(&stale) {
                    warn!(error = %e, "Failed to remove stale config-node file");
                }
            }
        }

        let mut updated = config.clone();
        updated.tabs_order = flow_set
            .tabs
            .iter()
            .filter_map(|t| t.id().map(str::to_string))
            .collect();
        Ok(updated)
    }

    fn read_tree(&self, config: &SplitterConfig, project_root: &Path) -> Result<FlowSet, ApiError> {
        let dest = config.destination_dir(project_root);
        if !self.files.is_dir(&dest) {
            return Err(ApiError::Collaborator(format!(
                "no split tree found at {}",
                dest.display()
            )));
        }

        let mut tabs = self.read_category(&dest.join(EntityKind::Tab.dir_name()), EntityKind::Tab)?;
        let order: HashMap<&str, usize> = config
            .tabs_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        // Stable: tabs missing from the order keep file-name order at the end.
        tabs.sort_by_key(|t| t.id().and_then(|id| order.get(id).copied()).unwrap_or(usize::MAX));

        let subflows =
            self.read_category(&dest.join(EntityKind::Subflow.dir_name()), EntityKind::Subflow)?;

        let mut config_nodes = Vec::new();
        let preferred = config.file_format;
        let fallback = match preferred {
            FileFormat::Yaml => FileFormat::Json,
            FileFormat::Json => FileFormat::Yaml,
        };
        for format in [preferred, fallback] {
            let path = dest.join(format!("{}.{}", CONFIG_NODES_STEM, format.extension()));
            if self.files.exists(&path) {
                let doc: ConfigNodesDocument = self.read_document(&path)?;
                config_nodes = doc.nodes;
                break;
            }
        }

        Ok(FlowSet {
            tabs,
            subflows,
            config_nodes,
        })
    }

    fn planned_basenames(&self, flow_set: &FlowSet, kind: EntityKind) -> Vec<String> {
        let mut names = NameAllocator::new();
        flow_set
            .entities(kind)
            .iter()
            .map(|e| names.allocate(e.label()).file_name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::files::LocalFileAccess;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn nodes(values: Vec<Value>) -> Vec<NodeRecord> {
        values
            .into_iter()
            .map(|v| NodeRecord::from_value(v).unwrap())
            .collect()
    }

    fn sample_monolith() -> Vec<NodeRecord> {
        nodes(vec![
            json!({"id": "t1", "type": "tab", "label": "Dashboard"}),
            json!({"id": "t2", "type": "tab", "label": "Alerts"}),
            json!({"id": "s1", "type": "subflow", "name": "Retry"}),
            json!({"id": "n1", "type": "function", "z": "t1", "func": "return msg;"}),
            json!({"id": "n2", "type": "debug", "z": "t2"}),
            json!({"id": "n3", "type": "delay", "z": "s1"}),
            json!({"id": "c1", "type": "mqtt-broker", "broker": "localhost"}),
            json!({"id": "n4", "type": "inject", "z": "gone"}),
        ])
    }

    fn manager() -> FileTreeManager {
        FileTreeManager::new(Arc::new(LocalFileAccess))
    }

    #[test]
    fn test_build_tree_assigns_owners() {
        let flow_set = manager().build_tree(&sample_monolith()).unwrap();
        assert_eq!(flow_set.tabs.len(), 2);
        assert_eq!(flow_set.tabs[0].label(), Some("Dashboard"));
        assert_eq!(flow_set.tabs[0].nodes[0].id(), Some("n1"));
        assert_eq!(flow_set.subflows[0].label(), Some("Retry"));
        assert_eq!(flow_set.subflows[0].nodes[0].id(), Some("n3"));
        let config_ids: Vec<_> = flow_set.config_nodes.iter().filter_map(|n| n.id()).collect();
        assert_eq!(config_ids, vec!["c1", "n4"]);
    }

    #[test]
    fn test_duplicate_entity_id_is_error() {
        let monolith = nodes(vec![
            json!({"id": "t1", "type": "tab", "label": "A"}),
            json!({"id": "t1", "type": "tab", "label": "B"}),
        ]);
        assert!(matches!(
            manager().build_tree(&monolith),
            Err(ApiError::Collaborator(_))
        ));
    }

    #[test]
    fn test_monolith_keeps_every_node() {
        let monolith = sample_monolith();
        let m = manager();
        let rebuilt = m.build_monolith(&m.build_tree(&monolith).unwrap()).unwrap();
        assert_eq!(rebuilt.len(), monolith.len());
        for node in &monolith {
            assert!(rebuilt.contains(node));
        }
    }

    #[test]
    fn test_write_then_read_tree() {
        let temp = TempDir::new().unwrap();
        let m = manager();
        let config = SplitterConfig::default();
        let flow_set = m.build_tree(&sample_monolith()).unwrap();

        let updated = m.write_tree(&flow_set, &config, temp.path()).unwrap();
        assert_eq!(updated.tabs_order, vec!["t1", "t2"]);
        assert!(temp.path().join("src/tabs/Dashboard.yaml").exists());
        assert!(temp.path().join("src/subflows/Retry.yaml").exists());
        assert!(temp.path().join("src/config-nodes.yaml").exists());

        let read = m.read_tree(&updated, temp.path()).unwrap();
        let labels: Vec<_> = read.tabs.iter().filter_map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Dashboard", "Alerts"]);
        assert_eq!(read.tabs[0].file_stem.as_deref(), Some("Dashboard"));
        assert_eq!(read.tabs[0].nodes, flow_set.tabs[0].nodes);
        assert_eq!(read.config_nodes, flow_set.config_nodes);
    }

    #[test]
    fn test_write_tree_removes_deleted_entities() {
        let temp = TempDir::new().unwrap();
        let m = manager();
        let config = SplitterConfig::default();
        let mut flow_set = m.build_tree(&sample_monolith()).unwrap();
        m.write_tree(&flow_set, &config, temp.path()).unwrap();

        flow_set.tabs.remove(1);
        m.write_tree(&flow_set, &config, temp.path()).unwrap();
        assert!(temp.path().join("src/tabs/Dashboard.yaml").exists());
        assert!(!temp.path().join("src/tabs/Alerts.yaml").exists());
    }

    #[test]
    fn test_same_labels_get_distinct_files() {
        let m = manager();
        let flow_set = m
            .build_tree(&nodes(vec![
                json!({"id": "t1", "type": "tab", "label": "Flow"}),
                json!({"id": "t2", "type": "tab", "label": "Flow"}),
            ]))
            .unwrap();
        assert_eq!(
            m.planned_basenames(&flow_set, EntityKind::Tab),
            vec!["Flow", "Flow(2)"]
        );
    }

    #[test]
    fn test_read_tree_without_destination_fails() {
        let temp = TempDir::new().unwrap();
        let result = manager().read_tree(&SplitterConfig::default(), temp.path());
        assert!(matches!(result, Err(ApiError::Collaborator(_))));
    }

    #[test]
    fn test_scan_entity_files_reads_ids() {
        let temp = TempDir::new().unwrap();
        let m = manager();
        let flow_set = m.build_tree(&sample_monolith()).unwrap();
        m.write_tree(&flow_set, &SplitterConfig::default(), temp.path())
            .unwrap();
        std::fs::write(temp.path().join("src/tabs/broken.yaml"), "[unclosed").unwrap();

        let found = scan_entity_files(&LocalFileAccess, &temp.path().join("src/tabs")).unwrap();
        let ids: Vec<_> = found
            .iter()
            .map(|f| (f.stem.as_str(), f.entity_id.as_deref()))
            .collect();
        assert_eq!(
            ids,
            vec![("Alerts", Some("t2")), ("Dashboard", Some("t1")), ("broken", None)]
        );
    }
}
