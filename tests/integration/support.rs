use flow_splitter::config::SplitterConfig;
use flow_splitter::error::ApiError;
use flow_splitter::extract::{FileAccess, LocalFileAccess};
use flow_splitter::flow::{FileTreeManager, MonolithDocument};
use flow_splitter::sync::{HostRuntime, SyncService};
use flow_splitter::types::NodeRecord;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Default)]
pub struct RecordingHost {
    pub loaded: Mutex<Vec<MonolithDocument>>,
}

impl HostRuntime for RecordingHost {
    fn load_flows(&self, flows: &MonolithDocument) -> Result<(), ApiError> {
        self.loaded.lock().push(flows.clone());
        Ok(())
    }
}

impl RecordingHost {
    pub fn last(&self) -> MonolithDocument {
        self.loaded.lock().last().cloned().unwrap()
    }
}

pub fn service(root: &Path, host: Arc<RecordingHost>) -> SyncService {
    let files: Arc<dyn FileAccess> = Arc::new(LocalFileAccess);
    SyncService::new(
        root.to_path_buf(),
        SplitterConfig::default(),
        Arc::new(FileTreeManager::new(files.clone())),
        host,
        files,
    )
}

pub fn records(values: Vec<Value>) -> Vec<NodeRecord> {
    values
        .into_iter()
        .map(|v| NodeRecord::from_value(v).unwrap())
        .collect()
}

/// Two tabs, one subflow, one config node
pub fn sample_flows() -> Vec<NodeRecord> {
    records(vec![
        json!({"id": "t1", "type": "tab", "label": "Dashboard", "disabled": false, "info": ""}),
        json!({"id": "t2", "type": "tab", "label": "Ops"}),
        json!({"id": "s1", "type": "subflow", "name": "Retry Logic", "in": [], "out": []}),
        json!({
            "id": "n1", "type": "function", "z": "t1", "name": "Process Data",
            "func": "return msg;", "outputs": 1, "wires": [["n2"]]
        }),
        json!({
            "id": "n2", "type": "function", "z": "t1", "name": "Process Data",
            "func": "msg.payload = 2;\nreturn msg;", "initialize": "// setup\n",
            "finalize": "context.set('x', null);", "wires": [[]]
        }),
        json!({
            "id": "u1", "type": "ui-template", "z": "t2", "name": "Status Card",
            "format": "<template>\n  <div>{{ msg.payload }}</div>\n</template>\n",
            "template": "<template>\n  <div>{{ msg.payload }}</div>\n</template>\n",
            "info": "Shows the latest payload."
        }),
        json!({"id": "i1", "type": "inject", "z": "t2", "name": "Tick", "repeat": "5"}),
        json!({"id": "r1", "type": "function", "z": "s1", "name": "Backoff", "func": "return [msg, null];"}),
        json!({"id": "c1", "type": "mqtt-broker", "broker": "localhost"}),
    ])
}

pub fn by_id(nodes: &[NodeRecord]) -> BTreeMap<String, NodeRecord> {
    nodes
        .iter()
        .map(|n| (n.id().unwrap().to_string(), n.clone()))
        .collect()
}
