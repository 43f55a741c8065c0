use crate::support::{by_id, records, sample_flows, service, RecordingHost};
use flow_splitter::extract::{ManifestStore, LocalFileAccess};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn split_then_rebuild_reproduces_every_node() {
    let temp = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::default());
    let sync = service(temp.path(), host.clone());
    let flows = sample_flows();

    sync.on_flows_started(&flows).unwrap();
    sync.on_flows_started(&[]).unwrap();

    let rebuilt = host.last();
    assert_eq!(rebuilt.len(), flows.len());
    assert_eq!(by_id(&rebuilt), by_id(&flows));
}

#[test]
fn split_lays_out_tree_and_side_files() {
    let temp = TempDir::new().unwrap();
    let sync = service(temp.path(), Arc::new(RecordingHost::default()));
    sync.split(&sample_flows()).unwrap();

    let src = temp.path().join("src");
    for path in [
        "tabs/Dashboard.yaml",
        "tabs/Ops.yaml",
        "subflows/Retry_Logic.yaml",
        "config-nodes.yaml",
        "tabs/Dashboard/Process_Data.js",
        "tabs/Dashboard/Process_Data(2).js",
        "tabs/Dashboard/Process_Data(2).initialize.js",
        "tabs/Dashboard/Process_Data(2).finalize.js",
        "tabs/Ops/Status_Card.vue",
        "tabs/Ops/Status_Card.info.md",
        "subflows/Retry_Logic/Backoff.js",
    ] {
        assert!(src.join(path).exists(), "missing {}", path);
    }
    assert!(!src.join("tabs/Ops/Tick.js").exists());
    assert!(!src.join("tabs/Dashboard/Process_Data.initialize.js").exists());

    let manifest = ManifestStore::new(&LocalFileAccess)
        .read(&src.join("tabs/Dashboard"))
        .unwrap()
        .unwrap();
    assert_eq!(manifest.len(), 2);
}

#[test]
fn edits_in_side_files_reach_the_host() {
    let temp = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::default());
    let sync = service(temp.path(), host.clone());
    sync.split(&sample_flows()).unwrap();

    let src = temp.path().join("src");
    fs::write(src.join("tabs/Dashboard/Process_Data.js"), "return msg2;").unwrap();
    fs::write(src.join("tabs/Ops/Status_Card.vue"), "<template>new</template>").unwrap();
    fs::remove_file(src.join("tabs/Dashboard/Process_Data(2).finalize.js")).unwrap();

    let summary = sync.reload().unwrap();
    assert_eq!(summary.restored_fields, 3);

    let rebuilt = by_id(&host.last());
    assert_eq!(rebuilt["n1"].str_field("func"), Some("return msg2;"));
    assert_eq!(rebuilt["u1"].str_field("format"), Some("<template>new</template>"));
    assert_eq!(rebuilt["u1"].str_field("template"), Some("<template>new</template>"));
    assert_eq!(rebuilt["n2"].str_field("finalize"), Some("context.set('x', null);"));
}

#[test]
fn renamed_tab_and_node_leave_no_stale_files() {
    let temp = TempDir::new().unwrap();
    let sync = service(temp.path(), Arc::new(RecordingHost::default()));
    sync.split(&sample_flows()).unwrap();

    let mut renamed = sample_flows();
    for node in renamed.iter_mut() {
        match node.id() {
            Some("t1") => {
                node.set_str("label", "Main Board");
            }
            Some("n1") => {
                node.set_str("name", "Transform");
            }
            _ => {}
        }
    }
    sync.split(&renamed).unwrap();

    let tabs = temp.path().join("src/tabs");
    assert!(!tabs.join("Dashboard.yaml").exists());
    assert!(!tabs.join("Dashboard").exists());
    assert!(tabs.join("Main_Board.yaml").exists());
    assert!(tabs.join("Main_Board/Transform.js").exists());
    assert!(tabs.join("Main_Board/Process_Data.js").exists());
    assert!(!tabs.join("Main_Board/Process_Data(2).js").exists());
}

#[test]
fn removed_nodes_are_garbage_collected() {
    let temp = TempDir::new().unwrap();
    let sync = service(temp.path(), Arc::new(RecordingHost::default()));
    sync.split(&sample_flows()).unwrap();

    let trimmed: Vec<_> = sample_flows()
        .into_iter()
        .filter(|n| n.id() != Some("n2") && n.id() != Some("s1") && n.id() != Some("r1"))
        .collect();
    sync.split(&trimmed).unwrap();

    let src = temp.path().join("src");
    assert!(src.join("tabs/Dashboard/Process_Data.js").exists());
    assert!(!src.join("tabs/Dashboard/Process_Data(2).js").exists());
    assert!(!src.join("tabs/Dashboard/Process_Data(2).initialize.js").exists());
    assert!(!src.join("subflows/Retry_Logic").exists());
    assert!(!src.join("subflows/Retry_Logic.yaml").exists());
}

#[test]
fn tab_order_survives_rebuild() {
    let temp = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::default());
    let sync = service(temp.path(), host.clone());
    let flows = records(vec![
        json!({"id": "tz", "type": "tab", "label": "Zulu"}),
        json!({"id": "ta", "type": "tab", "label": "Alpha"}),
    ]);
    sync.split(&flows).unwrap();
    sync.reload().unwrap();

    let ids: Vec<_> = host
        .last()
        .iter()
        .filter_map(|n| n.id().map(str::to_string))
        .collect();
    assert_eq!(ids, vec!["tz", "ta"]);
}

#[test]
fn concurrent_passes_are_serialized() {
    let temp = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::default());
    let sync = Arc::new(service(temp.path(), host.clone()));
    sync.split(&sample_flows()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sync = sync.clone();
            thread::spawn(move || {
                if i % 2 == 0 {
                    sync.split(&sample_flows()).map(|_| ())
                } else {
                    sync.reload().map(|_| ())
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let rebuilt = host.last();
    assert_eq!(by_id(&rebuilt), by_id(&sample_flows()));
}
