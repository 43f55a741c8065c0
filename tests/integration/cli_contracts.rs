use crate::support::sample_flows;
use flow_splitter::config::{ConfigLoader, CONFIG_FILE};
use flow_splitter::flow::FileFormat;
use flow_splitter::tooling::cli::{CliContext, Commands};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_sample(root: &std::path::Path) {
    fs::write(
        root.join("flows.json"),
        serde_json::to_string(&sample_flows()).unwrap(),
    )
    .unwrap();
}

#[test]
fn status_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    write_sample(temp.path());
    let cli = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    cli.execute(&Commands::Split {
        flows: PathBuf::from("flows.json"),
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Status {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert!(row.get("kind").and_then(|v| v.as_str()).is_some());
        assert!(row.get("file_stem").and_then(|v| v.as_str()).is_some());
        assert!(row.get("directory").and_then(|v| v.as_str()).is_some());
        assert!(row.get("nodes").and_then(|v| v.as_u64()).is_some());
        assert!(row.get("manifest_error").and_then(|v| v.as_bool()).is_some());
    }
}

#[test]
fn split_persists_tab_order_in_project_config() {
    let temp = TempDir::new().unwrap();
    write_sample(temp.path());
    let cli = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    cli.execute(&Commands::Split {
        flows: PathBuf::from("flows.json"),
    })
    .unwrap();

    assert!(temp.path().join(CONFIG_FILE).exists());
    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.tabs_order, vec!["t1", "t2"]);
}

#[test]
fn json_file_format_from_config_file() {
    let temp = TempDir::new().unwrap();
    write_sample(temp.path());
    fs::write(
        temp.path().join(CONFIG_FILE),
        r#"{"fileFormat": "json", "destinationFolder": "flows-src"}"#,
    )
    .unwrap();
    let cli = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    assert_eq!(cli.config().file_format, FileFormat::Json);

    cli.execute(&Commands::Split {
        flows: PathBuf::from("flows.json"),
    })
    .unwrap();
    assert!(temp.path().join("flows-src/tabs/Dashboard.json").exists());
    assert!(temp.path().join("flows-src/config-nodes.json").exists());
    assert!(temp.path().join("flows-src/tabs/Dashboard/Process_Data.js").exists());
}

#[test]
fn rebuild_without_tree_reports_error() {
    let temp = TempDir::new().unwrap();
    let cli = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let err = cli
        .execute(&Commands::Rebuild {
            flows: PathBuf::from("flows.json"),
        })
        .unwrap_err();
    assert!(err.to_string().contains("no split tree"));
    assert!(!temp.path().join("flows.json").exists());
}
