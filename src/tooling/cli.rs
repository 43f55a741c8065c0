//! CLI Tooling
//!
//! Command-line interface for split, rebuild, status and the reload server.
//! Every command runs against one project root.

use crate::config::{ConfigLoader, SplitterConfig};
use crate::error::ApiError;
use crate::extract::files::{FileAccess, LocalFileAccess};
use crate::flow::FileTreeManager;
use crate::logging::LoggingConfig;
use crate::server;
use crate::sync::host::read_flows_file;
use crate::sync::{EntityStatus, FlowsFileHost, SyncService};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Flow splitter - keep a flow document and its per-entity file tree in sync
#[derive(Parser)]
#[command(name = "flow-splitter")]
#[command(about = "Split a monolithic flow document into editable per-entity files and back")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a flows file into the entity tree and extract code
    Split {
        /// Monolithic flows file (JSON array of nodes)
        #[arg(long, default_value = "flows.json")]
        flows: PathBuf,
    },
    /// Rebuild the flows file from the entity tree and side files
    Rebuild {
        /// Flows file to write
        #[arg(long, default_value = "flows.json")]
        flows: PathBuf,
    },
    /// Show extraction state of every tab and subflow
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run a start-up pass, then serve the reload endpoint
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "1881")]
        port: u16,
        /// Flows file consumed on start and written on reload
        #[arg(long, default_value = "flows.json")]
        flows: PathBuf,
    },
}

/// Resolved project state shared by all commands
pub struct CliContext {
    root: PathBuf,
    config: SplitterConfig,
    config_path: Option<PathBuf>,
    /// Config logging section with CLI flags applied; never persisted
    logging: LoggingConfig,
}

impl CliContext {
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        let logging = config.logging.clone();
        Ok(Self {
            root,
            config,
            config_path,
            logging,
        })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Layer logging flags over the configured logging section
    pub fn apply_log_overrides(&mut self, cli: &Cli) {
        let logging = &mut self.logging;
        if let Some(level) = &cli.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            logging.output = output.clone();
        }
        if cli.log_file.is_some() {
            logging.file = cli.log_file.clone();
        }
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Split { flows } => {
                let flows = self.resolve(flows);
                let monolith = read_flows_file(&flows)?;
                if monolith.is_empty() {
                    return Err(ApiError::Host(format!(
                        "{} holds no flows to split",
                        flows.display()
                    )));
                }
                let summary = self.service(&flows).split(&monolith)?;
                Ok(render_summary(&summary.message(), &summary.warnings))
            }
            Commands::Rebuild { flows } => {
                let flows = self.resolve(flows);
                let summary = self.service(&flows).reload()?;
                Ok(render_summary(
                    &format!("{} -> {}", summary.message(), flows.display()),
                    &summary.warnings,
                ))
            }
            Commands::Status { format } => {
                let rows = self.service(&self.root.join("flows.json")).status()?;
                match format.as_str() {
                    "json" => serde_json::to_string_pretty(&rows).map_err(|e| {
                        ApiError::ConfigError(format!("Failed to serialize status: {}", e))
                    }),
                    "text" => Ok(format_status_text(&rows)),
                    other => Err(ApiError::ConfigError(format!(
                        "Invalid status format: {} (must be 'text' or 'json')",
                        other
                    ))),
                }
            }
            Commands::Serve { port, flows } => {
                let flows = self.resolve(flows);
                let service = Arc::new(self.service(&flows));
                let monolith = read_flows_file(&flows)?;
                let summary = service.on_flows_started(&monolith)?;
                info!(mode = ?summary.mode, "Start-up pass complete");

                let addr = SocketAddr::from(([127, 0, 0, 1], *port));
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| ApiError::Host(format!("Failed to start runtime: {}", e)))?;
                runtime
                    .block_on(server::serve(addr, service))
                    .map_err(|e| ApiError::Host(e.to_string()))?;
                Ok("Server stopped".to_string())
            }
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn service(&self, flows: &Path) -> SyncService {
        let files: Arc<dyn FileAccess> = Arc::new(LocalFileAccess);
        let service = SyncService::new(
            self.root.clone(),
            self.config.clone(),
            Arc::new(FileTreeManager::new(files.clone())),
            Arc::new(FlowsFileHost::new(flows)),
            files,
        );
        match &self.config_path {
            Some(path) => service.with_config_path(path.clone()),
            None => service,
        }
    }
}

fn render_summary(message: &str, warnings: &[String]) -> String {
    let mut out = message.to_string();
    for warning in warnings {
        out.push_str(&format!("\n  {} {}", "warning:".yellow(), warning));
    }
    out
}

/// Format a section heading with bold/underline
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format entity extraction state as a table
pub fn format_status_text(rows: &[EntityStatus]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Split tree"));
    if rows.is_empty() {
        out.push_str("  No tabs or subflows.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "File", "Nodes", "Extracted"]);
    for row in rows {
        let extracted = match (row.extracted, row.manifest_error) {
            (_, true) => "unreadable manifest".to_string(),
            (Some(n), false) => n.to_string(),
            (None, false) => "-".to_string(),
        };
        table.add_row(vec![
            row.kind.clone(),
            row.file_stem.clone(),
            row.nodes.to_string(),
            extracted,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_flows(path: &Path) {
        let flows = json!([
            {"id": "t1", "type": "tab", "label": "Dashboard"},
            {"id": "n1", "type": "function", "z": "t1", "name": "Process Data", "func": "return msg;"}
        ]);
        fs::write(path, serde_json::to_string(&flows).unwrap()).unwrap();
    }

    #[test]
    fn test_cli_parses_split() {
        let cli = Cli::try_parse_from(["flow-splitter", "--root", "/tmp/p", "split", "--flows", "f.json"])
            .unwrap();
        assert_eq!(cli.root, PathBuf::from("/tmp/p"));
        assert!(matches!(cli.command, Commands::Split { ref flows } if flows == Path::new("f.json")));
    }

    #[test]
    fn test_split_status_rebuild() {
        let temp = TempDir::new().unwrap();
        write_flows(&temp.path().join("flows.json"));
        let context = CliContext::new(temp.path().to_path_buf(), None).unwrap();

        let out = context
            .execute(&Commands::Split { flows: PathBuf::from("flows.json") })
            .unwrap();
        assert!(out.contains("extracted 1 nodes"));

        let status = context
            .execute(&Commands::Status { format: "json".to_string() })
            .unwrap();
        let rows: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(rows[0]["file_stem"], "Dashboard");
        assert_eq!(rows[0]["extracted"], 1);

        fs::write(temp.path().join("src/tabs/Dashboard/Process_Data.js"), "return 42;").unwrap();
        context
            .execute(&Commands::Rebuild { flows: PathBuf::from("out.json") })
            .unwrap();
        let rebuilt = read_flows_file(&temp.path().join("out.json")).unwrap();
        let n1 = rebuilt.iter().find(|n| n.id() == Some("n1")).unwrap();
        assert_eq!(n1.str_field("func"), Some("return 42;"));
    }

    #[test]
    fn test_split_updates_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        write_flows(&temp.path().join("flows.json"));
        let custom = temp.path().join("team.json");
        fs::write(&custom, r#"{"fileFormat": "json"}"#).unwrap();

        let context = CliContext::new(temp.path().to_path_buf(), Some(custom.clone())).unwrap();
        context
            .execute(&Commands::Split { flows: PathBuf::from("flows.json") })
            .unwrap();

        assert!(!temp.path().join(crate::config::CONFIG_FILE).exists());
        let saved = ConfigLoader::load_from_file(&custom).unwrap();
        assert_eq!(saved.tabs_order, vec!["t1"]);
        assert_eq!(saved.file_format, crate::flow::FileFormat::Json);
    }

    #[test]
    fn test_log_flags_are_not_persisted() {
        let temp = TempDir::new().unwrap();
        write_flows(&temp.path().join("flows.json"));
        let cli = Cli::try_parse_from(["flow-splitter", "--log-level", "debug", "split"]).unwrap();
        let mut context = CliContext::new(temp.path().to_path_buf(), None).unwrap();
        context.apply_log_overrides(&cli);
        assert_eq!(context.logging().level, "debug");

        context
            .execute(&Commands::Split { flows: PathBuf::from("flows.json") })
            .unwrap();
        let saved = ConfigLoader::load(temp.path()).unwrap();
        assert_eq!(saved.logging.level, "info");
    }

    #[test]
    fn test_split_of_empty_flows_fails() {
        let temp = TempDir::new().unwrap();
        let context = CliContext::new(temp.path().to_path_buf(), None).unwrap();
        assert!(context
            .execute(&Commands::Split { flows: PathBuf::from("missing.json") })
            .is_err());
    }

    #[test]
    fn test_status_text_table() {
        let rows = vec![EntityStatus {
            kind: "tab".to_string(),
            id: Some("t1".to_string()),
            file_stem: "Dashboard".to_string(),
            directory: PathBuf::from("src/tabs/Dashboard"),
            nodes: 3,
            extracted: Some(2),
            manifest_error: false,
        }];
        let text = format_status_text(&rows);
        assert!(text.contains("Dashboard"));
        assert!(text.contains("Extracted"));
    }
}
