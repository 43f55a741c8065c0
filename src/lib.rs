//! Flow Splitter: Bidirectional Flow Document Sync
//!
//! Keeps a monolithic flow document and a tree of per-tab, per-subflow files
//! in sync, moving embedded code (function bodies, lifecycle scripts, template
//! markup, documentation) into editable side files and back.

pub mod config;
pub mod error;
pub mod extract;
pub mod flow;
pub mod logging;
pub mod server;
pub mod sync;
pub mod tooling;
pub mod types;
