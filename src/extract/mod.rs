//! Code Extraction
//!
//! Moves embedded code fields (function bodies, lifecycle scripts, template
//! markup, documentation) between node records and per-node side files.
//! Each tab or subflow owns one extraction directory with a `.manifest.json`
//! that maps node ids to the files written for them.

pub mod classify;
pub mod engine;
pub mod files;
pub mod manifest;
pub mod naming;
pub mod reconcile;
pub mod restore;

pub use classify::{classify, NodeKind};
pub use engine::{ExtractionEngine, ExtractionReport};
pub use files::{FileAccess, LocalFileAccess};
pub use manifest::{Manifest, ManifestEntry, ManifestStore, MANIFEST_FILE};
pub use naming::{sanitize, NameAllocator};
pub use reconcile::OrphanReconciler;
pub use restore::{RestorationEngine, RestoreReport};
