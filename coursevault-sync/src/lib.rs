//! # coursevault-sync
//!
//! Reconciling sync engine: mirrors remote course items into the vault
//! without ever overwriting local edits.
//!
//! Call [`run_configured`] or [`run_sync`] for a full run over the selected courses, or
//! [`sync_kind`] to sync one kind of one course. [`scan`] and
//! [`diff_artifact`] inspect the vault without writing to it.

pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod lock;
pub mod orchestrator;
pub mod paths;
pub mod reconcile;
pub mod scan;
pub mod sources;
pub mod state_store;
pub mod synchronizer;
pub mod tasks;
pub mod writer;

pub use diff::{diff_artifact, ArtifactDiff};
pub use error::SyncError;
pub use fingerprint::fingerprint;
pub use lock::VaultLock;
pub use orchestrator::{load_last_report, run_configured, run_sync};
pub use reconcile::{decide, Verdict};
pub use scan::{scan, ArtifactState, ArtifactStatus, VaultScan};
pub use state_store::{forget, SyncStateStore};
pub use synchronizer::{sync_item, sync_items, sync_kind, KindOutcome, SyncContext};
pub use tasks::{merge_tasks, TaskEntry};
