// Reconciliation workflow: formatting, chain discovery, orchestration.

pub mod format;
pub mod orchestrator;
pub mod parents;

// Re-export main types
pub use format::{ManualFields, RecordFormatter};
pub use orchestrator::Reconciler;
pub use parents::ParentChainBuilder;
