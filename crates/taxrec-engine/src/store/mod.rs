// Store access: rank reference data, identity resolution, insertion.
//
// Reads run outside transactions; the insertion engine owns the single
// transaction of a reconciliation.

pub mod identity;
pub mod insert;
pub mod rank;

// Re-export main types
pub use identity::{IdentityResolver, NAME_SIMILARITY_THRESHOLD};
pub use insert::{AcceptedTaxon, InsertionEngine};
pub use rank::{RankInfo, RankTable, RANK_LEVEL_SPECIES};
