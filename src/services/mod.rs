// All service modules
pub mod drafts;
pub mod recommendation;
pub mod search_cache;

// Re-export for convenience
pub use drafts::{Draft, DraftStore};
pub use recommendation::{Recommendation, Recommender};
pub use search_cache::SearchCache;
