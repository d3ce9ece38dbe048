// src/models/mod.rs
pub mod game;
pub mod list;
pub mod profile;
pub mod response;
pub mod tier_list;

pub use game::{FranchiseSummary, GameDetails, GameSummary, Genre};
pub use list::{GameList, ListAccess, ListItem, ListShare, ShareRole};
pub use profile::Profile;
pub use response::{ApiResponse, PaginatedResponse};
pub use tier_list::{TierList, TierListColumn, TierListItem};
