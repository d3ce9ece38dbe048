/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Tier board
pub const DEFAULT_TIERS: &[(&str, &str)] = &[
    ("S", "red"),
    ("A", "orange"),
    ("B", "yellow"),
    ("C", "green"),
    ("D", "blue"),
];
pub const TIER_COLORS: &[&str] = &[
    "red", "orange", "yellow", "green", "teal", "blue", "purple", "pink", "gray",
];
pub const MAX_TIER_ROWS: usize = 12;
pub const MAX_BOARD_ITEMS: usize = 300;

// Recommendations
pub const RECOMMENDATION_LIMIT: usize = 5;
pub const FALLBACK_GENRE_COUNT: usize = 2;
pub const FALLBACK_GENRE_WEIGHT: f64 = 0.5;
pub const FALLBACK_FETCH_LIMIT: usize = 20;

// Lists
pub const MAX_LIST_ITEMS: i64 = 500;
pub const LIST_NAME_MAX_CHARS: usize = 80;
pub const LIST_DESCRIPTION_MAX_CHARS: usize = 500;

// Catalog (IGDB)
pub const IGDB_IMAGE_BASE_URL: &str = "https://images.igdb.com/igdb/image/upload";
pub const IGDB_COVER_SIZE: &str = "t_cover_big";
pub const RANDOM_PICK_MIN_RATINGS: u32 = 10;
pub const TOP_RATED_MIN_RATINGS: u32 = 20;
pub const TOKEN_REFRESH_MARGIN_SECS: u64 = 60;
pub const SEARCH_DEFAULT_LIMIT: u32 = 20;

// Redis key prefixes
pub const DRAFT_KEY_PREFIX: &str = "tierlist:draft";
pub const SEARCH_KEY_PREFIX: &str = "catalog:search";
