//! Application-level configuration constants.

// Remote API
pub const API_BASE_URL: &str = "https://pokeapi.co/api/v2";

// Catalog
pub const MAX_RECORDS: u32 = 151;
pub const PAGE_SIZE: usize = 20;

// Loader pacing
pub const INITIAL_BATCH_SIZE: u32 = 20;
pub const BATCH_SIZE: u32 = 10;
pub const BATCH_PACING_MS: u32 = 200;

// UI behavior
pub const DEBOUNCE_MS: u32 = 300;
pub const FAVORITES_KEY: &str = "pokemonFavorites";
pub const STAT_BAR_MAX: u32 = 150;
pub const TOP_TYPES_SHOWN: usize = 5;

/// Knobs for [`crate::loader::CatalogLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub max_id: u32,
    pub initial_batch: u32,
    pub batch_size: u32,
    pub pacing_ms: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_id: MAX_RECORDS,
            initial_batch: INITIAL_BATCH_SIZE,
            batch_size: BATCH_SIZE,
            pacing_ms: BATCH_PACING_MS,
        }
    }
}
