//! Global Constants
//!
//! Centralized constants for generation policy and tuning.
//! All magic numbers should be defined here with documentation.

/// Sampling temperatures per call purpose
pub mod temperature {
    /// Research and verification calls whose output is parsed as data
    pub const RESEARCH: f32 = 0.3;

    /// Category and tag extraction
    pub const CATEGORIZATION: f32 = 0.5;

    /// Article prose and edit suggestions
    pub const PROSE: f32 = 0.7;

    /// Subtopic ideation
    pub const IDEATION: f32 = 0.8;
}

/// Retrieval provider sampling parameters
pub mod retrieval {
    pub const TOP_P: f32 = 0.9;

    pub const FREQUENCY_PENALTY: f32 = 1.0;

    /// Search recency window
    pub const RECENCY_FILTER: &str = "month";
}

/// Verification gate constants
pub mod gates {
    /// Title share of the duplicate similarity score (percent)
    pub const TITLE_SIMILARITY_WEIGHT: u8 = 40;

    /// Content share of the duplicate similarity score (percent)
    pub const CONTENT_SIMILARITY_WEIGHT: u8 = 60;

    /// Similar articles reported by the duplicate gate
    pub const MAX_SIMILAR_ARTICLES: usize = 5;

    /// Existing articles per duplicate-gate call; longer lists are split
    pub const MAX_DUPLICATE_CANDIDATES: usize = 100;

    /// Characters of each existing article included in a duplicate prompt
    pub const DUPLICATE_EXCERPT_CHARS: usize = 400;

    /// Core fact share of the verification score (percent)
    pub const CORE_FACT_WEIGHT: u8 = 70;

    /// Supporting detail share of the verification score (percent)
    pub const SUPPORTING_DETAIL_WEIGHT: u8 = 30;

    /// Verification score that must be exceeded to pass
    pub const VERIFICATION_THRESHOLD: u8 = 70;
}

/// Article assembly constants
pub mod article {
    /// Fallback title when the model emits none
    pub const UNTITLED: &str = "Untitled Article";

    /// Change note recorded on the initial version
    pub const GENERATION_CHANGE_NOTE: &str = "Initial AI-generated version";

    /// Upper bound on flattened categories
    pub const MAX_CATEGORIES: usize = 10;

    /// Upper bound on tags
    pub const MAX_TAGS: usize = 10;

    /// Default images attached per article
    pub const DEFAULT_IMAGES_PER_ARTICLE: usize = 3;
}

/// Batch generation constants
pub mod batch {
    /// Subtopics requested per wanted article
    pub const SUBTOPIC_MULTIPLIER: usize = 3;

    /// Minimum subtopics requested from the expander
    pub const MIN_SUBTOPICS: usize = 10;

    /// Attempts allowed per wanted article
    pub const ATTEMPT_MULTIPLIER: usize = 3;

    /// Sampling weight for a fresh subtopic
    pub const FRESH_WEIGHT: f64 = 1.0;

    /// Sampling weight for a subtopic that already failed in this batch
    pub const FAILED_WEIGHT: f64 = 0.3;
}

/// Provider retry constants
pub mod retry {
    /// Default retries after the first attempt
    pub const DEFAULT_MAX_RETRIES: usize = 2;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Image search request timeout (seconds)
    pub const IMAGE_TIMEOUT_SECS: u64 = 20;

    /// Refresh credentials this many seconds before they expire
    pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
}
