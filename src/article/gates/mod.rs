//! Verification Gates
//!
//! Checks an article must pass before it is assembled:
//! - `duplicate`: overlap with existing articles (fails open)
//! - `facts`: claims against the gathered sources (fails closed)
//! - `moderation`: content policy (fails closed)

mod duplicate;
mod facts;
mod moderation;

pub use duplicate::{DuplicateDetector, SimilarityDuplicateDetector, TitleMatchDuplicateDetector};
pub use facts::FactVerifier;
pub use moderation::{LlmModerator, Moderator, OpenAiModerator, SharedModerator, create_moderator};
