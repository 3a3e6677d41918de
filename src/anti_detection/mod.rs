//! Anti-detection policy: recognising block pages, randomising the session
//! identity, and backing off before a blocked page is tried again.

pub mod detector;
pub mod identity;
pub mod retry;

pub use detector::{BlockDetector, BlockReason};
pub use identity::{random_user_agent, Identity, STEALTH_SCRIPT, USER_AGENTS};
pub use retry::RetryPolicy;
