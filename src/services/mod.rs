//! Generation services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `chain` walks one provider's model list, `dispatch` orders the two
//! providers and applies the caller-facing fallback policy, and `defaults`
//! holds the static payloads that policy serves when every backend fails.

pub mod chain;
pub mod defaults;
pub mod dispatch;
