//! State machine module root.
//!
//! The orchestrator has a single run-state level; see [`machine`].

pub mod machine;
