//! refnotify - Email notifications for pushed git reference updates
//!
//! Given the reference updates of a push, refnotify classifies each one,
//! works out which commits are new to the repository as a whole and
//! renders one email per update. Every commit is listed in exactly one
//! email, no matter how many branches end up containing it.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Classify → Analyze → Resolve → Render → Dispatch pipeline
//! - [`render`] - Subject and body templates
//! - [`notify`] - Message composition and transports
//! - [`core`] - Domain types, configuration and input formats
//! - [`git`] - Single interface for all Git operations
//!
//! # Correctness Invariants
//!
//! 1. A commit reachable from another branch is never reported again
//! 2. A branch never excludes its own history
//! 3. The repository is only written by mirror clone and fetch

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod notify;
pub mod render;
