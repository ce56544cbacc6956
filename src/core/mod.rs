//! core
//!
//! Core domain types, configuration and input formats.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName, RefUpdate, ChangeKind, RefKind
//! - [`config`] - Configuration schema and layered loading
//! - [`authors`] - Pusher login to mail identity mapping
//! - [`event`] - Forge push webhook payloads
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing in here touches the repository

pub mod authors;
pub mod config;
pub mod event;
pub mod types;
