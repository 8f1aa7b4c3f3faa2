//! Core types and shared functionality for correios-cep.
//!
//! This crate provides:
//! - Address store with SQLite backend
//! - Read-through resolution over the store and an external lookup
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod lookup;
pub mod resolver;
pub mod storage;
pub mod version;

pub use config::AppConfig;
pub use error::{Error, Kind, Op};
pub use lookup::AddressLookup;
pub use resolver::Resolver;
pub use storage::{Address, ListParams, Pagination, SqliteStore, Storage};
pub use version::BuildInfo;
