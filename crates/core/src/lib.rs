//! group-former-core: partitions student rosters into fixed-size groups
//!
//! This library provides the core components for a classroom tool that:
//! - Normalizes rosters from free text or CSV into student records
//! - Orders students randomly, sequentially, or balanced by id
//! - Chunks them into groups and redistributes students left alone
//! - Summarizes, exports, and QR-encodes the resulting groups
//! - Persists formation history and default settings as JSON documents
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `student`: Student record and group containers
//! - `normalize`: Text and CSV roster parsing with per-line reports
//! - `partition`: The grouping engine
//! - `stats`: Derived group statistics
//! - `config`: Persisted default settings
//! - `store`: History and settings documents on disk
//! - `export`: CSV, spreadsheet, and text renderings
//! - `qr`: QR payloads and SVG codes
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Deterministic**: Seeded randomness makes formations reproducible
//! - **Re-entrant**: No global state; each call owns its random source

pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod partition;
pub mod qr;
pub mod stats;
pub mod store;
pub mod student;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use partition::{partition, Method, PartitionRequest};
pub use stats::GroupStats;
pub use store::{HistoryEntry, Store};
pub use student::{DisplayFormat, Group, GroupSet, Student};
