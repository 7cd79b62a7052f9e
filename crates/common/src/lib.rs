//! Common utilities and shared types for the MWB audition backend.
//!
//! This crate provides foundational components used across all crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and reference numbers via [`IdGenerator`]
//! - **Storage**: Document storage backends (local, S3-compatible)
//!
//! # Example
//!
//! ```no_run
//! use mwb_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("Serving {} with id {}", config.server.url, id_gen.generate());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::{Config, SequenceBackend};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    DocumentKind, LocalStorage, StorageBackend, StorageConfig, UploadedFile,
    extension_for_content_type, generate_storage_key,
};

#[cfg(feature = "s3")]
pub use storage::S3Storage;
