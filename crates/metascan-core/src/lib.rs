//! metascan-core — shared library for the MetaDefender Cloud scan client.
//!
//! Provides file hashing, the MetaDefender HTTP adapter, the
//! hash-lookup/upload/poll workflow, and result reporting used by the CLI.

pub mod error;
pub mod hash;
pub mod metadefender;
pub mod report;
pub mod scan;

pub use error::ScanError;
