//! Logvault - Redacting, encrypted session logging for a wallet app
//!
//! This library provides the logger, the encrypted session store, the
//! persistence scheduler and the bulk exporter.

pub mod config;
pub mod export;
pub mod logging;
pub mod runtime;
pub mod scheduler;
pub mod storage;

pub use runtime::LogVault;
