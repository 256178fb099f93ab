//! # gch-core
//!
//! Core crate for the GCH Servicios back-office session toolkit. Contains
//! the storage and cache traits, configuration schemas, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other GCH crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
