#![forbid(unsafe_code)]

//! Core domain model and sequencing logic for planning exercise sessions.
//!
//! This crate provides:
//! - Domain types (movements, requests, plans, findings)
//! - Catalog view and the built-in movement catalog
//! - Muscle overlap evaluation and progression validation
//! - Duration fitting against fixed session sections
//! - The sequence builder and QA report generation

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod filter;
pub mod overlap;
pub mod progression;
pub mod duration;
pub mod sections;
pub mod engine;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, CatalogView};
pub use config::{Config, PlannerConfig, ViolationPolicy};
pub use duration::SectionProvider;
pub use engine::{build_from_snapshot, build_sequence};
pub use report::QaReport;
