//! Recipe page scraper and Paprika archive packager.
//!
//! The pipeline is a single-operator batch job: pending URLs are read from a
//! SQLite work queue, each page is fetched and mapped to a recipe record via
//! CSS-class selectors, and every success is appended to a `.paprikarecipes`
//! archive (a zip of gzipped JSON records) for its source site.

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingestion;
pub mod paths;
pub mod pipeline;
pub mod queue;
pub mod recipe;
