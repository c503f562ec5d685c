//! Fetching and field extraction for configured recipe sites.

pub mod extract;
pub mod site;
pub mod types;

pub use extract::{FieldSelector, RecipeExtractor, SiteProfile};
pub use site::SiteFetcher;
pub use types::{BatchSummary, ExtractError, FetchError, ScrapeOptions};
