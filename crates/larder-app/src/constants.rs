//! Cross-cutting application constants.

/// Extension of a single gzipped recipe record inside the archive.
pub const RECIPE_ENTRY_EXTENSION: &str = "paprikarecipe";

/// Extension of the per-source zip archive consumed by the recipe manager.
pub const ARCHIVE_EXTENSION: &str = "paprikarecipes";

/// File name of the work queue database under the data directory.
pub const QUEUE_DB_FILE: &str = "queue.sqlite3";
