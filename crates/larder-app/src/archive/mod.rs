//! The `.paprikarecipes` container: a zip of gzipped JSON records.
//!
//! The format is dictated by the consuming recipe manager: each zip entry is
//! `<name>.paprikarecipe`, a gzip stream wrapping one record's JSON, and the
//! entries themselves are stored uncompressed. Appending to an existing
//! archive keeps prior entries; a name collision skips the new record.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::{Compression, write::GzEncoder};
use thiserror::Error;
use zip::{CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::SimpleFileOptions};

use crate::constants::{ARCHIVE_EXTENSION, RECIPE_ENTRY_EXTENSION};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("failed to write archive entry `{entry}`: {source}")]
    Entry {
        entry: String,
        #[source]
        source: io::Error,
    },
}

/// Result of adding one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { entry: String },
    Duplicate { entry: String },
}

pub struct RecipeArchive {
    path: PathBuf,
    entries: HashSet<String>,
    writer: ZipWriter<File>,
}

impl RecipeArchive {
    /// Open an archive for appending, creating it when absent. Existing entry
    /// names are indexed up front for duplicate detection.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let mut entries = HashSet::new();

        let writer = if path.exists() {
            let reader = File::open(&path).map_err(|source| ArchiveError::Open {
                path: path.clone(),
                source,
            })?;
            let archive = ZipArchive::new(reader).map_err(|source| ArchiveError::Zip {
                path: path.clone(),
                source,
            })?;
            entries.extend(archive.file_names().map(str::to_owned));

            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|source| ArchiveError::Open {
                    path: path.clone(),
                    source,
                })?;
            ZipWriter::new_append(file).map_err(|source| ArchiveError::Zip {
                path: path.clone(),
                source,
            })?
        } else {
            let file = File::create(&path).map_err(|source| ArchiveError::Open {
                path: path.clone(),
                source,
            })?;
            ZipWriter::new(file)
        };

        Ok(Self {
            path,
            entries,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains(entry)
    }

    /// Gzip a record's JSON and append it under the recipe's sanitized name.
    /// `row_id` keeps entries distinct when a name sanitizes to nothing.
    pub fn add(&mut self, name: &str, row_id: i64, json: &[u8]) -> Result<AddOutcome, ArchiveError> {
        let entry = entry_name(name, row_id);
        if self.entries.contains(&entry) {
            return Ok(AddOutcome::Duplicate { entry });
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(json)
            .map_err(|source| ArchiveError::Entry {
                entry: entry.clone(),
                source,
            })?;
        let compressed = encoder.finish().map_err(|source| ArchiveError::Entry {
            entry: entry.clone(),
            source,
        })?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.writer
            .start_file(entry.as_str(), options)
            .map_err(|source| ArchiveError::Zip {
                path: self.path.clone(),
                source,
            })?;
        self.writer
            .write_all(&compressed)
            .map_err(|source| ArchiveError::Entry {
                entry: entry.clone(),
                source,
            })?;

        self.entries.insert(entry.clone());
        Ok(AddOutcome::Added { entry })
    }

    /// Write the central directory and close the file. Skipping this leaves
    /// the archive unreadable.
    pub fn finish(mut self) -> Result<(), ArchiveError> {
        self.writer.finish().map_err(|source| ArchiveError::Zip {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

/// Archive file name for a source (`<source>.paprikarecipes`).
pub fn archive_file_name(source: &str) -> String {
    format!("{source}.{ARCHIVE_EXTENSION}")
}

/// Keep ASCII letters, digits, and `-_.() `; drop everything else.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')' | ' '))
        .collect()
}

fn entry_name(name: &str, row_id: i64) -> String {
    let stem = sanitize_file_name(name);
    if stem.trim().is_empty() {
        return format!("recipe-{row_id}.{RECIPE_ENTRY_EXTENSION}");
    }
    format!("{stem}.{RECIPE_ENTRY_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    use super::*;

    fn read_entry(path: &Path, entry: &str) -> String {
        let file = File::open(path).expect("open archive");
        let mut archive = ZipArchive::new(file).expect("read archive");
        let compressed = archive.by_name(entry).expect("entry present");
        let mut decoder = GzDecoder::new(compressed);
        let mut json = String::new();
        decoder.read_to_string(&mut json).expect("gunzip entry");
        json
    }

    #[test]
    fn sanitize_keeps_whitelisted_chars() {
        assert_eq!(
            sanitize_file_name("Spaghetti alla Norma (v2)"),
            "Spaghetti alla Norma (v2)"
        );
        assert_eq!(sanitize_file_name("Fish & Chips?"), "Fish  Chips");
        assert_eq!(sanitize_file_name("Crème brûlée"), "Crme brle");
        assert_eq!(sanitize_file_name("家常豆腐"), "");
    }

    #[test]
    fn unnameable_recipes_fall_back_to_row_id() {
        assert_eq!(entry_name("家常豆腐", 7), "recipe-7.paprikarecipe");
        assert_eq!(entry_name("   ", 9), "recipe-9.paprikarecipe");
        assert_eq!(entry_name("Toast", 3), "Toast.paprikarecipe");
    }

    #[test]
    fn adds_gzipped_records_and_skips_duplicates() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(archive_file_name("site"));

        let mut archive = RecipeArchive::open(&path).expect("open");
        let outcome = archive.add("Midnight Pasta", 1, br#"{"name":"Midnight Pasta"}"#).expect("add");
        assert_eq!(
            outcome,
            AddOutcome::Added {
                entry: "Midnight Pasta.paprikarecipe".to_string()
            }
        );

        let outcome = archive.add("Midnight Pasta", 2, br#"{"name":"Other"}"#).expect("add dup");
        assert_eq!(
            outcome,
            AddOutcome::Duplicate {
                entry: "Midnight Pasta.paprikarecipe".to_string()
            }
        );
        assert_eq!(archive.entry_count(), 1);
        archive.finish().expect("finish");

        let json = read_entry(&path, "Midnight Pasta.paprikarecipe");
        assert_eq!(json, r#"{"name":"Midnight Pasta"}"#);
    }

    #[test]
    fn append_preserves_existing_entries() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(archive_file_name("site"));

        let mut archive = RecipeArchive::open(&path).expect("open");
        archive.add("First", 1, br#"{"name":"First"}"#).expect("add");
        archive.finish().expect("finish");

        let mut archive = RecipeArchive::open(&path).expect("reopen");
        assert!(archive.contains("First.paprikarecipe"));
        assert_eq!(
            archive.add("First", 1, br#"{"name":"First"}"#).expect("dup"),
            AddOutcome::Duplicate {
                entry: "First.paprikarecipe".to_string()
            }
        );
        archive.add("Second", 2, br#"{"name":"Second"}"#).expect("add");
        archive.finish().expect("finish");

        assert_eq!(read_entry(&path, "First.paprikarecipe"), r#"{"name":"First"}"#);
        assert_eq!(read_entry(&path, "Second.paprikarecipe"), r#"{"name":"Second"}"#);
    }
}
