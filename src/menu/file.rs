//! TOML menu file loading
//!
//! A menu file replaces the built-in table. All entries are listed in match
//! order; `case` and each document's `filename`/`mime_type` are optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{CasePolicy, DocumentTransfer, Menu, Reply};
use crate::Result;

/// Top-level menu file schema
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuFile {
    /// Case policy for codes and input
    #[serde(default)]
    pub case: CasePolicy,

    /// Reply for unmatched input
    pub fallback: String,

    /// Entries in match order
    #[serde(default)]
    pub entries: Vec<EntryFile>,
}

/// One `[[entries]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryFile {
    pub codes: Vec<String>,
    pub text: String,
    #[serde(default)]
    pub document: Option<DocumentFile>,
}

/// Inline `document = { ... }` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentFile {
    pub path: PathBuf,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

impl MenuFile {
    /// Convert into a validated menu
    ///
    /// # Errors
    ///
    /// Returns error if the table violates menu invariants
    pub fn into_menu(self) -> Result<Menu> {
        let mut builder = Menu::builder(self.case);

        for entry in self.entries {
            let reply = match entry.document {
                None => Reply::Text(entry.text),
                Some(doc) => {
                    let mut document = DocumentTransfer::new(doc.path);
                    if let Some(filename) = doc.filename {
                        document = document.filename(filename);
                    }
                    if let Some(mime_type) = doc.mime_type {
                        document = document.mime_type(mime_type);
                    }
                    Reply::TextWithDocument {
                        text: entry.text,
                        document,
                    }
                }
            };
            builder = builder.entry(entry.codes, reply);
        }

        builder.fallback(self.fallback).build()
    }
}

/// Parse a menu from TOML text
///
/// # Errors
///
/// Returns error if the TOML is invalid or the table violates menu invariants
pub fn parse_menu(contents: &str) -> Result<Menu> {
    let file: MenuFile = toml::from_str(contents)?;
    file.into_menu()
}

/// Load a menu from a TOML file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_menu(path: &Path) -> Result<Menu> {
    let contents = std::fs::read_to_string(path)?;
    let menu = parse_menu(&contents)?;
    tracing::debug!(
        path = %path.display(),
        entries = menu.entries().len(),
        "loaded menu file"
    );
    Ok(menu)
}
