//! Menu table and code matching
//!
//! A menu is an ordered list of entries, each claiming one or more codes.
//! Inbound text is trimmed and case-normalized, then the first entry that
//! claims it wins. Anything unclaimed gets the fallback reply, so every
//! input maps to exactly one reply.

mod defaults;
pub mod file;

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

pub use defaults::{DEFAULT_DOCUMENT_MIME, kings_hospital};

use crate::{Error, Result};

/// How menu codes and inbound text are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    /// Compare uppercased text
    #[default]
    Upper,
    /// Compare lowercased text
    Lower,
    /// Compare text as typed
    Sensitive,
}

impl CasePolicy {
    /// Trim `text` and apply the policy
    #[must_use]
    pub fn normalize(self, text: &str) -> String {
        let trimmed = text.trim();
        match self {
            Self::Upper => trimmed.to_uppercase(),
            Self::Lower => trimmed.to_lowercase(),
            Self::Sensitive => trimmed.to_string(),
        }
    }
}

impl fmt::Display for CasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Sensitive => "sensitive",
        })
    }
}

/// A local file to upload and send as a `WhatsApp` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTransfer {
    /// File on disk to upload
    pub path: PathBuf,
    /// Filename shown to the recipient
    pub filename: String,
    /// MIME type declared on upload
    pub mime_type: String,
}

impl DocumentTransfer {
    /// Create a transfer whose display name is the path's file name
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        Self {
            path,
            filename,
            mime_type: DEFAULT_DOCUMENT_MIME.to_string(),
        }
    }

    /// Override the display filename
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Override the declared MIME type
    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// What the bot sends back for a selected code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A single text message
    Text(String),
    /// A text message followed by a document transfer
    TextWithDocument {
        text: String,
        document: DocumentTransfer,
    },
}

impl Reply {
    /// Text sent for this reply
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::TextWithDocument { text, .. } => text,
        }
    }

    /// Document to transfer after the text, if any
    #[must_use]
    pub const fn document(&self) -> Option<&DocumentTransfer> {
        match self {
            Self::Text(_) => None,
            Self::TextWithDocument { document, .. } => Some(document),
        }
    }
}

/// One row of the menu table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Normalized codes this entry claims
    pub codes: Vec<String>,
    /// Reply for any of the codes
    pub reply: Reply,
}

/// Immutable, validated menu table
#[derive(Debug, Clone)]
pub struct Menu {
    case: CasePolicy,
    entries: Vec<MenuEntry>,
    fallback: Reply,
}

impl Menu {
    /// Start building a menu with the given case policy
    #[must_use]
    pub fn builder(case: CasePolicy) -> MenuBuilder {
        MenuBuilder {
            case,
            entries: Vec::new(),
            fallback: None,
        }
    }

    /// Case policy applied to codes and input
    #[must_use]
    pub const fn case_policy(&self) -> CasePolicy {
        self.case
    }

    /// Entries in match order
    #[must_use]
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Reply for input no entry claims
    #[must_use]
    pub const fn fallback(&self) -> &Reply {
        &self.fallback
    }

    /// Select the reply for raw inbound text
    ///
    /// First matching entry wins; unmatched text gets the fallback.
    #[must_use]
    pub fn select(&self, body: &str) -> &Reply {
        let code = self.case.normalize(body);
        self.entries
            .iter()
            .find(|entry| entry.codes.iter().any(|c| *c == code))
            .map_or(&self.fallback, |entry| &entry.reply)
    }

    /// All documents any entry may send
    pub fn documents(&self) -> impl Iterator<Item = &DocumentTransfer> {
        self.entries.iter().filter_map(|e| e.reply.document())
    }
}

/// Builder for [`Menu`]
#[derive(Debug)]
pub struct MenuBuilder {
    case: CasePolicy,
    entries: Vec<(Vec<String>, Reply)>,
    fallback: Option<Reply>,
}

impl MenuBuilder {
    /// Append an entry claiming `codes`
    #[must_use]
    pub fn entry<I, S>(mut self, codes: I, reply: Reply) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .push((codes.into_iter().map(Into::into).collect(), reply));
        self
    }

    /// Append a text-only entry
    #[must_use]
    pub fn text<I, S>(self, codes: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry(codes, Reply::Text(text.into()))
    }

    /// Set the reply for unmatched input
    #[must_use]
    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(Reply::Text(text.into()));
        self
    }

    /// Validate and build the menu
    ///
    /// # Errors
    ///
    /// Returns [`Error::Menu`] if the fallback is missing, an entry claims no
    /// code, a code is empty after normalization, or two entries claim the
    /// same normalized code.
    pub fn build(self) -> Result<Menu> {
        let fallback = self
            .fallback
            .ok_or_else(|| Error::Menu("menu has no fallback reply".to_string()))?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.entries.len());

        for (index, (raw_codes, reply)) in self.entries.into_iter().enumerate() {
            if raw_codes.is_empty() {
                return Err(Error::Menu(format!("entry {index} claims no codes")));
            }

            let mut codes = Vec::with_capacity(raw_codes.len());
            for raw in raw_codes {
                let code = self.case.normalize(&raw);
                if code.is_empty() {
                    return Err(Error::Menu(format!("entry {index} has an empty code")));
                }
                if !seen.insert(code.clone()) {
                    return Err(Error::Menu(format!(
                        "code {code:?} is claimed twice under {} case policy",
                        self.case
                    )));
                }
                codes.push(code);
            }

            entries.push(MenuEntry { codes, reply });
        }

        Ok(Menu {
            case: self.case,
            entries,
            fallback,
        })
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "case policy: {}", self.case)?;
        for entry in &self.entries {
            writeln!(f, "[{}]", entry.codes.join(", "))?;
            for line in entry.reply.text().lines() {
                writeln!(f, "    {line}")?;
            }
            if let Some(doc) = entry.reply.document() {
                writeln!(
                    f,
                    "    + document {} as {:?} ({})",
                    doc.path.display(),
                    doc.filename,
                    doc.mime_type
                )?;
            }
        }
        writeln!(f, "[*]")?;
        write!(f, "    {}", self.fallback.text())
    }
}
