//! Configuration management for the menubot gateway
//!
//! Everything is read once at startup from the environment into an
//! immutable [`Config`] that is passed explicitly to the components.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::menu::{self, DocumentTransfer, Menu};
use crate::{Error, Result};

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default `WhatsApp` Cloud API base URL
pub const DEFAULT_API_URL: &str = "https://graph.facebook.com/v19.0";

/// Default outbound request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default document sent by the built-in menu
pub const DEFAULT_DOCUMENT_PATH: &str = "comics.pdf";

/// Gateway configuration
#[derive(Debug)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Webhook verification configuration
    pub webhook: WebhookConfig,

    /// `WhatsApp` Cloud API configuration
    pub whatsapp: WhatsAppConfig,

    /// Document used by the built-in menu
    pub document: DocumentTransfer,

    /// Optional TOML menu replacing the built-in one
    pub menu_file: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Webhook verification configuration
#[derive(Debug)]
pub struct WebhookConfig {
    /// Shared secret the platform presents during verification (`VERIFY_TOKEN`)
    pub verify_token: SecretString,
}

/// `WhatsApp` Cloud API configuration
#[derive(Debug)]
pub struct WhatsAppConfig {
    /// Business API access token (`WHATSAPP_TOKEN`)
    pub access_token: SecretString,

    /// Phone number ID messages are sent from (`PHONE_NUMBER_ID`)
    pub phone_number_id: String,

    /// Graph API base URL, without trailing slash (`WHATSAPP_API_URL`)
    pub api_url: String,

    /// Timeout for each outbound request (`WHATSAPP_TIMEOUT_SECS`)
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is invalid
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} must be set")))
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid PORT {raw:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("WHATSAPP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("invalid WHATSAPP_TIMEOUT_SECS {raw:?}: {e}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(Error::Config(
                "WHATSAPP_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let webhook = WebhookConfig {
            verify_token: SecretString::from(require("VERIFY_TOKEN")?),
        };

        let whatsapp = WhatsAppConfig {
            access_token: SecretString::from(require("WHATSAPP_TOKEN")?),
            phone_number_id: require("PHONE_NUMBER_ID")?,
            api_url: get("WHATSAPP_API_URL").map_or_else(
                || DEFAULT_API_URL.to_string(),
                |u| u.trim_end_matches('/').to_string(),
            ),
            request_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            server: ServerConfig { port },
            webhook,
            whatsapp,
            document: document_from_lookup(&get),
            menu_file: get("MENU_FILE").map(PathBuf::from),
        })
    }

    /// Resolve the menu: the configured menu file, or the built-in table
    ///
    /// # Errors
    ///
    /// Returns error if the menu file cannot be loaded or is invalid
    pub fn menu(&self) -> Result<Menu> {
        resolve_menu(self.menu_file.as_deref(), &self.document)
    }
}

/// Build the built-in menu's document from `DOCUMENT_PATH`/`DOCUMENT_FILENAME`
fn document_from_lookup<F>(get: &F) -> DocumentTransfer
where
    F: Fn(&str) -> Option<String>,
{
    let path = get("DOCUMENT_PATH").unwrap_or_else(|| DEFAULT_DOCUMENT_PATH.to_string());
    let document = DocumentTransfer::new(path);
    match get("DOCUMENT_FILENAME") {
        Some(filename) => document.filename(filename),
        None => document,
    }
}

/// Document settings read straight from the environment
///
/// Used where the full [`Config`] (and its credentials) is not needed.
#[must_use]
pub fn document_from_env() -> DocumentTransfer {
    document_from_lookup(&|key: &str| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    })
}

/// Load `menu_file` if given, otherwise build the built-in menu around `document`
///
/// # Errors
///
/// Returns error if the menu file cannot be loaded or is invalid
pub fn resolve_menu(menu_file: Option<&Path>, document: &DocumentTransfer) -> Result<Menu> {
    match menu_file {
        Some(path) => menu::file::load_menu(path),
        None => menu::kings_hospital(document.clone()),
    }
}
