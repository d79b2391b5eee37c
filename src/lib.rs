//! Menubot Gateway - `WhatsApp` menu bot behind a webhook
//!
//! Receives `WhatsApp` Cloud API webhook deliveries, matches the message text
//! against a fixed code menu and replies with static text. One menu code can
//! also upload a local PDF and send it as a document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          WhatsApp Cloud API webhook           │
//! └──────────────────────┬───────────────────────┘
//!                        │ GET / (verify)  POST / (deliver)
//! ┌──────────────────────▼───────────────────────┐
//! │  api: axum router          dispatch: menu    │
//! │  verify handshake    ──▶   select reply      │
//! └──────────────────────┬───────────────────────┘
//!                        │ send text / upload / send document
//! ┌──────────────────────▼───────────────────────┐
//! │        channels: Messenger (WhatsApp)         │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod menu;

pub use config::Config;
pub use dispatch::{DispatchReport, Dispatcher};
pub use error::{Error, Result};
pub use menu::{CasePolicy, DocumentTransfer, Menu, Reply};
