//! roomsync: room settings reconciliation for shared viewing clients.
//!
//! A client in a shared "room" edits room-level settings (lock, permanence,
//! password, chat, custom URL, title) and purely local preferences. This
//! crate keeps both in sync with the authoritative room server:
//!
//! - **Draft**: admin-only edits accumulate in a draft that is re-seeded from
//!   every server echo and committed as one whole-object change-set.
//! - **Validator**: custom room URLs are checked asynchronously; only the
//!   outcome for the most recently typed candidate is ever shown.
//! - **Policy**: pure functions decide which controls are offered.
//! - **Dispatcher**: attaches a fresh identity token, re-checks authorization
//!   and emits exactly one command per action.
//! - **Preferences**: local-only settings in a JSON slot, never sent to the
//!   server.
//!
//! [`session::SettingsSession`] ties these together; [`host`] exposes a
//! session over newline-delimited JSON on stdio.

pub mod announce;
pub mod channel;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod draft;
pub mod error;
pub mod host;
pub mod identity;
pub mod model;
pub mod paths;
pub mod policy;
pub mod preferences;
pub mod resolver;
pub mod session;
pub mod slot;
pub mod validator;

pub use config::ClientConfig;
pub use draft::{AdminDraft, ChangeSet, DraftEdit, DraftManager};
pub use error::{Result, SettingsError};
pub use model::{ColorHex, Identity, RoomContext, RoomSettings, UserId};
pub use policy::ControlState;
pub use session::SettingsSession;
pub use validator::{ValidationState, ValidationStatus, VanityValidator};
