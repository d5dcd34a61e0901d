//! Live reload for hicfront.
//!
//! [`ReloadServer`] serves the output tree and keeps a WebSocket open to each
//! browser; [`WatchOrchestrator`] re-runs pipelines on source changes and
//! publishes the outcome through the shared [`ReloadHub`].

pub mod hub;
pub mod server;
pub mod watcher;

pub use hub::{ReloadHub, ReloadMessage};
pub use server::{inject_client, ReloadServer, CLIENT_PATH, LIVERELOAD_PATH};
pub use watcher::{next_batch, ActiveWatch, WatchOrchestrator};
