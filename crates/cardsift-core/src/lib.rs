pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, DedupConfig, LoggingConfig};
pub use error::{CardsiftError, ExitCode, Result};
pub use models::*;

pub use storage::deck::{load_deck, remove_cards, save_deck};
