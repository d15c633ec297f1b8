// Engine modules; the TUI, CLI and App live in the binary.
pub mod adaptive;
pub mod app_dirs;
pub mod audio;
pub mod compare;
pub mod config;
pub mod error;
pub mod exchange;
pub mod generator;
pub mod history;
pub mod matcher;
pub mod mode;
pub mod morse;
pub mod pool;
pub mod runtime;
pub mod session;
pub mod station;
pub mod timing;
pub mod util;

pub use error::{PileupError, Result};
