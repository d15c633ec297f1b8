use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "pileup";

/// Where the trainer keeps its database and log
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/pileup`, or the platform data dir without `$HOME`.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("contacts.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("pileup.log"))
    }
}
