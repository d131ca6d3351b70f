use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Save database under $HOME/.local/state/takt
    pub fn save_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("save.db"))
    }

    /// Session log next to the save file
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions.csv"))
    }

    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("takt"),
            )
        } else {
            ProjectDirs::from("", "", "takt")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }
}
