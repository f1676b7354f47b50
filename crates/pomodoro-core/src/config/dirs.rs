use directories::ProjectDirs;
use std::path::PathBuf;

/// Application directories under the XDG base directories
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/pomodoro-dialog)
    pub config: PathBuf,

    /// Config file path
    pub config_file: PathBuf,
}

impl Directories {
    /// Create a new `Directories` instance with standard XDG paths.
    ///
    /// # Panics
    ///
    /// Panics if the system's project directories cannot be determined.
    #[must_use]
    pub fn new() -> Self {
        let project = ProjectDirs::from("", "", "pomodoro-dialog")
            .expect("Failed to determine project directories");

        Self::with_base(project.config_dir().to_path_buf())
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            config: base,
        }
    }

    /// Ensure the config directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)
    }
}

impl Default for Directories {
    fn default() -> Self {
        Self::new()
    }
}
