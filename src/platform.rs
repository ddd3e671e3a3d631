//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione dei tool esterni (oggi solo
//! ffmpeg): nome del comando per piattaforma, tool bundled in `TOOLS_DIR`,
//! verifica di disponibilità con `which` / `where`.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::debug;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
    tools_dir: Option<PathBuf>,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        let which_command = if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            "where"
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            "which"
        };

        let tools_dir = env::var_os("TOOLS_DIR")
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        if let Some(ref dir) = tools_dir {
            debug!("Using bundled tools directory: {}", dir.display());
        }

        Self {
            commands,
            which_command,
            tools_dir,
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Bundled tool if present, otherwise the bare command for `PATH` lookup
    pub fn resolve_tool(&self, base_name: &str) -> PathBuf {
        let command = self.get_command(base_name);
        self.tools_dir
            .as_ref()
            .map(|dir| dir.join(command))
            .filter(|path| path.is_file())
            .unwrap_or_else(|| PathBuf::from(command))
    }

    /// Check if a command is available on the system or bundled
    pub async fn is_command_available(&self, base_name: &str) -> bool {
        let resolved = self.resolve_tool(base_name);
        if resolved.is_absolute() {
            return resolved.is_file();
        }

        match tokio::process::Command::new(self.which_command)
            .arg(&resolved)
            .output()
            .await
        {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}
