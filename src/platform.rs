//! # Platform-specific utilities
//!
//! Questo modulo centralizza la gestione cross-platform dei comandi esterni:
//! nomi dei tool per piattaforma e rilevamento disponibilità via which/where.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    /// Initialize platform-specific commands
    fn new() -> Self {
        let (commands, which_command) = if cfg!(windows) {
            // Windows commands
            let mut commands = HashMap::new();
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
            commands.insert("aomenc", "aomenc.exe");
            commands.insert("MP4Box", "MP4Box.exe");
            commands.insert("photonnoise", "photonnoise.exe");
            commands.insert("jpegtran", "jpegtran.exe");
            (commands, "where")
        } else {
            // Unix-like systems (Linux, macOS)
            let mut commands = HashMap::new();
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
            commands.insert("aomenc", "aomenc");
            commands.insert("MP4Box", "MP4Box");
            commands.insert("photonnoise", "photonnoise");
            commands.insert("jpegtran", "jpegtran");
            (commands, "which")
        };

        Self {
            commands,
            which_command,
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).unwrap_or(&base_name)
    }

    /// Get the command used to check if a program exists
    pub fn which_command(&self) -> &str {
        self.which_command
    }

    /// Check if a command is available on the system
    pub async fn is_command_available(&self, base_name: &str) -> bool {
        let command_name = self.get_command(base_name);

        let result = tokio::process::Command::new(self.which_command)
            .arg(command_name)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_commands() {
        let platform = PlatformCommands::instance();

        let ffmpeg = platform.get_command("ffmpeg");
        assert!(!ffmpeg.is_empty());

        // Unknown tools fall through unchanged
        assert_eq!(platform.get_command("sometool"), "sometool");

        let which = platform.which_command();
        assert!(!which.is_empty());
    }

    #[tokio::test]
    async fn test_command_availability() {
        let platform = PlatformCommands::instance();

        // A tool that is essentially guaranteed not to exist
        let missing = platform
            .is_command_available("definitely-not-a-real-tool-xyz")
            .await;
        assert!(!missing);
    }
}
