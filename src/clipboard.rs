//! Clipboard access
//!
//! Copying the compiled query is a convenience: failures are reported as
//! [`ClipboardError`] and callers log them instead of aborting.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Something that can receive text
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Errors that can occur while copying
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("No clipboard command available")]
    Unavailable,

    #[error("Clipboard IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Clipboard command `{command}` exited with {status}")]
    CommandFailed { command: String, status: String },
}

/// Clipboard backed by an external command reading stdin
/// (`wl-copy`, `xclip`, `pbcopy`, `clip.exe`, ...)
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    /// Use an explicit command line, e.g. `"xclip -selection clipboard"`
    pub fn new(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Pick a command for the current platform
    pub fn detect() -> Option<Self> {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["pbcopy"]
        } else if cfg!(target_os = "windows") {
            &["clip.exe"]
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            &["wl-copy", "xclip -selection clipboard"]
        } else {
            &["xclip -selection clipboard", "xsel --clipboard --input"]
        };

        candidates
            .iter()
            .filter_map(|c| Self::new(c))
            .find(|c| on_path(&c.program))
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let status = child.wait().await?;
        if status.success() {
            tracing::debug!("Copied {} bytes with {}", text.len(), self.program);
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                command: self.command_line(),
                status: status.to_string(),
            })
        }
    }
}

/// In-process clipboard, useful when no system clipboard exists
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut contents = self.contents.lock().map_err(|_| ClipboardError::Unavailable)?;
        *contents = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        let clipboard = CommandClipboard::new("xclip -selection clipboard").unwrap();
        assert_eq!(clipboard.program, "xclip");
        assert_eq!(clipboard.args, vec!["-selection", "clipboard"]);
        assert_eq!(clipboard.command_line(), "xclip -selection clipboard");
        assert!(CommandClipboard::new("   ").is_none());
    }

    #[tokio::test]
    async fn test_missing_command_is_io_error() {
        let clipboard = CommandClipboard::new("sfquery-no-such-clipboard-tool").unwrap();
        let err = clipboard.write_text("SELECT Id FROM Account").await.unwrap_err();
        assert!(matches!(err, ClipboardError::Io(_)));
    }

    #[tokio::test]
    async fn test_memory_clipboard() {
        let clipboard = MemoryClipboard::default();
        assert!(clipboard.contents().is_none());
        clipboard.write_text("SELECT Id FROM Lead").await.unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("SELECT Id FROM Lead"));
    }
}
