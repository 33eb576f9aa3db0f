//! Interactive redirect step of the implicit grant
//!
//! The authorization server answers by redirecting the browser to the
//! redirect URI with the token in the URL fragment. Fragments never reach a
//! server, so getting the final URL back is the job of an [`AuthLauncher`]:
//! a browser extension API, an embedded webview, or a human pasting it.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Drives the user through the authorization page and returns the final
/// redirect URL
#[async_trait]
pub trait AuthLauncher: Send + Sync {
    async fn launch(&self, url: &str) -> Result<String, LaunchError>;
}

/// Errors from the interaction mechanism
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

/// Prints the authorization URL, optionally opens a browser, and reads the
/// redirect URL back from the terminal
#[derive(Debug, Clone)]
pub struct ConsoleLauncher {
    open_browser: bool,
}

impl ConsoleLauncher {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }

    fn try_open_browser(url: &str) {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        };

        match std::process::Command::new(opener)
            .arg(url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
        {
            Ok(_) => tracing::debug!("Opened browser with {}", opener),
            Err(e) => tracing::debug!("Could not open browser with {}: {}", opener, e),
        }
    }
}

impl Default for ConsoleLauncher {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl AuthLauncher for ConsoleLauncher {
    async fn launch(&self, url: &str) -> Result<String, LaunchError> {
        eprintln!("Open this URL in a browser and sign in:\n\n  {}\n", url);
        if self.open_browser {
            Self::try_open_browser(url);
        }
        eprintln!("Paste the full URL you were redirected to (empty line to cancel):");

        // prefer the controlling terminal so stdin stays free for the message protocol
        #[cfg(unix)]
        let tty = tokio::fs::File::open("/dev/tty").await.ok();
        #[cfg(not(unix))]
        let tty: Option<tokio::fs::File> = None;

        if let Some(tty) = tty {
            return read_redirect(tty).await;
        }

        read_redirect(tokio::io::stdin()).await
    }
}

/// Read one line holding the redirect URL
async fn read_redirect<R: AsyncRead + Unpin>(input: R) -> Result<String, LaunchError> {
    let mut lines = BufReader::new(input).lines();
    match lines.next_line().await {
        Ok(Some(line)) if !line.trim().is_empty() => Ok(line.trim().to_string()),
        Ok(_) => Err(LaunchError::Cancelled),
        Err(e) => Err(LaunchError::Failed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_redirect_line() {
        let input: &[u8] = b"  https://login.example/callback#access_token=abc  \nignored\n";
        let url = read_redirect(input).await.unwrap();
        assert_eq!(url, "https://login.example/callback#access_token=abc");
    }

    #[tokio::test]
    async fn test_empty_line_cancels() {
        let input: &[u8] = b"\n";
        assert_eq!(read_redirect(input).await, Err(LaunchError::Cancelled));

        let input: &[u8] = b"";
        assert_eq!(read_redirect(input).await, Err(LaunchError::Cancelled));
    }
}
