//! BrowserManager: Chrome discovery and launch, connection and pages.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use reachguard_config::BrowserConfig;

use super::BrowserError;
use crate::cdp::CdpClient;
use crate::document::CdpDocument;

const LAUNCH_POLL_INTERVAL: Duration = Duration::from_millis(200);
const LAUNCH_MAX_ATTEMPTS: u32 = 30;

/// Manages the browser connection and the pages opened through it.
pub struct BrowserManager {
    config: BrowserConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    /// Target ids of pages opened by this manager.
    pages: RwLock<Vec<String>>,
    /// Chrome process handle (if we launched it).
    chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            pages: RwLock::new(Vec::new()),
            chrome_process: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Find a Chrome executable in well-known locations.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// The configured executable if set, otherwise a discovered one.
    pub fn chrome_executable(&self) -> Option<PathBuf> {
        match self.config.chrome_path {
            Some(ref path) => Some(path.clone()),
            None => Self::find_chrome(),
        }
    }

    fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.config.navigation_timeout_ms)
    }

    async fn is_chrome_running(&self) -> bool {
        reqwest::get(&format!("{}/json/version", self.config.endpoint()))
            .await
            .is_ok()
    }

    /// Launch Chrome with remote debugging enabled.
    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = self.chrome_executable().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.config.get_profile_dir();

        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!(
            "Launching {} with profile at {}",
            chrome_path.display(),
            profile_dir.display()
        );

        let mut cmd = Command::new(&chrome_path);
        cmd.arg(format!("--remote-debugging-port={}", self.config.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg(format!(
                "--window-size={},{}",
                self.config.viewport_width, self.config.viewport_height
            ))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--hide-scrollbars")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if self.config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect to the browser, launching it if necessary.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        if !self.is_chrome_running().await {
            info!("Chrome not running on port {}, launching...", self.config.debug_port);

            let child = self.launch_chrome().await?;
            *self.chrome_process.write().await = Some(child);

            let mut ready = false;
            for _ in 0..LAUNCH_MAX_ATTEMPTS {
                tokio::time::sleep(LAUNCH_POLL_INTERVAL).await;
                if self.is_chrome_running().await {
                    ready = true;
                    break;
                }
            }

            if !ready {
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        } else {
            info!("Chrome already running on port {}", self.config.debug_port);
        }

        let client = CdpClient::connect(&self.config.endpoint()).await?;
        info!("Connected to {} at {}", client.browser(), self.config.endpoint());
        *self.client.write().await = Some(Arc::new(client));
        Ok(())
    }

    async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Open `url` in a new tab with the configured viewport and attach a
    /// document to it once loaded.
    pub async fn open_document(&self, url: &str) -> Result<CdpDocument, BrowserError> {
        self.connect().await?;
        let client = self.client().await?;

        let session = Arc::new(client.new_page().await?);
        self.pages.write().await.push(session.target_id().to_string());

        session
            .set_viewport(self.config.viewport_width, self.config.viewport_height)
            .await?;
        session.navigate(url, self.navigation_timeout()).await?;

        let document = CdpDocument::attach(session).await?;
        debug!("Opened document {}", url);
        Ok(document)
    }

    /// Close the tab behind a document.
    pub async fn close_document(&self, document: CdpDocument) -> Result<(), BrowserError> {
        let target_id = document.session().target_id().to_string();
        self.pages.write().await.retain(|id| *id != target_id);

        let client = self.client().await?;
        client.close_page(&target_id).await?;
        debug!("Closed page {}", target_id);
        Ok(())
    }

    /// Number of pages this manager has open.
    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }

    /// Close every page opened by this manager and drop the connection.
    pub async fn close(&self) -> Result<(), BrowserError> {
        let pages: Vec<String> = self.pages.write().await.drain(..).collect();
        if let Some(client) = self.client.write().await.take() {
            for target_id in pages {
                if let Err(e) = client.close_page(&target_id).await {
                    warn!("Failed to close page {}: {}", target_id, e);
                }
            }
        }
        info!("Browser connection closed");
        Ok(())
    }

    /// Close the connection and stop Chrome if we launched it.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        self.close().await?;
        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("Shutting down Chrome...");
            let _ = child.kill().await;
        }
        Ok(())
    }
}
