//! Session wiring shared by every command.

mod navigator;
pub mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokenward::{AppUrl, AuthClient, ClientConfig, FileStorage};
use tracing::debug;

pub use navigator::TerminalNavigator;

/// Where the session lives and which application it talks to.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub base_url: AppUrl,
    pub storage_path: PathBuf,
}

impl SessionContext {
    pub fn new(base_url: &str, data_dir: Option<&Path>) -> Result<Self> {
        let base_url = AppUrl::new(base_url).context("Invalid base URL")?;
        let storage_path = storage::session_path(data_dir)?;
        Ok(Self {
            base_url,
            storage_path,
        })
    }

    /// Build a client over the session file.
    pub fn client(&self) -> Result<AuthClient> {
        let config = ClientConfig::new(self.base_url.clone())
            .with_user_agent(format!("tokenward-cli/{}", env!("TOKENWARD_VERSION")))
            .with_timeout(Duration::from_secs(30));
        debug!(path = %self.storage_path.display(), "Opening session file");
        let storage = Arc::new(FileStorage::new(&self.storage_path));

        AuthClient::new(config, storage, Arc::new(TerminalNavigator))
            .context("Failed to initialise session client")
    }
}
