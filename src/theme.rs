//! Light/dark theme preference, persisted as a small JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub background: &'static str,
    pub paper: &'static str,
    pub text_primary: &'static str,
    pub text_secondary: &'static str,
}

const LIGHT: Palette = Palette {
    primary: "#1976d2",
    secondary: "#dc004e",
    background: "#f5f7fa",
    paper: "#ffffff",
    text_primary: "#2c3e50",
    text_secondary: "#546e7a",
};

const DARK: Palette = Palette {
    primary: "#90caf9",
    secondary: "#f48fb1",
    background: "#121212",
    paper: "#1e1e1e",
    text_primary: "#ffffff",
    text_secondary: "#b0b0b0",
};

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Light => LIGHT,
            Self::Dark => DARK,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTheme {
    theme_mode: ThemeMode,
}

#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Anything other than a readable, valid preference falls back to light.
    pub async fn load(&self) -> ThemeMode {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No theme preference at {:?} ({}), using light", self.path, e);
                return ThemeMode::Light;
            }
        };
        match serde_json::from_slice::<StoredTheme>(&raw) {
            Ok(stored) => stored.theme_mode,
            Err(e) => {
                warn!("Ignoring invalid theme preference {:?}: {}", self.path, e);
                ThemeMode::Light
            }
        }
    }

    pub async fn save(&self, mode: ThemeMode) -> Result<()> {
        let body = serde_json::to_vec(&StoredTheme { theme_mode: mode })
            .context("Failed to encode theme preference")?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("Failed to write theme preference to {:?}", self.path))
    }
}

/// The process-wide theme value.
pub struct ThemeContext {
    mode: Mutex<ThemeMode>,
    store: ThemeStore,
}

impl ThemeContext {
    pub async fn load(store: ThemeStore) -> Self {
        let mode = store.load().await;
        info!("Theme mode: {}", mode.as_str());
        Self {
            mode: Mutex::new(mode),
            store,
        }
    }

    pub async fn current(&self) -> ThemeMode {
        *self.mode.lock().await
    }

    pub async fn toggle(&self) -> ThemeMode {
        let mut mode = self.mode.lock().await;
        *mode = mode.toggle();
        self.save_logged(*mode).await;
        *mode
    }

    pub async fn set(&self, next: ThemeMode) -> ThemeMode {
        let mut mode = self.mode.lock().await;
        *mode = next;
        self.save_logged(next).await;
        next
    }

    pub async fn persist(&self) -> Result<()> {
        let mode = self.current().await;
        self.store.save(mode).await
    }

    async fn save_logged(&self, mode: ThemeMode) {
        if let Err(e) = self.store.save(mode).await {
            warn!("{:#}", e);
        }
    }
}
