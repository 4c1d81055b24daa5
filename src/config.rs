use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::anilist::ANILIST_ENDPOINT;
use crate::filter::DEFAULT_PER_PAGE;

pub const DEFAULT_BIND: &str = "0.0.0.0:3146";
pub const DEFAULT_THEME_FILE: &str = "anicatalog-theme.json";
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
    pub anilist_endpoint: String,
    pub theme_file: PathBuf,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3146)),
            anilist_endpoint: ANILIST_ENDPOINT.to_string(),
            theme_file: PathBuf::from(DEFAULT_THEME_FILE),
            page_size: DEFAULT_PER_PAGE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind = get("ANICATALOG_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("ANICATALOG_BIND is not a socket address: {}", bind))?;

        let anilist_endpoint =
            get("ANILIST_ENDPOINT").unwrap_or_else(|| ANILIST_ENDPOINT.to_string());
        if !anilist_endpoint.starts_with("http://") && !anilist_endpoint.starts_with("https://") {
            return Err(anyhow!(
                "ANILIST_ENDPOINT must be an http(s) URL: {}",
                anilist_endpoint
            ));
        }

        let theme_file = get("ANICATALOG_THEME_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_THEME_FILE));

        let page_size = match get("ANICATALOG_PAGE_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
                .ok_or_else(|| {
                    anyhow!(
                        "ANICATALOG_PAGE_SIZE must be between 1 and {}: {}",
                        MAX_PAGE_SIZE,
                        raw
                    )
                })?,
            None => DEFAULT_PER_PAGE,
        };

        Ok(Self {
            bind,
            anilist_endpoint,
            theme_file,
            page_size,
        })
    }
}
