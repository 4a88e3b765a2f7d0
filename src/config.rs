// Loading configuration: defaults, then an optional config file, then APP_* environment variables

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_LISTINGS_URL: &str = "https://private-fe87c-simpleclassifieds.apiary-mock.com/";
pub const DEFAULT_FILTER_STORE_PATH: &str = "filters.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server_address: String,
    pub listings_url: String,
    // Empty path keeps filter selections in memory only
    pub filter_store_path: String,
    pub request_timeout_secs: u64,
    pub fetch_on_startup: bool,
    pub proxy_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            listings_url: DEFAULT_LISTINGS_URL.to_string(),
            filter_store_path: DEFAULT_FILTER_STORE_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fetch_on_startup: true,
            proxy_url: None,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present
        Self::load("config")
    }

    /// Load with `file_name` (extension optional) as the config file.
    pub fn load(file_name: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("server_address", DEFAULT_SERVER_ADDRESS)?
            .set_default("listings_url", DEFAULT_LISTINGS_URL)?
            .set_default("filter_store_path", DEFAULT_FILTER_STORE_PATH)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("fetch_on_startup", true)?
            .add_source(File::with_name(file_name).required(false))
            // e.g. APP_LISTINGS_URL; "__" separates nested keys so single underscores stay in names
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings = builder
            .build()
            .context("Failed to assemble configuration sources")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        Ok(settings)
    }
}
