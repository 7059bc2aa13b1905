use std::{env::var, time::Duration};

use anyhow::{Context as _, Result, ensure};

use stock::RedisWatchListStore;

use crate::command::DEFAULT_LIST_BUDGET;

#[derive(Clone)]
pub struct Config {
    pub line_channel_token: String,
    pub line_channel_secret: String,
    pub line_api_base: String,
    pub bind_addr: String,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub redis_connect_timeout: Duration,
    pub domestic_directory: String,
    pub index_directory: String,
    pub request_timeout: Duration,
    pub list_budget: Duration,
    pub version: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let request_timeout = secs_or("REQUEST_TIMEOUT_SECS", Duration::from_secs(30))?;
        let list_budget = secs_or("LIST_BUDGET_SECS", DEFAULT_LIST_BUDGET)?;
        check_timeouts(request_timeout, list_budget)?;

        Ok(Self {
            line_channel_token: var("LINE_CHANNEL_TOKEN").context("LINE_CHANNEL_TOKEN not set")?,
            line_channel_secret: var("LINE_CHANNEL_SECRET")
                .context("LINE_CHANNEL_SECRET not set")?,
            line_api_base: var("LINE_API_BASE")
                .unwrap_or_else(|_| "https://api.line.me".to_string()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            redis_url: var("REDIS_URL").ok(),
            redis_key_prefix: var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "kuko".to_string()),
            redis_connect_timeout: secs_or(
                "REDIS_CONNECT_TIMEOUT_SECS",
                RedisWatchListStore::DEFAULT_CONNECT_TIMEOUT,
            )?,
            domestic_directory: var("DOMESTIC_DIRECTORY")
                .unwrap_or_else(|_| "data/tw_stock.json".to_string()),
            index_directory: var("INDEX_DIRECTORY")
                .unwrap_or_else(|_| "data/index_stock.json".to_string()),
            request_timeout,
            list_budget,
            version: var("APP_VERSION").unwrap_or_else(|_| "Unknown".to_string()),
        })
    }
}

fn secs_or(name: &str, default: Duration) -> Result<Duration> {
    match var(name) {
        Ok(secs) => Ok(Duration::from_secs(
            secs.parse()
                .with_context(|| format!("{name} must be a number of seconds"))?,
        )),
        Err(_) => Ok(default),
    }
}

/// The watch list reply has to be ready before the webhook request is cut off.
fn check_timeouts(request_timeout: Duration, list_budget: Duration) -> Result<()> {
    ensure!(
        list_budget < request_timeout,
        "LIST_BUDGET_SECS ({}s) must be shorter than REQUEST_TIMEOUT_SECS ({}s)",
        list_budget.as_secs(),
        request_timeout.as_secs()
    );
    Ok(())
}
