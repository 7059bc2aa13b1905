use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::{America::New_York, Asia::Taipei, Tz};
use reqwest::{Client, header::USER_AGENT};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{directory::MarketClass, error::FetchError, quote::QuoteSnapshot};

pub const DEFAULT_DOMESTIC_API: &str = "https://tw.quote.finance.yahoo.net";
pub const DEFAULT_GLOBAL_API: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_AGENT: &str = "Mozilla/5.0";

/// Anything that can turn a symbol into a quote snapshot.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, symbol: &str, market: MarketClass) -> Result<QuoteSnapshot, FetchError>;
}

/// HTTP client for the domestic tick feed and the global quote-chain feed.
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    domestic_api: String,
    global_api: String,
}

impl QuoteClient {
    pub fn new(domestic_api: String, global_api: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            domestic_api,
            global_api,
        })
    }

    /// Reads DOMESTIC_QUOTE_URL, GLOBAL_QUOTE_URL and QUOTE_TIMEOUT_SECS,
    /// falling back to the public endpoints and a 10 second timeout.
    pub fn from_env() -> Result<Self> {
        use std::env::var;

        let domestic_api =
            var("DOMESTIC_QUOTE_URL").unwrap_or_else(|_| DEFAULT_DOMESTIC_API.to_string());
        let global_api = var("GLOBAL_QUOTE_URL").unwrap_or_else(|_| DEFAULT_GLOBAL_API.to_string());
        let timeout = match var("QUOTE_TIMEOUT_SECS") {
            Ok(secs) => Duration::from_secs(secs.parse()?),
            Err(_) => DEFAULT_TIMEOUT,
        };

        Self::new(domestic_api, global_api, timeout)
    }

    async fn fetch_domestic(&self, symbol: &str) -> Result<QuoteSnapshot, FetchError> {
        let url = format!("{}/quote/q", self.domestic_api.trim_end_matches('/'));

        let body = self
            .client
            .get(url)
            .query(&[
                ("type", "tick"),
                ("perd", "1m"),
                ("mkt", "10"),
                ("sym", symbol),
                ("callback", ""),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        debug!(bytes = body.len(), "received tick payload");
        parse_tick_payload(&body)
    }

    async fn fetch_global(&self, symbol: &str) -> Result<QuoteSnapshot, FetchError> {
        let url = format!(
            "{}/v7/finance/options/{}",
            self.global_api.trim_end_matches('/'),
            symbol
        );

        let res: OptionsResponse = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let quote = res
            .option_chain
            .result
            .into_iter()
            .next()
            .map(|r| r.quote)
            .ok_or_else(|| FetchError::Malformed("optionChain.result is empty".to_string()))?;

        let timestamp = New_York
            .timestamp_opt(quote.regular_market_time, 0)
            .single()
            .ok_or_else(|| FetchError::InvalidTimestamp(quote.regular_market_time.to_string()))?;

        Ok(QuoteSnapshot {
            name: symbol.to_string(),
            timestamp,
            price: quote.regular_market_price,
            change: quote.regular_market_change,
            change_percent: quote.regular_market_change_percent,
            volume: to_volume(quote.regular_market_volume),
        })
    }
}

#[async_trait]
impl QuoteSource for QuoteClient {
    #[instrument(name = "fetch_quote", skip(self, market), fields(market = %market))]
    async fn fetch(&self, symbol: &str, market: MarketClass) -> Result<QuoteSnapshot, FetchError> {
        match market {
            MarketClass::Domestic => self.fetch_domestic(symbol).await,
            MarketClass::IndexGlobal => self.fetch_global(symbol).await,
        }
    }
}

/// The tick feed answers with `(<json>);` and emits `"143":09`, which is not
/// valid JSON. Both are patched before parsing.
fn parse_tick_payload(body: &str) -> Result<QuoteSnapshot, FetchError> {
    let json = body
        .trim()
        .trim_matches(|c: char| matches!(c, '(' | ';' | ')'))
        .replace(r#""143":09"#, r#""143":10"#);

    let res: TickResponse = serde_json::from_str(&json)?;
    let last = res.tick.last().ok_or(FetchError::EmptyTicks)?;

    Ok(QuoteSnapshot {
        name: res.mem.name,
        timestamp: tick_time(last.time)?,
        price: last.price,
        change: res.mem.change,
        change_percent: res.mem.change_percent,
        volume: to_volume(res.mem.volume),
    })
}

/// `YYYYMMDDHHmm` in Taipei local time.
fn tick_time(code: u64) -> Result<DateTime<Tz>, FetchError> {
    let minute = code % 100;
    let hour = code / 100 % 100;
    let day = code / 10_000 % 100;
    let month = code / 1_000_000 % 100;
    let year = code / 100_000_000;

    Taipei
        .with_ymd_and_hms(
            year as i32,
            month as u32,
            day as u32,
            hour as u32,
            minute as u32,
            0,
        )
        .single()
        .ok_or_else(|| FetchError::InvalidTimestamp(code.to_string()))
}

fn to_volume(raw: f64) -> u64 {
    raw.max(0.0).round() as u64
}

//
// Yahoo TW tick feed
//
#[derive(Debug, Deserialize)]
struct TickResponse {
    mem: TickMem,
    tick: Vec<Tick>,
}

#[derive(Debug, Deserialize)]
struct TickMem {
    name: String,

    #[serde(rename = "184")]
    change: f64,

    #[serde(rename = "185")]
    change_percent: f64,

    #[serde(rename = "404")]
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct Tick {
    #[serde(rename = "t")]
    time: u64,

    #[serde(rename = "p")]
    price: f64,
}

//
// Yahoo options chain
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionChain,
}

#[derive(Debug, Deserialize)]
struct OptionChain {
    result: Vec<OptionResult>,
}

#[derive(Debug, Deserialize)]
struct OptionResult {
    quote: GlobalQuote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlobalQuote {
    regular_market_time: i64,
    regular_market_price: f64,
    regular_market_change: f64,
    regular_market_change_percent: f64,
    regular_market_volume: f64,
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;

    const TICK_BODY: &str = r#"({"mem":{"name":"台積電","143":09,"184":-6.5,"185":-0.82,"404":31245},"tick":[{"t":202403081325,"p":785.0},{"t":202403081330,"p":784.0}]});"#;

    const OPTIONS_BODY: &str = r#"{"optionChain":{"result":[{"quote":{"regularMarketTime":1709931600,"regularMarketPrice":5123.69,"regularMarketChange":-33.67,"regularMarketChangePercent":-0.6529,"regularMarketVolume":2970125312}}],"error":null}}"#;

    fn client(server: &MockServer) -> QuoteClient {
        QuoteClient::new(server.uri(), server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn domestic_quote_reads_the_last_tick() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote/q"))
            .and(query_param("type", "tick"))
            .and(query_param("perd", "1m"))
            .and(query_param("mkt", "10"))
            .and(query_param("sym", "2330"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TICK_BODY))
            .mount(&server)
            .await;

        let quote = client(&server)
            .fetch("2330", MarketClass::Domestic)
            .await
            .unwrap();

        assert_eq!(quote.name, "台積電");
        assert_eq!(quote.price, 784.0);
        assert_eq!(quote.change, -6.5);
        assert_eq!(quote.change_percent, -0.82);
        assert_eq!(quote.volume, 31245);
        assert_eq!(
            quote.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            "2024-03-08 13:30"
        );
    }

    #[tokio::test]
    async fn domestic_quote_without_ticks_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote/q"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"({"mem":{"name":"台積電","184":0,"185":0,"404":0},"tick":[]});"#,
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch("2330", MarketClass::Domestic)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::EmptyTicks));
    }

    #[tokio::test]
    async fn domestic_quote_with_missing_field_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote/q"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"({"mem":{"name":"台積電"},"tick":[{"t":202403081330,"p":784.0}]});"#,
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch("2330", MarketClass::Domestic)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn upstream_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch("2330", MarketClass::Domestic)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Http(_)));
    }

    #[tokio::test]
    async fn global_quote_is_converted_to_new_york_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/options/AAPL"))
            .and(header("user-agent", BROWSER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(OPTIONS_BODY))
            .mount(&server)
            .await;

        let quote = client(&server)
            .fetch("AAPL", MarketClass::IndexGlobal)
            .await
            .unwrap();

        assert_eq!(quote.name, "AAPL");
        assert_eq!(quote.price, 5123.69);
        assert_eq!(quote.volume, 2_970_125_312);
        assert_eq!(quote.timestamp.timezone(), New_York);
        assert_eq!(quote.timestamp.hour(), 16);
        assert_eq!(
            quote.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            "2024-03-08 16:00"
        );
    }

    #[tokio::test]
    async fn global_quote_with_empty_result_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/options/AAPL"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"optionChain":{"result":[],"error":null}}"#),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch("AAPL", MarketClass::IndexGlobal)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn stalled_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(TICK_BODY)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        let client =
            QuoteClient::new(server.uri(), server.uri(), Duration::from_millis(200)).unwrap();

        let started = std::time::Instant::now();
        let err = client
            .fetch("2330", MarketClass::Domestic)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(&err, FetchError::Http(e) if e.is_timeout()), "{err:?}");
    }

    #[test]
    fn tick_time_rejects_impossible_dates() {
        assert!(matches!(
            tick_time(202413991330),
            Err(FetchError::InvalidTimestamp(_))
        ));
    }
}
