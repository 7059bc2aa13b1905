use std::{iter, time::Duration};

use futures::{StreamExt, stream};
use stock::{FetchError, InstrumentDirectory, MarketClass, QuoteSource, SENTINEL_SYMBOL, WatchList};
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::reply::{self, Reply};

const CONCURRENCY: usize = 4;

/// Render the sentinel quote plus every watched symbol, last-added first.
///
/// Entries are fetched concurrently but rendered in list order; a failed
/// entry becomes an "unavailable" line and the rest still render. Entries
/// still pending once `budget` has elapsed count as failed.
pub(super) async fn show_all(
    quotes: &dyn QuoteSource,
    directory: &InstrumentDirectory,
    watch: &WatchList,
    keyword: &str,
    budget: Duration,
) -> Reply {
    let deadline = Instant::now() + budget;
    let entries = iter::once(SENTINEL_SYMBOL.to_string())
        .chain(watch.symbols().iter().cloned())
        .rev();

    let lines: Vec<String> = stream::iter(entries)
        .map(|symbol| render_entry(quotes, directory, symbol, deadline))
        .buffered(CONCURRENCY)
        .collect()
        .await;

    info!(entries = lines.len(), "rendered watch list");

    let mut text = keyword.to_string();
    for line in lines {
        text.push_str(&line);
    }

    Reply::text(text)
}

async fn render_entry(
    quotes: &dyn QuoteSource,
    directory: &InstrumentDirectory,
    symbol: String,
    deadline: Instant,
) -> String {
    let market = if symbol == SENTINEL_SYMBOL {
        Some(MarketClass::Domestic)
    } else {
        directory.market_of(&symbol)
    };

    let result = match market {
        Some(market) => timeout_at(deadline, quotes.fetch(&symbol, market))
            .await
            .unwrap_or_else(|_| Err(FetchError::TimedOut(symbol.clone()))),
        None => Err(FetchError::UnknownMarket(symbol.clone())),
    };

    match result {
        Ok(quote) => format!("\n{quote}"),
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "watch list entry unavailable");
            format!("\n\n{}\n", reply::unavailable(&symbol))
        }
    }
}
