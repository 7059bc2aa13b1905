use stock::{Instrument, QuoteSource};
use tracing::{debug, warn};

use crate::reply::{self, Reply};

/// Quote a single instrument. A failed fetch still produces a reply.
pub(super) async fn query(quotes: &dyn QuoteSource, instrument: &Instrument, message: &str) -> Reply {
    match quotes.fetch(&instrument.symbol, instrument.market).await {
        Ok(quote) => {
            debug!(symbol = %instrument.symbol, "quote fetched");
            Reply::text(quote.to_string()).with_watch_actions(message)
        }
        Err(e) => {
            warn!(symbol = %instrument.symbol, error = %e, "quote unavailable");
            Reply::text(reply::unavailable(&instrument.symbol))
        }
    }
}
