mod directory;
mod error;
mod quote;
mod quote_client;
mod watch_list;
mod watch_store;

pub use directory::{Instrument, InstrumentDirectory, MarketClass};
pub use error::{DirectoryError, FetchError, StoreError};
pub use quote::QuoteSnapshot;
pub use quote_client::{QuoteClient, QuoteSource};
pub use watch_list::{RECORD_VERSION, SENTINEL_SYMBOL, WatchList};
pub use watch_store::{MemoryWatchListStore, RedisWatchListStore, WatchListStore};
