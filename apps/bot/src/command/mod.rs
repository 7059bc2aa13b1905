mod delete;
mod list;
mod query;
mod watch;

use std::{sync::Arc, time::Duration};

use stock::{Instrument, InstrumentDirectory, QuoteSource, WatchListStore};
use tracing::{debug, instrument};

use crate::{Error, reply::Reply};

/// Message that asks for the whole watch list.
pub const WATCH_LIST_KEYWORD: &str = "關注清單";

/// Time allowed for rendering the whole watch list.
pub const DEFAULT_LIST_BUDGET: Duration = Duration::from_secs(20);

const ADD_PREFIX: char = '+';
const REMOVE_PREFIX: char = '-';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ShowAllWatched,
    QueryInstrument(Instrument),
    AddToWatch(Instrument),
    RemoveFromWatch(Instrument),
    Unrecognized,
}

impl Command {
    /// Classify a raw message. Matching is exact and case-sensitive.
    pub fn classify(message: &str, directory: &InstrumentDirectory) -> Self {
        if message == WATCH_LIST_KEYWORD {
            return Command::ShowAllWatched;
        }

        let prefixed = |prefix: char| {
            message
                .strip_prefix(prefix)
                .and_then(|rest| directory.resolve(rest))
                .cloned()
        };

        if let Some(instrument) = prefixed(ADD_PREFIX) {
            return Command::AddToWatch(instrument);
        }
        if let Some(instrument) = prefixed(REMOVE_PREFIX) {
            return Command::RemoveFromWatch(instrument);
        }

        match directory.resolve(message) {
            Some(instrument) => Command::QueryInstrument(instrument.clone()),
            None => Command::Unrecognized,
        }
    }
}

/// Turns one user message into at most one reply, updating the user's
/// watch list along the way.
pub struct Interpreter {
    directory: Arc<InstrumentDirectory>,
    quotes: Arc<dyn QuoteSource>,
    store: Arc<dyn WatchListStore>,
    list_budget: Duration,
}

impl Interpreter {
    pub fn new(
        directory: Arc<InstrumentDirectory>,
        quotes: Arc<dyn QuoteSource>,
        store: Arc<dyn WatchListStore>,
    ) -> Self {
        Self {
            directory,
            quotes,
            store,
            list_budget: DEFAULT_LIST_BUDGET,
        }
    }

    pub fn with_list_budget(mut self, budget: Duration) -> Self {
        self.list_budget = budget;
        self
    }

    /// Returns `None` for unrecognized messages; those get no reply at all.
    /// Errors only when a watch list change could not be persisted or the
    /// store could not be read.
    #[instrument(name = "handle_message", skip(self, message))]
    pub async fn handle(&self, user_id: &str, message: &str) -> Result<Option<Reply>, Error> {
        let command = Command::classify(message, &self.directory);
        debug!(?command, "classified message");

        if command == Command::Unrecognized {
            return Ok(None);
        }

        let mut watch_list = self.store.load(user_id).await?;
        let store = self.store.as_ref();
        let quotes = self.quotes.as_ref();

        let reply = match command {
            Command::ShowAllWatched => {
                list::show_all(
                    quotes,
                    &self.directory,
                    &watch_list,
                    message,
                    self.list_budget,
                )
                .await
            }
            Command::QueryInstrument(instrument) => {
                query::query(quotes, &instrument, message).await
            }
            Command::AddToWatch(instrument) => {
                watch::add(store, user_id, &mut watch_list, &instrument.symbol).await?
            }
            Command::RemoveFromWatch(instrument) => {
                delete::remove(store, user_id, &mut watch_list, &instrument.symbol).await?
            }
            Command::Unrecognized => return Ok(None),
        };

        Ok(Some(reply))
    }
}
