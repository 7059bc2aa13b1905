use anyhow::Context as _;
use stock::{WatchList, WatchListStore};
use tracing::{debug, info};

use crate::{
    Error,
    reply::{self, Reply},
};

/// Add `symbol` to the user's list, persisting only when it changes.
pub(super) async fn add(
    store: &dyn WatchListStore,
    user_id: &str,
    watch: &mut WatchList,
    symbol: &str,
) -> Result<Reply, Error> {
    if !watch.add(symbol) {
        debug!(symbol, "already watched");
        return Ok(Reply::text(reply::already_watching(symbol)));
    }

    store
        .save(user_id, watch)
        .await
        .with_context(|| format!("saving watch list for user {user_id}"))?;

    info!(symbol, count = watch.len(), "added to watch list");
    Ok(Reply::text(reply::added(symbol)))
}
