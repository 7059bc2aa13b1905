use anyhow::Context as _;
use stock::{WatchList, WatchListStore};
use tracing::{debug, info};

use crate::{
    Error,
    reply::{self, Reply},
};

pub(super) async fn remove(
    store: &dyn WatchListStore,
    user_id: &str,
    watch: &mut WatchList,
    symbol: &str,
) -> Result<Reply, Error> {
    if !watch.remove(symbol) {
        debug!(symbol, "not watched");
        return Ok(Reply::text(reply::not_watching(symbol)));
    }

    store
        .save(user_id, watch)
        .await
        .with_context(|| format!("saving watch list for user {user_id}"))?;

    info!(symbol, count = watch.len(), "removed from watch list");
    Ok(Reply::text(reply::removed(symbol)))
}
