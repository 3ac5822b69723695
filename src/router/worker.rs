//! Contains the worker task for the routing stage.
//! This module consumes crawl items from a channel and routes them through
//! the shared `Router` concurrently, forwarding admitted items downstream.

use crate::item::{CrawlItem, RoutedItem};
use crate::router::core::{RouteOutcome, Router};
use crate::state::RouterState;
use kanal::{AsyncReceiver, AsyncSender};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

/// Spawns the routing worker task.
///
/// Items are pulled from `item_rx` and routed concurrently, bounded by the
/// router's `max_concurrent_routes`. Admitted items go out on `routed_tx`;
/// rejected and dropped items are absorbed here (their counters have already
/// been updated by the router). The task finishes once `item_rx` closes and
/// all in-flight routes have completed.
pub fn spawn_router_task(
    router: Arc<Router>,
    state: Arc<RouterState>,
    item_rx: AsyncReceiver<CrawlItem>,
    routed_tx: AsyncSender<RoutedItem>,
) -> tokio::task::JoinHandle<()> {
    let mut tasks = JoinSet::new();
    let semaphore = Arc::new(Semaphore::new(router.max_concurrent_routes()));

    trace!(
        "Starting router task with max_concurrent_routes: {}",
        router.max_concurrent_routes()
    );
    tokio::spawn(async move {
        while let Ok(item) = item_rx.recv().await {
            trace!("Received item for routing");
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, shutting down router task.");
                    break;
                }
            };

            state.routing_items.fetch_add(1, Ordering::SeqCst);
            let router_clone = Arc::clone(&router);
            let state_clone = Arc::clone(&state);
            let routed_tx_clone = routed_tx.clone();

            tasks.spawn(async move {
                match router_clone.route(item).await {
                    RouteOutcome::Routed(routed) => {
                        if routed_tx_clone.send(routed).await.is_err() {
                            warn!("Routed item receiver dropped, discarding item");
                        }
                    }
                    RouteOutcome::Rejected => {
                        trace!("Item rejected by admission filter");
                    }
                    RouteOutcome::Dropped(reason) => {
                        debug!("Item dropped: {}", reason.as_str());
                    }
                }
                state_clone.routing_items.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            });
        }

        trace!("Waiting for active routing tasks to complete");
        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result {
                error!("A routing task failed: {:?}", error);
            }
        }
        trace!("Router task finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RouterBuilder;
    use crate::metadata::Metadata;
    use serde_json::json;

    fn item(url: &str, pairs: &[(&str, &str)]) -> CrawlItem {
        let mut metadata = Metadata::new();
        for (key, value) in pairs {
            metadata.add_value(*key, *value);
        }
        CrawlItem::new(url, metadata)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn admitted_items_flow_downstream_and_rejections_do_not() {
        let router = Arc::new(
            RouterBuilder::new()
                .filter_config(json!({"blocked": "yes"}))
                .build()
                .unwrap(),
        );
        let state = RouterState::new();
        let (item_tx, item_rx) = kanal::bounded_async(8);
        let (routed_tx, routed_rx) = kanal::bounded_async(8);

        let handle = spawn_router_task(Arc::clone(&router), state, item_rx, routed_tx);

        item_tx
            .send(item("http://allowed.test/page", &[("blocked", "no")]))
            .await
            .unwrap();
        item_tx
            .send(item("http://blocked.test/page", &[("blocked", "yes")]))
            .await
            .unwrap();
        item_tx
            .send(item("::broken::", &[("blocked", "no")]))
            .await
            .unwrap();
        drop(item_tx);

        handle.await.unwrap();

        let mut routed = Vec::new();
        while let Ok(Some(next)) = routed_rx.try_recv() {
            routed.push(next);
        }
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].url, "http://allowed.test/page");
        assert_eq!(routed[0].partition_key, "allowed.test");

        let stats = router.get_stats();
        assert_eq!(stats.items_received.load(Ordering::SeqCst), 3);
        assert_eq!(stats.items_admitted.load(Ordering::SeqCst), 1);
        assert_eq!(stats.items_rejected.load(Ordering::SeqCst), 1);
        assert_eq!(stats.items_dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn state_returns_to_idle_after_draining() {
        let router = Arc::new(RouterBuilder::new().build().unwrap());
        let state = RouterState::new();
        let (item_tx, item_rx) = kanal::bounded_async(8);
        let (routed_tx, routed_rx) = kanal::bounded_async(8);

        let handle = spawn_router_task(router, Arc::clone(&state), item_rx, routed_tx);

        for n in 0..5 {
            item_tx
                .send(item(&format!("http://host{n}.test/"), &[]))
                .await
                .unwrap();
        }
        drop(item_tx);
        handle.await.unwrap();

        assert!(state.is_idle());
        let mut routed = 0;
        while let Ok(Some(_)) = routed_rx.try_recv() {
            routed += 1;
        }
        assert_eq!(routed, 5);
    }
}
