use std::{collections::BTreeSet, time::Duration};

use tokio::{
	sync::{broadcast, mpsc},
	task::JoinHandle,
	time::{sleep, Instant},
};
use tracing::{debug, error, trace};

use super::{Error, InvalidationCoordinator, InvalidationReport};

const REPORT_CHANNEL_CAPACITY: usize = 100;

/// Collects invalidation requests and runs them as one deduplicated pass per throttle window.
///
/// Mutations settling in quick succession then cost a single invalidation (and a single round of
/// refetches) instead of one each.
pub struct InvalidationBatcher {
	requests_tx: mpsc::UnboundedSender<BTreeSet<String>>,
	reports_tx: broadcast::Sender<InvalidationReport>,
	handle: JoinHandle<()>,
}

impl InvalidationBatcher {
	pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(10);

	#[must_use]
	pub fn spawn(coordinator: InvalidationCoordinator, throttle: Duration) -> Self {
		let throttle = throttle.max(Duration::from_millis(1));
		let (requests_tx, mut requests_rx) = mpsc::unbounded_channel::<BTreeSet<String>>();
		let (reports_tx, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);

		let handle = tokio::spawn({
			let reports_tx = reports_tx.clone();

			async move {
				let mut buf = BTreeSet::new();
				let window = sleep(throttle);
				tokio::pin!(window);

				loop {
					tokio::select! {
						roots = requests_rx.recv() => {
							if let Some(roots) = roots {
								// The first request of a batch opens its window
								if buf.is_empty() {
									window.as_mut().reset(Instant::now() + throttle);
								}
								buf.extend(roots);
							} else {
								flush(&coordinator, &reports_tx, &mut buf).await;
								debug!("Shutting down invalidation batcher, every handle was dropped");
								break;
							}
						}
						() = window.as_mut(), if !buf.is_empty() => {
							flush(&coordinator, &reports_tx, &mut buf).await;
						}
					}
				}
			}
		});

		Self {
			requests_tx,
			reports_tx,
			handle,
		}
	}

	/// Queues `roots` for the next pass. Related roots are expanded when the pass runs.
	pub fn request<I, S>(&self, roots: I) -> Result<(), Error>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let roots = roots.into_iter().map(Into::into).collect::<BTreeSet<_>>();
		trace!(?roots, "invalidation requested");

		self.requests_tx
			.send(roots)
			.map_err(|_| Error::BatcherClosed)
	}

	/// One report per pass that ran.
	pub fn subscribe(&self) -> broadcast::Receiver<InvalidationReport> {
		self.reports_tx.subscribe()
	}

	/// Runs whatever is still queued, then stops the background task.
	pub async fn shutdown(self) {
		let Self {
			requests_tx,
			handle,
			..
		} = self;

		drop(requests_tx);

		if let Err(e) = handle.await {
			error!(?e, "Invalidation batcher task failed");
		}
	}
}

async fn flush(
	coordinator: &InvalidationCoordinator,
	reports_tx: &broadcast::Sender<InvalidationReport>,
	buf: &mut BTreeSet<String>,
) {
	if buf.is_empty() {
		return;
	}

	let report = coordinator.invalidate(std::mem::take(buf)).await;

	// Nobody listening for reports is fine
	reports_tx.send(report).ok();
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::json;
	use tokio::time::timeout;
	use tracing_test::traced_test;

	use crate::{cache::tests::TestFetcher, EntryState, QueryCache, QueryKeys, RelatedQueries};

	use super::*;

	fn coordinator() -> InvalidationCoordinator {
		InvalidationCoordinator::new(
			QueryCache::new(Arc::new(TestFetcher::default())),
			Arc::new(RelatedQueries::from_entries([
				("orders", vec!["orders", "designs"]),
				("stocks", vec!["stocks"]),
			])),
		)
	}

	#[tokio::test]
	#[traced_test]
	async fn requests_in_one_window_share_a_pass() {
		let coordinator = coordinator();
		let cache = Arc::clone(coordinator.cache());
		cache.write(QueryKeys::new("designs").list(), json!([])).await;
		cache.write(QueryKeys::new("stocks").detail(2), json!({})).await;

		let batcher = InvalidationBatcher::spawn(coordinator, Duration::from_millis(50));
		let mut reports = batcher.subscribe();

		batcher.request(["orders"]).unwrap();
		batcher.request(["orders", "stocks"]).unwrap();

		let report = timeout(Duration::from_secs(5), reports.recv())
			.await
			.unwrap()
			.unwrap();

		assert_eq!(
			report.roots.into_iter().collect::<Vec<_>>(),
			vec!["designs", "orders", "stocks"]
		);
		assert_eq!(report.stale_entries, 2);
		assert!(matches!(
			reports.try_recv(),
			Err(broadcast::error::TryRecvError::Empty)
		));

		batcher.shutdown().await;
	}

	#[tokio::test]
	#[traced_test]
	async fn window_opens_with_the_first_request_after_idling() {
		let coordinator = coordinator();
		let cache = Arc::clone(coordinator.cache());
		cache.write(QueryKeys::new("orders").list(), json!([])).await;
		cache.write(QueryKeys::new("stocks").list(), json!([])).await;

		let batcher = InvalidationBatcher::spawn(coordinator, Duration::from_millis(50));
		let mut reports = batcher.subscribe();

		tokio::time::sleep(Duration::from_millis(200)).await;
		batcher.request(["orders"]).unwrap();
		tokio::time::sleep(Duration::from_millis(5)).await;
		batcher.request(["stocks"]).unwrap();

		let report = timeout(Duration::from_secs(5), reports.recv())
			.await
			.unwrap()
			.unwrap();

		assert_eq!(
			report.roots.into_iter().collect::<Vec<_>>(),
			vec!["designs", "orders", "stocks"]
		);
		assert_eq!(report.stale_entries, 2);
		assert!(timeout(Duration::from_millis(150), reports.recv()).await.is_err());

		batcher.shutdown().await;
	}

	#[tokio::test]
	#[traced_test]
	async fn shutdown_flushes_pending_requests() {
		let coordinator = coordinator();
		let cache = Arc::clone(coordinator.cache());
		let key = QueryKeys::new("stocks").list();
		cache.write(key.clone(), json!([])).await;

		let batcher = InvalidationBatcher::spawn(coordinator, Duration::from_secs(3600));
		batcher.request(["stocks"]).unwrap();
		batcher.shutdown().await;

		assert_eq!(cache.state(&key).await, Some(EntryState::Stale));
		assert!(logs_contain("Shutting down invalidation batcher"));
	}
}
