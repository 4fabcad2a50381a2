use std::{collections::BTreeSet, sync::Arc};

use serde::Serialize;
use tracing::{debug, instrument};

use super::{KeyPrefix, QueryCache, RefetchMode, RelatedQueries};

/// Outcome of one invalidation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
	/// Roots that were invalidated, after expanding related roots.
	pub roots: BTreeSet<String>,
	/// Entries that went stale because of this pass.
	pub stale_entries: usize,
}

/// Marks everything a mutation may have changed as stale.
#[derive(Clone)]
pub struct InvalidationCoordinator {
	cache: Arc<QueryCache>,
	related: Arc<RelatedQueries>,
	mode: RefetchMode,
}

impl InvalidationCoordinator {
	pub fn new(cache: Arc<QueryCache>, related: Arc<RelatedQueries>) -> Self {
		Self {
			cache,
			related,
			mode: RefetchMode::default(),
		}
	}

	#[must_use]
	pub const fn with_mode(mut self, mode: RefetchMode) -> Self {
		self.mode = mode;
		self
	}

	pub const fn cache(&self) -> &Arc<QueryCache> {
		&self.cache
	}

	pub const fn related(&self) -> &Arc<RelatedQueries> {
		&self.related
	}

	/// The given roots plus the roots each one lists, one level deep.
	pub fn roots_for<I, S>(&self, roots: I) -> BTreeSet<String>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		roots
			.into_iter()
			.flat_map(|root| self.related.expand(root.as_ref()))
			.collect()
	}

	#[instrument(skip_all)]
	pub async fn invalidate<I, S>(&self, roots: I) -> InvalidationReport
	where
		I: IntoIterator<Item = S> + Send,
		S: AsRef<str>,
	{
		let roots = self.roots_for(roots);
		let prefixes = roots.iter().map(KeyPrefix::root).collect::<Vec<_>>();

		let stale_entries = self.cache.invalidate(&prefixes, self.mode).await;

		debug!(?roots, stale_entries, "invalidated related queries");

		InvalidationReport {
			roots,
			stale_entries,
		}
	}
}
