use std::sync::Arc;

use once_cell::sync::Lazy;
use pd_query_cache::{QueryKeys, RelatedQueries};
use tracing::debug;

pub const ORDERS: &str = "orders";
pub const DESIGNS: &str = "designs";
pub const PROOFING_ORDERS: &str = "proofing-orders";
pub const PRODUCTIONS: &str = "productions";
pub const ACCOUNTINGS: &str = "accountings";
pub const CUSTOMERS: &str = "customers";
pub const DESIGN_TYPES: &str = "design-types";
pub const MATERIAL_TYPES: &str = "material-types";
pub const STOCKS: &str = "stocks";
pub const USERS: &str = "users";

/// Every resource root the backend exposes.
pub const ROOTS: [&str; 10] = [
	ORDERS,
	DESIGNS,
	PROOFING_ORDERS,
	PRODUCTIONS,
	ACCOUNTINGS,
	CUSTOMERS,
	DESIGN_TYPES,
	MATERIAL_TYPES,
	STOCKS,
	USERS,
];

/// Roots that go stale together, authored per entry and never expanded transitively.
static RELATED: Lazy<Arc<RelatedQueries>> = Lazy::new(|| {
	let related = RelatedQueries::from_entries([
		(
			ORDERS,
			vec![ORDERS, DESIGNS, PROOFING_ORDERS, PRODUCTIONS, ACCOUNTINGS],
		),
		(DESIGNS, vec![DESIGNS, ORDERS, PROOFING_ORDERS, PRODUCTIONS]),
		(PROOFING_ORDERS, vec![PROOFING_ORDERS, ORDERS, DESIGNS]),
		(PRODUCTIONS, vec![PRODUCTIONS, ORDERS, STOCKS]),
		(ACCOUNTINGS, vec![ACCOUNTINGS, ORDERS, CUSTOMERS]),
		(CUSTOMERS, vec![CUSTOMERS, ORDERS, ACCOUNTINGS]),
		(DESIGN_TYPES, vec![DESIGN_TYPES, MATERIAL_TYPES]),
		(MATERIAL_TYPES, vec![MATERIAL_TYPES, DESIGN_TYPES, STOCKS]),
		(STOCKS, vec![STOCKS, MATERIAL_TYPES, PRODUCTIONS]),
		(USERS, vec![USERS]),
	]);

	for (root, missing) in related.dangling() {
		debug!(%root, %missing, "related root has no entry of its own");
	}

	Arc::new(related)
});

pub fn related_queries() -> Arc<RelatedQueries> {
	Arc::clone(&RELATED)
}

#[must_use]
pub fn keys(root: &str) -> QueryKeys {
	QueryKeys::new(root)
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;

	#[test]
	fn every_root_has_an_entry_and_nothing_dangles() {
		let related = related_queries();

		let mut roots = ROOTS.to_vec();
		roots.sort_unstable();

		assert_eq!(related.roots(), roots);
		assert!(related.dangling().is_empty());
	}

	#[test]
	fn orders_invalidate_the_whole_order_pipeline() {
		assert_eq!(
			related_queries().expand(ORDERS),
			BTreeSet::from(
				[ORDERS, DESIGNS, PROOFING_ORDERS, PRODUCTIONS, ACCOUNTINGS].map(String::from)
			)
		);
	}

	#[test]
	fn type_tables_only_reach_each_other() {
		let expanded = related_queries().expand(DESIGN_TYPES);

		assert!(expanded.contains(MATERIAL_TYPES));
		assert!(!expanded.contains(DESIGNS));
		assert!(!expanded.contains(STOCKS));
	}
}
