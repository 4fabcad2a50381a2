use std::collections::{BTreeSet, HashMap};

/// Static table of resource roots that go stale together.
///
/// Lookups are one level deep: if `a` lists `b` and `b` lists `c`, invalidating `a` does not
/// touch `c` unless `a` lists it too. Whoever writes the table decides each root's full set.
#[derive(Debug, Clone, Default)]
pub struct RelatedQueries {
	table: HashMap<String, BTreeSet<String>>,
}

impl RelatedQueries {
	pub fn from_entries<I, R, S>(entries: I) -> Self
	where
		I: IntoIterator<Item = (R, S)>,
		R: Into<String>,
		S: IntoIterator,
		S::Item: Into<String>,
	{
		let mut table = HashMap::<String, BTreeSet<String>>::new();
		for (root, related) in entries {
			table
				.entry(root.into())
				.or_default()
				.extend(related.into_iter().map(Into::into));
		}

		Self { table }
	}

	pub fn related(&self, root: &str) -> impl Iterator<Item = &str> {
		self.table
			.get(root)
			.into_iter()
			.flat_map(|related| related.iter().map(String::as_str))
	}

	/// `root` together with the roots it lists.
	#[must_use]
	pub fn expand(&self, root: &str) -> BTreeSet<String> {
		let mut roots = BTreeSet::from([root.to_string()]);
		roots.extend(self.related(root).map(str::to_string));
		roots
	}

	/// Sorted roots that have an entry in the table.
	#[must_use]
	pub fn roots(&self) -> Vec<&str> {
		let mut roots = self.table.keys().map(String::as_str).collect::<Vec<_>>();
		roots.sort_unstable();
		roots
	}

	/// `(root, related)` pairs where `related` has no entry of its own. Tolerated, since
	/// invalidating an extra root is harmless, but worth a look when editing the table.
	#[must_use]
	pub fn dangling(&self) -> Vec<(&str, &str)> {
		let mut dangling = self
			.table
			.iter()
			.flat_map(|(root, related)| {
				related
					.iter()
					.filter(move |related| !self.table.contains_key(*related))
					.map(move |related| (root.as_str(), related.as_str()))
			})
			.collect::<Vec<_>>();
		dangling.sort_unstable();
		dangling
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table() -> RelatedQueries {
		RelatedQueries::from_entries([
			("a", vec!["a", "b"]),
			("b", vec!["b", "c"]),
			("c", vec!["c", "ghost"]),
		])
	}

	#[test]
	fn expansion_is_one_level_only() {
		let related = table();

		assert_eq!(
			related.expand("a"),
			BTreeSet::from(["a".to_string(), "b".to_string()])
		);
		assert_eq!(related.expand("unknown"), BTreeSet::from(["unknown".to_string()]));
	}

	#[test]
	fn reports_dangling_roots() {
		assert_eq!(table().dangling(), vec![("c", "ghost")]);
		assert_eq!(table().roots(), vec!["a", "b", "c"]);
	}
}
