use std::{collections::BTreeMap, fmt};

use serde::{
	de::Deserializer,
	ser::{SerializeSeq, Serializer},
	Deserialize, Serialize,
};
use serde_json::Value;

use super::Error;

/// A filter value inside [`QueryParams`]. Floats are kept by their decimal text so keys stay
/// hashable and totally ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	Bool(bool),
	Int(i64),
	Text(String),
	List(Vec<ParamValue>),
}

impl ParamValue {
	fn from_json(name: &str, value: &Value) -> Result<Option<Self>, Error> {
		Ok(match value {
			Value::Null => None,
			Value::Bool(b) => Some(Self::Bool(*b)),
			Value::Number(n) => Some(n.as_i64().map_or_else(|| Self::Text(n.to_string()), Self::Int)),
			Value::String(s) => Some(Self::Text(s.clone())),
			Value::Array(items) => Some(Self::List(
				items
					.iter()
					.map(|item| Self::from_json(name, item))
					.filter_map(Result::transpose)
					.collect::<Result<_, _>>()?,
			)),
			Value::Object(_) => return Err(Error::UnsupportedParam(name.to_string())),
		})
	}

	fn to_json(&self) -> Value {
		match self {
			Self::Bool(b) => Value::Bool(*b),
			Self::Int(i) => Value::from(*i),
			Self::Text(s) => Value::String(s.clone()),
			Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
		}
	}

	fn to_query_value(&self) -> String {
		match self {
			Self::Bool(b) => b.to_string(),
			Self::Int(i) => i.to_string(),
			Self::Text(s) => s.clone(),
			Self::List(items) => items
				.iter()
				.map(Self::to_query_value)
				.collect::<Vec<_>>()
				.join(","),
		}
	}
}

impl From<bool> for ParamValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for ParamValue {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for ParamValue {
	fn from(i: i32) -> Self {
		Self::Int(i.into())
	}
}

impl From<&str> for ParamValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<String> for ParamValue {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl<T: Into<Self>> From<Vec<T>> for ParamValue {
	fn from(items: Vec<T>) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}
}

/// List filters. Sorted by name, so the order in which filters were set never splits the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
		self.0.insert(name.into(), value.into());
	}

	/// Builds params from a JSON object. `null` members are treated as unset filters.
	pub fn from_json(value: &Value) -> Result<Self, Error> {
		let object = value.as_object().ok_or(Error::ParamsNotAnObject)?;

		let mut params = Self::new();
		for (name, value) in object {
			if let Some(value) = ParamValue::from_json(name, value)? {
				params.0.insert(name.clone(), value);
			}
		}

		Ok(params)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&ParamValue> {
		self.0.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	#[must_use]
	pub fn to_json(&self) -> Value {
		Value::Object(
			self.0
				.iter()
				.map(|(name, value)| (name.clone(), value.to_json()))
				.collect(),
		)
	}

	/// Query-string pairs; lists are comma separated.
	#[must_use]
	pub fn to_query_pairs(&self) -> Vec<(String, String)> {
		self.0
			.iter()
			.map(|(name, value)| (name.clone(), value.to_query_value()))
			.collect()
	}
}

/// Identifier inside a detail key.
///
/// Ids are canonical: any text that is the plain decimal form of an `i64` (no sign other than a
/// leading `-`, no leading zeros) becomes [`ResourceId::Int`], so `detail(5)` and `detail("5")`
/// name the same entry while `detail("05")` does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ResourceId {
	Int(i64),
	Text(String),
}

impl ResourceId {
	fn canonical(text: String) -> Self {
		let digits = text.strip_prefix('-').unwrap_or(&text);
		let plain = !digits.is_empty()
			&& digits.bytes().all(|b| b.is_ascii_digit())
			&& (digits == "0" || !digits.starts_with('0'))
			&& text != "-0";

		match text.parse() {
			Ok(int) if plain => Self::Int(int),
			_ => Self::Text(text),
		}
	}
}

impl<'de> Deserialize<'de> for ResourceId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Int(i64),
			Text(String),
		}

		Ok(match Raw::deserialize(deserializer)? {
			Raw::Int(int) => Self::Int(int),
			Raw::Text(text) => Self::canonical(text),
		})
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(int) => write!(f, "{int}"),
			Self::Text(text) => f.write_str(text),
		}
	}
}

impl From<i64> for ResourceId {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}

impl From<i32> for ResourceId {
	fn from(int: i32) -> Self {
		Self::Int(int.into())
	}
}

impl From<u32> for ResourceId {
	fn from(int: u32) -> Self {
		Self::Int(int.into())
	}
}

impl From<String> for ResourceId {
	fn from(text: String) -> Self {
		Self::canonical(text)
	}
}

impl From<&str> for ResourceId {
	fn from(text: &str) -> Self {
		Self::canonical(text.to_string())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
	List,
	Detail,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Tail {
	List(Option<QueryParams>),
	Detail(ResourceId),
}

/// Cache key. Equality, hashing and ordering are structural, and the serialized form is the
/// array form used in logs and events: `["orders","list"]`, `["orders","list",{"page":2}]`,
/// `["orders","detail",5]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
	root: String,
	tail: Tail,
}

impl ResourceKey {
	#[must_use]
	pub fn root(&self) -> &str {
		&self.root
	}

	#[must_use]
	pub const fn segment(&self) -> Segment {
		match self.tail {
			Tail::List(_) => Segment::List,
			Tail::Detail(_) => Segment::Detail,
		}
	}

	#[must_use]
	pub const fn params(&self) -> Option<&QueryParams> {
		match &self.tail {
			Tail::List(params) => params.as_ref(),
			Tail::Detail(_) => None,
		}
	}

	#[must_use]
	pub const fn id(&self) -> Option<&ResourceId> {
		match &self.tail {
			Tail::Detail(id) => Some(id),
			Tail::List(_) => None,
		}
	}

	#[must_use]
	pub fn starts_with(&self, prefix: &KeyPrefix) -> bool {
		prefix.matches(self)
	}
}

impl Serialize for ResourceKey {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let len = match &self.tail {
			Tail::List(None) => 2,
			Tail::List(Some(_)) | Tail::Detail(_) => 3,
		};

		let mut seq = serializer.serialize_seq(Some(len))?;
		seq.serialize_element(&self.root)?;
		seq.serialize_element(&self.segment())?;
		match &self.tail {
			Tail::List(None) => {}
			Tail::List(Some(params)) => seq.serialize_element(params)?,
			Tail::Detail(id) => seq.serialize_element(id)?,
		}
		seq.end()
	}
}

impl fmt::Display for ResourceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&serde_json::to_string(self).map_err(|_| fmt::Error)?)
	}
}

/// Selects keys for invalidation or removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPrefix {
	/// Every key of a resource root.
	Root(String),
	/// Every list key, or every detail key, of a root.
	Segment(String, Segment),
	Exact(ResourceKey),
}

impl KeyPrefix {
	#[must_use]
	pub fn root(root: impl Into<String>) -> Self {
		Self::Root(root.into())
	}

	#[must_use]
	pub fn matches(&self, key: &ResourceKey) -> bool {
		match self {
			Self::Root(root) => key.root == *root,
			Self::Segment(root, segment) => key.root == *root && key.segment() == *segment,
			Self::Exact(exact) => key == exact,
		}
	}
}

impl fmt::Display for KeyPrefix {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Root(root) => write!(f, "[\"{root}\"]"),
			Self::Segment(root, Segment::List) => write!(f, "[\"{root}\",\"list\"]"),
			Self::Segment(root, Segment::Detail) => write!(f, "[\"{root}\",\"detail\"]"),
			Self::Exact(key) => write!(f, "{key}"),
		}
	}
}

/// Key builders for one resource root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKeys {
	root: String,
}

impl QueryKeys {
	#[must_use]
	pub fn new(root: impl Into<String>) -> Self {
		Self { root: root.into() }
	}

	#[must_use]
	pub fn root(&self) -> &str {
		&self.root
	}

	/// Prefix covering every key of this root.
	#[must_use]
	pub fn all(&self) -> KeyPrefix {
		KeyPrefix::Root(self.root.clone())
	}

	/// Prefix covering every list of this root, whatever its filters.
	#[must_use]
	pub fn lists(&self) -> KeyPrefix {
		KeyPrefix::Segment(self.root.clone(), Segment::List)
	}

	#[must_use]
	pub fn list(&self) -> ResourceKey {
		self.list_with(None)
	}

	/// Absent and empty params both collapse to [`Self::list`].
	#[must_use]
	pub fn list_with(&self, params: Option<QueryParams>) -> ResourceKey {
		ResourceKey {
			root: self.root.clone(),
			tail: Tail::List(params.filter(|params| !params.is_empty())),
		}
	}

	#[must_use]
	pub fn detail(&self, id: impl Into<ResourceId>) -> ResourceKey {
		ResourceKey {
			root: self.root.clone(),
			tail: Tail::Detail(id.into()),
		}
	}
}
