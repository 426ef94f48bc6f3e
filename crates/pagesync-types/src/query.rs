//! Query description
//!
//! A [`QueryKey`] is the immutable value describing what the user currently
//! wants to see. It never carries a page number: pagination belongs to the
//! collection store, not to the query.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::prelude::*;

/// Document category (the documents API's single-letter codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
	C,
	D,
	F,
}

impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Category::C => "C",
			Category::D => "D",
			Category::F => "F",
		}
	}
}

impl std::str::FromStr for Category {
	type Err = Error;

	fn from_str(s: &str) -> SyncResult<Self> {
		match s {
			"C" | "c" => Ok(Category::C),
			"D" | "d" => Ok(Category::D),
			"F" | "f" => Ok(Category::F),
			_ => Err(Error::ValidationError(format!("unknown category: {}", s))),
		}
	}
}

/// Seen/unseen status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeenStatus {
	#[default]
	All,
	Seen,
	Unseen,
}

impl SeenStatus {
	/// The `isSeen` request parameter; `None` means "don't filter"
	pub fn is_seen(self) -> Option<bool> {
		match self {
			SeenStatus::All => None,
			SeenStatus::Seen => Some(true),
			SeenStatus::Unseen => Some(false),
		}
	}
}

impl std::str::FromStr for SeenStatus {
	type Err = Error;

	/// Unknown values fall back to `All`, the way the console treats its
	/// `status` URL parameter.
	fn from_str(s: &str) -> SyncResult<Self> {
		Ok(match s {
			"seen" => SeenStatus::Seen,
			"unseen" => SeenStatus::Unseen,
			_ => SeenStatus::All,
		})
	}
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
	pub start: NaiveDate,
	pub end: NaiveDate,
}

impl DateRange {
	pub fn new(start: NaiveDate, end: NaiveDate) -> SyncResult<Self> {
		if start > end {
			return Err(Error::ValidationError(format!(
				"date range start {} is after end {}",
				start, end
			)));
		}
		Ok(Self { start, end })
	}

	/// The `days` days up to and including `today`
	pub fn last_days(today: NaiveDate, days: u64) -> Self {
		let start = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
		Self { start, end: today }
	}
}

/// What the user currently wants to see
///
/// Equality compares every field; filters are kept in a sorted set so the
/// order in which the user picked them never makes two keys differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
	search: Box<str>,
	filters: BTreeSet<Box<str>>,
	category: Option<Category>,
	status: SeenStatus,
	flagged: Option<bool>,
	date_range: Option<DateRange>,
	page_size: u32,
}

impl QueryKey {
	pub fn builder(page_size: u32) -> QueryKeyBuilder {
		QueryKeyBuilder {
			key: QueryKey {
				search: "".into(),
				filters: BTreeSet::new(),
				category: None,
				status: SeenStatus::All,
				flagged: None,
				date_range: None,
				page_size,
			},
		}
	}

	pub fn search(&self) -> &str {
		&self.search
	}

	/// Type filters in canonical (sorted) order
	pub fn filters(&self) -> impl Iterator<Item = &str> {
		self.filters.iter().map(AsRef::as_ref)
	}

	pub fn category(&self) -> Option<Category> {
		self.category
	}

	pub fn status(&self) -> SeenStatus {
		self.status
	}

	pub fn flagged(&self) -> Option<bool> {
		self.flagged
	}

	pub fn date_range(&self) -> Option<DateRange> {
		self.date_range
	}

	pub fn page_size(&self) -> u32 {
		self.page_size
	}
}

pub struct QueryKeyBuilder {
	key: QueryKey,
}

impl QueryKeyBuilder {
	pub fn search(mut self, search: impl Into<Box<str>>) -> Self {
		self.key.search = search.into();
		self
	}

	pub fn filter(mut self, filter: impl Into<Box<str>>) -> Self {
		self.key.filters.insert(filter.into());
		self
	}

	pub fn filters(mut self, filters: impl IntoIterator<Item = impl Into<Box<str>>>) -> Self {
		self.key.filters = filters.into_iter().map(Into::into).collect();
		self
	}

	pub fn category(mut self, category: Option<Category>) -> Self {
		self.key.category = category;
		self
	}

	pub fn status(mut self, status: SeenStatus) -> Self {
		self.key.status = status;
		self
	}

	pub fn flagged(mut self, flagged: Option<bool>) -> Self {
		self.key.flagged = flagged;
		self
	}

	pub fn date_range(mut self, date_range: Option<DateRange>) -> Self {
		self.key.date_range = date_range;
		self
	}

	pub fn build(self) -> SyncResult<QueryKey> {
		if self.key.page_size == 0 {
			return Err(Error::ValidationError("page size must be positive".into()));
		}
		if self.key.filters.iter().any(|f| f.is_empty()) {
			return Err(Error::ValidationError("empty type filter".into()));
		}
		Ok(self.key)
	}
}

/// Partial query change coming from the rendering layer
///
/// Only the fields that are set replace the corresponding fields of the
/// current key. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
	pub search: Option<Box<str>>,
	pub filters: Option<BTreeSet<Box<str>>>,
	pub category: Option<Option<Category>>,
	pub status: Option<SeenStatus>,
	pub flagged: Option<Option<bool>>,
	pub date_range: Option<Option<DateRange>>,
	pub page_size: Option<u32>,
}

impl QueryPatch {
	pub fn search(search: impl Into<Box<str>>) -> Self {
		Self { search: Some(search.into()), ..Self::default() }
	}

	pub fn with_filters(mut self, filters: impl IntoIterator<Item = impl Into<Box<str>>>) -> Self {
		self.filters = Some(filters.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_category(mut self, category: Option<Category>) -> Self {
		self.category = Some(category);
		self
	}

	pub fn with_status(mut self, status: SeenStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn with_flagged(mut self, flagged: Option<bool>) -> Self {
		self.flagged = Some(flagged);
		self
	}

	pub fn with_date_range(mut self, date_range: Option<DateRange>) -> Self {
		self.date_range = Some(date_range);
		self
	}

	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = Some(page_size);
		self
	}

	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}

	/// Produce a new key from `base` with this patch's fields applied
	pub fn apply(&self, base: &QueryKey) -> SyncResult<QueryKey> {
		let mut builder = QueryKey::builder(self.page_size.unwrap_or(base.page_size))
			.search(self.search.clone().unwrap_or_else(|| base.search.clone()))
			.category(self.category.unwrap_or(base.category))
			.status(self.status.unwrap_or(base.status))
			.flagged(self.flagged.unwrap_or(base.flagged))
			.date_range(self.date_range.unwrap_or(base.date_range));
		builder.key.filters = self.filters.clone().unwrap_or_else(|| base.filters.clone());
		builder.build()
	}
}

impl From<QueryKey> for QueryPatch {
	fn from(key: QueryKey) -> Self {
		Self {
			search: Some(key.search),
			filters: Some(key.filters),
			category: Some(key.category),
			status: Some(key.status),
			flagged: Some(key.flagged),
			date_range: Some(key.date_range),
			page_size: Some(key.page_size),
		}
	}
}


// vim: ts=4
