//! Collection records
//!
//! Providers disagree on what they call the identifier of a contact or a
//! document, so it is resolved through a list of legacy aliases. Records
//! without any usable identifier never enter a collection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::prelude::*;

/// A record as it arrives from the server
pub type RawRecord = Value;

/// Identifier aliases, in lookup order
pub const ID_ALIASES: [&str; 6] = ["userid", "userId", "contactId", "contactid", "uid", "id"];

/// Last-activity aliases used by chat contacts, in lookup order
pub const ACTIVITY_ALIASES: [&str; 3] = ["lastActivityAt", "last_chat_time", "lastChatTime"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub Box<str>);

impl RecordId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for RecordId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for RecordId {
	fn from(id: &str) -> Self {
		RecordId(id.into())
	}
}

/// A record admitted into a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
	pub id: RecordId,
	pub last_activity_at: Option<DateTime<Utc>>,
	pub data: Map<String, Value>,
}

impl Record {
	/// Admit a raw record, resolving its identifier and activity timestamp
	pub fn from_raw(raw: RawRecord) -> SyncResult<Self> {
		let Value::Object(data) = raw else {
			return Err(Error::NoIdentifier);
		};
		let id = resolve_id(&data).ok_or(Error::NoIdentifier)?;
		let last_activity_at = ACTIVITY_ALIASES
			.iter()
			.filter_map(|key| data.get(*key))
			.find_map(parse_timestamp);
		Ok(Self { id, last_activity_at, data })
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.data.get(key)
	}

	pub fn set(&mut self, key: impl Into<String>, value: Value) {
		self.data.insert(key.into(), value);
	}
}

/// First alias holding a non-null, non-empty string or a number wins
pub fn resolve_id(data: &Map<String, Value>) -> Option<RecordId> {
	ID_ALIASES.iter().filter_map(|key| data.get(*key)).find_map(|value| match value {
		Value::String(s) if !s.is_empty() => Some(RecordId(s.as_str().into())),
		Value::Number(n) => Some(RecordId(n.to_string().into())),
		_ => None,
	})
}

/// Parse a timestamp the way providers send them
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, bare dates (midnight UTC) and
/// epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
	match value {
		Value::String(s) => {
			let s = s.trim();
			if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
				return Some(dt.with_timezone(&Utc));
			}
			if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
				return Some(dt.and_utc());
			}
			NaiveDate::parse_from_str(s, "%Y-%m-%d")
				.ok()
				.and_then(|d| d.and_hms_opt(0, 0, 0))
				.map(|dt| dt.and_utc())
		}
		Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
		_ => None,
	}
}


// vim: ts=4
