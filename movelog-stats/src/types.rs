//! Core domain types: categories, periods, keywords and action records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Verb category an action is logged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// "did" (했어요)
    #[serde(rename = "did")]
    Do,
    /// "ate" (먹었어요)
    #[serde(rename = "ate")]
    Eat,
    /// "went" (갔어요)
    #[serde(rename = "went")]
    Go,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 3] = [Category::Do, Category::Eat, Category::Go];

    /// Wire and database representation, also used in cache keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Do => "did",
            Self::Eat => "ate",
            Self::Go => "went",
        }
    }

    /// Display label shown to users of the app.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Do => "했어요",
            Self::Eat => "먹었어요",
            Self::Go => "갔어요",
        }
    }

    /// Parse either the wire string or the display label.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.label() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown category: {s:?}")))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Time granularity of a stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Today
    Daily,
    /// The current ISO week
    Weekly,
    /// The current calendar month
    Monthly,
    /// All time
    Total,
}

impl Period {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Total => "total",
        }
    }

    /// Parse from the wire representation.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "total" => Ok(Self::Total),
            other => Err(Error::InvalidArgument(format!("unknown period: {other:?}"))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identifier of a keyword row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeywordId(pub i64);

impl fmt::Display for KeywordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an action record row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-chosen noun paired with one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    /// The noun, e.g. "climbing"
    pub noun: String,
    pub category: Category,
    /// User that owns the keyword
    pub owner_id: i64,
}

/// A noun found by a keyword search, with how often it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    /// Oldest keyword carrying the noun
    pub keyword_id: KeywordId,
    pub noun: String,
    /// Records across every keyword with this noun
    pub count: u64,
}

/// An immutable logged action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: RecordId,
    pub keyword_id: KeywordId,
    /// When the action happened, in the store's zone (UTC)
    pub timestamp: DateTime<Utc>,
}

/// An action record joined with its keyword.
///
/// This is the row shape every aggregation consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub record_id: RecordId,
    pub keyword_id: KeywordId,
    pub noun: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

impl KeywordRecord {
    /// Join a record with the keyword it references.
    #[must_use]
    pub fn new(record: &ActionRecord, keyword: &Keyword) -> Self {
        Self {
            record_id: record.id,
            keyword_id: keyword.id,
            noun: keyword.noun.clone(),
            category: keyword.category,
            timestamp: record.timestamp,
        }
    }

    /// Calendar date in the store's zone.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
