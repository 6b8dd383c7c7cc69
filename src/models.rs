//! Data models for the listing statistics pipeline.
//!
//! Raw records come straight from a source and carry no schema. Everything
//! past the extractor works on [`NormalizedRecord`] and the summaries built
//! from it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when a categorical field is missing.
pub const NOT_SPECIFIED: &str = "not specified";

/// Title given to a talk whose card has no heading.
pub const NO_TITLE: &str = "no title";

/// A scraped or fetched item before normalization.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Salary-like range where either bound may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalaryRange {
    /// Lower bound.
    pub from: Option<f64>,
    /// Upper bound.
    pub to: Option<f64>,
}

impl SalaryRange {
    /// Midpoint of the range, the single present bound, or `None`.
    pub fn midpoint(&self) -> Option<f64> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some((from + to) / 2.0),
            (Some(from), None) => Some(from),
            (None, Some(to)) => Some(to),
            (None, None) => None,
        }
    }

    /// Lowest and highest value the range reaches.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let low = self.from.or(self.to)?;
        let high = self.to.or(self.from)?;
        Some((low, high))
    }
}

/// A typed, default-populated listing ready for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Source-provided identifier.
    pub id: Option<String>,
    /// Title of the talk, vacancy or article.
    pub title: String,
    /// Absolute link to the item.
    pub link: Option<String>,
    /// Company or employer name.
    pub company: String,
    /// City the listing belongs to.
    pub city: String,
    /// Author or speaker.
    pub author: String,
    /// Publication date.
    pub published: Option<NaiveDate>,
    /// Paired measure; absent when neither bound is known.
    pub salary: Option<SalaryRange>,
    /// Scalar measures, zero when missing.
    pub rating: i64,
    pub views: i64,
    pub comments: i64,
}

impl Default for NormalizedRecord {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            link: None,
            company: NOT_SPECIFIED.to_string(),
            city: NOT_SPECIFIED.to_string(),
            author: NOT_SPECIFIED.to_string(),
            published: None,
            salary: None,
            rating: 0,
            views: 0,
            comments: 0,
        }
    }
}

impl NormalizedRecord {
    /// Year and month of publication, if known.
    pub fn year_month(&self) -> Option<YearMonth> {
        self.published.map(YearMonth::from)
    }
}

/// Numeric measure that can be averaged per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Salary,
    Rating,
    Views,
    Comments,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Salary => write!(f, "Salary"),
            Measure::Rating => write!(f, "Rating"),
            Measure::Views => write!(f, "Views"),
            Measure::Comments => write!(f, "Comments"),
        }
    }
}

impl Measure {
    /// Value of this measure for a record.
    ///
    /// Salary is absent when the record has no bounds. Scalar measures are
    /// always present because the extractor defaults them to zero.
    pub fn value(&self, record: &NormalizedRecord) -> Option<f64> {
        match self {
            Measure::Salary => record.salary.and_then(|s| s.midpoint()),
            Measure::Rating => Some(record.rating as f64),
            Measure::Views => Some(record.views as f64),
            Measure::Comments => Some(record.comments as f64),
        }
    }

    /// Lowest and highest value this record contributes to min/max.
    pub fn bounds(&self, record: &NormalizedRecord) -> Option<(f64, f64)> {
        match self {
            Measure::Salary => record.salary.and_then(|s| s.bounds()),
            _ => self.value(record).map(|v| (v, v)),
        }
    }
}

/// Calendar month used as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Aggregate of all records sharing one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary<K> {
    /// Grouping key.
    pub key: K,
    /// Number of records in the group.
    pub count: usize,
    /// Average per requested measure, 0 when no member has it.
    pub averages: Vec<(Measure, f64)>,
}

impl<K> GroupSummary<K> {
    /// Average for a measure, 0 if it was not requested.
    pub fn average(&self, measure: Measure) -> f64 {
        self.averages
            .iter()
            .find(|(m, _)| *m == measure)
            .map(|(_, avg)| *avg)
            .unwrap_or(0.0)
    }
}

/// Global min/max/average of one measure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeasureStats {
    /// Records that have the measure.
    pub present: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// Records split by identifier into exclusive and shared parts.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub only_a: Vec<NormalizedRecord>,
    pub common: Vec<NormalizedRecord>,
    pub only_b: Vec<NormalizedRecord>,
}

impl Partition {
    /// Size of the union of both collections.
    pub fn union_len(&self) -> usize {
        self.only_a.len() + self.common.len() + self.only_b.len()
    }
}
