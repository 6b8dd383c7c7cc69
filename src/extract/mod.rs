//! Field extraction.
//!
//! Maps schema-less raw records onto [`NormalizedRecord`]. All null
//! handling for the pipeline happens here.

pub mod fields;

use crate::models::{NormalizedRecord, RawRecord, NO_TITLE};
use fields::{category, count, date, range, text};
use serde::{Deserialize, Serialize};

/// Kind of listing a collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Talk,
    Vacancy,
    Article,
}

impl ListingKind {
    /// Normalize one raw record of this kind.
    pub fn normalize(&self, raw: &RawRecord) -> NormalizedRecord {
        match self {
            ListingKind::Talk => normalize_talk(raw),
            ListingKind::Vacancy => normalize_vacancy(raw),
            ListingKind::Article => normalize_article(raw),
        }
    }

    /// Normalize a whole batch.
    pub fn normalize_all(&self, raws: &[RawRecord]) -> Vec<NormalizedRecord> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// Job vacancy from a JSON search API.
///
/// The salary stays absent when the API gives neither bound.
pub fn normalize_vacancy(raw: &RawRecord) -> NormalizedRecord {
    NormalizedRecord {
        id: text(raw, "id"),
        title: text(raw, "name").unwrap_or_default(),
        link: text(raw, "alternate_url"),
        company: category(raw, "employer.name"),
        city: category(raw, "area.name"),
        published: date(raw, "published_at"),
        salary: range(raw, "salary"),
        ..NormalizedRecord::default()
    }
}

/// Hub article scraped from an HTML listing.
///
/// Rating, views and comments default to zero rather than absent.
pub fn normalize_article(raw: &RawRecord) -> NormalizedRecord {
    let link = text(raw, "link");

    NormalizedRecord {
        id: text(raw, "id").or_else(|| link.clone()),
        title: text(raw, "title").unwrap_or_default(),
        link,
        author: category(raw, "author"),
        published: date(raw, "published"),
        rating: count(raw, "rating"),
        views: count(raw, "views"),
        comments: count(raw, "comments"),
        ..NormalizedRecord::default()
    }
}

/// Conference talk scraped from a schedule page.
///
/// A talk without a heading is kept under a placeholder title.
pub fn normalize_talk(raw: &RawRecord) -> NormalizedRecord {
    NormalizedRecord {
        id: text(raw, "id"),
        title: text(raw, "title").unwrap_or_else(|| NO_TITLE.to_string()),
        link: text(raw, "link"),
        company: category(raw, "company"),
        author: category(raw, "speaker"),
        ..NormalizedRecord::default()
    }
}
