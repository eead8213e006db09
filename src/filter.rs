//! Filter criteria and the local predicate filter applied to already-fetched catalog records.
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    #[default]
    Movie,
    Tv,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Movie => "movie",
            MediaCategory::Tv => "tv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
}

impl SortBy {
    pub const ALL: [SortBy; 6] = [
        SortBy::PopularityDesc,
        SortBy::PopularityAsc,
        SortBy::ReleaseDateDesc,
        SortBy::ReleaseDateAsc,
        SortBy::VoteAverageDesc,
        SortBy::VoteAverageAsc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::PopularityAsc => "popularity.asc",
            SortBy::PopularityDesc => "popularity.desc",
            SortBy::ReleaseDateAsc => "release_date.asc",
            SortBy::ReleaseDateDesc => "release_date.desc",
            SortBy::VoteAverageAsc => "vote_average.asc",
            SortBy::VoteAverageDesc => "vote_average.desc",
        }
    }
}

/// Search constraints. Every field is independently optional; an absent field
/// never constrains its dimension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub media_category: MediaCategory,
    pub genres: Vec<i32>,
    pub year: Option<i32>,
    pub release_date_from: Option<NaiveDate>,
    pub release_date_to: Option<NaiveDate>,
    pub vote_average_from: Option<f64>,
    pub vote_average_to: Option<f64>,
    pub vote_count_from: Option<i64>,
    pub vote_count_to: Option<i64>,
    pub language: Option<String>,
    pub runtime_from: Option<i32>,
    pub runtime_to: Option<i32>,
    pub certification: Option<String>,
    pub sort_by: Option<SortBy>,
}

/// One catalog record, normalized at ingestion: movies and shows carry their
/// release date under different field names upstream, so the date is resolved
/// once when the record is built and predicates never branch on category.
/// Fields not consumed by the filter ride along in `extra` untouched.
#[derive(Debug, Clone, Serialize)]
pub struct MediaRecord {
    pub id: i64,
    #[serde(rename = "media_type")]
    pub category: MediaCategory,
    pub release_date: Option<NaiveDate>,
    pub genre_ids: Vec<i32>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub original_language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Order-preserving subsequence of `records` matching every active predicate.
pub fn filter_media(records: Vec<MediaRecord>, spec: &FilterSpec) -> Vec<MediaRecord> {
    records.into_iter().filter(|r| matches(r, spec)).collect()
}

pub fn matches(record: &MediaRecord, spec: &FilterSpec) -> bool {
    year_matches(record, spec.year)
        && genres_match(record, &spec.genres)
        && in_range(
            record.release_date,
            spec.release_date_from,
            spec.release_date_to,
        )
        && in_range(
            Some(record.vote_average),
            spec.vote_average_from,
            spec.vote_average_to,
        )
        && in_range(
            Some(record.vote_count),
            spec.vote_count_from,
            spec.vote_count_to,
        )
        && language_matches(record, spec.language.as_deref())
}

fn year_matches(record: &MediaRecord, year: Option<i32>) -> bool {
    match year {
        None => true,
        Some(y) => record.release_date.map_or(false, |d| d.year() == y),
    }
}

fn genres_match(record: &MediaRecord, genres: &[i32]) -> bool {
    genres.is_empty() || genres.iter().any(|g| record.genre_ids.contains(g))
}

fn language_matches(record: &MediaRecord, language: Option<&str>) -> bool {
    match language {
        None => true,
        Some(code) => record.original_language == code,
    }
}

// Inclusive one- or two-sided range check. A record missing the value fails
// any active bound; a reversed range (from > to) admits nothing.
fn in_range<T: PartialOrd>(value: Option<T>, from: Option<T>, to: Option<T>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    from.map_or(true, |f| value >= f) && to.map_or(true, |t| value <= t)
}
