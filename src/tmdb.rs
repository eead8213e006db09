use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::time::Duration;

use crate::filter::{FilterSpec, MediaCategory, MediaRecord};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

pub const CERTIFICATION_COUNTRY: &str = "US";
pub const MAX_DISCOVER_PAGES: u32 = 5;

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn discover(&self, spec: &FilterSpec, page: u32) -> Result<DiscoverPage>;
    async fn search(&self, category: MediaCategory, query: &str, page: u32)
        -> Result<DiscoverPage>;
    async fn fetch_detail(&self, category: MediaCategory, id: i64) -> Result<Value>;
}

/// One page of normalized results, mirroring the upstream page envelope.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverPage {
    pub page: u32,
    pub results: Vec<MediaRecord>,
    pub total_pages: u32,
    pub total_results: u64,
}

impl TmdbClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let user_agent = format!("cinesuggest/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn discover(&self, spec: &FilterSpec, page: u32) -> Result<DiscoverPage> {
        let path = discover_query(spec);
        let sep = if path.contains('?') { '&' } else { '?' };
        let url = format!(
            "{TMDB_BASE}/{path}{sep}api_key={}&page={page}",
            self.api_key
        );
        match spec.media_category {
            MediaCategory::Movie => {
                let data: PageEnvelope<MovieRecord> = self.get_json(&url).await?;
                Ok(data.normalize())
            }
            MediaCategory::Tv => {
                let data: PageEnvelope<ShowRecord> = self.get_json(&url).await?;
                Ok(data.normalize())
            }
        }
    }

    async fn search(
        &self,
        category: MediaCategory,
        query: &str,
        page: u32,
    ) -> Result<DiscoverPage> {
        let url = format!(
            "{TMDB_BASE}/search/{}?api_key={}&query={}&page={page}",
            category.as_str(),
            self.api_key,
            urlencoding::encode(query)
        );
        match category {
            MediaCategory::Movie => {
                let data: PageEnvelope<MovieRecord> = self.get_json(&url).await?;
                Ok(data.normalize())
            }
            MediaCategory::Tv => {
                let data: PageEnvelope<ShowRecord> = self.get_json(&url).await?;
                Ok(data.normalize())
            }
        }
    }

    async fn fetch_detail(&self, category: MediaCategory, id: i64) -> Result<Value> {
        let url = format!(
            "{TMDB_BASE}/{}/{id}?api_key={}&append_to_response=credits,videos",
            category.as_str(),
            self.api_key
        );
        self.get_json(&url).await
    }
}

impl TmdbClient {
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}", url, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

/// Builds the discover request path for a filter spec. Pure string
/// construction, no I/O; an empty spec yields the bare resource path.
/// Parameter names and order are the upstream discovery contract.
pub fn discover_query(spec: &FilterSpec) -> String {
    let mut query = format!("discover/{}", spec.media_category.as_str());
    let mut params: Vec<String> = Vec::new();

    if let Some(year) = spec.year {
        params.push(format!("primary_release_year={year}"));
    }
    if !spec.genres.is_empty() {
        let ids: Vec<String> = spec.genres.iter().map(|g| g.to_string()).collect();
        params.push(format!("with_genres={}", ids.join(",")));
    }
    if let Some(from) = spec.release_date_from {
        params.push(format!("release_date.gte={from}"));
    }
    if let Some(to) = spec.release_date_to {
        params.push(format!("release_date.lte={to}"));
    }
    if let Some(from) = spec.vote_average_from {
        params.push(format!("vote_average.gte={from}"));
    }
    if let Some(to) = spec.vote_average_to {
        params.push(format!("vote_average.lte={to}"));
    }
    if let Some(language) = &spec.language {
        params.push(format!("with_original_language={language}"));
    }
    if let Some(from) = spec.runtime_from {
        params.push(format!("with_runtime.gte={from}"));
    }
    if let Some(to) = spec.runtime_to {
        params.push(format!("with_runtime.lte={to}"));
    }
    if let Some(cert) = &spec.certification {
        params.push(format!(
            "certification_country={CERTIFICATION_COUNTRY}&certification={cert}"
        ));
    }
    if let Some(sort) = spec.sort_by {
        params.push(format!("sort_by={}", sort.as_str()));
    }

    if !params.is_empty() {
        query.push('?');
        query.push_str(&params.join("&"));
    }
    query
}

/// Fetches pages 1..=n and concatenates their results in page order.
pub async fn collect_pages(
    api: &dyn CatalogApi,
    spec: &FilterSpec,
    pages: u32,
) -> Result<Vec<MediaRecord>> {
    let pages = pages.clamp(1, MAX_DISCOVER_PAGES);
    let mut records = Vec::new();
    let mut total_pages = u32::MAX;
    for page in 1..=pages {
        if page > total_pages {
            break;
        }
        let batch = api.discover(spec, page).await?;
        total_pages = batch.total_pages;
        records.extend(batch.results);
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct PageEnvelope<T> {
    page: u32,
    results: Vec<T>,
    total_pages: u32,
    total_results: u64,
}

impl<T: Into<MediaRecord>> PageEnvelope<T> {
    fn normalize(self) -> DiscoverPage {
        DiscoverPage {
            page: self.page,
            results: self.results.into_iter().map(Into::into).collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub original_language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ShowRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub first_air_date: Option<NaiveDate>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub original_language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<MovieRecord> for MediaRecord {
    fn from(r: MovieRecord) -> Self {
        MediaRecord {
            id: r.id,
            category: MediaCategory::Movie,
            release_date: r.release_date,
            genre_ids: r.genre_ids,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
            original_language: r.original_language,
            extra: r.extra,
        }
    }
}

impl From<ShowRecord> for MediaRecord {
    fn from(r: ShowRecord) -> Self {
        MediaRecord {
            id: r.id,
            category: MediaCategory::Tv,
            release_date: r.first_air_date,
            genre_ids: r.genre_ids,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
            original_language: r.original_language,
            extra: r.extra,
        }
    }
}

// The upstream sends "" for unknown dates; treat anything unparseable as absent.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<NaiveDate>().ok()))
}

// Fixed filter vocabularies exposed to API consumers.
pub const GENRES: [(i32, &str); 19] = [
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

pub const LANGUAGES: [(&str, &str); 21] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("hi", "Hindi"),
    ("ar", "Arabic"),
    ("nl", "Dutch"),
    ("tr", "Turkish"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("bn", "Bengali"),
    ("fa", "Persian"),
    ("pl", "Polish"),
    ("sv", "Swedish"),
    ("th", "Thai"),
];

pub const CERTIFICATIONS: [&str; 5] = ["G", "PG", "PG-13", "R", "NC-17"];
