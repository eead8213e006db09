use chrono::NaiveDate;
use cinesuggest::filter::{filter_media, FilterSpec, MediaCategory, MediaRecord, SortBy};
use cinesuggest::tmdb::{discover_query, MovieRecord, ShowRecord};
use serde_json::{json, Map};

fn date(s: &str) -> NaiveDate {
    s.parse().expect("test date is valid")
}

fn record(id: i64, release_date: Option<&str>) -> MediaRecord {
    MediaRecord {
        id,
        category: MediaCategory::Movie,
        release_date: release_date.map(date),
        genre_ids: Vec::new(),
        vote_average: 0.0,
        vote_count: 0,
        original_language: "en".to_string(),
        extra: Map::new(),
    }
}

fn ids(records: &[MediaRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

#[test]
fn empty_spec_yields_bare_resource_path() {
    assert_eq!(discover_query(&FilterSpec::default()), "discover/movie");

    let tv = FilterSpec {
        media_category: MediaCategory::Tv,
        ..FilterSpec::default()
    };
    assert_eq!(discover_query(&tv), "discover/tv");
}

#[test]
fn all_params_appear_in_wire_order() {
    let spec = FilterSpec {
        media_category: MediaCategory::Movie,
        genres: vec![28, 12],
        year: Some(2020),
        release_date_from: Some(date("2020-01-01")),
        release_date_to: Some(date("2020-12-31")),
        vote_average_from: Some(7.0),
        vote_average_to: Some(8.5),
        vote_count_from: None,
        vote_count_to: None,
        language: Some("en".to_string()),
        runtime_from: Some(90),
        runtime_to: Some(150),
        certification: Some("PG-13".to_string()),
        sort_by: Some(SortBy::ReleaseDateDesc),
    };
    assert_eq!(
        discover_query(&spec),
        "discover/movie?primary_release_year=2020&with_genres=28,12\
         &release_date.gte=2020-01-01&release_date.lte=2020-12-31\
         &vote_average.gte=7&vote_average.lte=8.5\
         &with_original_language=en&with_runtime.gte=90&with_runtime.lte=150\
         &certification_country=US&certification=PG-13\
         &sort_by=release_date.desc"
    );
}

#[test]
fn zero_bounds_still_emit() {
    let spec = FilterSpec {
        vote_average_from: Some(0.0),
        runtime_from: Some(0),
        ..FilterSpec::default()
    };
    assert_eq!(
        discover_query(&spec),
        "discover/movie?vote_average.gte=0&with_runtime.gte=0"
    );
}

#[test]
fn certification_param_carries_country() {
    let spec = FilterSpec {
        certification: Some("PG-13".to_string()),
        ..FilterSpec::default()
    };
    assert_eq!(
        discover_query(&spec),
        "discover/movie?certification_country=US&certification=PG-13"
    );
}

#[test]
fn vote_count_never_reaches_the_wire() {
    let spec = FilterSpec {
        vote_count_from: Some(100),
        vote_count_to: Some(5000),
        ..FilterSpec::default()
    };
    assert_eq!(discover_query(&spec), "discover/movie");
}

#[test]
fn default_spec_keeps_everything_in_order() {
    let records = vec![record(3, Some("2021-06-01")), record(1, None), record(2, None)];
    let spec = FilterSpec::default();

    let once = filter_media(records.clone(), &spec);
    assert_eq!(ids(&once), vec![3, 1, 2]);

    let twice = filter_media(once.clone(), &spec);
    assert_eq!(ids(&twice), ids(&once));
}

#[test]
fn year_requires_a_matching_release_date() {
    let spec = FilterSpec {
        year: Some(2020),
        ..FilterSpec::default()
    };
    let records = vec![
        record(1, Some("2020-05-17")),
        record(2, Some("2019-12-31")),
        record(3, None),
    ];
    assert_eq!(ids(&filter_media(records, &spec)), vec![1]);
}

#[test]
fn genres_match_any_of_the_requested() {
    let spec = FilterSpec {
        genres: vec![28, 99],
        ..FilterSpec::default()
    };
    let mut action = record(1, None);
    action.genre_ids = vec![12, 28];
    let mut animation = record(2, None);
    animation.genre_ids = vec![16];
    let unclassified = record(3, None);

    assert_eq!(
        ids(&filter_media(vec![action, animation, unclassified], &spec)),
        vec![1]
    );
}

#[test]
fn predicates_combine_with_and() {
    let mut media = record(1, Some("2020-05-01"));
    media.genre_ids = vec![28, 12];

    let included = FilterSpec {
        year: Some(2020),
        genres: vec![28],
        ..FilterSpec::default()
    };
    assert_eq!(ids(&filter_media(vec![media.clone()], &included)), vec![1]);

    let wrong_year = FilterSpec {
        year: Some(2019),
        ..included
    };
    assert!(filter_media(vec![media], &wrong_year).is_empty());
}

#[test]
fn date_range_boundaries_are_inclusive() {
    let spec = FilterSpec {
        release_date_from: Some(date("2020-01-01")),
        release_date_to: Some(date("2020-12-31")),
        ..FilterSpec::default()
    };
    let records = vec![
        record(1, Some("2020-01-01")),
        record(2, Some("2020-12-31")),
        record(3, Some("2019-12-31")),
        record(4, Some("2021-01-01")),
        record(5, None),
    ];
    assert_eq!(ids(&filter_media(records, &spec)), vec![1, 2]);
}

#[test]
fn reversed_date_range_excludes_everything() {
    let spec = FilterSpec {
        release_date_from: Some(date("2020-12-31")),
        release_date_to: Some(date("2020-01-01")),
        ..FilterSpec::default()
    };
    let records = vec![
        record(1, Some("2020-06-15")),
        record(2, Some("2020-01-01")),
        record(3, Some("2020-12-31")),
    ];
    assert!(filter_media(records, &spec).is_empty());
}

#[test]
fn vote_average_boundaries_are_inclusive() {
    let spec = FilterSpec {
        vote_average_from: Some(7.0),
        vote_average_to: Some(9.0),
        ..FilterSpec::default()
    };
    let mut records = Vec::new();
    for (id, avg) in [(1, 6.9), (2, 7.0), (3, 9.0), (4, 9.1)] {
        let mut r = record(id, None);
        r.vote_average = avg;
        records.push(r);
    }
    assert_eq!(ids(&filter_media(records, &spec)), vec![2, 3]);
}

#[test]
fn vote_count_trims_locally() {
    let spec = FilterSpec {
        vote_count_from: Some(100),
        ..FilterSpec::default()
    };
    let mut popular = record(1, None);
    popular.vote_count = 2500;
    let mut obscure = record(2, None);
    obscure.vote_count = 99;

    assert_eq!(ids(&filter_media(vec![popular, obscure], &spec)), vec![1]);
}

#[test]
fn language_is_exact_equality() {
    let spec = FilterSpec {
        language: Some("en".to_string()),
        ..FilterSpec::default()
    };
    let english = record(1, None);
    let mut french = record(2, None);
    french.original_language = "fr".to_string();
    let mut unset = record(3, None);
    unset.original_language = String::new();

    assert_eq!(ids(&filter_media(vec![english, french, unset], &spec)), vec![1]);
}

#[test]
fn show_dates_resolve_at_ingestion() {
    let show: ShowRecord = serde_json::from_value(json!({
        "id": 1399,
        "name": "Game of Thrones",
        "first_air_date": "2011-04-17",
        "genre_ids": [18],
        "vote_average": 8.4,
        "vote_count": 21000,
        "original_language": "en"
    }))
    .expect("show payload deserializes");
    let media = MediaRecord::from(show);
    assert_eq!(media.category, MediaCategory::Tv);
    assert_eq!(media.release_date, Some(date("2011-04-17")));

    let year_spec = FilterSpec {
        media_category: MediaCategory::Tv,
        year: Some(2011),
        ..FilterSpec::default()
    };
    assert_eq!(ids(&filter_media(vec![media], &year_spec)), vec![1399]);
}

#[test]
fn blank_upstream_dates_become_absent() {
    let movie: MovieRecord = serde_json::from_value(json!({
        "id": 7,
        "title": "Unreleased",
        "release_date": "",
        "vote_average": 0,
        "vote_count": 0
    }))
    .expect("movie payload deserializes");
    let media = MediaRecord::from(movie);
    assert_eq!(media.release_date, None);

    let spec = FilterSpec {
        year: Some(2024),
        ..FilterSpec::default()
    };
    assert!(filter_media(vec![media], &spec).is_empty());
}

#[test]
fn unknown_fields_ride_through_serialization() {
    let movie: MovieRecord = serde_json::from_value(json!({
        "id": 550,
        "title": "Fight Club",
        "poster_path": "/poster.jpg",
        "release_date": "1999-10-15",
        "genre_ids": [18],
        "vote_average": 8.4,
        "vote_count": 26000,
        "original_language": "en"
    }))
    .expect("movie payload deserializes");
    let media = MediaRecord::from(movie);

    let out = serde_json::to_value(&media).expect("record serializes");
    assert_eq!(out["media_type"], "movie");
    assert_eq!(out["title"], "Fight Club");
    assert_eq!(out["poster_path"], "/poster.jpg");
    assert_eq!(out["release_date"], "1999-10-15");
}
