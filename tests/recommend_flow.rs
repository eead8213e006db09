use chrono::NaiveDate;
use cinesuggest::recommend::{CatalogEntry, QuestionnaireAnswers, Recommender};
use rand::{rngs::StdRng, SeedableRng};

fn entry(id: i64, overview: &str, genres: &str, release_date: Option<&str>) -> CatalogEntry {
    CatalogEntry {
        id,
        title: format!("Title {id}"),
        overview: overview.to_string(),
        genres: genres.to_string(),
        keywords: String::new(),
        tagline: String::new(),
        release_date: release_date.map(|d| d.parse().expect("fixture date is valid")),
    }
}

fn today() -> NaiveDate {
    "2024-06-01".parse().expect("fixture date is valid")
}

fn pool_ids(recommender: &Recommender, answers: &QuestionnaireAnswers) -> Vec<i64> {
    recommender
        .filter(answers, today())
        .iter()
        .map(|e| e.id)
        .collect()
}

#[test]
fn seeded_sampling_is_deterministic() {
    let entries: Vec<CatalogEntry> = (1..=50)
        .map(|id| entry(id, "An adventure", "Action", Some("2022-01-01")))
        .collect();
    let recommender = Recommender::new(entries, Vec::new());
    let answers = QuestionnaireAnswers::default();

    let first = recommender.recommend(&answers, 5, today(), &mut StdRng::seed_from_u64(7));
    let second = recommender.recommend(&answers, 5, today(), &mut StdRng::seed_from_u64(7));
    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}

#[test]
fn oversized_pools_are_capped_before_sampling() {
    let entries: Vec<CatalogEntry> = (1..=600)
        .map(|id| entry(id, "Filler", "Drama", None))
        .collect();
    let recommender = Recommender::new(entries, Vec::new());
    let answers = QuestionnaireAnswers::default();

    let ids = recommender.recommend(&answers, 600, today(), &mut StdRng::seed_from_u64(1));
    assert_eq!(ids.len(), 500);
    assert!(ids.iter().all(|id| *id <= 500));
}

#[test]
fn mood_maps_to_genre_families() {
    let recommender = Recommender::new(
        vec![
            entry(1, "", "Comedy", None),
            entry(2, "", "Drama, Romance", None),
            entry(3, "", "Horror", None),
        ],
        Vec::new(),
    );

    let happy = QuestionnaireAnswers {
        mood: Some("Happy".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &happy), vec![1]);

    let sad = QuestionnaireAnswers {
        mood: Some("Sad".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &sad), vec![2]);
}

#[test]
fn category_keywords_filter_overviews() {
    let recommender = Recommender::new(
        vec![
            entry(1, "A Spy among thieves", "Thriller", None),
            entry(2, "A baking contest", "Reality", None),
        ],
        Vec::new(),
    );

    let spy = QuestionnaireAnswers {
        category: Some("Spy Movies".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &spy), vec![1]);

    // The New York list ends with an empty alternative, so every overview matches.
    let new_york = QuestionnaireAnswers {
        category: Some("Movies set in New York City".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &new_york), vec![1, 2]);
}

#[test]
fn top_rated_category_swaps_the_pool() {
    let recommender = Recommender::new(
        vec![entry(1, "", "Action", None), entry(2, "", "Drama", None)],
        vec![entry(10, "", "Crime", None), entry(11, "", "Drama", None)],
    );

    let top = QuestionnaireAnswers {
        category: Some("IMDb Top 250 Movies".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &top), vec![10, 11]);
}

#[test]
fn friends_occasion_accepts_both_spellings() {
    let recommender = Recommender::new(
        vec![entry(1, "", "Comedy", None), entry(2, "", "Drama", None)],
        Vec::new(),
    );

    for occasion in ["Movie Night with friends", "Movie Night with Friends"] {
        let answers = QuestionnaireAnswers {
            occasion: Some(occasion.to_string()),
            ..QuestionnaireAnswers::default()
        };
        assert_eq!(pool_ids(&recommender, &answers), vec![1], "{occasion}");
    }
}

#[test]
fn age_cutoff_is_january_first() {
    let recommender = Recommender::new(
        vec![
            entry(1, "", "Drama", Some("2021-01-01")),
            entry(2, "", "Drama", Some("2020-12-31")),
            entry(3, "", "Drama", None),
        ],
        Vec::new(),
    );

    let recent = QuestionnaireAnswers {
        age: Some("Published in the last 3 years".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &recent), vec![1]);
}

#[test]
fn unknown_answers_leave_the_pool_untouched() {
    let recommender = Recommender::new(
        vec![entry(1, "", "Action", None), entry(2, "", "Drama", None)],
        Vec::new(),
    );

    let answers = QuestionnaireAnswers {
        mood: Some("Neutral".to_string()),
        occasion: Some("Just watching by myself".to_string()),
        age: Some("Doesn't matter".to_string()),
        category: Some("Something entirely different".to_string()),
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &answers), vec![1, 2]);
}

#[test]
fn genre_answers_are_an_or() {
    let recommender = Recommender::new(
        vec![
            entry(1, "", "Action, Adventure", None),
            entry(2, "", "Drama, Romance", None),
            entry(3, "", "Horror", None),
        ],
        Vec::new(),
    );

    let answers = QuestionnaireAnswers {
        genre: vec!["Horror".to_string(), "Drama".to_string()],
        ..QuestionnaireAnswers::default()
    };
    assert_eq!(pool_ids(&recommender, &answers), vec![2, 3]);
}

#[test]
fn empty_catalog_yields_no_recommendations() {
    let recommender = Recommender::default();
    let answers = QuestionnaireAnswers::default();
    let ids = recommender.recommend(&answers, 30, today(), &mut StdRng::seed_from_u64(3));
    assert!(ids.is_empty());
}
