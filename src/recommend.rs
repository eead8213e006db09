//! Questionnaire-driven recommendations over a local catalog snapshot.
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use tracing::info;

pub const DEFAULT_RECOMMENDATIONS: usize = 30;
// The filtered pool is capped before sampling so one broad answer set cannot
// dominate the draw with the whole catalog.
const FILTER_CAP: usize = 500;

const TOP_RATED_CATEGORY: &str = "IMDb Top 250 Movies";

/// One row of the offline catalog snapshot. Genres and keywords are the
/// snapshot's display-name strings, matched by substring like the datasets
/// they were exported from.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default, deserialize_with = "crate::tmdb::lenient_date")]
    pub release_date: Option<NaiveDate>,
}

/// Raw questionnaire answers. Unrecognized or empty values never fail, they
/// simply leave the pool unconstrained.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuestionnaireAnswers {
    pub mood: Option<String>,
    pub genre: Vec<String>,
    pub occasion: Option<String>,
    pub age: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct Recommender {
    movies: Vec<CatalogEntry>,
    top_rated: Vec<CatalogEntry>,
}

impl Recommender {
    pub fn new(movies: Vec<CatalogEntry>, top_rated: Vec<CatalogEntry>) -> Self {
        Self { movies, top_rated }
    }

    pub fn from_files(movies_path: &str, top_rated_path: &str) -> Result<Self> {
        let movies = load_catalog(movies_path)?;
        let top_rated = load_catalog(top_rated_path)?;
        info!(
            "Loaded {} catalog titles and {} top rated titles",
            movies.len(),
            top_rated.len()
        );
        Ok(Self { movies, top_rated })
    }

    /// Applies the questionnaire filters in order: category, mood, genre,
    /// occasion, age. The top-rated category swaps the pool to the top-rated
    /// snapshot instead of matching keywords.
    pub fn filter(&self, answers: &QuestionnaireAnswers, today: NaiveDate) -> Vec<&CatalogEntry> {
        let mut pool: Vec<&CatalogEntry> =
            if answers.category.as_deref() == Some(TOP_RATED_CATEGORY) {
                self.top_rated.iter().collect()
            } else {
                self.movies.iter().collect()
            };

        if let Some(keywords) = answers.category.as_deref().and_then(category_keywords) {
            pool.retain(|m| contains_any(&m.overview, keywords));
        }

        if let Some(genres) = mood_genres(answers.mood.as_deref()) {
            pool.retain(|m| contains_any(&m.genres, genres));
        }

        if !answers.genre.is_empty() {
            pool.retain(|m| answers.genre.iter().any(|g| m.genres.contains(g.as_str())));
        }

        if let Some(genres) = occasion_genres(answers.occasion.as_deref()) {
            pool.retain(|m| contains_any(&m.genres, genres));
        }

        if let Some(cutoff) = age_cutoff(answers.age.as_deref(), today) {
            pool.retain(|m| m.release_date.map_or(false, |d| d >= cutoff));
        }

        pool
    }

    /// Samples up to `limit` ids uniformly from the filtered pool. An empty
    /// pool yields an empty list, never an error.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        answers: &QuestionnaireAnswers,
        limit: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> Vec<i64> {
        let mut pool = self.filter(answers, today);
        pool.truncate(FILTER_CAP);
        pool.choose_multiple(rng, limit).map(|m| m.id).collect()
    }
}

fn load_catalog(path: &str) -> Result<Vec<CatalogEntry>> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {path}"))
}

// Pipe-separated keyword lists, matched case-sensitively as substrings. A
// trailing pipe yields an empty keyword that matches everything; the New York
// list carries one.
fn contains_any(haystack: &str, keywords: &str) -> bool {
    keywords.split('|').any(|k| haystack.contains(k))
}

fn mood_genres(mood: Option<&str>) -> Option<&'static str> {
    match mood? {
        "Happy" => Some("Comedy|Adventure|Family"),
        "Sad" => Some("Drama|Romance"),
        _ => None,
    }
}

fn occasion_genres(occasion: Option<&str>) -> Option<&'static str> {
    match occasion? {
        "Movie Date" => Some("Romance"),
        // The friends-night label circulates with both capitalizations.
        "Movie Night with friends" | "Movie Night with Friends" => Some("Comedy|Action|Thriller"),
        "Watching a movie with family or relatives" => Some("Family"),
        _ => None,
    }
}

fn age_cutoff(age: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let years_back = match age? {
        "Published in the last 3 years" => 3,
        "Published in the last 5 years" => 5,
        "Published in the last 10 years" => 10,
        "Published in the last 20 years" => 20,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(today.year() - years_back, 1, 1)
}

fn category_keywords(category: &str) -> Option<&'static str> {
    match category {
        "Movies based on a true story" => Some(TRUE_STORY_KEYWORDS),
        "Movies that may change the way you look at life" => Some(LIFE_CHANGING_KEYWORDS),
        "Movies set in New York City" => Some(NEW_YORK_KEYWORDS),
        "Spy Movies" => Some(SPY_KEYWORDS),
        "Cop Movies" => Some(COP_KEYWORDS),
        "Space Movies" => Some(SPACE_KEYWORDS),
        "Wedding Movies" => Some(WEDDING_KEYWORDS),
        "Heist Movies" => Some(HEIST_KEYWORDS),
        "Movies based on a book" => Some(BOOK_KEYWORDS),
        "Racing Movies" => Some(RACING_KEYWORDS),
        "Girl Power Movies" => Some(GIRL_POWER_KEYWORDS),
        "Movies set in Las Vegas" => Some(LAS_VEGAS_KEYWORDS),
        "Movies with pre- or sequels" => Some(SEQUEL_KEYWORDS),
        _ => None,
    }
}

const TRUE_STORY_KEYWORDS: &str = "based on a true story|Based on a True Story|Inspired by True Events|Biographical|Biography|True Story|Real Events|Historical|Non-Fiction|Life Story|Documentary|Docudrama|Authentic|Based on Real Life|Real People|Fact-based|Real-life Drama|True Crime|Factual|Real Events Adaptation|Historical Drama|True Events Retelling|Life and Times|Personal Journey|Famous Figures|Cultural Impact|Documented Events|Historical Figures|Chronicle|Narrative Non-Fiction|True Life|Verité|Memoir|Historical Accuracy|Factually Inspired|Actual Events|Biopic";

const LIFE_CHANGING_KEYWORDS: &str = "Life-changing|Transformational|Inspirational|Thought-provoking|Eye-opening|Reflective|Perspective Shift|Personal Growth|Self-discovery|Motivational|Existential|Philosophical|Life Lessons|Human Experience|Journey|Coming of Age|Overcoming Adversity|Triumph|Redemption|Awakening|Life Choices|Value of Life|Emotional Impact|Self-Reflection|Impactful|Cultural Insight|Realizations|Change|Enlightenment|Heartwarming|Dramatic Transformation|Life Altering|New Perspectives|Life's Journey|Finding Purpose|Defining Moments|Mindfulness|Legacy|Authenticity";

const NEW_YORK_KEYWORDS: &str = "New York City|Park|Empire State Building|Statue of Liberty|Wall Street|New York Subway|Broadway|Skyscrapers|New York Skyline|New York Streets|New York Taxi|NYC Police|New York Crime|New York Mafia|New York Gangsters|New York Nightlife|New York Apartments|New York Real Estate|New York Architecture|New York Landmarks|Upper East Side|Lower East Side|New York City Drama|New York Romance|New York Comedy|NYC Action|NYC Thriller|New York Culture|New York Immigrants|New York Fashion|New York Restaurants|New York Media|New York Financial District|New York in Winter|New York Summer|";

const SPY_KEYWORDS: &str = "Spy|Spy Thriller|Secret Agent|Espionage|Undercover|Double Agent|Covert Operation|Intelligence Agency|CIA|MI6|FBI|KGB|Spy Mission|Code Name|Assassination|Spy Ring|Black Ops|Top Secret|Cold War|Spy Network|Surveillance|Bugging|Infiltration|Deception|Disguise|Stealth|Sabotage|Espionage Thriller|Spy Gadgets|Agent in Peril|Mole|Spy vs Spy|Field Agent|Espionage Plot|Spy Conspiracy|Spy Drama|Spy Action|Spy Chase|Espionage Agency|Secret Mission|Global Espionage|Sleeper Agent";

const COP_KEYWORDS: &str = "Cop|Police Officer|Detective|Undercover Cop|Law Enforcement|Police Procedural|Crime Investigation|Homicide Detective|Narcotics Detective|Vice Squad|Special Investigations Unit|Criminal Investigation|Police Force|SWAT Team|Crime Scene Investigation|FBI Investigation|Police Chase|Police Shootout|Crime Thriller|Internal Affairs|Corrupt Cop|Police Interrogation|Police Squad|Hostage Negotiation|Police Drama|Cop Duo|Cop Action|Bad Cop|Rookie Cop|Dirty Cop|Lawman|Police Raid|Cop Thriller|Detective Thriller|Patrol Officer";

const SPACE_KEYWORDS: &str = "Space|Outer Space|Deep Space|Space Exploration|Space Travel|Space Mission|Space Station|Space Colony|Spacecraft|Spaceship|Space Shuttle|Mars|Moon|Planet|Interplanetary|Alien Planet|Solar System|Black Hole|Wormhole|Astronaut|Cosmonaut|Space Engineer|Space Crew|Space Commander|Aliens|Alien Invasion|Extraterrestrial|First Contact|Galactic War|Space Battle|Space War|Space Combat|Space Pirates|Space Opera|Starship|Space Suits|Artificial Intelligence|AI|Robots|Dystopia|Utopia|Terraforming|Zero Gravity|Microgravity|Asteroid|Comet|Supernova|Meteor Shower|Space Anomaly|Cosmic Event|Space-Time|Cosmic Rays|Gravitational Waves|Space Adventure|Space Rescue|Space Survival|Lost in Space|Space Colonization|Space Race|Intergalactic|Spaceship Crash|Space Horror";

const WEDDING_KEYWORDS: &str = "Wedding|Wedding Event|Wedding Ceremony|Wedding Planning|Wedding Reception|Bride|Groom|Bridesmaids|Groomsmen|Wedding Dress|Bachelor Party|Bachelorette Party|Engagement|Wedding Venue|Romantic Themes|Love Story|Engagement|Proposal|Love Triangle|Second Chances|Family and Relationships|Family Drama|In-Laws|Father of the Bride|Mother of the Bride|Wedding Crashers|Exes at Weddings|Specific Types of Weddings|Destination Wedding|Beach Wedding|Royal Wedding|Elopement|Multicultural Wedding|Traditional Wedding|Big Fat Wedding|Wedding Planner|Wedding Photographer|Florist|Wedding Band";

const HEIST_KEYWORDS: &str = "Bank Heist|Jewelry Heist|Museum Heist|Art Heist|Robbery|Bank Robbery|Vault Robbery|Armed Robbery|Grand Theft|Smash-and-Grab|Train Robbery|Casino Robbery|Theft|Jewel Theft|Car Theft|Master Thief|Cat Burglar|Safe Cracking|Planning/Execution Terms|Caper|Inside Job|Master Plan|Elaborate Scheme|Double Cross|Getaway|Criminal Crew|Con Artists|Robbery Team|Partners in Crime|Accomplice";

const BOOK_KEYWORDS: &str = "based on a book|Based on a Book|Adaptation|Literary Adaptation|From Novel|Book to Film|Inspired by a Book|Based on a Novel|Book Adaptation|Screenplay Adaptation|Fictional Adaptation|Source Material|Novel Adaptation|Classic Literature|Bestseller Adaptation|Graphic Novel Adaptation|Young Adult Novel|Memoir Adaptation|Author's Work|Based on True Events|Book Series|Literary Classic|Film Adaptation|Page to Screen|Book Characters|Story from a Book|Reading to Film|Adapted Screenplay|Book Lovers|Literature on Screen|Cinematic Adaptation|Novelist|Book Inspiration|Book-to-Movie|Storytelling|Published Work|Literary Work";

const RACING_KEYWORDS: &str = "Racing|Car Racing|Street Racing|Drag Racing|Motorcycle Racing|NASCAR|Formula 1|Horse Racing|Boat Racing|Rally Racing|Fast Cars|Race Cars|Supercars|Grand Prix|Circuit Racing|Track Racing|Off-Road Racing|Speed";

const GIRL_POWER_KEYWORDS: &str = "Girl Power|Female Empowerment|Women Empowering Women|Strong Female Lead|Feminism|Girl Boss|Sisterhood|Women’s Rights|Female Protagonist|Girl Friendship|Breaking Stereotypes|Women in Charge|Self-Discovery|Independence|Women’s Stories|Feminist Themes|Empowered Women|Bold Women|Resilience|Women’s Journey|Overcoming Obstacles|Female Heroes|Girl Tribe|Challenging Norms|Women Supporting Women|Empowering Stories|Defying Expectations|Female Representation|Girlhood|Courageous Women|Women’s Achievements|Equality|Women in Leadership|Women’s Solidarity|Diversity|Girl Power Anthem|Inspirational Women|Women’s Narratives";

const LAS_VEGAS_KEYWORDS: &str = "Las Vegas|Vegas|Sin City|Casino|Gambling|High Stakes|Las Vegas Strip|Las Vegas Nights|Neon Lights|Showgirls|Slot Machines|Poker|Blackjack|Casino Heist|Las Vegas Weddings|Nightlife|Entertainment Capital|Las Vegas Shows|Viva Las Vegas|Desert City|Las Vegas Hotels|Fremont Street|Gambling Addiction|Vegas Parties|Chips|Las Vegas Locals|Las Vegas Attractions|Las Vegas Lifestyle|Las Vegas Casinos|Sin City Adventure|Las Vegas Nightclubs|Vegas Weddings|Las Vegas Events|Las Vegas Culture|The Mob|Las Vegas Drama|Las Vegas Comedy|Las Vegas Mystery|Las Vegas Romance|Vices|Big Win|Casino Royale";

const SEQUEL_KEYWORDS: &str = "Prequel|Sequel|Franchise|Follow-Up|Spin-Off|Continuing Story|Series|Film Series|Origin Story|Expanded Universe|Cliffhanger|Returning Characters|Part Two|Part Three|Second Installment|Third Installment|Prequel Trilogy|Sequel Trilogy|Reboot|Remake|Legacy Sequel|Chapter Two|Next Chapter|Series Continuation|Character Development|Character Arc|Story Continuation|Backstory|Cinematic Universe|Multi-part Film|Serialized Storytelling|Episodic|Anthology|Continuation|Next Generation|Cross-Over|Time Jump|Future Installment|Film Saga|Revisiting Characters|Recurring Themes|Recurring Cast";
