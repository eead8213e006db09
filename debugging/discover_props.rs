//! Build a discover query from filter flags, print it, and optionally run it.
//! Usage:
//!   cargo run --bin discover_props -- --year 2020 --genres 28,12 --sort popularity.desc
//!   cargo run --bin discover_props -- --tv --vote-gte 7 --fetch --pages 2
//! --fetch requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinesuggest::filter::{filter_media, FilterSpec, MediaCategory, SortBy};
use cinesuggest::tmdb::{collect_pages, discover_query, TmdbClient};
use dotenvy::dotenv;
use std::env;

fn parse_sort(s: &str) -> Result<SortBy> {
    let sort = match s {
        "popularity.asc" => SortBy::PopularityAsc,
        "popularity.desc" => SortBy::PopularityDesc,
        "release_date.asc" => SortBy::ReleaseDateAsc,
        "release_date.desc" => SortBy::ReleaseDateDesc,
        "vote_average.asc" => SortBy::VoteAverageAsc,
        "vote_average.desc" => SortBy::VoteAverageDesc,
        _ => anyhow::bail!("unknown sort key '{s}'"),
    };
    Ok(sort)
}

fn next_value<'a>(iter: &mut std::slice::Iter<'a, String>, flag: &str) -> Result<&'a String> {
    iter.next()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin discover_props -- [flags]");
    eprintln!("  --tv                        discover shows instead of movies");
    eprintln!("  --year <Y>                  primary release year");
    eprintln!("  --genres <id,id,...>        genre ids, comma separated");
    eprintln!("  --from/--to <YYYY-MM-DD>    release date range");
    eprintln!("  --vote-gte/--vote-lte <x>   vote average bounds");
    eprintln!("  --votes-gte/--votes-lte <n> vote count bounds (local filter only)");
    eprintln!("  --lang <code>               original language");
    eprintln!("  --runtime-gte/--runtime-lte <min> runtime bounds");
    eprintln!("  --cert <rating>             US certification");
    eprintln!("  --sort <key>                sort key, e.g. popularity.desc");
    eprintln!("  --pages <n>                 pages to fetch (with --fetch)");
    eprintln!("  --fetch                     run the query against TMDB");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();

    let mut spec = FilterSpec::default();
    let mut pages: u32 = 1;
    let mut fetch = false;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--tv" => spec.media_category = MediaCategory::Tv,
            "--fetch" => fetch = true,
            "--year" => {
                spec.year = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--year must be an integer")?,
                )
            }
            "--genres" => {
                spec.genres = next_value(&mut iter, flag)?
                    .split(',')
                    .map(|g| {
                        g.trim()
                            .parse::<i32>()
                            .context("--genres must be comma separated integers")
                    })
                    .collect::<Result<Vec<_>>>()?;
            }
            "--from" => {
                spec.release_date_from = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--from must be YYYY-MM-DD")?,
                )
            }
            "--to" => {
                spec.release_date_to = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--to must be YYYY-MM-DD")?,
                )
            }
            "--vote-gte" => {
                spec.vote_average_from = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--vote-gte must be a number")?,
                )
            }
            "--vote-lte" => {
                spec.vote_average_to = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--vote-lte must be a number")?,
                )
            }
            "--votes-gte" => {
                spec.vote_count_from = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--votes-gte must be an integer")?,
                )
            }
            "--votes-lte" => {
                spec.vote_count_to = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--votes-lte must be an integer")?,
                )
            }
            "--lang" => spec.language = Some(next_value(&mut iter, flag)?.to_string()),
            "--runtime-gte" => {
                spec.runtime_from = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--runtime-gte must be an integer")?,
                )
            }
            "--runtime-lte" => {
                spec.runtime_to = Some(
                    next_value(&mut iter, flag)?
                        .parse()
                        .context("--runtime-lte must be an integer")?,
                )
            }
            "--cert" => spec.certification = Some(next_value(&mut iter, flag)?.to_string()),
            "--sort" => spec.sort_by = Some(parse_sort(next_value(&mut iter, flag)?)?),
            "--pages" => {
                pages = next_value(&mut iter, flag)?
                    .parse()
                    .context("--pages must be an integer")?
            }
            "--help" | "-h" => usage(),
            other => {
                eprintln!("Unknown flag '{other}'");
                usage();
            }
        }
    }

    println!("{}", discover_query(&spec));

    if fetch {
        let client = TmdbClient::from_env()?;
        let records = collect_pages(&client, &spec, pages).await?;
        let fetched = records.len();
        let kept = filter_media(records, &spec);
        eprintln!("{} fetched, {} after local filters", fetched, kept.len());
        println!("{}", serde_json::to_string_pretty(&kept)?);
    }

    Ok(())
}
