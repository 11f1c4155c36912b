//! Integration tests for the registry.
//!
//! These tests drive a `Db` end to end:
//! - The tosters walkthrough: add, query, count, remove
//! - Paging over a populated collection
//! - Reopening a storage root written by an earlier `Db`

use regex::RegexBuilder;
use serde_json::json;
use shelf_db::{Db, DbConfig, DbError, Projection, SortOrder};
use tempfile::TempDir;

fn open(tmp: &TempDir) -> Db {
    Db::open(DbConfig::with_storage_root(tmp.path().join("db"))).expect("open db")
}

#[test]
fn test_tosters_walkthrough() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);

    let tosters = db.select("tosters", None).unwrap();
    let id = tosters
        .add(json!({"type": "movie", "title": "The Godfather", "imdb": 9.2}))
        .unwrap();

    let he = RegexBuilder::new("he").case_insensitive(true).build().unwrap();
    let movie = RegexBuilder::new("movie").case_insensitive(true).build().unwrap();
    let found = tosters
        .find()
        .unwrap()
        .matches("title", &he)
        .matches("type", &movie)
        .run();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], json!("The Godfather"));
    assert_eq!(found[0]["_id"], json!(id.as_str()));
    assert_eq!(tosters.count().unwrap(), 1);

    let removed = tosters.remove(id.as_str()).unwrap().unwrap();
    assert_eq!(removed["imdb"], json!(9.2));
    assert!(tosters.get(id.as_str(), &Projection::all()).unwrap().is_none());
    assert_eq!(tosters.count().unwrap(), 0);
}

#[test]
fn test_names_are_validated_and_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);

    assert!(matches!(
        db.select("bad name!", None).unwrap_err(),
        DbError::InvalidCollectionName { .. }
    ));
    let upper = db.select("Tosters", None).unwrap();
    let lower = db.select("tosters", None).unwrap();
    assert!(std::sync::Arc::ptr_eq(&upper, &lower));
    assert!(tmp.path().join("db/tosters/tosters.json").is_file());
}

#[test]
fn test_paging_a_collection() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    let movies = db.select("movies", None).unwrap();
    for year in 1990..2000 {
        movies.add(json!({"year": year, "kind": "film"})).unwrap();
    }

    let pages = movies
        .find()
        .unwrap()
        .greater_or_equal("year", 1992.0)
        .paginate(3, None)
        .unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!((pages[0].start, pages[0].end, pages[0].total), (1, 3, 8));
    assert_eq!((pages[2].start, pages[2].end), (7, 8));

    let years: Vec<i64> = pages
        .iter()
        .flat_map(|p| p.items.iter())
        .map(|r| r["year"].as_i64().unwrap())
        .collect();
    // Newest first: additions are prepended.
    assert_eq!(years, (1992..2000).rev().collect::<Vec<_>>());

    let oldest = movies.find().unwrap().sort_by_ts(SortOrder::Asc).first().unwrap();
    assert!(oldest["_ts"].as_i64().unwrap() <= pages[0].items[0]["_ts"].as_i64().unwrap());
}

#[test]
fn test_reopen_sees_previous_writes() {
    let tmp = TempDir::new().unwrap();

    // Phase 1: write through one registry.
    let id = {
        let db = open(&tmp);
        let c = db.select("notes", None).unwrap();
        let id = c.add(json!({"text": "first", "tags": ["a", "b"]})).unwrap();
        c.update(id.as_str(), json!({"tags": ["a", "c"]})).unwrap();
        db.close();
        id
    };

    // Phase 2: a fresh registry picks the collection up from disk.
    let db = open(&tmp);
    assert_eq!(db.collections().unwrap(), vec!["notes"]);
    let notes = db.get("notes").unwrap().unwrap();
    let got = notes
        .get(id.as_str(), &Projection::parse("tags"))
        .unwrap()
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got["tags"], json!(["a", "c"]));
}

#[test]
fn test_sync_then_empty_then_drop() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    let c = db.select("mirror", None).unwrap();

    let entries: Vec<_> = [json!({"_id": "a", "n": 1}), json!({"_id": "b", "n": 2})]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();
    assert!(c.sync(entries.clone()).unwrap());
    assert!(!c.sync(entries).unwrap());
    assert_eq!(c.count().unwrap(), 2);

    assert!(db.empty_collection("mirror").unwrap());
    assert_eq!(c.count().unwrap(), 0);

    assert!(db.remove_collection("mirror").unwrap());
    assert!(!tmp.path().join("db/mirror").exists());
    assert!(db.collections().unwrap().is_empty());
}
