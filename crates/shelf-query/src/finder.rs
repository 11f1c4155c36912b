//! The chainable [`Finder`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelf_page::{paginate, Page};
use shelf_types::{record_timestamp, Record};
use tracing::trace;

use crate::deep::deep_search;
use crate::error::QueryResult;
use crate::predicate::Predicate;
use crate::projection::Projection;

/// Direction for ordering by creation time (`_ts`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<&str> for SortOrder {
    /// `"asc"` (any case) is ascending; every other value is descending.
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// A narrowing query over an immutable snapshot of records.
///
/// The snapshot is shared behind an `Arc`; a `Finder` only owns the list of
/// positions still selected. Predicate methods borrow `self` and return a new
/// `Finder`, leaving the original untouched, so partial queries can be reused:
///
/// ```
/// # use serde_json::json;
/// # use shelf_query::Finder;
/// # use shelf_types::into_record;
/// let base = Finder::new(vec![
///     into_record(json!({"kind": "a", "n": 1})).unwrap(),
///     into_record(json!({"kind": "b", "n": 2})).unwrap(),
/// ]);
/// let a = base.equals("kind", "a");
/// let big = base.greater_than("n", 1.0);
/// assert_eq!(a.len(), 1);
/// assert_eq!(big.len(), 1);
/// assert_eq!(base.len(), 2);
/// ```
#[derive(Clone)]
pub struct Finder {
    snapshot: Arc<Vec<Record>>,
    selection: Vec<usize>,
}

impl Finder {
    /// Create a finder selecting every record in `entries`.
    pub fn new(entries: Vec<Record>) -> Self {
        Self::from_snapshot(Arc::new(entries))
    }

    /// Create a finder over an already-shared snapshot.
    pub fn from_snapshot(snapshot: Arc<Vec<Record>>) -> Self {
        let selection = (0..snapshot.len()).collect();
        Self { snapshot, selection }
    }

    /// Number of records still selected.
    pub fn len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    // ---------------------------------------------------------------
    // Narrowing
    // ---------------------------------------------------------------

    /// Keep records satisfying `predicate`.
    pub fn apply(&self, predicate: &Predicate) -> Self {
        let out = self.filter(|r| predicate.test(r));
        trace!(field = predicate.field(), before = self.len(), after = out.len(), "predicate applied");
        out
    }

    /// Keep records for which `keep` returns `true`.
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Record) -> bool,
    {
        let selection = self
            .selection
            .iter()
            .copied()
            .filter(|&i| keep(&self.snapshot[i]))
            .collect();
        Self {
            snapshot: Arc::clone(&self.snapshot),
            selection,
        }
    }

    pub fn equals(&self, field: &str, value: impl Into<Value>) -> Self {
        self.apply(&Predicate::Equals(field.to_string(), value.into()))
    }

    /// Keeps records whose field differs from `value`, including records
    /// that do not have the field at all.
    pub fn not_equal(&self, field: &str, value: impl Into<Value>) -> Self {
        self.apply(&Predicate::NotEqual(field.to_string(), value.into()))
    }

    pub fn greater_than(&self, field: &str, bound: f64) -> Self {
        self.apply(&Predicate::GreaterThan(field.to_string(), bound))
    }

    pub fn greater_or_equal(&self, field: &str, bound: f64) -> Self {
        self.apply(&Predicate::GreaterOrEqual(field.to_string(), bound))
    }

    pub fn less_than(&self, field: &str, bound: f64) -> Self {
        self.apply(&Predicate::LessThan(field.to_string(), bound))
    }

    pub fn less_or_equal(&self, field: &str, bound: f64) -> Self {
        self.apply(&Predicate::LessOrEqual(field.to_string(), bound))
    }

    /// Keeps records whose field is a string matched by `pattern`.
    pub fn matches(&self, field: &str, pattern: &Regex) -> Self {
        self.apply(&Predicate::Matches(field.to_string(), pattern.clone()))
    }

    /// Narrow to the first selected record, if any.
    pub fn one(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            selection: self.selection.iter().copied().take(1).collect(),
        }
    }

    /// Reorder the selection by `_ts`.
    ///
    /// The sort is stable. Records without a numeric `_ts` sort before all
    /// timestamped records in ascending order and after them in descending.
    pub fn sort_by_ts(&self, order: SortOrder) -> Self {
        let mut selection = self.selection.clone();
        selection.sort_by(|&a, &b| {
            let ord = compare_ts(&self.snapshot[a], &self.snapshot[b]);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Self {
            snapshot: Arc::clone(&self.snapshot),
            selection,
        }
    }

    // ---------------------------------------------------------------
    // Terminals
    // ---------------------------------------------------------------

    /// The selected records, in snapshot order.
    pub fn run(&self) -> Vec<Record> {
        self.selected().cloned().collect()
    }

    /// The selected records, trimmed by `projection`.
    pub fn run_projected(&self, projection: &Projection) -> Vec<Record> {
        self.selected().map(|r| projection.apply(r)).collect()
    }

    /// The first selected record.
    pub fn first(&self) -> Option<Record> {
        self.selected().next().cloned()
    }

    /// Divide the selection into pages of `per_page`, optionally sorting by
    /// `_ts` first. Every page is returned; callers index into the result.
    pub fn paginate(&self, per_page: usize, sort: Option<SortOrder>) -> QueryResult<Vec<Page<Record>>> {
        let ordered = match sort {
            Some(order) => self.sort_by_ts(order),
            None => self.clone(),
        };
        Ok(paginate(per_page, &ordered.run())?)
    }

    /// Every value stored under `key` at any depth of the selected records.
    pub fn pluck_deep(&self, key: &str) -> Vec<Value> {
        self.selected()
            .flat_map(|r| {
                let wrapped = Value::Object(r.clone());
                deep_search(key, &wrapped).into_iter().cloned().collect::<Vec<_>>()
            })
            .collect()
    }

    fn selected(&self) -> impl Iterator<Item = &Record> + '_ {
        self.selection.iter().map(move |&i| &self.snapshot[i])
    }
}

impl fmt::Debug for Finder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finder")
            .field("snapshot", &self.snapshot.len())
            .field("selected", &self.selection.len())
            .finish()
    }
}

fn compare_ts(a: &Record, b: &Record) -> Ordering {
    match (record_timestamp(a), record_timestamp(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use regex::RegexBuilder;
    use serde_json::json;
    use shelf_types::into_record;

    fn ci(pattern: &str) -> Regex {
        RegexBuilder::new(pattern).case_insensitive(true).build().unwrap()
    }

    fn catalog() -> Finder {
        let rows = vec![
            json!({"_id": "1", "_ts": 30, "type": "movie", "title": "The Godfather", "imdb": 9.2}),
            json!({"_id": "2", "_ts": 10, "type": "movie", "title": "Heat", "imdb": 8.3}),
            json!({"_id": "3", "_ts": 20, "type": "series", "title": "The Wire", "imdb": 9.3}),
            json!({"_id": "4", "_ts": 20, "type": "movie", "title": "Alien"}),
            json!({"_id": "5", "_ts": 40, "title": "Untitled"}),
        ];
        Finder::new(rows.into_iter().map(|v| into_record(v).unwrap()).collect())
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r["_id"].as_str().unwrap()).collect()
    }

    // -----------------------------------------------------------------------
    // Narrowing
    // -----------------------------------------------------------------------

    #[test]
    fn composed_filters_keep_snapshot_order() {
        let out = catalog().equals("type", "movie").matches("title", &ci("he")).run();
        assert_eq!(ids(&out), ["1"]);

        let out = catalog().matches("title", &ci("he")).run();
        assert_eq!(ids(&out), ["1", "2", "3"]);
    }

    #[test]
    fn not_equal_keeps_sparse_records() {
        let out = catalog().not_equal("type", "movie").run();
        assert_eq!(ids(&out), ["3", "5"]);
    }

    #[test]
    fn numeric_filters_skip_records_without_the_field() {
        let out = catalog().greater_or_equal("imdb", 0.0).run();
        assert_eq!(ids(&out), ["1", "2", "3"]);

        let out = catalog().greater_than("imdb", 8.5).less_than("imdb", 9.25).run();
        assert_eq!(ids(&out), ["1"]);

        let out = catalog().less_or_equal("imdb", 8.3).run();
        assert_eq!(ids(&out), ["2"]);
    }

    #[test]
    fn narrowing_does_not_touch_the_base() {
        let base = catalog();
        let movies = base.equals("type", "movie");
        let series = base.equals("type", "series");
        assert_eq!(movies.len(), 3);
        assert_eq!(series.len(), 1);
        assert_eq!(base.len(), 5);
    }

    #[test]
    fn one_keeps_the_first_match() {
        let out = catalog().equals("type", "movie").one().run();
        assert_eq!(ids(&out), ["1"]);

        let none = catalog().equals("type", "opera").one();
        assert!(none.is_empty());
        assert!(none.first().is_none());
    }

    #[test]
    fn custom_filter_closure() {
        let out = catalog().filter(|r| r.len() == 3).run();
        assert_eq!(ids(&out), ["5"]);
    }

    // -----------------------------------------------------------------------
    // Sorting and pagination
    // -----------------------------------------------------------------------

    #[test]
    fn sort_is_stable_both_ways() {
        let asc = catalog().sort_by_ts(SortOrder::Asc).run();
        assert_eq!(ids(&asc), ["2", "3", "4", "1", "5"]);

        let desc = catalog().sort_by_ts(SortOrder::Desc).run();
        assert_eq!(ids(&desc), ["5", "1", "3", "4", "2"]);
    }

    #[test]
    fn paginate_returns_every_page() {
        let pages = catalog().paginate(2, None).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(ids(&pages[0].items), ["1", "2"]);
        assert_eq!(ids(&pages[2].items), ["5"]);
        assert_eq!(pages[2].total, 5);
    }

    #[test]
    fn paginate_sorted() {
        let pages = catalog().equals("type", "movie").paginate(2, Some(SortOrder::Asc)).unwrap();
        assert_eq!(ids(&pages[0].items), ["2", "4"]);
        assert_eq!(ids(&pages[1].items), ["1"]);
    }

    #[test]
    fn paginate_empty_selection_yields_no_pages() {
        let pages = catalog().equals("type", "opera").paginate(2, None).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn paginate_rejects_zero_page_size() {
        let err = catalog().paginate(0, None).unwrap_err();
        assert!(matches!(err, QueryError::Page(_)));
    }

    #[test]
    fn sort_order_from_str() {
        assert_eq!(SortOrder::from("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::from("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::from("newest"), SortOrder::Desc);
        assert_eq!(serde_json::to_string(&SortOrder::Asc).unwrap(), "\"asc\"");
        assert_eq!(serde_json::from_str::<SortOrder>("\"desc\"").unwrap(), SortOrder::Desc);
    }

    // -----------------------------------------------------------------------
    // Terminals
    // -----------------------------------------------------------------------

    #[test]
    fn run_projected_trims_fields() {
        let out = catalog().equals("_id", "2").run_projected(&Projection::parse("title"));
        assert_eq!(out, vec![into_record(json!({"title": "Heat"})).unwrap()]);
    }

    #[test]
    fn pluck_deep_over_selection() {
        let finder = Finder::new(vec![
            into_record(json!({"cast": [{"name": "Pacino"}, {"name": "Brando"}]})).unwrap(),
            into_record(json!({"crew": {"name": "Coppola"}})).unwrap(),
        ]);
        let names = finder.pluck_deep("name");
        assert_eq!(names, vec![json!("Pacino"), json!("Brando"), json!("Coppola")]);
    }

    #[test]
    fn shared_snapshot_across_threads() {
        let base = catalog();
        let handles: Vec<_> = ["movie", "series"]
            .into_iter()
            .map(|kind| {
                let base = base.clone();
                std::thread::spawn(move || base.equals("type", kind).len())
            })
            .collect();
        let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![3, 1]);
    }
}
