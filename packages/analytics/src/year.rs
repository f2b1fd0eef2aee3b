//! Year filter and its memoization cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use nypd_arrests_arrest_models::{ArrestRecord, Column, GeoPoint};
use nypd_arrests_dataset::{Dataset, SnapshotId};

/// The rows of one snapshot whose arrest date mentions a given year.
///
/// Rows are exposed under the canonical column names (see
/// [`YearSlice::columns`]); the raw CSV names never leave the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSlice {
    snapshot: SnapshotId,
    year: i32,
    rows: Arc<[ArrestRecord]>,
}

impl YearSlice {
    /// Snapshot the slice was cut from.
    #[must_use]
    pub const fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    /// Year the slice was filtered on.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Matching rows in snapshot order.
    #[must_use]
    pub fn rows(&self) -> &[ArrestRecord] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Arrest locations of every row.
    #[must_use]
    pub fn points(&self) -> Vec<GeoPoint> {
        self.rows.iter().map(ArrestRecord::location).collect()
    }

    /// Canonical names of the columns carried by the slice.
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = Column::required()
            .iter()
            .map(|c| c.canonical_name())
            .collect();
        if self.rows.iter().any(|r| r.law_code.is_some()) {
            columns.push(Column::LawCode.canonical_name());
        }
        columns
    }
}

/// Returns the rows whose arrest date contains `year` as a substring.
///
/// A year with no matching rows yields an empty slice.
#[must_use]
pub fn filter_year(dataset: &Dataset, year: i32) -> YearSlice {
    let needle = year.to_string();
    let rows: Vec<ArrestRecord> = dataset
        .records()
        .iter()
        .filter(|r| r.arrest_date.contains(&needle))
        .cloned()
        .collect();

    log::debug!(
        "Year {year} matched {} of {} rows in {}",
        rows.len(),
        dataset.len(),
        dataset.id()
    );

    YearSlice {
        snapshot: dataset.id(),
        year,
        rows: rows.into(),
    }
}

/// Memoizes [`filter_year`] results keyed by `(snapshot, year)`.
///
/// Only one snapshot is retained at a time: caching a slice of a newer
/// snapshot evicts every entry of the previous one.
#[derive(Debug, Default)]
pub struct YearFilterCache {
    entries: BTreeMap<(SnapshotId, i32), Arc<YearSlice>>,
    hits: u64,
    misses: u64,
}

impl YearFilterCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached slice for `(snapshot, year)`, counting a hit.
    pub fn get(&mut self, snapshot: SnapshotId, year: i32) -> Option<Arc<YearSlice>> {
        let slice = self.entries.get(&(snapshot, year)).map(Arc::clone);
        if slice.is_some() {
            self.hits += 1;
            log::trace!("Year filter cache hit for {year} in {snapshot}");
        }
        slice
    }

    /// Caches a freshly filtered slice, counting a miss.
    ///
    /// Entries of every other snapshot are evicted. If the same
    /// `(snapshot, year)` was inserted in the meantime, the cached slice is
    /// kept and returned instead of `slice`.
    pub fn insert(&mut self, slice: YearSlice) -> Arc<YearSlice> {
        self.misses += 1;
        let key = (slice.snapshot, slice.year);

        let before = self.entries.len();
        self.entries.retain(|(snapshot, _), _| *snapshot == key.0);
        if self.entries.len() < before {
            log::debug!(
                "Evicted {} year slice(s) of superseded snapshots",
                before - self.entries.len()
            );
        }

        Arc::clone(self.entries.entry(key).or_insert_with(|| Arc::new(slice)))
    }

    /// Returns the cached slice for `(dataset, year)`, computing it on a
    /// miss.
    pub fn get_or_filter(&mut self, dataset: &Dataset, year: i32) -> Arc<YearSlice> {
        if let Some(slice) = self.get(dataset.id(), year) {
            return slice;
        }
        self.insert(filter_year(dataset, year))
    }

    /// Drops every cached slice of `snapshot`.
    pub fn invalidate(&mut self, snapshot: SnapshotId) {
        self.entries.retain(|(s, _), _| *s != snapshot);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `(hits, misses)` since construction.
    #[must_use]
    pub const fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::arrest;

    fn dated(date: &str) -> ArrestRecord {
        ArrestRecord {
            arrest_date: date.to_string(),
            ..arrest("BLACK", "ROBBERY")
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            dated("01/03/2016"),
            dated("07/21/2015"),
            dated("12/31/2016"),
            dated("02/14/2019"),
        ])
    }

    #[test]
    fn keeps_only_rows_mentioning_the_year() {
        let slice = filter_year(&dataset(), 2016);
        assert_eq!(slice.len(), 2);
        assert!(slice.rows().iter().all(|r| r.arrest_date.contains("2016")));
        assert_eq!(slice.year(), 2016);
    }

    #[test]
    fn unmatched_year_is_empty_not_an_error() {
        let slice = filter_year(&dataset(), 2008);
        assert!(slice.is_empty());
    }

    #[test]
    fn exposes_canonical_column_names() {
        let slice = filter_year(&dataset(), 2016);
        assert_eq!(
            slice.columns(),
            vec![
                "arrest date",
                "offense description",
                "age group",
                "gender",
                "race",
                "longitude",
                "latitude",
            ]
        );
    }

    #[test]
    fn filtering_is_repeatable() {
        let data = dataset();
        assert_eq!(filter_year(&data, 2015), filter_year(&data, 2015));
    }

    #[test]
    fn cache_reuses_slices_for_same_snapshot_and_year() {
        let data = dataset();
        let mut cache = YearFilterCache::new();
        let a = cache.get_or_filter(&data, 2016);
        let b = cache.get_or_filter(&data, 2016);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), (1, 1));

        cache.get_or_filter(&data, 2015);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn newer_snapshot_evicts_older_entries() {
        let old = dataset();
        let new = dataset();
        let mut cache = YearFilterCache::new();
        cache.get_or_filter(&old, 2016);
        cache.get_or_filter(&old, 2015);

        let slice = cache.get_or_filter(&new, 2016);
        assert_eq!(slice.snapshot(), new.id());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_snapshot_entries() {
        let data = dataset();
        let mut cache = YearFilterCache::new();
        cache.get_or_filter(&data, 2016);
        cache.invalidate(data.id());
        assert!(cache.is_empty());
        cache.get_or_filter(&data, 2016);
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn get_counts_hits_only() {
        let data = dataset();
        let mut cache = YearFilterCache::new();
        assert!(cache.get(data.id(), 2016).is_none());
        assert_eq!(cache.stats(), (0, 0));

        let inserted = cache.insert(filter_year(&data, 2016));
        let cached = cache.get(data.id(), 2016).unwrap();
        assert!(Arc::ptr_eq(&inserted, &cached));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn racing_inserts_keep_the_first_slice() {
        let data = dataset();
        let mut cache = YearFilterCache::new();
        let first = cache.insert(filter_year(&data, 2016));
        let second = cache.insert(filter_year(&data, 2016));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn insert_evicts_other_snapshots() {
        let old = dataset();
        let new = dataset();
        let mut cache = YearFilterCache::new();
        cache.insert(filter_year(&old, 2016));
        cache.insert(filter_year(&new, 2015));
        assert!(cache.get(old.id(), 2016).is_none());
        assert_eq!(cache.len(), 1);
    }
}
