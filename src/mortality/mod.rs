mod extremes;

pub use extremes::{Extreme, Extremes, AGGREGATE_ENTITIES};

use std::collections::HashMap;
use std::ops::Range;

/// One row of the mortality table: an entity (country, continent or "World")
/// in a single year, with one optional value per indicator column.
#[derive(Clone, Debug, PartialEq)]
pub struct MortalityRecord {
    pub entity: String,
    pub year: i32,
    /// Indexed by the owning table's indicator column
    values: Vec<Option<f64>>,
}

impl MortalityRecord {
    /// Value stored in a column, if any
    #[inline(always)]
    pub fn get(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }
}

/// Immutable death-rate table keyed by (entity, year).
///
/// Records are kept sorted by entity then year so that every entity's
/// series is one contiguous, year-ordered slice.
#[derive(Clone, Debug, Default)]
pub struct MortalityTable {
    indicators: Vec<String>,
    records: Vec<MortalityRecord>,
    by_entity: HashMap<String, Range<usize>>,
}

impl MortalityTable {
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Indicator column names in first-seen order
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn has_indicator(&self, indicator: &str) -> bool {
        self.column(indicator).is_some()
    }

    #[inline(always)]
    fn column(&self, indicator: &str) -> Option<usize> {
        self.indicators.iter().position(|name| name == indicator)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct entity names in ascending order
    pub fn entities(&self) -> impl Iterator<Item = &str> + '_ {
        let mut prev: Option<&str> = None;
        self.records.iter().map(|r| r.entity.as_str()).filter(move |entity| {
            let fresh = prev != Some(*entity);
            prev = Some(*entity);
            fresh
        })
    }

    /// Earliest and latest year present anywhere in the table
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    /// All records of an entity, ascending by year. Empty when unknown.
    pub fn series(&self, entity: &str) -> &[MortalityRecord] {
        match self.by_entity.get(entity) {
            Some(range) => &self.records[range.clone()],
            None => &[],
        }
    }

    /// Value of `indicator` for (entity, year).
    ///
    /// `None` covers every kind of absence: no such entity, no record for the
    /// year, an unknown indicator, or a record without a value in that column.
    pub fn value(&self, entity: &str, year: i32, indicator: &str) -> Option<f64> {
        let column = self.column(indicator)?;
        let series = self.series(entity);
        let idx = series.binary_search_by_key(&year, |r| r.year).ok()?;
        series[idx].get(column)
    }

    /// (year, value) pairs of a series that carry a value for `indicator`
    pub fn series_points(&self, series: &[MortalityRecord], indicator: &str) -> Vec<(f64, f64)> {
        let Some(column) = self.column(indicator) else {
            return Vec::new();
        };
        series
            .iter()
            .filter_map(|r| r.get(column).map(|v| (r.year as f64, v)))
            .collect()
    }
}

/// Accumulates raw rows and interns indicator names
#[derive(Default)]
pub struct TableBuilder {
    indicators: Vec<String>,
    columns: HashMap<String, usize>,
    records: Vec<MortalityRecord>,
}

impl TableBuilder {
    /// Add a row. Non-finite values are dropped.
    pub fn push<I, S>(&mut self, entity: impl Into<String>, year: i32, values: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut slots = vec![None; self.indicators.len()];
        for (name, value) in values {
            if !value.is_finite() {
                continue;
            }
            let column = self.intern(name.as_ref());
            if column >= slots.len() {
                slots.resize(column + 1, None);
            }
            slots[column] = Some(value);
        }
        self.records.push(MortalityRecord {
            entity: entity.into(),
            year,
            values: slots,
        });
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&column) = self.columns.get(name) {
            return column;
        }
        let column = self.indicators.len();
        self.indicators.push(name.to_string());
        self.columns.insert(name.to_string(), column);
        column
    }

    pub fn build(mut self) -> MortalityTable {
        let width = self.indicators.len();

        // Stable sort keeps the first occurrence of a duplicated (entity, year) in front
        self.records
            .sort_by(|a, b| a.entity.cmp(&b.entity).then(a.year.cmp(&b.year)));
        let before = self.records.len();
        self.records
            .dedup_by(|later, first| later.entity == first.entity && later.year == first.year);
        let dropped = before - self.records.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped duplicate (entity, year) rows");
        }

        for record in &mut self.records {
            record.values.resize(width, None);
        }

        let mut by_entity: HashMap<String, Range<usize>> = HashMap::new();
        let mut start = 0;
        for idx in 1..=self.records.len() {
            let boundary = idx == self.records.len()
                || self.records[idx].entity != self.records[start].entity;
            if boundary {
                by_entity.insert(self.records[start].entity.clone(), start..idx);
                start = idx;
            }
        }

        MortalityTable {
            indicators: self.indicators,
            records: self.records,
            by_entity,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const OPIOIDS: &str = "Death: Opioid use disorders";
    pub const COCAINE: &str = "Death: Cocaine use disorders";

    pub fn sample_table() -> MortalityTable {
        let mut b = MortalityTable::builder();
        b.push("Chile", 2010, [(OPIOIDS, 12.0)]);
        b.push("Chile", 2000, [(OPIOIDS, 3.0), (COCAINE, 0.0)]);
        b.push("Chile", 2005, [(OPIOIDS, 7.5), (COCAINE, 1.25)]);
        b.push("Peru", 2010, [(OPIOIDS, 4.0), (COCAINE, 2.0)]);
        b.push("World", 2010, [(OPIOIDS, 900.0), (COCAINE, 80.0)]);
        b.push("Asia", 2010, [(OPIOIDS, 0.1), (COCAINE, 0.1)]);
        b.build()
    }

    #[test]
    fn test_value_present() {
        let table = sample_table();
        assert_eq!(table.value("Chile", 2010, OPIOIDS), Some(12.0));
        assert_eq!(table.value("Chile", 2005, COCAINE), Some(1.25));
    }

    #[test]
    fn test_value_missing_column_on_record() {
        let table = sample_table();
        assert_eq!(table.value("Chile", 2010, COCAINE), None);
    }

    #[test]
    fn test_value_zero_is_not_missing() {
        let table = sample_table();
        assert_eq!(table.value("Chile", 2000, COCAINE), Some(0.0));
    }

    #[test]
    fn test_value_absent_pairs() {
        let table = sample_table();
        assert_eq!(table.value("Chile", 2019, OPIOIDS), None);
        assert_eq!(table.value("Atlantis", 2010, OPIOIDS), None);
        assert_eq!(table.value("Chile", 2010, "Death: Alcohol"), None);
        // Case-sensitive join
        assert_eq!(table.value("chile", 2010, OPIOIDS), None);
    }

    #[test]
    fn test_series_sorted_by_year() {
        let table = sample_table();
        let years: Vec<i32> = table.series("Chile").iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2000, 2005, 2010]);
        assert!(table.series("Atlantis").is_empty());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let mut b = MortalityTable::builder();
        b.push("Chile", 2010, [(OPIOIDS, 1.0)]);
        b.push("Chile", 2010, [(OPIOIDS, 2.0)]);
        let table = b.build();
        assert_eq!(table.len(), 1);
        assert_eq!(table.value("Chile", 2010, OPIOIDS), Some(1.0));
    }

    #[test]
    fn test_non_finite_dropped() {
        let mut b = MortalityTable::builder();
        b.push("Chile", 2010, [(OPIOIDS, f64::NAN)]);
        let table = b.build();
        assert_eq!(table.value("Chile", 2010, OPIOIDS), None);
    }

    #[test]
    fn test_entities_and_span() {
        let table = sample_table();
        let entities: Vec<&str> = table.entities().collect();
        assert_eq!(entities, vec!["Asia", "Chile", "Peru", "World"]);
        assert_eq!(table.year_span(), Some((2000, 2010)));
        assert_eq!(table.indicators(), &[OPIOIDS.to_string(), COCAINE.to_string()]);
    }

    #[test]
    fn test_series_points_skip_missing() {
        let table = sample_table();
        let points = table.series_points(table.series("Chile"), COCAINE);
        assert_eq!(points, vec![(2000.0, 0.0), (2005.0, 1.25)]);
    }
}
