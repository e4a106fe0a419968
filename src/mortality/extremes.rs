use super::{MortalityRecord, MortalityTable};

/// World total and the six continent rows, excluded from per-country ranking
pub const AGGREGATE_ENTITIES: [&str; 7] = [
    "World",
    "Africa",
    "Asia",
    "Europe",
    "North America",
    "South America",
    "Oceania",
];

/// One extreme value and the key (entity or year) that holds it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extreme<K> {
    pub key: K,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremes<K> {
    pub min: Extreme<K>,
    pub max: Extreme<K>,
}

/// Fold keyed values into min/max. The first key seen wins a tie.
fn fold_extremes<K: Copy>(items: impl Iterator<Item = (K, f64)>) -> Option<Extremes<K>> {
    items.fold(None, |acc, (key, value)| {
        let here = Extreme { key, value };
        match acc {
            None => Some(Extremes { min: here, max: here }),
            Some(mut ex) => {
                if value < ex.min.value {
                    ex.min = here;
                }
                if value > ex.max.value {
                    ex.max = here;
                }
                Some(ex)
            }
        }
    })
}

impl MortalityTable {
    /// Lowest and highest `indicator` value among entities at `year`,
    /// skipping any entity in `exclude` and rows without a value.
    ///
    /// Records are ordered by entity, so ties go to the entity that sorts first.
    pub fn year_extremes(&self, year: i32, indicator: &str, exclude: &[&str]) -> Option<Extremes<&str>> {
        let column = self.column(indicator)?;
        fold_extremes(
            self.records
                .iter()
                .filter(|r| r.year == year && !exclude.iter().any(|e| *e == r.entity))
                .filter_map(|r| r.get(column).map(|v| (r.entity.as_str(), v))),
        )
    }

    /// Lowest and highest `indicator` value over one entity's series, keyed by
    /// year. Ties go to the earliest year.
    pub fn series_extremes(&self, series: &[MortalityRecord], indicator: &str) -> Option<Extremes<i32>> {
        let column = self.column(indicator)?;
        fold_extremes(series.iter().filter_map(|r| r.get(column).map(|v| (r.year, v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::tests::{sample_table, COCAINE, OPIOIDS};

    #[test]
    fn test_year_extremes_ignores_every_continent() {
        let mut b = MortalityTable::builder();
        b.push("World", 2015, [(OPIOIDS, 5000.0)]);
        b.push("Africa", 2015, [(OPIOIDS, 0.0)]);
        b.push("Asia", 2015, [(OPIOIDS, 4000.0)]);
        b.push("Europe", 2015, [(OPIOIDS, 0.01)]);
        b.push("North America", 2015, [(OPIOIDS, 3000.0)]);
        b.push("South America", 2015, [(OPIOIDS, 0.02)]);
        b.push("Oceania", 2015, [(OPIOIDS, 2000.0)]);
        b.push("Chile", 2015, [(OPIOIDS, 10.0)]);
        b.push("Peru", 2015, [(OPIOIDS, 20.0)]);
        b.push("Bolivia", 2015, [(OPIOIDS, 15.0)]);
        let table = b.build();

        let ex = table.year_extremes(2015, OPIOIDS, &AGGREGATE_ENTITIES).unwrap();
        assert_eq!(ex.min, Extreme { key: "Chile", value: 10.0 });
        assert_eq!(ex.max, Extreme { key: "Peru", value: 20.0 });

        let all = table.year_extremes(2015, OPIOIDS, &[]).unwrap();
        assert_eq!(all.min.key, "Africa");
        assert_eq!(all.max.key, "World");
    }

    #[test]
    fn test_year_extremes_excludes_aggregates() {
        let table = sample_table();
        let ex = table.year_extremes(2010, OPIOIDS, &AGGREGATE_ENTITIES).unwrap();
        assert_eq!(ex.min, Extreme { key: "Peru", value: 4.0 });
        assert_eq!(ex.max, Extreme { key: "Chile", value: 12.0 });
    }

    #[test]
    fn test_year_extremes_without_exclusion_sees_world() {
        let table = sample_table();
        let ex = table.year_extremes(2010, OPIOIDS, &[]).unwrap();
        assert_eq!(ex.max.key, "World");
        assert_eq!(ex.min.key, "Asia");
    }

    #[test]
    fn test_year_extremes_skips_missing_values() {
        let table = sample_table();
        // Chile has no cocaine value in 2010
        let ex = table.year_extremes(2010, COCAINE, &AGGREGATE_ENTITIES).unwrap();
        assert_eq!(ex.min.key, "Peru");
        assert_eq!(ex.max.key, "Peru");
    }

    #[test]
    fn test_year_extremes_empty() {
        let table = sample_table();
        assert!(table.year_extremes(1999, OPIOIDS, &AGGREGATE_ENTITIES).is_none());
        assert!(table.year_extremes(2010, "Death: Alcohol", &[]).is_none());
    }

    #[test]
    fn test_year_extremes_tie_goes_to_first_name() {
        let mut b = MortalityTable::builder();
        b.push("Zambia", 2001, [(OPIOIDS, 5.0)]);
        b.push("Angola", 2001, [(OPIOIDS, 5.0)]);
        b.push("Mali", 2001, [(OPIOIDS, 5.0)]);
        let table = b.build();
        let ex = table.year_extremes(2001, OPIOIDS, &AGGREGATE_ENTITIES).unwrap();
        assert_eq!(ex.min.key, "Angola");
        assert_eq!(ex.max.key, "Angola");
    }

    #[test]
    fn test_series_extremes() {
        let table = sample_table();
        let ex = table.series_extremes(table.series("Chile"), OPIOIDS).unwrap();
        assert_eq!(ex.min, Extreme { key: 2000, value: 3.0 });
        assert_eq!(ex.max, Extreme { key: 2010, value: 12.0 });
    }

    #[test]
    fn test_series_extremes_tie_goes_to_earliest_year() {
        let mut b = MortalityTable::builder();
        b.push("Chile", 2003, [(OPIOIDS, 2.0)]);
        b.push("Chile", 2001, [(OPIOIDS, 2.0)]);
        let table = b.build();
        let ex = table.series_extremes(table.series("Chile"), OPIOIDS).unwrap();
        assert_eq!(ex.min.key, 2001);
        assert_eq!(ex.max.key, 2001);
    }

    #[test]
    fn test_series_extremes_empty() {
        let table = sample_table();
        assert!(table.series_extremes(table.series("Atlantis"), OPIOIDS).is_none());
    }
}
