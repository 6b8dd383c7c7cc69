//! Grouping and summary statistics.
//!
//! This module groups normalized records by a derived key, averages the
//! requested measures over the members that have them, and orders the
//! resulting summaries deterministically.

use crate::models::{GroupSummary, Measure, MeasureStats, NormalizedRecord, Partition};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Running totals for one group.
#[derive(Debug, Clone)]
struct Accumulator {
    count: usize,
    /// Per measure: (sum, present count).
    sums: Vec<(f64, usize)>,
}

impl Accumulator {
    fn new(measures: usize) -> Self {
        Self {
            count: 0,
            sums: vec![(0.0, 0); measures],
        }
    }

    fn add(&mut self, record: &NormalizedRecord, measures: &[Measure]) {
        self.count += 1;
        for (slot, measure) in self.sums.iter_mut().zip(measures) {
            if let Some(value) = measure.value(record) {
                slot.0 += value;
                slot.1 += 1;
            }
        }
    }

    fn finish<K>(self, key: K, measures: &[Measure]) -> GroupSummary<K> {
        let averages = measures
            .iter()
            .zip(self.sums)
            .map(|(measure, (sum, present))| (*measure, average(sum, present)))
            .collect();

        GroupSummary {
            key,
            count: self.count,
            averages,
        }
    }
}

fn average(sum: f64, present: usize) -> f64 {
    if present == 0 {
        0.0
    } else {
        sum / present as f64
    }
}

/// Group records by `key_fn` and summarize each group.
///
/// Groups come back ordered by count descending, then by the average of
/// `measures[0]` descending (if any measure was requested), then by key.
pub fn aggregate<K, F>(
    records: &[NormalizedRecord],
    key_fn: F,
    measures: &[Measure],
) -> Vec<GroupSummary<K>>
where
    K: Eq + Hash + Ord,
    F: Fn(&NormalizedRecord) -> K,
{
    let groups = records
        .iter()
        .fold(HashMap::<K, Accumulator>::new(), |mut groups, record| {
            groups
                .entry(key_fn(record))
                .or_insert_with(|| Accumulator::new(measures.len()))
                .add(record, measures);
            groups
        });

    let mut summaries: Vec<GroupSummary<K>> = groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key, measures))
        .collect();

    sort_summaries(&mut summaries, measures.first().copied());
    summaries
}

/// Order summaries by count, primary measure average, then key.
pub fn sort_summaries<K: Ord>(summaries: &mut [GroupSummary<K>], primary: Option<Measure>) {
    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| match primary {
                Some(measure) => b
                    .average(measure)
                    .partial_cmp(&a.average(measure))
                    .unwrap_or(Ordering::Equal),
                None => Ordering::Equal,
            })
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Order summaries by key only (chronological for month keys).
pub fn sort_chronological<K: Ord>(summaries: &mut [GroupSummary<K>]) {
    summaries.sort_by(|a, b| a.key.cmp(&b.key));
}

/// Min, max and average of a measure over the records that have it.
///
/// Everything is 0 when no record has the measure.
pub fn global_stats(records: &[NormalizedRecord], measure: Measure) -> MeasureStats {
    let mut stats = MeasureStats::default();
    let mut sum = 0.0;

    for record in records {
        let (Some(value), Some((low, high))) = (measure.value(record), measure.bounds(record))
        else {
            continue;
        };

        if stats.present == 0 {
            stats.min = low;
            stats.max = high;
        } else {
            stats.min = stats.min.min(low);
            stats.max = stats.max.max(high);
        }
        sum += value;
        stats.present += 1;
    }

    stats.average = average(sum, stats.present);
    stats
}

/// Sum of a measure over the records that have it.
pub fn total(records: &[NormalizedRecord], measure: Measure) -> f64 {
    records.iter().filter_map(|r| measure.value(r)).sum()
}

/// The `n` records with the highest value of `measure`.
///
/// Ties keep their input order. Records lacking the measure are skipped.
pub fn top_by(records: &[NormalizedRecord], measure: Measure, n: usize) -> Vec<&NormalizedRecord> {
    let mut ranked: Vec<(&NormalizedRecord, f64)> = records
        .iter()
        .filter_map(|r| measure.value(r).map(|v| (r, v)))
        .collect();

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(n);
    ranked.into_iter().map(|(r, _)| r).collect()
}

/// The first record with the highest (or lowest) value of `measure`.
pub fn extreme_by(
    records: &[NormalizedRecord],
    measure: Measure,
    highest: bool,
) -> Option<&NormalizedRecord> {
    let mut best: Option<(&NormalizedRecord, f64)> = None;

    for record in records {
        let Some(value) = measure.value(record) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((_, current)) if highest => value > current,
            Some((_, current)) => value < current,
        };
        if better {
            best = Some((record, value));
        }
    }

    best.map(|(record, _)| record)
}

/// Split two collections by identifier equality.
///
/// Repeated identifiers inside one collection are collapsed to their first
/// occurrence, so a shared item lands in `common` exactly once. Records
/// without an identifier cannot match and stay exclusive to their side.
pub fn partition(a: &[NormalizedRecord], b: &[NormalizedRecord]) -> Partition {
    let ids_a: HashSet<&str> = a.iter().filter_map(|r| r.id.as_deref()).collect();
    let ids_b: HashSet<&str> = b.iter().filter_map(|r| r.id.as_deref()).collect();

    let mut result = Partition::default();
    let mut seen_a: HashSet<&str> = HashSet::new();
    let mut seen_b: HashSet<&str> = HashSet::new();

    for record in a {
        if let Some(id) = record.id.as_deref() {
            if !seen_a.insert(id) {
                continue;
            }
            if ids_b.contains(id) {
                result.common.push(record.clone());
                continue;
            }
        }
        result.only_a.push(record.clone());
    }

    for record in b {
        if let Some(id) = record.id.as_deref() {
            if !seen_b.insert(id) || ids_a.contains(id) {
                continue;
            }
        }
        result.only_b.push(record.clone());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SalaryRange, NOT_SPECIFIED};

    fn vacancy(company: &str, salary: Option<(Option<f64>, Option<f64>)>) -> NormalizedRecord {
        NormalizedRecord {
            company: company.to_string(),
            salary: salary.map(|(from, to)| SalaryRange { from, to }),
            ..NormalizedRecord::default()
        }
    }

    fn article(id: &str, rating: i64) -> NormalizedRecord {
        NormalizedRecord {
            id: Some(id.to_string()),
            title: format!("Article {}", id),
            rating,
            ..NormalizedRecord::default()
        }
    }

    fn repeat(company: &str, salary: f64, n: usize) -> Vec<NormalizedRecord> {
        (0..n)
            .map(|_| vacancy(company, Some((Some(salary), Some(salary)))))
            .collect()
    }

    #[test]
    fn test_counts_sum_to_total() {
        let records = vec![
            vacancy("Acme", None),
            vacancy("Acme", Some((Some(100.0), None))),
            vacancy("Globex", None),
            vacancy(NOT_SPECIFIED, None),
        ];

        let groups = aggregate(&records, |r| r.company.clone(), &[Measure::Salary]);
        let sum: usize = groups.iter().map(|g| g.count).sum();

        assert_eq!(sum, records.len());
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_average_excludes_absent_measure() {
        let records = vec![
            vacancy("Acme", Some((Some(100.0), Some(200.0)))),
            vacancy("Acme", None),
            vacancy("Acme", Some((None, Some(300.0)))),
        ];

        let groups = aggregate(&records, |r| r.company.clone(), &[Measure::Salary]);

        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].average(Measure::Salary), 225.0);
    }

    #[test]
    fn test_average_of_empty_is_zero() {
        let records = vec![vacancy("Acme", None), vacancy("Acme", None)];

        let groups = aggregate(&records, |r| r.company.clone(), &[Measure::Salary]);

        assert_eq!(groups[0].average(Measure::Salary), 0.0);
        assert!(!groups[0].average(Measure::Salary).is_nan());
    }

    #[test]
    fn test_order_count_then_average_then_key() {
        let mut records = repeat("A", 100.0, 5);
        records.extend(repeat("B", 200.0, 5));
        records.extend(repeat("C", 999.0, 3));

        let groups = aggregate(&records, |r| r.company.clone(), &[Measure::Salary]);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();

        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_order_without_measure_uses_key() {
        let records = vec![
            vacancy("Zeta", None),
            vacancy("Alpha", None),
            vacancy("Mid", None),
            vacancy("Mid", None),
        ];

        let groups = aggregate(&records, |r| r.company.clone(), &[]);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();

        assert_eq!(keys, vec!["Mid", "Alpha", "Zeta"]);
        assert!(groups[0].averages.is_empty());
    }

    #[test]
    fn test_global_stats() {
        let records = vec![
            vacancy("A", Some((Some(100.0), Some(200.0)))),
            vacancy("B", Some((Some(50.0), None))),
            vacancy("C", Some((None, Some(400.0)))),
            vacancy("D", None),
        ];

        let stats = global_stats(&records, Measure::Salary);

        assert_eq!(stats.present, 3);
        assert_eq!(stats.min, 50.0);
        assert_eq!(stats.max, 400.0);
        assert_eq!(stats.average, (150.0 + 50.0 + 400.0) / 3.0);
    }

    #[test]
    fn test_global_stats_without_data() {
        let records = vec![vacancy("A", None)];

        let stats = global_stats(&records, Measure::Salary);

        assert_eq!(stats, MeasureStats::default());
    }

    #[test]
    fn test_partition_identity() {
        let a = vec![article("1", 0), article("2", 0), article("3", 0)];
        let b = vec![article("2", 0), article("3", 0), article("4", 0)];

        let parts = partition(&a, &b);
        let ids = |v: &[NormalizedRecord]| -> Vec<String> {
            v.iter().filter_map(|r| r.id.clone()).collect()
        };

        assert_eq!(ids(&parts.only_a), vec!["1"]);
        assert_eq!(ids(&parts.only_b), vec!["4"]);
        assert_eq!(ids(&parts.common), vec!["2", "3"]);
        assert_eq!(parts.union_len(), 4);
    }

    #[test]
    fn test_partition_collapses_duplicates() {
        let a = vec![article("1", 0), article("2", 0), article("2", 0)];
        let b = vec![article("2", 0), article("2", 0)];

        let parts = partition(&a, &b);

        assert_eq!(parts.common.len(), 1);
        assert_eq!(parts.only_a.len(), 1);
        assert!(parts.only_b.is_empty());
        assert_eq!(parts.union_len(), 2);
    }

    #[test]
    fn test_partition_keeps_unidentified_exclusive() {
        let unnamed = NormalizedRecord::default();
        let parts = partition(&[unnamed.clone()], &[unnamed]);

        assert_eq!(parts.only_a.len(), 1);
        assert_eq!(parts.only_b.len(), 1);
        assert!(parts.common.is_empty());
    }

    #[test]
    fn test_top_by_is_stable() {
        let records = vec![article("1", 5), article("2", 9), article("3", 5), article("4", 1)];

        let top = top_by(&records, Measure::Rating, 3);
        let ids: Vec<&str> = top.iter().filter_map(|r| r.id.as_deref()).collect();

        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_extreme_by() {
        let records = vec![article("1", 5), article("2", -4), article("3", 9), article("4", 9)];

        let best = extreme_by(&records, Measure::Rating, true);
        let worst = extreme_by(&records, Measure::Rating, false);

        assert_eq!(best.and_then(|r| r.id.as_deref()), Some("3"));
        assert_eq!(worst.and_then(|r| r.id.as_deref()), Some("2"));
        assert!(extreme_by(&[], Measure::Rating, true).is_none());
    }

    #[test]
    fn test_total() {
        let records = vec![article("1", 5), article("2", -2)];
        assert_eq!(total(&records, Measure::Rating), 3.0);
        assert_eq!(total(&records, Measure::Salary), 0.0);
    }
}
