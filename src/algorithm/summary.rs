//! Cross-animal summaries
//!
//! Mean and standard error of the mean of per-animal values, keyed like the
//! input tables. Keys keep the order of their first occurrence.
//!
//! Region rows are averaged over the animals that imaged the region. Bins are
//! averaged over every processed animal: an animal without a bin had no
//! object there, so it contributes the value of an empty bin.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::models::{Axis, DistributionBin, Hemisphere, RegionStat};

/// Mean and standard error of a set of per-animal values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanSem {
    /// Number of non-NaN values
    pub n: usize,
    /// Mean, NaN without values
    pub mean: f64,
    /// Standard error of the mean, NaN with fewer than two values
    pub sem: f64,
}

impl MeanSem {
    /// Summarize `values`, ignoring NaN
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        let n = values.len();
        if n == 0 {
            return Self {
                n,
                mean: f64::NAN,
                sem: f64::NAN,
            };
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let sem = if n < 2 {
            f64::NAN
        } else {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            (variance / n as f64).sqrt()
        };
        Self { n, mean, sem }
    }
}

/// Summary of one (region, hemisphere, channel) across animals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Canonical region acronym
    pub region: String,
    /// Hemisphere label
    pub hemisphere: Hemisphere,
    /// Canonical channel name
    pub channel: String,
    /// Number of animals with a row for this key
    pub n_animals: usize,
    /// Mean count
    pub count_mean: f64,
    /// Standard error of the count
    pub count_sem: f64,
    /// Mean density over animals with a finite density
    pub density_mean: f64,
    /// Standard error of the density
    pub density_sem: f64,
}

/// Summary of one distribution bin across animals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSummary {
    /// Axis
    pub axis: Axis,
    /// Canonical channel name
    pub channel: String,
    /// Hemisphere label
    pub hemisphere: Hemisphere,
    /// Lower bound of the bin
    pub bin_start: f64,
    /// Upper bound of the bin
    pub bin_end: f64,
    /// Number of animals with a non-NaN value in this bin, empty bins included
    pub n_animals: usize,
    /// Mean bin value
    pub mean: f64,
    /// Standard error of the bin value
    pub sem: f64,
}

/// Group values by key, keeping first-occurrence order
fn group_by_key<'a, T, K, F>(rows: &'a [T], key: F) -> Vec<(K, Vec<&'a T>)>
where
    K: std::hash::Hash + Eq + Clone,
    F: Fn(&T) -> K,
{
    let mut order: Vec<(K, Vec<&T>)> = Vec::new();
    let mut index: FxHashMap<K, usize> = FxHashMap::default();
    for row in rows {
        let k = key(row);
        match index.get(&k) {
            Some(&idx) => order[idx].1.push(row),
            None => {
                index.insert(k.clone(), order.len());
                order.push((k, vec![row]));
            }
        }
    }
    order
}

/// Mean ± SEM of count and density per (region, hemisphere, channel)
#[must_use]
pub fn summarize_regions(rows: &[RegionStat]) -> Vec<RegionSummary> {
    group_by_key(rows, |r| (r.region.clone(), r.hemisphere, r.channel.clone()))
        .into_iter()
        .map(|((region, hemisphere, channel), group)| {
            let count = MeanSem::from_values(group.iter().map(|r| r.count as f64));
            let density = MeanSem::from_values(group.iter().map(|r| r.density));
            RegionSummary {
                region,
                hemisphere,
                channel,
                n_animals: group.len(),
                count_mean: count.mean,
                count_sem: count.sem,
                density_mean: density.mean,
                density_sem: density.sem,
            }
        })
        .collect()
}

/// Bin edge as an integer key, to the nanometre
fn edge_key(edge: f64) -> i64 {
    (edge * 1.0e3).round() as i64
}

/// Mean ± SEM of the bin value per (axis, channel, hemisphere, bin)
///
/// `animals` are all processed animals. Each one missing from a bin counts
/// with `empty_value`, the value its own normalization gives an empty bin.
#[must_use]
pub fn summarize_distributions<S: AsRef<str>>(
    bins: &[DistributionBin],
    animals: &[S],
    empty_value: f64,
) -> Vec<BinSummary> {
    group_by_key(bins, |b| {
        (
            b.axis,
            b.channel.clone(),
            b.hemisphere,
            edge_key(b.bin_start),
            edge_key(b.bin_end),
        )
    })
    .into_iter()
    .map(|((axis, channel, hemisphere, _, _), group)| {
        let present: FxHashSet<&str> = group.iter().map(|b| b.animal_id.as_str()).collect();
        let absent = animals
            .iter()
            .filter(|animal| !present.contains(animal.as_ref()))
            .count();
        let value = MeanSem::from_values(
            group
                .iter()
                .map(|b| b.value)
                .chain(std::iter::repeat_n(empty_value, absent)),
        );
        BinSummary {
            axis,
            channel,
            hemisphere,
            bin_start: group[0].bin_start,
            bin_end: group[0].bin_end,
            n_animals: value.n,
            mean: value.mean,
            sem: value.sem,
        }
    })
    .collect()
}
