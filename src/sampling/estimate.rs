//! Running estimates and per-bin statistics.

use indexmap::IndexMap;
use num_complex::Complex64;
use num_traits::Zero;
use serde::Serialize;

/// Mean of measured values since the last reset, plus a cumulative mean
/// that survives resets.
///
/// The accumulator a [`Simulation`](super::Simulation) keeps per measurement
/// plan: `add_value` on every measured step,
/// [`reset`](RunningEstimate::reset) from
/// [`reset_measurement_estimates`](super::Simulation::reset_measurement_estimates),
/// and [`recent_result`](RunningEstimate::recent_result) as its
/// [`recent_estimate`](super::Simulation::recent_estimate).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningEstimate {
    recent_sum: Complex64,
    recent_count: u64,
    cumulative_sum: Complex64,
    cumulative_count: u64,
}

impl RunningEstimate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, value: Complex64) {
        self.recent_sum += value;
        self.recent_count += 1;
        self.cumulative_sum += value;
        self.cumulative_count += 1;
    }

    /// Average since the most recent reset, if anything was measured.
    pub fn recent_result(&self) -> Option<Complex64> {
        (self.recent_count > 0).then(|| self.recent_sum / self.recent_count as f64)
    }

    /// Average over the estimator's whole history.
    pub fn cumulative_result(&self) -> Option<Complex64> {
        (self.cumulative_count > 0).then(|| self.cumulative_sum / self.cumulative_count as f64)
    }

    pub fn num_recent_values(&self) -> u64 {
        self.recent_count
    }

    pub fn num_cumulative_values(&self) -> u64 {
        self.cumulative_count
    }

    pub fn reset(&mut self) {
        self.recent_sum = Complex64::zero();
        self.recent_count = 0;
    }
}

/// Statistics over the bins of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinSummary {
    /// Mean over bins
    #[serde(with = "crate::io::tagged_complex")]
    pub mean: Complex64,
    /// Sample variance of the bin values, `Σ|x - mean|² / (n - 1)`
    pub variance: f64,
    /// Standard error of the mean
    pub error: f64,
    /// Number of bins
    pub n_bins: usize,
}

impl BinSummary {
    /// `None` for an empty series. A single bin has zero variance.
    pub fn from_bins(bins: &[Complex64]) -> Option<Self> {
        if bins.is_empty() {
            return None;
        }
        let n = bins.len();
        let mean = bins.iter().sum::<Complex64>() / n as f64;
        if n < 2 {
            return Some(Self {
                mean,
                variance: 0.0,
                error: 0.0,
                n_bins: n,
            });
        }
        let variance = bins.iter().map(|&x| (x - mean).norm_sqr()).sum::<f64>() / (n - 1) as f64;
        Some(Self {
            mean,
            variance,
            error: (variance / n as f64).sqrt(),
            n_bins: n,
        })
    }
}

/// Per-bin values of each basic measurement plan, in bin order.
#[derive(Debug, Clone)]
pub struct BinnedResults<P> {
    bins: IndexMap<P, Vec<Complex64>>,
}

impl<P> Default for BinnedResults<P> {
    fn default() -> Self {
        Self { bins: IndexMap::new() }
    }
}

impl<P: std::hash::Hash + Eq + Clone> BinnedResults<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one bin's value for every plan in `bin`.
    pub fn record(&mut self, bin: IndexMap<P, Complex64>) {
        for (plan, value) in bin {
            self.bins.entry(plan).or_default().push(value);
        }
    }

    pub fn get(&self, plan: &P) -> Option<&[Complex64]> {
        self.bins.get(plan).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&P, &[Complex64])> {
        self.bins.iter().map(|(plan, values)| (plan, values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Value of the last bin of each plan.
    pub fn most_recent(&self) -> IndexMap<P, Complex64> {
        self.bins
            .iter()
            .filter_map(|(plan, values)| values.last().map(|&v| (plan.clone(), v)))
            .collect()
    }

    /// Aggregate each plan's bins into a [`BinSummary`].
    pub fn summarize(&self) -> IndexMap<P, BinSummary> {
        self.bins
            .iter()
            .filter_map(|(plan, values)| BinSummary::from_bins(values).map(|s| (plan.clone(), s)))
            .collect()
    }
}
