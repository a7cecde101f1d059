//! Similarity of brain maps and permutation testing against null maps.
//!
//! Model
//! - Similarity is Pearson's r, or Spearman's rho (Pearson on average ranks).
//! - Permutation p-values are two-sided with the `+1` correction:
//!   `p = (1 + #{|null| >= |observed|}) / (n_perm + 1)`.
//! - Null maps are matrices with one null per column, as produced by
//!   `nulls`; every column is ranked on its own for Spearman.
//!
//! Assumptions
//! - Parametric p-values are not provided. Without null maps only the
//!   similarity is reported.

use std::fmt;
use std::str::FromStr;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::cfg::DEFAULT_N_PERM;
use crate::error::{check_len, Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    #[default]
    Pearson,
    Spearman,
}

impl Metric {
    pub const NAMES: &'static [&'static str] = &["pearsonr", "spearmanr"];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Pearson => "pearsonr",
            Metric::Spearman => "spearmanr",
        })
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pearsonr" | "pearson" => Ok(Metric::Pearson),
            "spearmanr" | "spearman" => Ok(Metric::Spearman),
            other => Err(Error::InvalidMethod {
                kind: "metric",
                value: other.to_string(),
                valid: Self::NAMES,
            }),
        }
    }
}

/// Handling of NaN entries in the inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NanPolicy {
    /// Any NaN makes the result NaN.
    #[default]
    Propagate,
    /// Any NaN is an error.
    Raise,
    /// Pairs with a NaN on either side are dropped.
    Omit,
}

impl NanPolicy {
    pub const NAMES: &'static [&'static str] = &["propagate", "raise", "omit"];
}

impl FromStr for NanPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "propagate" => Ok(NanPolicy::Propagate),
            "raise" => Ok(NanPolicy::Raise),
            "omit" => Ok(NanPolicy::Omit),
            other => Err(Error::InvalidMethod {
                kind: "nan policy",
                value: other.to_string(),
                valid: Self::NAMES,
            }),
        }
    }
}

/// Applies `policy` to paired samples. `None` means the result is NaN.
fn nan_filter(a: &[f64], b: &[f64], policy: NanPolicy) -> Result<Option<(Vec<f64>, Vec<f64>)>> {
    let has_nan = a.iter().chain(b).any(|x| x.is_nan());
    if !has_nan {
        return Ok(Some((a.to_vec(), b.to_vec())));
    }
    match policy {
        NanPolicy::Propagate => Ok(None),
        NanPolicy::Raise => Err(Error::NanInput),
        NanPolicy::Omit => Ok(Some(
            a.iter()
                .zip(b)
                .filter(|(x, y)| !x.is_nan() && !y.is_nan())
                .map(|(&x, &y)| (x, y))
                .unzip(),
        )),
    }
}

fn pearson_finite(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let (ma, mb) = (a.iter().sum::<f64>() / nf, b.iter().sum::<f64>() / nf);
    let sd = |x: &[f64], m: f64| (x.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (nf - 1.0)).sqrt();
    let (sa, sb) = (sd(a, ma), sd(b, mb));
    let r = a
        .iter()
        .zip(b)
        .map(|(x, y)| ((x - ma) / sa) * ((y - mb) / sb))
        .sum::<f64>()
        / (nf - 1.0);
    // NaN for constant inputs survives the clamp
    r.clamp(-1.0, 1.0)
}

/// Pearson correlation from z-scores (`ddof = 1`), clipped to `[-1, 1]`.
///
/// Constant inputs give NaN.
pub fn efficient_pearsonr(a: &[f64], b: &[f64], nan_policy: NanPolicy) -> Result<f64> {
    check_len("correlation input", a.len(), b.len())?;
    Ok(match nan_filter(a, b, nan_policy)? {
        Some((a, b)) => pearson_finite(&a, &b),
        None => f64::NAN,
    })
}

/// 1-based ranks; ties share their average rank.
pub fn rankdata(x: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&i, &j| x[i].total_cmp(&x[j]));
    let mut ranks = vec![0.0; x.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && x[order[end]] == x[order[start]] {
            end += 1;
        }
        let avg = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg;
        }
        start = end;
    }
    ranks
}

/// Similarity of `a` and `b` under `metric`.
pub fn similarity(a: &[f64], b: &[f64], metric: Metric, nan_policy: NanPolicy) -> Result<f64> {
    check_len("similarity input", a.len(), b.len())?;
    let Some((a, b)) = nan_filter(a, b, nan_policy)? else {
        return Ok(f64::NAN);
    };
    Ok(match metric {
        Metric::Pearson => pearson_finite(&a, &b),
        Metric::Spearman => pearson_finite(&rankdata(&a), &rankdata(&b)),
    })
}

/// Null distribution for a permutation test.
#[derive(Clone, Copy, Debug)]
pub enum NullSource<'a> {
    /// Shuffle `a` this many times.
    Permute { n_perm: usize, seed: Option<u64> },
    /// Explicit null maps for `a`, one per column.
    Maps(&'a DMatrix<f64>),
}

impl Default for NullSource<'_> {
    fn default() -> Self {
        NullSource::Permute {
            n_perm: DEFAULT_N_PERM,
            seed: None,
        }
    }
}

/// Observed similarity of `a` and `b` and its permutation p-value.
///
/// Empty inputs give `(NaN, NaN)`. Null similarities that are NaN never
/// count as exceeding the observed value.
pub fn permtest_metric(
    a: &[f64],
    b: &[f64],
    metric: Metric,
    nulls: NullSource<'_>,
    nan_policy: NanPolicy,
) -> Result<(f64, f64)> {
    check_len("permutation input", a.len(), b.len())?;
    if let NullSource::Maps(maps) = nulls {
        check_len("null maps", a.len(), maps.nrows())?;
    }
    if a.is_empty() {
        return Ok((f64::NAN, f64::NAN));
    }
    let sim = similarity(a, b, metric, nan_policy)?;
    let observed = sim.abs();

    let mut exceed = 0usize;
    let mut count = |null: &[f64]| -> Result<()> {
        if similarity(null, b, metric, nan_policy)?.abs() >= observed {
            exceed += 1;
        }
        Ok(())
    };
    let n_perm = match nulls {
        NullSource::Maps(maps) => {
            for col in maps.column_iter() {
                let col: Vec<f64> = col.iter().copied().collect();
                count(&col)?;
            }
            maps.ncols()
        }
        NullSource::Permute { n_perm, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut shuffled = a.to_vec();
            for _ in 0..n_perm {
                shuffled.shuffle(&mut rng);
                count(&shuffled)?;
            }
            n_perm
        }
    };
    debug!(%metric, n_perm, exceed, "permutation test");
    Ok((sim, (1 + exceed) as f64 / (n_perm + 1) as f64))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CompareOpts<'a> {
    pub metric: Metric,
    /// Drop entries where either map is (numerically) zero.
    pub ignore_zero: bool,
    pub nulls: Option<&'a DMatrix<f64>>,
    pub nan_policy: NanPolicy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison {
    pub similarity: f64,
    /// Present only when null maps were supplied.
    pub pvalue: Option<f64>,
}

fn is_zero(x: f64) -> bool {
    x.abs() <= 1e-8
}

/// Compares two brain maps of equal length.
///
/// NaN entries are always removed (an error under `NanPolicy::Raise`); with
/// `ignore_zero` so are zeros. Null maps are masked the same way and tested
/// with `permtest_metric`.
pub fn compare_images(src: &[f64], trg: &[f64], opts: &CompareOpts<'_>) -> Result<Comparison> {
    check_len("target map", src.len(), trg.len())?;
    if let Some(nulls) = opts.nulls {
        check_len("null maps", src.len(), nulls.nrows())?;
    }
    let has_nan = src.iter().chain(trg).any(|x| x.is_nan());
    if has_nan && opts.nan_policy == NanPolicy::Raise {
        return Err(Error::NanInput);
    }
    let keep: Vec<usize> = (0..src.len())
        .filter(|&i| !src[i].is_nan() && !trg[i].is_nan())
        .filter(|&i| !(opts.ignore_zero && (is_zero(src[i]) || is_zero(trg[i]))))
        .collect();
    let src: Vec<f64> = keep.iter().map(|&i| src[i]).collect();
    let trg: Vec<f64> = keep.iter().map(|&i| trg[i]).collect();
    debug!(kept = keep.len(), metric = %opts.metric, "comparing images");

    match opts.nulls {
        Some(nulls) => {
            let masked = nulls.select_rows(keep.iter());
            let (similarity, p) =
                permtest_metric(&src, &trg, opts.metric, NullSource::Maps(&masked), opts.nan_policy)?;
            Ok(Comparison {
                similarity,
                pvalue: Some(p),
            })
        }
        None => Ok(Comparison {
            similarity: similarity(&src, &trg, opts.metric, opts.nan_policy)?,
            pvalue: None,
        }),
    }
}
