//! Parcellation labels, background resolution and relabelling.

use std::collections::{BTreeMap, BTreeSet};

use crate::cfg::PARCIGNORE;
use crate::hemi::Hemispheres;

/// Per-vertex integer labels plus a label → name table.
///
/// Label 0 is background. The table may be empty (unnamed atlas); in that case
/// only label 0 and negative labels are treated as background.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parcellation {
    pub labels: Vec<i32>,
    pub table: BTreeMap<i32, String>,
}

impl Parcellation {
    pub fn new(labels: Vec<i32>, table: BTreeMap<i32, String>) -> Self {
        Self { labels, table }
    }

    /// Labels without names.
    pub fn from_labels(labels: Vec<i32>) -> Self {
        Self {
            labels,
            table: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn name(&self, label: i32) -> Option<&str> {
        self.table.get(&label).map(String::as_str)
    }

    /// Distinct label values, ascending (background included).
    pub fn unique_labels(&self) -> Vec<i32> {
        self.labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether `label` has a name listed in `drop` (`None` = `PARCIGNORE`).
    pub fn is_dropped(&self, label: i32, drop: Option<&[String]>) -> bool {
        self.name(label).map_or(false, |name| name_in_drop(name, drop))
    }

    /// Number of distinct positive labels.
    pub fn n_parcels(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l > 0)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Resolves background once: labels named in `drop` and labels `<= 0`
    /// become 0, the remaining labels become consecutive `offset + 1..`
    /// in ascending order of their old value. The table is rewritten to the
    /// new ids.
    pub fn relabel(&self, drop: Option<&[String]>, offset: i32) -> Parcellation {
        let kept: Vec<i32> = self
            .unique_labels()
            .into_iter()
            .filter(|&l| l > 0 && !self.is_dropped(l, drop))
            .collect();
        let mapping: BTreeMap<i32, i32> = kept
            .iter()
            .enumerate()
            .map(|(k, &old)| (old, offset + k as i32 + 1))
            .collect();

        let labels = self
            .labels
            .iter()
            .map(|l| mapping.get(l).copied().unwrap_or(0))
            .collect();
        let mut table: BTreeMap<i32, String> = mapping
            .iter()
            .filter_map(|(old, new)| self.table.get(old).map(|n| (*new, n.clone())))
            .collect();
        if let Some(bg) = self.table.get(&0) {
            table.insert(0, bg.clone());
        }
        Parcellation { labels, table }
    }
}

/// `drop` membership with `None` standing for `PARCIGNORE`.
pub(crate) fn name_in_drop(name: &str, drop: Option<&[String]>) -> bool {
    match drop {
        Some(names) => names.iter().any(|n| n == name),
        None => PARCIGNORE.contains(&name),
    }
}

/// Relabels both hemispheres so right-hemisphere ids continue after the left's.
pub fn relabel_hemispheres(
    parcellation: &Hemispheres<Parcellation>,
    drop: Option<&[String]>,
) -> Hemispheres<Parcellation> {
    let left = parcellation.left.relabel(drop, 0);
    let offset = left.n_parcels() as i32;
    let right = parcellation.right.relabel(drop, offset);
    Hemispheres::new(left, right)
}

/// Concatenated (left, right) labels after `relabel_hemispheres`.
pub fn joint_labels(
    parcellation: &Hemispheres<Parcellation>,
    drop: Option<&[String]>,
) -> Vec<i32> {
    let relabelled = relabel_hemispheres(parcellation, drop);
    let mut labels = relabelled.left.labels;
    labels.extend(relabelled.right.labels);
    labels
}
