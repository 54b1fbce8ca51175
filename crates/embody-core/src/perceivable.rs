#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::{Aabb, Vec2};

/// What a perception entry represents, as far as filtering policies care.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PerceivableKind {
    /// Another body. Dead bodies may be hidden depending on `BodyConfig::hide_dead_bodies`.
    Body { alive: bool },
    /// Something that blocks line of sight.
    Obstacle { bounds: Aabb },
    /// Any other visible object that does not occlude.
    Object,
    /// An entry the environment could not classify. Policies keep it and report partial coverage.
    Unrecognized,
}

/// Any world object that can appear in a perception query result.
pub trait Perceivable {
    fn position(&self) -> Vec2;
    fn kind(&self) -> PerceivableKind;
}

impl<T: Perceivable + ?Sized> Perceivable for &T {
    fn position(&self) -> Vec2 {
        (**self).position()
    }

    fn kind(&self) -> PerceivableKind {
        (**self).kind()
    }
}

/// Whether a perception filter could account for every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterCoverage {
    #[default]
    Complete,
    /// The result may still contain occluded entries. Not fatal.
    Partial,
}

impl FilterCoverage {
    pub fn is_complete(self) -> bool {
        matches!(self, FilterCoverage::Complete)
    }

    pub fn merge(self, other: FilterCoverage) -> FilterCoverage {
        if self.is_complete() && other.is_complete() {
            FilterCoverage::Complete
        } else {
            FilterCoverage::Partial
        }
    }
}

/// Filtered perception handed to an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Perception<P> {
    pub entries: Vec<P>,
    pub coverage: FilterCoverage,
}

impl<P> Perception<P> {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            coverage: FilterCoverage::Complete,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.entries.iter()
    }
}

impl<P: Perceivable> Perception<P> {
    /// Closest entry to `from` matching `pred`.
    pub fn nearest(&self, from: Vec2, mut pred: impl FnMut(&P) -> bool) -> Option<&P> {
        self.entries
            .iter()
            .filter(|p| pred(p))
            .min_by(|a, b| {
                let da = a.position().distance(from);
                let db = b.position().distance(from);
                da.total_cmp(&db)
            })
    }
}

/// Keep/hide flags over a raw perception list.
///
/// Policies can only clear flags; the body then compacts the raw list in order, so the filtered
/// output is always a subsequence of what the environment returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityMask {
    visible: Vec<bool>,
}

impl VisibilityMask {
    pub fn all_visible(len: usize) -> Self {
        Self {
            visible: vec![true; len],
        }
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn hide(&mut self, index: usize) {
        if let Some(flag) = self.visible.get_mut(index) {
            *flag = false;
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    pub(crate) fn apply<P>(&self, raw: Vec<P>) -> Vec<P> {
        raw.into_iter()
            .zip(self.visible.iter().copied())
            .filter_map(|(entry, keep)| keep.then_some(entry))
            .collect()
    }
}
