//! Descriptions of state, action, and observation spaces.

use serde::{Deserialize, Serialize};

/// Inclusive bounds of one dimension of a continuous space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        debug_assert!(low <= high, "bounds out of order: {low} > {high}");
        Self { low, high }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Enumeration result usable polymorphically across model variants.
///
/// Discrete models enumerate every member; continuous models describe
/// per-dimension bounds instead of members.
#[derive(Debug, Clone)]
pub enum Space<T> {
    Enumerated(Vec<T>),
    Bounded(Vec<Bounds>),
}

impl<T> Space<T> {
    /// The enumerated members, or `None` for continuous spaces.
    pub fn members(&self) -> Option<&[T]> {
        match self {
            Space::Enumerated(members) => Some(members),
            Space::Bounded(_) => None,
        }
    }

    /// The per-dimension bounds, or `None` for enumerated spaces.
    pub fn bounds(&self) -> Option<&[Bounds]> {
        match self {
            Space::Enumerated(_) => None,
            Space::Bounded(bounds) => Some(bounds),
        }
    }

    pub fn is_enumerable(&self) -> bool {
        matches!(self, Space::Enumerated(_))
    }

    /// Number of enumerated members; continuous spaces report `None`.
    pub fn cardinality(&self) -> Option<usize> {
        self.members().map(<[T]>::len)
    }
}
