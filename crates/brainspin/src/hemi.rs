//! Hemisphere designation and left/right pairs.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Cortical hemisphere. The discriminant is the `hemiid` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Hemisphere {
    Left = 0,
    Right = 1,
}

impl Hemisphere {
    pub const BOTH: [Hemisphere; 2] = [Hemisphere::Left, Hemisphere::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short designation used in atlas file names.
    pub fn short(self) -> &'static str {
        match self {
            Hemisphere::Left => "L",
            Hemisphere::Right => "R",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

impl TryFrom<u8> for Hemisphere {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Hemisphere::Left),
            1 => Ok(Hemisphere::Right),
            other => Err(Error::InvalidHemisphere {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<i64> for Hemisphere {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| Error::InvalidHemisphere {
                value: value.to_string(),
            })
            .and_then(Hemisphere::try_from)
    }
}

impl FromStr for Hemisphere {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "L" | "lh" | "left" | "0" => Ok(Hemisphere::Left),
            "R" | "rh" | "right" | "1" => Ok(Hemisphere::Right),
            other => Err(Error::InvalidHemisphere {
                value: other.to_string(),
            }),
        }
    }
}

/// Parses a slice of raw ids into hemispheres, rejecting anything outside {0, 1}.
pub fn hemiid_from_ints(ids: &[i64]) -> Result<Vec<Hemisphere>> {
    ids.iter().map(|&v| Hemisphere::try_from(v)).collect()
}

/// A (left, right) pair of per-hemisphere inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Hemispheres<T> {
    pub left: T,
    pub right: T,
}

impl<T> Hemispheres<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn get(&self, hemi: Hemisphere) -> &T {
        match hemi {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }

    /// Left first, then right.
    pub fn iter(&self) -> impl Iterator<Item = (Hemisphere, &T)> {
        [(Hemisphere::Left, &self.left), (Hemisphere::Right, &self.right)].into_iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Hemispheres<U> {
        Hemispheres {
            left: f(&self.left),
            right: f(&self.right),
        }
    }
}
