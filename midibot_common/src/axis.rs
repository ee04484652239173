//! Axis identifiers, travel bounds and direction of travel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::AXIS_COUNT;

/// One of the three machine axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Axis {
    /// First note slot.
    X = 0,
    /// Second note slot.
    Y = 1,
    /// Third note slot.
    Z = 2,
}

impl Axis {
    /// All axes in slot order.
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::X, Axis::Y, Axis::Z];

    /// G-code address letter.
    #[inline]
    pub const fn letter(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }

    /// Slot index (`0..3`).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Inclusive travel range of one axis in machine units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl AxisBounds {
    /// Create bounds without validation.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Default X range.
    pub const X_DEFAULT: Self = Self::new(-5.0, 5.0);
    /// Default Y range.
    pub const Y_DEFAULT: Self = Self::new(-5.0, 5.0);
    /// Default Z range.
    pub const Z_DEFAULT: Self = Self::new(0.0, 10.0);

    /// Default range for an axis.
    pub const fn default_for(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X_DEFAULT,
            Axis::Y => Self::Y_DEFAULT,
            Axis::Z => Self::Z_DEFAULT,
        }
    }

    /// True if `position` lies inside the range (inclusive).
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.min && position <= self.max
    }

    /// Check the range is finite, non-empty and holds the reset position 0.
    pub fn validate(&self, axis: Axis) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(format!("axis {axis}: bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(format!(
                "axis {axis}: min {} must be below max {}",
                self.min, self.max
            ));
        }
        if !self.contains(0.0) {
            return Err(format!(
                "axis {axis}: reset position 0 outside [{}, {}]",
                self.min, self.max
            ));
        }
        Ok(())
    }
}

/// Direction of travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Position grows.
    #[default]
    Increasing,
    /// Position shrinks.
    Decreasing,
}

impl Direction {
    /// `1.0` or `-1.0`.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Increasing => 1.0,
            Self::Decreasing => -1.0,
        }
    }

    /// The opposite direction.
    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Increasing => Self::Decreasing,
            Self::Decreasing => Self::Increasing,
        }
    }
}
