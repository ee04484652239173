//! Boundary-reflecting position integrator.
//!
//! Tracks the commanded position and travel direction of each axis. Every
//! tick the integrator receives unsigned per-axis travel magnitudes and
//! returns signed deltas, reversing an axis before it would leave its range:
//!
//! 1. Moving up and `position + d > max` → reverse to decreasing.
//! 2. Moving down (possibly just reversed) and `position - d < min` →
//!    reverse to increasing.
//! 3. Apply `d` in the resulting direction.
//!
//! Each axis is checked against its own magnitude. When `d` exceeds the
//! room on both sides, the axis travels toward the farther bound and stops
//! on it, so the position never leaves `[min, max]`.

use midibot_common::axis::{Axis, AxisBounds, Direction};
use midibot_common::consts::AXIS_COUNT;
use tracing::trace;

/// Commanded state of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    bounds: AxisBounds,
    position: f64,
    direction: Direction,
    reversals: u64,
}

impl AxisState {
    /// Axis at the reset position 0, moving up.
    pub const fn new(bounds: AxisBounds) -> Self {
        Self {
            bounds,
            position: 0.0,
            direction: Direction::Increasing,
            reversals: 0,
        }
    }

    /// Current commanded position.
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current travel direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Configured travel range.
    #[inline]
    pub fn bounds(&self) -> AxisBounds {
        self.bounds
    }

    /// Number of direction reversals since reset.
    #[inline]
    pub fn reversals(&self) -> u64 {
        self.reversals
    }

    /// Advance by `magnitude` and return the signed delta.
    fn advance(&mut self, magnitude: f64) -> f64 {
        let d = magnitude.abs();
        if d == 0.0 {
            return 0.0;
        }

        let mut direction = self.direction;
        if direction == Direction::Increasing && self.position + d > self.bounds.max {
            direction = direction.reversed();
        }
        if direction == Direction::Decreasing && self.position - d < self.bounds.min {
            direction = direction.reversed();
        }

        let candidate = self.position + direction.sign() * d;
        let delta = if self.bounds.contains(candidate) {
            self.position = candidate;
            direction.sign() * d
        } else {
            // Neither direction fits the whole move.
            let room_up = self.bounds.max - self.position;
            let room_down = self.position - self.bounds.min;
            let start = self.position;
            if room_up >= room_down {
                direction = Direction::Increasing;
                self.position = self.bounds.max;
            } else {
                direction = Direction::Decreasing;
                self.position = self.bounds.min;
            }
            self.position - start
        };

        if direction != self.direction {
            self.reversals += 1;
            self.direction = direction;
        }
        delta
    }
}

/// Position integrator for the X, Y and Z axes.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionIntegrator {
    axes: [AxisState; AXIS_COUNT],
}

impl PositionIntegrator {
    /// Create an integrator with every axis at 0, moving up.
    pub fn new(bounds: [AxisBounds; AXIS_COUNT]) -> Self {
        Self {
            axes: bounds.map(AxisState::new),
        }
    }

    /// Return every axis to 0, moving up, with new bounds.
    pub fn reset(&mut self, bounds: [AxisBounds; AXIS_COUNT]) {
        self.axes = bounds.map(AxisState::new);
    }

    /// Advance all axes by unsigned magnitudes; returns signed deltas.
    pub fn advance(&mut self, magnitudes: [f64; AXIS_COUNT]) -> [f64; AXIS_COUNT] {
        let mut deltas = [0.0; AXIS_COUNT];
        for axis in Axis::ALL {
            let i = axis.index();
            deltas[i] = self.axes[i].advance(magnitudes[i]);
            trace!(
                %axis,
                delta = deltas[i],
                position = self.axes[i].position,
                "axis advanced"
            );
        }
        deltas
    }

    /// State of one axis.
    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisState {
        &self.axes[axis.index()]
    }

    /// Current positions in X, Y, Z order.
    pub fn positions(&self) -> [f64; AXIS_COUNT] {
        self.axes.map(|a| a.position)
    }
}

impl Default for PositionIntegrator {
    fn default() -> Self {
        Self::new(Axis::ALL.map(AxisBounds::default_for))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
