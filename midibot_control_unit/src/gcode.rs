//! Motion command encoding (`G1 X<dx> Y<dy> Z<dz> F<feed>`).
//!
//! Every number carries exactly 10 fractional digits, `.` as separator, an
//! optional leading `-` and nothing else. Rounding is half away from zero,
//! identical for all four fields. A rounded zero is always printed unsigned.

use std::fmt;
use std::str::FromStr;

use midibot_common::axis::Axis;
use midibot_common::consts::{AXIS_COUNT, GCODE_FRACTION_DIGITS};
use thiserror::Error;

/// `10^GCODE_FRACTION_DIGITS`.
const FRACTION_SCALE: u128 = 10u128.pow(GCODE_FRACTION_DIGITS as u32);

/// Linear move word.
const LINEAR_MOVE: &str = "G1";

/// One discrete move issued to the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    /// Signed per-axis deltas in X, Y, Z order.
    pub deltas: [f64; AXIS_COUNT],
    /// Combined feed rate [units/min], never negative.
    pub feed: f64,
}

impl MotionCommand {
    /// Create a command.
    pub const fn new(deltas: [f64; AXIS_COUNT], feed: f64) -> Self {
        Self { deltas, feed }
    }

    /// Delta for one axis.
    #[inline]
    pub fn delta(&self, axis: Axis) -> f64 {
        self.deltas[axis.index()]
    }

    /// Encoded command line.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LINEAR_MOVE}")?;
        for axis in Axis::ALL {
            write!(f, " {}{}", axis.letter(), format_fixed(self.delta(axis)))?;
        }
        write!(f, " F{}", format_fixed(self.feed))
    }
}

/// Format `value` with exactly 10 fractional digits, ties away from zero.
pub fn format_fixed(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value:.prec$}", prec = GCODE_FRACTION_DIGITS);
    }
    // f64::round rounds half away from zero.
    let scaled = (value * FRACTION_SCALE as f64).round();
    let sign = if scaled < 0.0 { "-" } else { "" };
    let units = scaled.abs() as u128;
    format!(
        "{sign}{}.{:0width$}",
        units / FRACTION_SCALE,
        units % FRACTION_SCALE,
        width = GCODE_FRACTION_DIGITS
    )
}

/// Errors when parsing an encoded command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GcodeParseError {
    /// Line does not start with `G1`.
    #[error("expected G1, found {0:?}")]
    NotLinearMove(String),
    /// A word is missing.
    #[error("missing {0} word")]
    MissingWord(char),
    /// A word appears twice or is unknown.
    #[error("unexpected word {0:?}")]
    UnexpectedWord(String),
    /// A number failed to parse.
    #[error("invalid number in word {0:?}")]
    InvalidNumber(String),
}

impl FromStr for MotionCommand {
    type Err = GcodeParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some(LINEAR_MOVE) => {}
            other => {
                return Err(GcodeParseError::NotLinearMove(
                    other.unwrap_or_default().to_string(),
                ));
            }
        }

        let mut deltas = [None; AXIS_COUNT];
        let mut feed = None;
        for word in words {
            let mut chars = word.chars();
            let letter = chars.next().unwrap_or_default();
            let value: f64 = chars
                .as_str()
                .parse()
                .map_err(|_| GcodeParseError::InvalidNumber(word.to_string()))?;
            let slot = match letter {
                'X' => &mut deltas[Axis::X.index()],
                'Y' => &mut deltas[Axis::Y.index()],
                'Z' => &mut deltas[Axis::Z.index()],
                'F' => &mut feed,
                _ => return Err(GcodeParseError::UnexpectedWord(word.to_string())),
            };
            if slot.replace(value).is_some() {
                return Err(GcodeParseError::UnexpectedWord(word.to_string()));
            }
        }

        let mut out = [0.0; AXIS_COUNT];
        for axis in Axis::ALL {
            out[axis.index()] =
                deltas[axis.index()].ok_or(GcodeParseError::MissingWord(axis.letter()))?;
        }
        Ok(Self {
            deltas: out,
            feed: feed.ok_or(GcodeParseError::MissingWord('F'))?,
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
