//! # Breakpoint Tables
//!
//! Piecewise-linear lookup over sorted `(x, y)` breakpoints, shared by every
//! table-driven correction in the engines (ampacity by cross-section,
//! ambient temperature factors, ...).
//!
//! Outside the tabulated range the first/last value is held, so a table
//! never extrapolates.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::electrical::interpolation::Breakpoints;
//!
//! const TABLE: Breakpoints = Breakpoints::new(&[(30.0, 1.15), (40.0, 1.00)]);
//!
//! assert_eq!(TABLE.interpolate(30.0), 1.15);
//! assert!((TABLE.interpolate(35.0) - 1.075).abs() < 1e-12);
//! assert_eq!(TABLE.interpolate(50.0), 1.00);
//! ```

/// Sorted breakpoint table. Keys must be strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints {
    points: &'static [(f64, f64)],
}

impl Breakpoints {
    /// Wrap a static table.
    pub const fn new(points: &'static [(f64, f64)]) -> Self {
        Breakpoints { points }
    }

    /// All `(x, y)` pairs in ascending order
    pub fn points(&self) -> &'static [(f64, f64)] {
        self.points
    }

    /// Tabulated keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(x, _)| *x)
    }

    /// Largest tabulated key
    pub fn max_key(&self) -> Option<f64> {
        self.points.last().map(|(x, _)| *x)
    }

    /// Value stored for exactly `x`, if `x` is a tabulated key
    pub fn lookup_exact(&self, x: f64) -> Option<f64> {
        self.points.iter().find(|(key, _)| *key == x).map(|(_, y)| *y)
    }

    /// Linear interpolation at `x`, holding the end values outside the
    /// tabulated range. An empty table yields 0.
    pub fn interpolate(&self, x: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };

        if let Some(y) = self.lookup_exact(x) {
            return y;
        }
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
            }
        }

        last.1
    }
}

/// Value in `candidates` closest to `x`. Ties go to the smaller value.
pub fn nearest(candidates: &[f64], x: f64) -> Option<f64> {
    candidates.iter().copied().fold(None, |best, candidate| match best {
        Some(b) if (b - x).abs() <= (candidate - x).abs() => Some(b),
        _ => Some(candidate),
    })
}
