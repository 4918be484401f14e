//! Distance falloff curves
//!
//! A curve is a list of `(range, percent)` breakpoints with strictly
//! increasing ranges and non-increasing, non-negative percentages. Between
//! breakpoints the percentage is interpolated linearly; closer than the
//! first range it is the first percentage, beyond the last range it is zero.

use crate::geometry::WDist;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FalloffCurve {
    ranges: Vec<WDist>,
    percentages: Vec<i32>,
}

impl FalloffCurve {
    pub fn new(ranges: Vec<WDist>, percentages: Vec<i32>) -> Result<Self, String> {
        if ranges.is_empty() {
            return Err("at least one breakpoint is required".to_string());
        }
        if ranges.len() != percentages.len() {
            return Err(format!(
                "{} ranges but {} percentages",
                ranges.len(),
                percentages.len()
            ));
        }
        if ranges[0] < WDist::ZERO {
            return Err(format!("negative range {}", ranges[0].0));
        }
        if let Some(w) = ranges.windows(2).find(|w| w[1] <= w[0]) {
            return Err(format!("ranges must increase strictly ({} then {})", w[0].0, w[1].0));
        }
        if let Some(p) = percentages.iter().find(|p| **p < 0) {
            return Err(format!("negative percentage {p}"));
        }
        if let Some(w) = percentages.windows(2).find(|w| w[1] > w[0]) {
            return Err(format!("percentages must not increase ({} then {})", w[0], w[1]));
        }
        Ok(Self { ranges, percentages })
    }

    /// Evenly spaced breakpoints `0, spread, 2*spread, ...` for each percentage
    pub fn from_spread(spread: WDist, percentages: Vec<i32>) -> Result<Self, String> {
        if spread <= WDist::ZERO {
            return Err(format!("spread must be positive, got {}", spread.0));
        }
        let ranges = (0..percentages.len() as i32).map(|i| WDist(spread.0 * i)).collect();
        Self::new(ranges, percentages)
    }

    /// Full strength everywhere up to `range`
    pub fn flat(range: WDist) -> Self {
        Self {
            ranges: vec![range.max(WDist::ZERO)],
            percentages: vec![100],
        }
    }

    /// Furthest distance with a non-zero chance of an effect
    pub fn outer_range(&self) -> WDist {
        self.ranges.last().copied().unwrap_or(WDist::ZERO)
    }

    pub fn evaluate(&self, distance: WDist) -> i32 {
        let d = distance.0 as i64;
        let first = self.ranges[0].0 as i64;
        if d <= first {
            return self.percentages[0];
        }
        for i in 1..self.ranges.len() {
            let inner = self.ranges[i - 1].0 as i64;
            let outer = self.ranges[i].0 as i64;
            if d <= outer {
                let (p0, p1) = (self.percentages[i - 1] as i64, self.percentages[i] as i64);
                return (p0 + (p1 - p0) * (d - inner) / (outer - inner)) as i32;
            }
        }
        0
    }
}
