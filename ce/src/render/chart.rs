//! Chart descriptions

use crate::payload::{BarSeries, ScatterSeries};

/// Fraction of the data span added on each side of a scatter axis
const SCATTER_PADDING: f64 = 0.05;

/// Inclusive numeric axis bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Linear value axis anchored at zero
    ///
    /// Zero is always inside the range, so bars are never drawn from an
    /// auto-scaled baseline.
    fn zero_based(values: &[f64]) -> Self {
        let (lo, hi) = finite_bounds(values).unwrap_or((0.0, 0.0));
        let min = lo.min(0.0);
        let max = hi.max(0.0);
        if min == max { Self { min, max: min + 1.0 } } else { Self { min, max } }
    }

    /// Linear axis fitted to the data with a little room on both sides
    fn padded(values: &[f64]) -> Self {
        match finite_bounds(values) {
            None => Self { min: 0.0, max: 1.0 },
            Some((lo, hi)) if lo == hi => Self {
                min: lo - 1.0,
                max: hi + 1.0,
            },
            Some((lo, hi)) => {
                let pad = (hi - lo) * SCATTER_PADDING;
                Self {
                    min: lo - pad,
                    max: hi + pad,
                }
            }
        }
    }
}

fn finite_bounds(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// One category on a bar chart
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Bars in the order the service ranked them
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartView {
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub bars: Vec<Bar>,
    pub value_axis: AxisRange,
}

impl BarChartView {
    pub(super) fn from_series(series: &BarSeries) -> Self {
        Self {
            x_axis_title: series.x_axis_title().to_string(),
            y_axis_title: series.y_axis_title().to_string(),
            bars: series
                .entries()
                .map(|(label, value)| Bar {
                    label: label.to_string(),
                    value,
                })
                .collect(),
            value_axis: AxisRange::zero_based(series.values()),
        }
    }
}

/// One labelled point on a scatter chart
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// Points on two numeric axes
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChartView {
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub points: Vec<ScatterPoint>,
    pub x_axis: AxisRange,
    pub y_axis: AxisRange,
}

impl ScatterChartView {
    pub(super) fn from_series(series: &ScatterSeries) -> Self {
        Self {
            x_axis_title: series.x_axis_title().to_string(),
            y_axis_title: series.y_axis_title().to_string(),
            points: series
                .points()
                .map(|(label, x, y)| ScatterPoint {
                    label: label.to_string(),
                    x,
                    y,
                })
                .collect(),
            x_axis: AxisRange::padded(series.x_values()),
            y_axis: AxisRange::padded(series.y_values()),
        }
    }
}

/// What the chart pane shows
#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Bar(BarChartView),
    Scatter(ScatterChartView),
    /// Payload tag outside the supported set
    Unsupported { kind: String },
}

impl ChartView {
    /// Bars or points drawn
    pub fn len(&self) -> usize {
        match self {
            Self::Bar(bar) => bar.bars.len(),
            Self::Scatter(scatter) => scatter.points.len(),
            Self::Unsupported { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
