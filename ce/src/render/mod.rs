//! Visualization dispatcher
//!
//! Turns a [`ChartPayload`] into a backend-independent [`RenderedView`]: a
//! chart description plus its tabular mirror. Both halves come from the same
//! match on the payload, so they can never disagree about which variant they
//! are showing or how many rows it has. The terminal views only translate
//! these descriptions into widgets.

use tracing::debug;

use crate::payload::ChartPayload;

mod chart;
mod table;

pub use chart::{AxisRange, Bar, BarChartView, ChartView, ScatterChartView, ScatterPoint};
pub use table::TableView;

/// Chart and table for one payload
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub title: String,
    pub chart: ChartView,
    pub table: TableView,
}

impl RenderedView {
    /// Number of bars or points in the chart
    pub fn series_len(&self) -> usize {
        self.chart.len()
    }
}

/// Render a payload
///
/// Bar is checked before scatter; anything else takes the unsupported path,
/// which carries the raw discriminant and never fails.
pub fn render(payload: &ChartPayload) -> RenderedView {
    debug!(kind = payload.kind(), "render: called");
    match payload {
        ChartPayload::Bar(bar) => RenderedView {
            title: bar.title().to_string(),
            chart: ChartView::Bar(BarChartView::from_series(bar)),
            table: TableView::from_bar(bar),
        },
        ChartPayload::Scatter(scatter) => RenderedView {
            title: scatter.title().to_string(),
            chart: ChartView::Scatter(ScatterChartView::from_series(scatter)),
            table: TableView::from_scatter(scatter),
        },
        ChartPayload::Unsupported { kind, .. } => {
            debug!(%kind, "render: unsupported chart type");
            RenderedView {
                title: String::new(),
                chart: ChartView::Unsupported { kind: kind.clone() },
                table: TableView::empty(),
            }
        }
    }
}
