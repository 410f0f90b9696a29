//! Tabular mirror of a chart

use crate::payload::{BarSeries, ScatterSeries};

/// Header row plus one row per bar or point, in chart order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn header(title: &str, fallback: &str) -> String {
    if title.trim().is_empty() {
        fallback.to_string()
    } else {
        title.to_string()
    }
}

impl TableView {
    pub(super) fn from_bar(series: &BarSeries) -> Self {
        Self {
            headers: vec![
                header(series.x_axis_title(), "Label"),
                header(series.y_axis_title(), "Value"),
            ],
            rows: series
                .entries()
                .map(|(label, value)| vec![label.to_string(), value.to_string()])
                .collect(),
        }
    }

    pub(super) fn from_scatter(series: &ScatterSeries) -> Self {
        Self {
            headers: vec![
                "Label".to_string(),
                header(series.x_axis_title(), "X"),
                header(series.y_axis_title(), "Y"),
            ],
            rows: series
                .points()
                .map(|(label, x, y)| vec![label.to_string(), x.to_string(), y.to_string()])
                .collect(),
        }
    }

    pub(super) fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of each column in characters, headers included
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_table_has_three_columns() {
        let series = ScatterSeries::new(
            vec!["Erie".into(), "Monroe".into()],
            vec![35.6, 44.1],
            vec![54320.0, 65780.0],
            "College Graduates (%)",
            "Median Income ($)",
            "Income vs Education",
        )
        .unwrap();
        let table = TableView::from_scatter(&series);
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows[1], vec!["Monroe", "44.1", "65780"]);
    }

    #[test]
    fn test_blank_titles_fall_back() {
        let series = BarSeries::new(vec!["a".into()], vec![1.5], "", " ", "").unwrap();
        let table = TableView::from_bar(&series);
        assert_eq!(table.headers, vec!["Label", "Value"]);
        assert_eq!(table.column_widths(), vec![5, 5]);
    }
}
