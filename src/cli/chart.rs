//! Text charts for the terminal: share bars standing in for a pie chart, and
//! a dot plot for sales over time.

use crate::report::{Slice, TrendPoint};

const BAR: char = '█';
const DOT: char = '●';

/// One bar per slice, scaled so that 100% fills `width` cells.
///
/// Lines look like `Visa       ██████████··········  50.0% (10)`.
pub fn share_bars(slices: &[Slice], label_width: usize, width: usize) -> Vec<String> {
    slices
        .iter()
        .map(|slice| {
            let share = slice.share.unwrap_or(0.0);
            let filled = ((share / 100.0) * width as f64).round() as usize;
            let filled = filled.min(width);
            format!(
                "{:<label_width$} {}{} {:>5.1}% ({})",
                super::truncate(&slice.label, label_width),
                BAR.to_string().repeat(filled),
                "·".repeat(width - filled),
                share,
                slice.count,
            )
        })
        .collect()
}

/// Plot period sums as dots on a grid `height` rows tall, one column per
/// period, with the maximum and minimum printed on the y axis.
///
/// Returns `height` grid lines followed by an axis line and a line naming
/// the first and last period. An empty series yields no lines.
pub fn line_plot(points: &[TrendPoint], height: usize, precision: usize) -> Vec<String> {
    if points.is_empty() || height == 0 {
        return Vec::new();
    }

    let max = points.iter().map(|p| p.sum).fold(f64::NEG_INFINITY, f64::max);
    let min = points.iter().map(|p| p.sum).fold(f64::INFINITY, f64::min);
    let span = max - min;

    let levels: Vec<usize> = points
        .iter()
        .map(|p| {
            if span > 0.0 {
                (((p.sum - min) / span) * (height - 1) as f64).round() as usize
            } else {
                0
            }
        })
        .collect();

    let top_label = super::format_amount(max, precision);
    let bottom_label = super::format_amount(min, precision);
    let axis_width = top_label.chars().count().max(bottom_label.chars().count());

    let mut lines = Vec::with_capacity(height + 2);
    for row in (0..height).rev() {
        let label = if row == height - 1 {
            top_label.as_str()
        } else if row == 0 {
            bottom_label.as_str()
        } else {
            ""
        };

        let cells: String = levels
            .iter()
            .map(|&level| if level == row { DOT } else { ' ' })
            .collect();
        lines.push(format!("{label:>axis_width$} │{}", cells.trim_end()));
    }

    lines.push(format!("{:>axis_width$} └{}", "", "─".repeat(points.len())));

    let first = &points[0].period;
    let last = &points[points.len() - 1].period;
    if points.len() == 1 {
        lines.push(format!("{:>axis_width$}  {first}", ""));
    } else {
        lines.push(format!("{:>axis_width$}  {first} … {last}", ""));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(label: &str, count: usize, share: f64) -> Slice {
        Slice {
            label: label.to_string(),
            count,
            share: Some(share),
        }
    }

    fn point(period: &str, sum: f64) -> TrendPoint {
        TrendPoint {
            period: period.to_string(),
            count: 1,
            sum,
        }
    }

    #[test]
    fn share_bars_scale_to_width() {
        let lines = share_bars(&[slice("Cash", 3, 75.0), slice("Visa", 1, 25.0)], 6, 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches(BAR).count(), 15);
        assert_eq!(lines[1].matches(BAR).count(), 5);
        assert!(lines[0].starts_with("Cash  "));
        assert!(lines[0].ends_with(" 75.0% (3)"));
    }

    #[test]
    fn line_plot_has_grid_axis_and_labels() {
        let points = [point("2020-01", 10.0), point("2020-02", 30.0), point("2020-03", 20.0)];
        let lines = line_plot(&points, 5, 0);
        assert_eq!(lines.len(), 7);
        // Max on the top row, min on the bottom row.
        assert!(lines[0].starts_with("30 │ ●"));
        assert!(lines[4].starts_with("10 │●"));
        assert!(lines[6].contains("2020-01 … 2020-03"));
    }

    #[test]
    fn flat_series_sits_on_the_bottom_row() {
        let points = [point("2020", 5.0), point("2021", 5.0)];
        let lines = line_plot(&points, 3, 2);
        assert_eq!(lines[2].matches(DOT).count(), 2);
        assert_eq!(lines[0].matches(DOT).count(), 0);
    }

    #[test]
    fn empty_series_plots_nothing() {
        assert!(line_plot(&[], 5, 2).is_empty());
    }
}
