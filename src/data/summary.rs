use std::cmp::Ordering;

use super::model::Dataset;
use crate::error::{PipelineError, Stage};

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Row indices ordered by the numeric value of `idx`, largest first.  Ties
/// keep their original order and rows without a number come last.
fn descending_order(dataset: &Dataset, idx: usize) -> Vec<usize> {
    let mut keyed: Vec<(usize, Option<f64>)> = dataset
        .column_values(idx)
        .map(|c| c.numeric())
        .enumerate()
        .collect();
    keyed.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(i, _)| i).collect()
}

/// The whole dataset sorted by `column`, largest first.
pub fn sort_descending(dataset: &Dataset, column: &str) -> Result<Dataset, PipelineError> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| PipelineError::missing_column(column, Stage::Render))?;
    Ok(dataset.take_rows(&descending_order(dataset, idx)))
}

/// The `n` rows with the largest value in `column`.  Rows without a numeric
/// value are never part of the result.
pub fn top_n(dataset: &Dataset, column: &str, n: usize) -> Result<Dataset, PipelineError> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| PipelineError::missing_column(column, Stage::Rank))?;
    let picked: Vec<usize> = descending_order(dataset, idx)
        .into_iter()
        .filter(|&i| dataset.rows()[i][idx].numeric().is_some())
        .take(n)
        .collect();
    Ok(dataset.take_rows(&picked))
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// `describe()`-style statistics of one numeric column.  With no values every
/// statistic is `None`; `std` also needs at least two values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStats {
    /// Label / value pairs in `describe()` order, for display.
    pub fn rows(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.p25),
            ("50%", self.p50),
            ("75%", self.p75),
            ("max", self.max),
        ]
    }
}

/// Linear interpolation between the closest ranks of a sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn summarize(dataset: &Dataset, column: &str) -> Result<SummaryStats, PipelineError> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| PipelineError::missing_column(column, Stage::Summary))?;

    let mut values: Vec<f64> = dataset.column_values(idx).filter_map(|c| c.numeric()).collect();
    if values.is_empty() {
        return Ok(SummaryStats::default());
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    Ok(SummaryStats {
        count: n,
        mean: Some(mean),
        std,
        min: values.first().copied(),
        p25: Some(percentile(&values, 0.25)),
        p50: Some(percentile(&values, 0.50)),
        p75: Some(percentile(&values, 0.75)),
        max: values.last().copied(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn marks(values: &[&str]) -> Dataset {
        let rows: Vec<Vec<&str>> = values
            .iter()
            .enumerate()
            .map(|(i, v)| vec![["A", "B", "C", "D", "E", "F", "G"][i % 7], *v])
            .collect();
        let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        Dataset::from_text(&["CollegeName", "ST"], &refs)
    }

    #[test]
    fn summary_ignores_missing_values() {
        let stats = summarize(&marks(&["40", "60", "NA", "80"]), "ST").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Some(40.0));
        assert_eq!(stats.max, Some(80.0));
        assert_eq!(stats.mean, Some(60.0));
        assert_eq!(stats.p50, Some(60.0));
        assert_eq!(stats.std, Some(20.0));
    }

    #[test]
    fn quartiles_interpolate_between_ranks() {
        let stats = summarize(&marks(&["1", "2", "3", "4"]), "ST").unwrap();
        assert_eq!(stats.p25, Some(1.75));
        assert_eq!(stats.p50, Some(2.5));
        assert_eq!(stats.p75, Some(3.25));
    }

    #[test]
    fn empty_column_gives_an_empty_summary() {
        let stats = summarize(&marks(&["NA", ""]), "ST").unwrap();
        assert_eq!(stats, SummaryStats::default());

        let single = summarize(&marks(&["12"]), "ST").unwrap();
        assert_eq!(single.count, 1);
        assert_eq!(single.std, None);
    }

    #[test]
    fn top_n_is_descending_and_bounded() {
        let ds = marks(&["50", "90", "NA", "70", "90", "10", "30"]);
        let top = top_n(&ds, "ST", 5).unwrap();
        assert_eq!(top.len(), 5);
        let got: Vec<f64> = top.rows().iter().map(|r| r[1].numeric().unwrap()).collect();
        assert_eq!(got, vec![90.0, 90.0, 70.0, 50.0, 30.0]);
        // ties keep input order
        assert_eq!(top.rows()[0][0], CellValue::from("B"));
        assert_eq!(top.rows()[1][0], CellValue::from("E"));

        let excluded_max = ds
            .rows()
            .iter()
            .filter(|r| !top.rows().contains(r))
            .filter_map(|r| r[1].numeric())
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(got.iter().all(|&v| v >= excluded_max));
    }

    #[test]
    fn top_n_never_exceeds_row_count() {
        let ds = marks(&["5", "6"]);
        assert_eq!(top_n(&ds, "ST", 5).unwrap().len(), 2);
        assert_eq!(top_n(&ds, "ST", 0).unwrap().len(), 0);
    }

    #[test]
    fn sort_descending_puts_missing_last() {
        let ds = marks(&["NA", "3", "9"]);
        let sorted = sort_descending(&ds, "ST").unwrap();
        let names: Vec<String> = sorted.rows().iter().map(|r| r[0].to_string()).collect();
        assert_eq!(names, ["C", "B", "A"]);
    }
}
