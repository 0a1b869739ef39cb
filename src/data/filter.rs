use super::model::{CellValue, Dataset};
use crate::error::{PipelineError, Stage};

// ---------------------------------------------------------------------------
// Filter parameters: chosen once, applied to every file of a batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    /// Substring of the college name; empty means every location.
    pub location: String,
    pub reservation: String,
    /// Cut-off column the marks threshold is compared against.
    pub marks_column: String,
    pub marks_threshold: f64,
    pub display_columns: Vec<String>,
}

/// Names of the identifier columns the stages read.
#[derive(Debug, Clone, Copy)]
pub struct FilterColumns<'a> {
    pub name: &'a str,
    pub reservation: &'a str,
}

/// Intermediate results of one pipeline run.
#[derive(Debug, Clone)]
pub struct FilterStages {
    pub by_location: Dataset,
    pub by_reservation: Dataset,
    pub filtered: Dataset,
}

impl FilterParams {
    /// Run the three stages in their default order: location, then
    /// reservation, then marks.
    pub fn apply(
        &self,
        dataset: &Dataset,
        columns: FilterColumns<'_>,
    ) -> Result<FilterStages, PipelineError> {
        let by_location = filter_by_location(dataset, columns.name, &self.location)?;
        let by_reservation =
            filter_by_reservation(&by_location, columns.reservation, &self.reservation)?;
        let filtered =
            filter_by_marks_threshold(&by_reservation, &self.marks_column, self.marks_threshold)?;
        log::debug!(
            "filter stages: {} rows -> location {} -> reservation {} -> marks {}",
            dataset.len(),
            by_location.len(),
            by_reservation.len(),
            filtered.len()
        );
        Ok(FilterStages {
            by_location,
            by_reservation,
            filtered,
        })
    }
}

// ---------------------------------------------------------------------------
// Stage functions
// ---------------------------------------------------------------------------

/// Case-insensitive literal containment.  Missing cells never match.
fn contains_ignore_case(cell: &CellValue, needle_lower: &str) -> bool {
    match cell {
        CellValue::Missing => false,
        other => other.to_string().to_lowercase().contains(needle_lower),
    }
}

/// Keep rows whose name column contains `substring`, ignoring case.
/// An empty substring returns the input unchanged.
pub fn filter_by_location(
    dataset: &Dataset,
    name_column: &str,
    substring: &str,
) -> Result<Dataset, PipelineError> {
    if substring.is_empty() {
        return Ok(dataset.clone());
    }
    let idx = dataset
        .column_index(name_column)
        .ok_or_else(|| PipelineError::missing_column(name_column, Stage::Location))?;
    let needle = substring.to_lowercase();
    Ok(dataset.filter_rows(|row| contains_ignore_case(&row[idx], &needle)))
}

/// Keep rows whose reservation column contains `reservation`, ignoring
/// case.  The empty string is contained in everything, so it keeps every
/// row, including rows without a reservation value.
pub fn filter_by_reservation(
    dataset: &Dataset,
    reservation_column: &str,
    reservation: &str,
) -> Result<Dataset, PipelineError> {
    let idx = dataset
        .column_index(reservation_column)
        .ok_or_else(|| PipelineError::missing_column(reservation_column, Stage::Reservation))?;
    if reservation.is_empty() {
        return Ok(dataset.clone());
    }
    let needle = reservation.to_lowercase();
    Ok(dataset.filter_rows(|row| contains_ignore_case(&row[idx], &needle)))
}

/// Coerce `column` to numbers on a working copy, then keep rows whose value
/// is at most `threshold`.  Values that fail coercion become `Missing` and
/// are dropped.
pub fn filter_by_marks_threshold(
    dataset: &Dataset,
    column: &str,
    threshold: f64,
) -> Result<Dataset, PipelineError> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| PipelineError::missing_column(column, Stage::Marks))?;

    let mut working = dataset.clone();
    let mut coerced_away = 0usize;
    working.map_column(idx, |cell| {
        let coerced = cell.coerce_numeric();
        if coerced.is_missing() && !cell.is_missing() {
            coerced_away += 1;
        }
        coerced
    });
    if coerced_away > 0 {
        log::debug!("{coerced_away} non-numeric values in '{column}' treated as missing");
    }

    Ok(working.filter_rows(|row| matches!(row[idx].as_f64(), Some(v) if v <= threshold)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "CollegeName";
    const RES: &str = "Reservation Details";

    fn cutoffs() -> Dataset {
        Dataset::from_text(
            &["ChoiceCodeDisplay", NAME, RES, "ST"],
            &[
                &["101", "Alpha College", "OPEN", "55"],
                &["102", "Beta Institute", "SC", "70"],
                &["103", "Alpha Tech", "OPEN", "45"],
            ],
        )
    }

    fn with_missing_cells() -> Dataset {
        Dataset::new(
            vec![NAME.into(), RES.into(), "ST".into()],
            vec![
                vec!["Gamma Pune".into(), CellValue::Missing, "NA".into()],
                vec![CellValue::Missing, "OPEN".into(), CellValue::Integer(40)],
            ],
        )
    }

    #[test]
    fn empty_location_is_identity() {
        for ds in [cutoffs(), with_missing_cells()] {
            assert_eq!(filter_by_location(&ds, NAME, "").unwrap(), ds);
        }
    }

    #[test]
    fn empty_reservation_keeps_every_row() {
        for ds in [cutoffs(), with_missing_cells()] {
            assert_eq!(filter_by_reservation(&ds, RES, "").unwrap(), ds);
        }
    }

    #[test]
    fn location_match_ignores_case_and_drops_missing_names() {
        let out = filter_by_location(&cutoffs(), NAME, "alpha").unwrap();
        assert_eq!(out.len(), 2);

        let out = filter_by_location(&with_missing_cells(), NAME, "pune").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0][0], CellValue::from("Gamma Pune"));
    }

    #[test]
    fn reservation_is_a_substring_match() {
        let out = filter_by_reservation(&cutoffs(), RES, "pe").unwrap();
        assert_eq!(out.len(), 2);
        let out = filter_by_reservation(&with_missing_cells(), RES, "open").unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn marks_filter_keeps_values_at_or_below_threshold() {
        let out = filter_by_marks_threshold(&cutoffs(), "ST", 55.0).unwrap();
        assert_eq!(out.len(), 2);
        for row in out.rows() {
            let v = row[3].as_f64().unwrap();
            assert!(v <= 55.0);
        }
    }

    #[test]
    fn marks_filter_drops_unparsable_values() {
        let out = filter_by_marks_threshold(&with_missing_cells(), "ST", 100.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0][2], CellValue::Integer(40));
    }

    #[test]
    fn marks_filter_is_idempotent() {
        let ds = cutoffs();
        let once = filter_by_marks_threshold(&ds, "ST", 60.0).unwrap();
        let twice = filter_by_marks_threshold(&once, "ST", 60.0).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn marks_filter_does_not_touch_the_input() {
        let ds = with_missing_cells();
        let _ = filter_by_marks_threshold(&ds, "ST", 100.0).unwrap();
        assert_eq!(ds.rows()[0][2], CellValue::from("NA"));
    }

    #[test]
    fn unknown_column_names_the_stage() {
        let err = filter_by_marks_threshold(&cutoffs(), "OBC", 10.0).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, stage: Stage::Marks } if column == "OBC"
        ));
    }

    #[test]
    fn default_order_produces_the_single_qualifying_row() {
        let params = FilterParams {
            location: "Alpha".into(),
            reservation: "OPEN".into(),
            marks_column: "ST".into(),
            marks_threshold: 50.0,
            display_columns: Vec::new(),
        };
        let stages = params
            .apply(&cutoffs(), FilterColumns { name: NAME, reservation: RES })
            .unwrap();
        assert_eq!(stages.by_location.len(), 2);
        assert_eq!(stages.by_reservation.len(), 2);
        assert_eq!(stages.filtered.len(), 1);
        let row = &stages.filtered.rows()[0];
        assert_eq!(row[0], CellValue::from("103"));
        assert_eq!(row[1], CellValue::from("Alpha Tech"));
        assert_eq!(row[2], CellValue::from("OPEN"));
        assert_eq!(row[3], CellValue::Integer(45));
    }
}
