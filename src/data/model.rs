use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of an uploaded sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what spreadsheet readers produce.
/// `CellValue` is `Ord` + `Hash` so it can key maps and sets downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Missing,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeMap / HashSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Missing, Missing) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Missing => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl CellValue {
    /// Numeric view of the cell without any parsing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Convert to a number the way a lenient dataframe `to_numeric` would:
    /// numbers pass through, numeric text is parsed, everything else
    /// (including NaN) becomes `Missing`.
    pub fn coerce_numeric(&self) -> CellValue {
        match self {
            CellValue::Integer(_) => self.clone(),
            CellValue::Float(v) if v.is_nan() => CellValue::Missing,
            CellValue::Float(_) => self.clone(),
            CellValue::Text(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    CellValue::Integer(i)
                } else {
                    match s.parse::<f64>() {
                        Ok(v) if !v.is_nan() => CellValue::Float(v),
                        _ => CellValue::Missing,
                    }
                }
            }
            _ => CellValue::Missing,
        }
    }

    /// The number behind [`coerce_numeric`](Self::coerce_numeric), if any.
    pub fn numeric(&self) -> Option<f64> {
        self.coerce_numeric().as_f64()
    }
}

// ---------------------------------------------------------------------------
// Dataset – one uploaded sheet
// ---------------------------------------------------------------------------

/// Named columns over row-major cells. Every row holds exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, padding short rows with `Missing` and dropping
    /// cells past the last column so every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Missing);
                row
            })
            .collect();
        Dataset { columns, rows }
    }

    #[cfg(test)]
    pub fn from_text(columns: &[&str], rows: &[&[&str]]) -> Self {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|&v| CellValue::from(v)).collect())
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Distinct non-missing values of a column in first-seen order.
    pub fn distinct_values(&self, idx: usize) -> Vec<CellValue> {
        let mut seen = HashSet::new();
        self.column_values(idx)
            .filter(|v| !v.is_missing())
            .filter(|v| seen.insert((*v).clone()))
            .cloned()
            .collect()
    }

    /// Keep the rows for which `keep` returns true, preserving order.
    pub fn filter_rows(&self, mut keep: impl FnMut(&[CellValue]) -> bool) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rows at the given indices, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Rewrite every cell of one column in place.
    pub fn map_column(&mut self, idx: usize, mut f: impl FnMut(&CellValue) -> CellValue) {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// Project onto `names`, in that order. Returns the first unknown name
    /// as the error.
    pub fn select(&self, names: &[String]) -> Result<Dataset, String> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n).ok_or_else(|| n.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset {
            columns: names.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }
}
