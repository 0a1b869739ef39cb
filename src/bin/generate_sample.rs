use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const CITIES: [&str; 6] = ["Pune", "Mumbai", "Nagpur", "Nashik", "Aurangabad", "Kolhapur"];
const KINDS: [&str; 4] = [
    "Institute of Technology",
    "College of Engineering",
    "Education Society's College of Engineering and Research",
    "Vidyapeeth Institute of Information Technology",
];
const FOUNDERS: [&str; 5] = ["Shivaji", "Savitribai Phule", "Tilak", "Bharati", "Dnyanganga"];
const RESERVATIONS: [&str; 4] = [
    "Maharashtra State Seats",
    "Home University Seats Allotted to Home University Candidates",
    "Other Than Home University Seats",
    "All India Seats",
];
const BRANCHES: [&str; 4] = [
    "Computer Engineering",
    "Information Technology",
    "Mechanical Engineering",
    "Civil Engineering",
];
/// Cut-off categories and how far below the open cut-off each sits.
const CATEGORIES: [(&str, f64); 4] = [("General", 0.0), ("OBC", 8.0), ("SC", 18.0), ("ST", 25.0)];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One generated cut-off row.  `None` marks are written as null / "NA".
struct CutoffRow {
    choice_code: String,
    college: String,
    reservation: String,
    marks: Vec<Option<f64>>,
}

fn generate(rng: &mut SimpleRng, colleges: usize) -> Vec<CutoffRow> {
    let mut rows = Vec::new();
    for c in 0..colleges {
        let city = rng.pick(&CITIES);
        let college = format!(
            "{} {}, {city}",
            rng.pick(&FOUNDERS),
            rng.pick(&KINDS)
        );
        let code = 6000 + c as u64 * 7;
        for (b, branch) in BRANCHES.iter().enumerate() {
            let open = 35.0 + rng.next_f64() * 60.0;
            let reservation = rng.pick(&RESERVATIONS);
            let marks = CATEGORIES
                .iter()
                .map(|&(_, offset)| {
                    // Roughly one cut-off in twelve is not published.
                    if rng.next_f64() < 0.08 {
                        None
                    } else {
                        let v: f64 = open - offset + rng.next_f64() * 4.0;
                        Some((v.max(1.0) * 100.0).round() / 100.0)
                    }
                })
                .collect();
            rows.push(CutoffRow {
                choice_code: format!("{code}{b:02}10"),
                college: format!("{college} - {branch}"),
                reservation: reservation.to_string(),
                marks,
            });
        }
    }
    rows
}

fn write_parquet(rows: &[CutoffRow], path: &str) {
    let mut fields = vec![
        Field::new("ChoiceCodeDisplay", DataType::Utf8, false),
        Field::new("CollegeName", DataType::Utf8, false),
        Field::new("Reservation Details", DataType::Utf8, false),
    ];
    fields.extend(
        CATEGORIES
            .iter()
            .map(|&(name, _)| Field::new(name, DataType::Float64, true)),
    );
    let schema = Arc::new(Schema::new(fields));

    let text = |f: fn(&CutoffRow) -> &str| {
        let values: Vec<&str> = rows.iter().map(f).collect();
        Arc::new(StringArray::from(values)) as arrow::array::ArrayRef
    };
    let mut columns = vec![
        text(|r| r.choice_code.as_str()),
        text(|r| r.college.as_str()),
        text(|r| r.reservation.as_str()),
    ];
    for i in 0..CATEGORIES.len() {
        let values: Float64Array = rows.iter().map(|r| r.marks[i]).collect();
        columns.push(Arc::new(values));
    }

    let batch =
        RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn write_csv(rows: &[CutoffRow], path: &str) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create output file");
    let mut header = vec!["ChoiceCodeDisplay", "CollegeName", "Reservation Details"];
    header.extend(CATEGORIES.iter().map(|&(name, _)| name));
    writer.write_record(&header).expect("Failed to write header");

    for row in rows {
        let mut record = vec![
            row.choice_code.clone(),
            row.college.clone(),
            row.reservation.clone(),
        ];
        record.extend(
            row.marks
                .iter()
                .map(|m| m.map_or_else(|| "NA".to_string(), |v| v.to_string())),
        );
        writer.write_record(&record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng, 40);

    write_parquet(&rows, "sample_cutoffs.parquet");
    write_csv(&rows, "sample_cutoffs.csv");

    println!(
        "Wrote {} cut-off rows to sample_cutoffs.parquet and sample_cutoffs.csv",
        rows.len()
    );
}
