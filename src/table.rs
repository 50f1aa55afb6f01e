use serde::{Deserialize, Serialize};

pub const COLUMN_COUNT: usize = 4;

/// Column headings of the deployment table, always row 0.
pub const HEADER: [&str; COLUMN_COUNT] = ["State", "Name", "Type", "Path"];

/// One row of the deployment table: State, Name, Type and Path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow(pub [String; COLUMN_COUNT]);

impl ReportRow {
    pub fn header() -> Self {
        Self(HEADER.map(str::to_owned))
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for ReportRow {
    type Error = Vec<String>;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        <[String; COLUMN_COUNT]>::try_from(tokens).map(Self)
    }
}

/// Header row followed by the parsed data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn new() -> Self {
        Self {
            rows: vec![ReportRow::header()],
        }
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn data_rows(&self) -> &[ReportRow] {
        &self.rows[1..]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table holding nothing but the header row cannot make a report.
    pub fn is_insufficient(&self) -> bool {
        self.data_rows().is_empty()
    }
}

impl Default for ReportTable {
    fn default() -> Self {
        Self::new()
    }
}
