//! Raw tabular data as read from a worksheet, before any normalization.
//!
//! Row 0 of a [`RawTable`] is row 1 of the sheet; column 0 is column A.
//! Cells outside the populated range read as [`RawCell::Empty`].

#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY: RawCell = RawCell::Empty;

impl RawCell {
    /// Empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text content, only for text cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Display text for any non-blank cell. Integral numbers print without decimals.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{}", n))
                }
            }
            Self::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, so ragged rows still count their trailing columns.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, row: usize) -> &[RawCell] {
        self.rows.get(row).map(|r| r.as_slice()).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[RawCell]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn is_row_blank(&self, row: usize) -> bool {
        self.row(row).iter().all(RawCell::is_blank)
    }

    /// Copy of the rows left after dropping `top` rows from the start and
    /// `bottom` rows from the end. Over-long skips yield an empty table.
    pub fn slice_rows(&self, top: usize, bottom: usize) -> RawTable {
        let end = self.rows.len().saturating_sub(bottom);
        if top >= end {
            return RawTable::default();
        }
        RawTable::new(self.rows[top..end].to_vec())
    }

    /// Copy of the first `n` rows.
    pub fn truncate(&self, n: usize) -> RawTable {
        let end = n.min(self.rows.len());
        RawTable::new(self.rows[..end].to_vec())
    }

    /// Copy without the columns whose cells are blank in every row from
    /// `first_data_row` on. Rows above it (headers) are carried along but do
    /// not keep a column alive.
    pub fn drop_empty_columns(&self, first_data_row: usize) -> RawTable {
        let width = self.width();
        let keep: Vec<usize> = (0..width)
            .filter(|&c| {
                (first_data_row..self.rows.len()).any(|r| !self.cell(r, c).is_blank())
            })
            .collect();

        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(r, _)| keep.iter().map(|&c| self.cell(r, c).clone()).collect())
            .collect();
        RawTable::new(rows)
    }

    /// Position of the first cell in `row` whose text equals `name`.
    pub fn find_in_row(&self, row: usize, name: &str) -> Option<usize> {
        self.row(row)
            .iter()
            .position(|cell| cell.to_text().as_deref() == Some(name))
    }
}

/// Parse an Excel column letter ("A", "h", "AA") into a 0-based index.
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }
    let mut idx: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let v = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        idx = idx.checked_mul(26)?.checked_add(v)?;
    }
    Some(idx - 1)
}

/// Convert a 0-based column index to its letter (0 = A, 25 = Z, 26 = AA).
pub fn column_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
