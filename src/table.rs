//! Pipe-table model parsed from a contiguous run of `|`-prefixed lines.

use regex::Regex;
use std::sync::OnceLock;

fn separator_cell_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^:?-{3,}:?$").ok()).as_ref()
}

/// Parsed table rows with optional header detection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableModel {
    /// All rendered rows; the header (when present) is row 0.
    pub rows: Vec<Vec<String>>,
    /// True when a separator row followed the first row.
    pub has_header: bool,
}

impl TableModel {
    /// Parse trimmed table lines. The separator row, if any, is dropped.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut rows: Vec<Vec<String>> = lines.iter().map(|l| split_row(l.as_ref())).collect();
        let mut has_header = false;
        if rows.len() >= 2 && is_separator_row(&rows[1]) {
            rows.remove(1);
            has_header = true;
        }
        Self { rows, has_header }
    }

    /// Max cell count across rows.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Option<&[String]> {
        if self.has_header {
            self.rows.first().map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Rows below the header, or every row when no header was detected.
    pub fn body_rows(&self) -> &[Vec<String>] {
        if self.has_header && !self.rows.is_empty() {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }

    /// Cell text, padding short rows with an empty cell.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Whether `row` renders with the header weight.
    pub fn is_header_row(&self, row: usize) -> bool {
        self.has_header && row == 0
    }
}

/// Split a pipe row, discarding the fields outside the outer pipes.
pub fn split_row(line: &str) -> Vec<String> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 2 {
        return Vec::new();
    }
    fields[1..fields.len() - 1]
        .iter()
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// True when every cell is a dash run, optionally colon-flanked.
pub fn is_separator_row<S: AsRef<str>>(cells: &[S]) -> bool {
    let Some(re) = separator_cell_regex() else {
        return false;
    };
    cells.iter().all(|cell| re.is_match(cell.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_row_marks_header_and_is_removed() {
        let table = TableModel::parse(&["| A | B |", "| --- | --- |", "| 1 | 2 |"]);
        assert!(table.has_header);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.header(), Some(&["A".to_string(), "B".to_string()][..]));
        assert_eq!(table.body_rows(), &[vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn alignment_colons_are_accepted_in_separator() {
        assert!(is_separator_row(&[":---", "---:", ":----:"]));
        assert!(!is_separator_row(&["--", "---"]));
        assert!(!is_separator_row(&["- --"]));
    }

    #[test]
    fn table_without_separator_has_no_header() {
        let table = TableModel::parse(&["| a | b |", "| c | d |"]);
        assert!(!table.has_header);
        assert_eq!(table.header(), None);
        assert_eq!(table.body_rows().len(), 2);
    }

    #[test]
    fn short_rows_pad_with_empty_cells() {
        let table = TableModel::parse(&["| a | b | c |", "| d |"]);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(1, 0), "d");
        assert_eq!(table.cell(1, 2), "");
    }

    #[test]
    fn missing_trailing_pipe_drops_last_field() {
        assert_eq!(split_row("| a | b"), vec!["a".to_string()]);
        assert_eq!(split_row("| | |"), vec![String::new(), String::new()]);
        assert!(split_row("|").is_empty());
    }

    #[test]
    fn empty_header_cells_still_detect_separator() {
        let table = TableModel::parse(&["| | |", "| --- | --- |", "| Github | x |"]);
        assert!(table.has_header);
        assert_eq!(table.row_count(), 2);
        assert!(table.is_header_row(0));
        assert!(!table.is_header_row(1));
    }
}
