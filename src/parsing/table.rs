// src/parsing/table.rs
//! Table geometry: splitting tall tables under the row cap and sizing
//! columns from their content.

use crate::constants::{
    TABLE_COLUMN_MAX_WIDTH, TABLE_COLUMN_MIN_WIDTH, TABLE_PIXELS_PER_CHAR, TABLE_TARGET_WIDTH,
};
use crate::model::TableData;
use crate::types::StyledText;

/// A table as parsed, before splitting.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub columns: usize,
    /// `None` when the source header row is entirely blank.
    pub header: Option<Vec<StyledText>>,
    pub rows: Vec<Vec<StyledText>>,
}

impl ParsedTable {
    /// Pads or truncates every row to the column count.
    fn normalized(mut self) -> Self {
        let columns = self.columns;
        let fit = |row: &mut Vec<StyledText>| row.resize_with(columns, StyledText::new);
        if let Some(header) = self.header.as_mut() {
            fit(header);
        }
        self.rows.iter_mut().for_each(fit);
        self
    }
}

/// Splits a parsed table into chunks of at most `max_rows` rows each,
/// header included.
///
/// Each chunk repeats the header when the table has one. Column widths are
/// computed once over the whole table so all chunks line up.
pub fn split_table(table: ParsedTable, max_rows: usize) -> Vec<TableData> {
    if table.columns == 0 {
        return Vec::new();
    }
    let table = table.normalized();
    let widths = column_widths(&table);
    let header_rows = usize::from(table.header.is_some());
    let data_per_chunk = max_rows.saturating_sub(header_rows).max(1);

    if table.rows.is_empty() {
        return match table.header {
            Some(header) => vec![build_chunk(table.columns, Some(&header), &[], &widths)],
            None => Vec::new(),
        };
    }

    let chunks: Vec<TableData> = table
        .rows
        .chunks(data_per_chunk)
        .map(|rows| build_chunk(table.columns, table.header.as_deref(), rows, &widths))
        .collect();

    if chunks.len() > 1 {
        log::debug!(
            "Split a {}-row table into {} tables of at most {} rows",
            table.rows.len() + header_rows,
            chunks.len(),
            max_rows
        );
    }
    chunks
}

fn build_chunk(
    columns: usize,
    header: Option<&[StyledText]>,
    rows: &[Vec<StyledText>],
    widths: &[u32],
) -> TableData {
    let cells_rich: Vec<StyledText> = header
        .into_iter()
        .chain(rows.iter().map(Vec::as_slice))
        .flat_map(|row| row.iter().cloned())
        .collect();
    let cells_plain = cells_rich.iter().map(StyledText::to_plain_text).collect();

    TableData {
        rows: rows.len() + usize::from(header.is_some()),
        columns,
        header_row: header.is_some(),
        column_widths: widths.to_vec(),
        cells_plain,
        cells_rich,
    }
}

/// Display width of `text`: wide characters (CJK and the like) count twice.
fn display_width(text: &str) -> u32 {
    text.chars()
        .map(|c| if c.len_utf8() > 1 { 2 } else { 1 })
        .sum()
}

/// Column widths in pixels from the widest cell of each column, clamped,
/// then spread evenly toward the target page width.
pub fn column_widths(table: &ParsedTable) -> Vec<u32> {
    let columns = table.columns;
    if columns == 0 {
        return Vec::new();
    }

    let mut widest = vec![0u32; columns];
    for row in table.header.iter().chain(table.rows.iter()) {
        for (column, cell) in row.iter().enumerate().take(columns) {
            widest[column] = widest[column].max(display_width(&cell.to_plain_text()));
        }
    }

    let mut widths: Vec<u32> = widest
        .iter()
        .map(|chars| {
            (chars * TABLE_PIXELS_PER_CHAR).clamp(TABLE_COLUMN_MIN_WIDTH, TABLE_COLUMN_MAX_WIDTH)
        })
        .collect();

    let total: u32 = widths.iter().sum();
    if total < TABLE_TARGET_WIDTH {
        let extra = (TABLE_TARGET_WIDTH - total) / columns as u32;
        for width in &mut widths {
            *width = (*width + extra).min(TABLE_COLUMN_MAX_WIDTH);
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TABLE_MAX_ROWS;

    fn row(cells: &[&str]) -> Vec<StyledText> {
        cells.iter().map(|c| StyledText::plain(*c)).collect()
    }

    fn numbered_rows(count: usize) -> Vec<Vec<StyledText>> {
        (0..count).map(|i| row(&[&i.to_string(), "x"])).collect()
    }

    #[test]
    fn test_split_without_header() {
        let table = ParsedTable {
            columns: 2,
            header: None,
            rows: numbered_rows(12),
        };
        let chunks = split_table(table, TABLE_MAX_ROWS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].rows, 9);
        assert_eq!(chunks[1].rows, 3);
        assert!(!chunks[0].header_row);
    }

    #[test]
    fn test_split_with_header_preserves_rows() {
        for n in [9usize, 10, 17, 25] {
            let table = ParsedTable {
                columns: 2,
                header: Some(row(&["id", "value"])),
                rows: numbered_rows(n),
            };
            let chunks = split_table(table, TABLE_MAX_ROWS);
            assert_eq!(chunks.len(), n.div_ceil(TABLE_MAX_ROWS - 1));

            let mut data = Vec::new();
            for chunk in &chunks {
                assert!(chunk.rows <= TABLE_MAX_ROWS);
                assert_eq!(chunk.row_plain(0), ["id".to_string(), "value".to_string()]);
                for r in 1..chunk.rows {
                    data.push(chunk.row_plain(r)[0].clone());
                }
            }
            let expected: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            assert_eq!(data, expected);
        }
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let table = ParsedTable {
            columns: 3,
            header: None,
            rows: vec![row(&["a"]), row(&["b", "c", "d", "e"])],
        };
        let chunks = split_table(table, TABLE_MAX_ROWS);
        assert_eq!(chunks[0].cells_plain, vec!["a", "", "", "b", "c", "d"]);
    }

    #[test]
    fn test_column_widths_clamped_and_spread() {
        let table = ParsedTable {
            columns: 2,
            header: None,
            rows: vec![row(&["a", &"y".repeat(100)])],
        };
        let widths = column_widths(&table);
        assert_eq!(widths[1], TABLE_COLUMN_MAX_WIDTH);
        assert!(widths[0] >= TABLE_COLUMN_MIN_WIDTH);
        assert!(widths.iter().sum::<u32>() <= TABLE_TARGET_WIDTH);
    }

    #[test]
    fn test_wide_characters_count_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("表格"), 4);
    }
}
