//! Pure helper functions shared by the renderer and the writer.

use std::collections::BTreeSet;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::ConfigError;

////////////////////////////////////////////////////////////////////////////////
// #region Coordinates

/// Check a 1-based origin lies inside the worksheet.
pub fn validate_coordinates(row: usize, col: usize) -> Result<(), ConfigError> {
    if row == 0 || col == 0 || row > N_NROWS_EXCEL_MAX || col > N_NCOLS_EXCEL_MAX {
        return Err(ConfigError::InvalidCoordinates { row, col });
    }
    Ok(())
}

/// Convert a 1-based row to the writer's 0-based row number.
pub fn cast_row_num(row: usize) -> Result<u32, String> {
    row.checked_sub(1)
        .and_then(|val| u32::try_from(val).ok())
        .ok_or_else(|| format!("row index out of range: {row}"))
}

/// Convert a 1-based column to the writer's 0-based column number.
pub fn cast_col_num(col: usize) -> Result<u16, String> {
    col.checked_sub(1)
        .and_then(|val| u16::try_from(val).ok())
        .ok_or_else(|| format!("column index out of range: {col}"))
}

/// Excel column letters for a 1-based column (`1 -> "A"`, `28 -> "AB"`).
pub fn derive_column_letters(col: usize) -> String {
    let mut n_rest = col;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// True when Excel accepts `name` unchanged.
pub fn is_valid_sheet_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name.chars().count() <= N_LEN_EXCEL_SHEET_NAME_MAX
        && !TUP_EXCEL_ILLEGAL.iter().any(|c_illegal| name.contains(c_illegal))
}

/// Return `name`, or a `name__N` variant not yet in `set_names_existing`, and record it.
///
/// Excel compares sheet names case-insensitively, so the set holds lowercase keys.
pub fn derive_unique_sheet_name(name: &str, set_names_existing: &mut BTreeSet<String>) -> String {
    if set_names_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if set_names_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Display width of text, counting non-ASCII characters as wider glyphs.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(1, 1).is_ok());
        assert!(validate_coordinates(3, 2).is_ok());
        assert_eq!(
            validate_coordinates(0, 1),
            Err(ConfigError::InvalidCoordinates { row: 0, col: 1 })
        );
        assert!(validate_coordinates(1, N_NCOLS_EXCEL_MAX + 1).is_err());
    }

    #[test]
    fn test_cast_is_zero_based() {
        assert_eq!(cast_row_num(1), Ok(0));
        assert_eq!(cast_col_num(3), Ok(2));
        assert!(cast_row_num(0).is_err());
        assert!(cast_col_num(70_000).is_err());
    }

    #[test]
    fn test_derive_column_letters() {
        assert_eq!(derive_column_letters(1), "A");
        assert_eq!(derive_column_letters(26), "Z");
        assert_eq!(derive_column_letters(28), "AB");
        assert_eq!(derive_column_letters(N_NCOLS_EXCEL_MAX), "XFD");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
        assert!(is_valid_sheet_name("Hoja 1"));
        assert!(!is_valid_sheet_name("Q1?"));
    }

    #[test]
    fn test_derive_unique_sheet_name() {
        let mut set_names = BTreeSet::new();
        assert_eq!(derive_unique_sheet_name("Data", &mut set_names), "Data");
        assert_eq!(derive_unique_sheet_name("data", &mut set_names), "data__2");
        assert_eq!(derive_unique_sheet_name("Data", &mut set_names), "Data__3");
    }

    #[test]
    fn test_estimate_unicode_string_width() {
        assert_eq!(estimate_unicode_string_width("abc"), 3);
        assert_eq!(estimate_unicode_string_width("año"), 4);
    }
}
