//! Grid renderer: turns one sheet definition into positioned, styled cells.
//!
//! Rendering walks a row cursor down from the sheet origin through four
//! phases: title, header, body, column widths.

use crate::column::SpecColumn;
use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::sheet::SpecSheet;
use crate::spec::{
    ConfigError, EnumAutofitColumnsRule, EnumCellValue, ExportError, Result,
    SpecAutofitCellsPolicy, SpecCellFormat, SpecExportOptions, SpecGrid,
};
use crate::util::{estimate_unicode_string_width, validate_coordinates};

/// Render `sheet` as it will appear in a worksheet named `sheet_name`.
pub fn render_grid<T>(
    sheet: &SpecSheet<T>,
    sheet_name: &str,
    options: &SpecExportOptions,
) -> Result<SpecGrid> {
    let (n_row_origin, n_col_origin) = sheet.origin();
    validate_coordinates(n_row_origin, n_col_origin)?;

    let styles = &options.styles;
    let l_cols_visible: Vec<&SpecColumn<T>> = sheet.column_set().visible_columns().collect();
    validate_grid_extent(sheet, sheet_name, &l_cols_visible, options)?;

    let mut grid = SpecGrid::new();
    let mut n_row_cursor = n_row_origin;

    if let Some(title) = sheet.title_block() {
        grid.put_cell(
            n_row_cursor,
            n_col_origin,
            EnumCellValue::String(title.resolve_text(sheet_name)),
            styles.fmt_title.merge(&title.format),
        );
        n_row_cursor += 1 + options.n_rows_title_gap;
    }

    let policy_autofit = &options.policy_autofit;
    let mut l_width_by_col_header = vec![0usize; l_cols_visible.len()];
    let mut l_width_by_col_body = vec![0usize; l_cols_visible.len()];

    if sheet.shows_header() {
        for (n_idx_col, column) in l_cols_visible.iter().enumerate() {
            grid.put_cell(
                n_row_cursor,
                n_col_origin + n_idx_col,
                EnumCellValue::String(column.title().to_string()),
                styles.fmt_header.merge(column.format()),
            );
            l_width_by_col_header[n_idx_col] = estimate_unicode_string_width(column.title());
        }
        if sheet.freezes_header() {
            grid.set_freeze_rows(n_row_cursor);
        }
        n_row_cursor += 1;
    }

    let l_fmt_body_by_col: Vec<SpecCellFormat> = l_cols_visible
        .iter()
        .map(|column| styles.fmt_cell.merge(column.format()))
        .collect();
    let if_autofit_body = matches!(
        policy_autofit.rule_columns,
        EnumAutofitColumnsRule::Body | EnumAutofitColumnsRule::All
    );

    if !l_cols_visible.is_empty() {
        for (n_idx_record, record) in sheet.data().iter().enumerate() {
            let derive_render_error = |message: String| ExportError::Render {
                sheet: sheet_name.to_string(),
                n_idx_record,
                message,
            };

            let mut fmt_rules: Option<SpecCellFormat> = None;
            for rule in sheet.rules() {
                if rule.matches(record).map_err(derive_render_error)? {
                    fmt_rules = Some(match fmt_rules {
                        Some(fmt_acc) => fmt_acc.merge(rule.fmt_patch()),
                        None => rule.fmt_patch().clone(),
                    });
                }
            }

            let if_measure_row = if_autofit_body
                && policy_autofit
                    .height_body_inferred_max
                    .is_none_or(|n_max| n_idx_record < n_max);

            for (n_idx_col, column) in l_cols_visible.iter().enumerate() {
                let value = column.read(record).map_err(derive_render_error)?;
                if if_measure_row {
                    l_width_by_col_body[n_idx_col] =
                        usize::max(l_width_by_col_body[n_idx_col], estimate_width_len(&value));
                }
                let format = match &fmt_rules {
                    Some(fmt_patch) => l_fmt_body_by_col[n_idx_col].merge(fmt_patch),
                    None => l_fmt_body_by_col[n_idx_col].clone(),
                };
                grid.put_cell(n_row_cursor, n_col_origin + n_idx_col, value, format);
            }
            n_row_cursor += 1;
        }
    }

    for (n_idx_col, column) in l_cols_visible.iter().enumerate() {
        let n_col = n_col_origin + n_idx_col;
        if let Some(width) = column.format().width {
            grid.set_column_width(n_col, width);
        } else if let Some(width) = derive_autofit_width(
            policy_autofit,
            l_width_by_col_header[n_idx_col],
            l_width_by_col_body[n_idx_col],
        ) {
            grid.set_column_width(n_col, width);
        }
    }

    log::debug!(
        "rendered sheet '{sheet_name}': {} record(s), {} visible column(s), {} cell(s)",
        sheet.data().len(),
        l_cols_visible.len(),
        grid.len()
    );
    Ok(grid)
}

/// Fail before rendering when the sheet would not fit in a worksheet.
fn validate_grid_extent<T>(
    sheet: &SpecSheet<T>,
    sheet_name: &str,
    l_cols_visible: &[&SpecColumn<T>],
    options: &SpecExportOptions,
) -> Result<()> {
    let (n_row_origin, n_col_origin) = sheet.origin();
    let n_rows_title = if sheet.title_block().is_some() {
        1 + options.n_rows_title_gap
    } else {
        0
    };
    let n_rows_header = usize::from(sheet.shows_header());
    let n_rows_total = n_rows_title + n_rows_header + sheet.data().len();

    let n_row_last = n_row_origin + n_rows_total.saturating_sub(1);
    let n_col_last = n_col_origin + l_cols_visible.len().saturating_sub(1);
    if n_row_last > N_NROWS_EXCEL_MAX || n_col_last > N_NCOLS_EXCEL_MAX {
        return Err(ConfigError::GridOutOfBounds {
            sheet: sheet_name.to_string(),
            row: n_row_last,
            col: n_col_last,
        }
        .into());
    }
    Ok(())
}

/// Estimate displayed width units for one cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                (*n as i64).to_string().len()
            } else {
                format!("{n:.4}").len()
            }
        }
        EnumCellValue::Boolean(b) => if *b { 4 } else { 5 },
    }
}

fn derive_autofit_width(
    policy: &SpecAutofitCellsPolicy,
    n_width_header: usize,
    n_width_body: usize,
) -> Option<f64> {
    let n_width_recorded = match policy.rule_columns {
        EnumAutofitColumnsRule::None => return None,
        EnumAutofitColumnsRule::Header => n_width_header,
        EnumAutofitColumnsRule::Body => n_width_body,
        EnumAutofitColumnsRule::All => usize::max(n_width_header, n_width_body),
    };
    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy.width_cell_max));
    let n_width_final = usize::min(
        n_max,
        usize::max(n_min, n_width_recorded + policy.width_cell_padding),
    );
    Some(n_width_final as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;
    use crate::spec::SpecRgb;

    #[derive(Clone)]
    struct Item {
        prop_a: String,
        prop_b: String,
        prop_c: i32,
    }

    crate::export_record!(Item { prop_a => "Prop A", prop_b, prop_c });

    fn derive_items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|idx| Item {
                prop_a: format!("a{idx}"),
                prop_b: format!("b{idx}"),
                prop_c: idx as i32,
            })
            .collect()
    }

    fn render(sheet: SpecSheet<Item>) -> SpecGrid {
        render_grid(&sheet, "Hoja 1", &SpecExportOptions::default()).expect("render grid")
    }

    #[test]
    fn test_header_plus_rows() {
        for n in [0, 1, 3, 300] {
            let grid = render(SpecSheet::new().set_data(derive_items(n)));
            assert_eq!(grid.last_used_row(), n + 1);
            assert_eq!(grid.last_used_column(), 3);
        }
    }

    #[test]
    fn test_title_adds_one_row_and_defaults_to_sheet_name() {
        let items = derive_items(3);
        let grid = render(SpecSheet::new().set_data(items).show_title());
        assert_eq!(grid.last_used_row(), 5);
        assert_eq!(grid.value(1, 1), Some(&EnumCellValue::from("Hoja 1")));
        assert_eq!(grid.value(2, 1), Some(&EnumCellValue::from("Prop A")));
        assert!(grid.cell(1, 2).is_none());
    }

    #[test]
    fn test_title_gap_option_inserts_blank_rows() {
        let sheet = SpecSheet::<Item>::new().set_data(derive_items(3)).show_title();
        let options = SpecExportOptions {
            n_rows_title_gap: 1,
            ..Default::default()
        };
        let grid = render_grid(&sheet, "Hoja 1", &options).expect("render grid");
        assert!(grid.cell(2, 1).is_none());
        assert_eq!(grid.value(3, 1), Some(&EnumCellValue::from("Prop A")));
        assert_eq!(grid.last_used_row(), 6);
    }

    #[test]
    fn test_title_format_only_touches_title() {
        let grid = render(
            SpecSheet::new()
                .set_data(derive_items(3))
                .title(|t| t.format(|f| f.bold(true).color(0, 0, 255))),
        );
        let fmt_title = &grid.cell(1, 1).expect("title cell").format;
        assert_eq!(fmt_title.bold, Some(true));
        assert_eq!(fmt_title.italic, Some(true));
        assert_eq!(fmt_title.font_color, Some(SpecRgb::new(0, 0, 255)));

        let fmt_body = &grid.cell(3, 1).expect("body cell").format;
        assert_eq!(fmt_body.bold, Some(false));
        assert_eq!(fmt_body.font_color, Some(SpecRgb::new(0, 0, 0)));
    }

    #[test]
    fn test_hidden_headers_leave_only_rows() {
        let grid = render(SpecSheet::new().set_data(derive_items(3)).hide_column_headers());
        assert_eq!(grid.last_used_row(), 3);
        assert_eq!(grid.value(1, 1), Some(&EnumCellValue::from("a0")));
    }

    #[test]
    fn test_coordinates_shift_every_cell() {
        let grid = render(SpecSheet::new().set_data(derive_items(3)).set_coordinates(3, 2));
        assert!(grid.cell(1, 1).is_none());
        assert_eq!(grid.value(3, 2), Some(&EnumCellValue::from("Prop A")));
        assert_eq!(grid.value(4, 2), Some(&EnumCellValue::from("a0")));
        assert_eq!(grid.last_used_row(), 6);
        assert_eq!(grid.last_used_column(), 4);

        let grid = render(
            SpecSheet::new()
                .set_data(derive_items(3))
                .set_coordinates(2, 3)
                .show_title(),
        );
        assert_eq!(grid.value(2, 3), Some(&EnumCellValue::from("Hoja 1")));
    }

    #[test]
    fn test_explicit_columns_control_width_of_grid() {
        let grid = render(SpecSheet::new().set_data(derive_items(3)).columns(|cols| {
            cols.clear()
                .add_column(field!(Item, prop_a))
                .add_column(field!(Item, prop_a))
                .title("Prop a (2)")
        }));
        assert_eq!(grid.last_used_column(), 2);
        assert_eq!(grid.value(1, 1), Some(&EnumCellValue::from("Prop A")));
        assert_eq!(grid.value(1, 2), Some(&EnumCellValue::from("Prop a (2)")));
        assert_eq!(grid.value(2, 2), Some(&EnumCellValue::from("a0")));
    }

    #[test]
    fn test_computed_column_values_stay_numeric() {
        let items = derive_items(3);
        let grid = render(SpecSheet::new().set_data(items.clone()).columns(|cols| {
            cols.clear()
                .add_column(field!(Item, prop_a))
                .add_computed_column("Plus 1", |r: &Item| r.prop_c + 1)
        }));
        assert_eq!(grid.last_used_column(), 2);
        assert_eq!(grid.last_used_row(), items.len() + 1);
        for (n_idx, item) in items.iter().enumerate() {
            assert_eq!(
                grid.value(n_idx + 2, 2),
                Some(&EnumCellValue::Number(f64::from(item.prop_c + 1)))
            );
        }
    }

    #[test]
    fn test_hidden_field_shifts_remaining_columns_left() {
        let grid = render(
            SpecSheet::new()
                .set_data(derive_items(3))
                .columns(|cols| cols.hide_column(field!(Item, prop_b))),
        );
        assert_eq!(grid.last_used_column(), 2);
        assert_eq!(grid.value(1, 1), Some(&EnumCellValue::from("Prop A")));
        assert_eq!(grid.value(1, 2), Some(&EnumCellValue::from("prop_c")));
    }

    #[test]
    fn test_format_rule_applies_to_matching_rows_only() {
        let items = derive_items(2);
        let c_first = items[0].prop_a.clone();
        let grid = render(
            SpecSheet::new()
                .set_data(items)
                .add_format_rule(move |r: &Item| r.prop_a == c_first, |f| f.bold(true).italic(true)),
        );

        for n_col in 1..=3 {
            let fmt_match = &grid.cell(2, n_col).expect("matching row").format;
            assert_eq!(fmt_match.bold, Some(true));
            assert_eq!(fmt_match.italic, Some(true));
            assert_eq!(fmt_match.underline, Some(false));

            let fmt_other = &grid.cell(3, n_col).expect("other row").format;
            assert_eq!(fmt_other.bold, Some(false));
            assert_eq!(fmt_other.italic, Some(false));
            assert_eq!(fmt_other.underline, Some(false));
        }
        assert_eq!(grid.cell(1, 1).expect("header").format.italic, Some(false));
    }

    #[test]
    fn test_later_rule_wins_on_shared_attribute() {
        let grid = render(
            SpecSheet::new()
                .set_data(derive_items(1))
                .add_format_rule(|_: &Item| true, |f| f.color(255, 0, 0).bold(true))
                .add_format_rule(|_: &Item| true, |f| f.color(0, 255, 0)),
        );
        let format = &grid.cell(2, 1).expect("body cell").format;
        assert_eq!(format.font_color, Some(SpecRgb::new(0, 255, 0)));
        assert_eq!(format.bold, Some(true));
    }

    #[test]
    fn test_column_format_reaches_header_and_body() {
        let grid = render(SpecSheet::new().set_data(derive_items(2)).columns(|cols| {
            cols.clear()
                .add_column(field!(Item, prop_a))
                .format(|f| f.bold(true).color(255, 0, 0))
                .add_column(field!(Item, prop_b))
                .format(|f| f.italic(true))
        }));
        for n_row in 2..=3 {
            let fmt_a = &grid.cell(n_row, 1).expect("col a").format;
            assert_eq!(fmt_a.bold, Some(true));
            assert_eq!(fmt_a.font_color, Some(SpecRgb::new(255, 0, 0)));
            let fmt_b = &grid.cell(n_row, 2).expect("col b").format;
            assert_eq!(fmt_b.italic, Some(true));
            assert_eq!(fmt_b.bold, Some(false));
        }
        let fmt_header_b = &grid.cell(1, 2).expect("header b").format;
        assert_eq!(fmt_header_b.bold, Some(true));
        assert_eq!(fmt_header_b.italic, Some(true));
        assert_eq!(fmt_header_b.font_size, Some(12.0));
    }

    #[test]
    fn test_explicit_widths_are_verbatim() {
        let grid = render(SpecSheet::new().set_data(derive_items(3)).columns(|cols| {
            cols.clear()
                .add_column(field!(Item, prop_a))
                .format(|f| f.width(150.0))
                .add_column(field!(Item, prop_b))
                .format(|f| f.width(10.0))
                .add_column(field!(Item, prop_c))
        }));
        assert_eq!(grid.column_width(1), Some(150.0));
        assert_eq!(grid.column_width(2), Some(10.0));
        assert_eq!(grid.column_width(3), None);
    }

    #[test]
    fn test_autofit_fills_unset_widths_only() {
        let sheet = SpecSheet::<Item>::new().set_data(derive_items(3)).columns(|cols| {
            cols.clear()
                .add_column(field!(Item, prop_a))
                .format(|f| f.width(30.0))
                .add_computed_column("A much longer header title", |r: &Item| r.prop_c)
        });
        let options = SpecExportOptions {
            policy_autofit: SpecAutofitCellsPolicy {
                rule_columns: EnumAutofitColumnsRule::Header,
                ..Default::default()
            },
            ..Default::default()
        };
        let grid = render_grid(&sheet, "Hoja 1", &options).expect("render grid");
        assert_eq!(grid.column_width(1), Some(30.0));
        assert_eq!(grid.column_width(2), Some(28.0));
    }

    #[test]
    fn test_empty_data_and_zero_columns() {
        let grid = render(SpecSheet::new().show_title());
        assert_eq!(grid.last_used_row(), 2);

        let grid = render(
            SpecSheet::new()
                .set_data(derive_items(3))
                .show_title()
                .columns(|cols| cols.clear()),
        );
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.last_used_row(), 1);
    }

    #[test]
    fn test_freeze_header_records_header_row() {
        let grid = render(
            SpecSheet::new()
                .set_data(derive_items(2))
                .show_title()
                .freeze_header(),
        );
        assert_eq!(grid.freeze_rows(), Some(2));
    }

    #[test]
    fn test_failing_accessor_reports_record_and_sheet() {
        let sheet = SpecSheet::<Item>::new().set_data(derive_items(3)).columns(|cols| {
            cols.clear().try_add_computed_column("Ratio", |r: &Item| {
                if r.prop_c == 2 {
                    Err("division by zero")
                } else {
                    Ok(1.0 / f64::from(2 - r.prop_c))
                }
            })
        });
        let err = render_grid(&sheet, "Hoja 1", &SpecExportOptions::default())
            .expect_err("render must fail");
        match err {
            ExportError::Render {
                sheet,
                n_idx_record,
                message,
            } => {
                assert_eq!(sheet, "Hoja 1");
                assert_eq!(n_idx_record, 2);
                assert_eq!(message, "division by zero");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failing_rule_predicate_aborts_render() {
        let sheet = SpecSheet::<Item>::new()
            .set_data(derive_items(2))
            .try_add_format_rule(
                |r: &Item| if r.prop_c == 0 { Err("bad record") } else { Ok(true) },
                |f| f.bold(true),
            );
        let err = render_grid(&sheet, "S", &SpecExportOptions::default())
            .expect_err("render must fail");
        assert!(matches!(err, ExportError::Render { n_idx_record: 0, .. }));
    }

    #[test]
    fn test_grid_out_of_bounds() {
        let sheet = SpecSheet::<Item>::new()
            .set_data(derive_items(3))
            .set_coordinates(N_NROWS_EXCEL_MAX - 1, 1);
        let err = render_grid(&sheet, "S", &SpecExportOptions::default())
            .expect_err("render must fail");
        assert!(matches!(
            err,
            ExportError::Configuration(ConfigError::GridOutOfBounds { .. })
        ));
    }
}
