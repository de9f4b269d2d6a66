//! XLSX writer that serializes rendered grids into a workbook buffer.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet};

use crate::spec::{
    ConfigError, EnumCellValue, ExportError, Result, SpecCellFormat, SpecExportReport, SpecGrid,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_unique_sheet_name, is_valid_sheet_name, sanitize_sheet_name,
};

/// Stateful workbook writer. The workbook is buffered in memory until
/// [`Self::save_to_buffer`] is called.
pub struct XlsxWriter {
    workbook: Workbook,
    if_sanitize_sheet_names: bool,
    set_sheet_names_existing: BTreeSet<String>,
    l_fmt_cache: Vec<(SpecCellFormat, Format)>,
}

impl XlsxWriter {
    pub fn new(if_sanitize_sheet_names: bool) -> Self {
        Self {
            workbook: Workbook::new(),
            if_sanitize_sheet_names,
            set_sheet_names_existing: BTreeSet::new(),
            l_fmt_cache: Vec::new(),
        }
    }

    /// Reserve a valid, unique worksheet name derived from `name`.
    ///
    /// Renames are recorded as warnings on `report`.
    pub fn reserve_sheet_name(&mut self, name: &str, report: &mut SpecExportReport) -> Result<String> {
        let c_name_valid = if is_valid_sheet_name(name) {
            name.to_string()
        } else if self.if_sanitize_sheet_names {
            let c_name_sanitized = sanitize_sheet_name(name, "_");
            report.warn(format!(
                "Sheet name '{name}' is not valid in Excel; using '{c_name_sanitized}'."
            ));
            c_name_sanitized
        } else {
            return Err(ConfigError::InvalidSheetName(name.to_string()).into());
        };

        let c_name_unique = derive_unique_sheet_name(&c_name_valid, &mut self.set_sheet_names_existing);
        if c_name_unique != c_name_valid {
            report.warn(format!(
                "Sheet name '{c_name_valid}' is already used; using '{c_name_unique}'."
            ));
        }
        Ok(c_name_unique)
    }

    /// Append one worksheet holding `grid`.
    pub fn write_sheet(&mut self, sheet_name: &str, grid: &SpecGrid) -> Result<()> {
        let Self {
            workbook,
            l_fmt_cache,
            ..
        } = self;
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;

        for (n_row, n_col, cell) in grid.cells() {
            let format = derive_cached_format(l_fmt_cache, &cell.format);
            write_cell(worksheet, n_row, n_col, &cell.value, format)?;
        }

        for (n_col, width) in grid.column_widths() {
            worksheet.set_column_width(cast_col_num(n_col).map_err(ExportError::Codec)?, width)?;
        }

        if let Some(n_rows_freeze) = grid.freeze_rows() {
            let n_row_first_unfrozen =
                u32::try_from(n_rows_freeze).map_err(|_| ExportError::Codec(format!("row index overflow: {n_rows_freeze}")))?;
            worksheet.set_freeze_panes(n_row_first_unfrozen, 0)?;
        }

        Ok(())
    }

    /// Serialize the workbook.
    pub fn save_to_buffer(mut self) -> Result<Vec<u8>> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

fn derive_cached_format<'a>(
    l_fmt_cache: &'a mut Vec<(SpecCellFormat, Format)>,
    spec: &SpecCellFormat,
) -> &'a Format {
    let n_idx = match l_fmt_cache.iter().position(|(spec_cached, _)| spec_cached == spec) {
        Some(n_idx) => n_idx,
        None => {
            l_fmt_cache.push((spec.clone(), derive_rust_xlsx_format(spec)));
            l_fmt_cache.len() - 1
        }
    };
    &l_fmt_cache[n_idx].1
}

fn write_cell(
    worksheet: &mut Worksheet,
    n_row: usize,
    n_col: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<()> {
    let n_row = cast_row_num(n_row).map_err(ExportError::Codec)?;
    let n_col = cast_col_num(n_col).map_err(ExportError::Codec)?;

    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

/// Convert a resolved cell format into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }
    if let Some(val) = spec.font_color {
        format = format.set_font_color(Color::RGB(val.to_u32()));
    }
    if let Some(val) = spec.bg_color {
        format = format.set_background_color(Color::RGB(val.to_u32()));
    }
    if spec.bottom_border.unwrap_or(false) {
        format = format.set_border_bottom(FormatBorder::Thin);
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
