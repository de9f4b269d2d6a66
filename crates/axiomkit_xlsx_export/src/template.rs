//! Template workbook codec.
//!
//! A template is loaded whole, rendered grids are written onto its sheets
//! positionally and the workbook is saved back. Everything a grid does not
//! touch (other cells, formulas, number formats, styles, widths, merges,
//! other sheets) is kept as loaded.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use umya_spreadsheet::{
    Border, HorizontalAlignmentValues, Spreadsheet, Style, VerticalAlignmentValues,
};

use crate::spec::{EnumCellValue, ExportError, Result, SpecCellFormat, SpecGrid, SpecRgb};
use crate::util::derive_column_letters;

/// Parsed template workbook.
///
/// Holds the original payload; every export overlays a fresh copy of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTemplateWorkbook {
    v_bytes: Vec<u8>,
    l_sheet_names: Vec<String>,
}

impl SpecTemplateWorkbook {
    /// Parse an XLSX payload.
    pub fn from_bytes(v_bytes: &[u8]) -> Result<Self> {
        let book = read_book(v_bytes)?;
        let l_sheet_names: Vec<String> = book
            .get_sheet_collection()
            .iter()
            .map(|worksheet| worksheet.get_name().to_string())
            .collect();

        log::debug!("parsed template with {} sheet(s)", l_sheet_names.len());
        Ok(Self {
            v_bytes: v_bytes.to_vec(),
            l_sheet_names,
        })
    }

    /// Parse an XLSX file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let v_bytes = std::fs::read(path).map_err(|err| {
            ExportError::Codec(format!(
                "failed to read template {}: {err}",
                path.display()
            ))
        })?;
        Self::from_bytes(&v_bytes)
    }

    /// Parse an XLSX stream.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut v_bytes = Vec::new();
        reader
            .read_to_end(&mut v_bytes)
            .map_err(|err| ExportError::Codec(format!("failed to read template: {err}")))?;
        Self::from_bytes(&v_bytes)
    }

    pub fn sheet_count(&self) -> usize {
        self.l_sheet_names.len()
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.l_sheet_names.iter().map(String::as_str).collect()
    }

    /// Editable copy of the template.
    pub fn open(&self) -> Result<TemplateOverlay> {
        Ok(TemplateOverlay {
            book: read_book(&self.v_bytes)?,
        })
    }
}

/// Template copy receiving rendered grids.
pub struct TemplateOverlay {
    book: Spreadsheet,
}

impl TemplateOverlay {
    /// Write `grid` onto the sheet named `sheet_name`.
    ///
    /// Grid values replace template values at the same address; the grid
    /// format is patched onto the cell's existing style.
    pub fn write_grid(&mut self, sheet_name: &str, grid: &SpecGrid) -> Result<()> {
        let worksheet = self
            .book
            .get_sheet_by_name_mut(sheet_name)
            .ok_or_else(|| ExportError::Codec(format!("template has no sheet '{sheet_name}'")))?;

        for (n_row, n_col, cell) in grid.cells() {
            let target = worksheet.get_cell_mut((cast_coordinate(n_col)?, cast_coordinate(n_row)?));
            match &cell.value {
                EnumCellValue::None => {
                    target.set_blank();
                }
                EnumCellValue::String(val) => {
                    target.set_value_string(val.clone());
                }
                EnumCellValue::Number(val) => {
                    target.set_value_number(*val);
                }
                EnumCellValue::Boolean(val) => {
                    target.set_value_bool(*val);
                }
            }
            apply_umya_style(target.get_style_mut(), &cell.format);
        }

        for (n_col, width) in grid.column_widths() {
            worksheet
                .get_column_dimension_mut(&derive_column_letters(n_col))
                .set_width(width);
        }
        Ok(())
    }

    /// Serialize the overlaid workbook.
    pub fn save_to_buffer(&self) -> Result<Vec<u8>> {
        let mut v_bytes = Vec::new();
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, Cursor::new(&mut v_bytes))
            .map_err(|err| ExportError::Codec(format!("failed to write workbook: {err}")))?;
        Ok(v_bytes)
    }
}

fn read_book(v_bytes: &[u8]) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(v_bytes), true)
        .map_err(|err| ExportError::Codec(format!("failed to read template: {err}")))
}

fn cast_coordinate(n_idx: usize) -> Result<u32> {
    u32::try_from(n_idx).map_err(|_| ExportError::Codec(format!("cell index out of range: {n_idx}")))
}

fn derive_argb(rgb: SpecRgb) -> String {
    format!("FF{:06X}", rgb.to_u32())
}

/// Patch the attributes set in `spec` onto `style`; unset attributes keep the template's value.
fn apply_umya_style(style: &mut Style, spec: &SpecCellFormat) {
    let font = style.get_font_mut();
    if let Some(val) = &spec.font_name {
        font.set_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        font.set_size(val);
    }
    if let Some(val) = spec.bold {
        font.set_bold(val);
    }
    if let Some(val) = spec.italic {
        font.set_italic(val);
    }
    if let Some(val) = spec.underline {
        font.set_underline(if val { "single" } else { "none" });
    }
    if let Some(val) = spec.font_color {
        font.get_color_mut().set_argb(derive_argb(val));
    }

    if let Some(val) = spec.bg_color {
        style.set_background_color(derive_argb(val));
    }
    if let Some(val) = spec.bottom_border {
        style
            .get_borders_mut()
            .get_bottom_mut()
            .set_border_style(if val { Border::BORDER_THIN } else { Border::BORDER_NONE });
    }
    if let Some(val) = &spec.num_format {
        style.get_number_format_mut().set_format_code(val.clone());
    }

    let alignment = style.get_alignment_mut();
    if let Some(val) = &spec.align {
        match val.trim().to_ascii_lowercase().as_str() {
            "general" => {
                alignment.set_horizontal(HorizontalAlignmentValues::General);
            }
            "left" => {
                alignment.set_horizontal(HorizontalAlignmentValues::Left);
            }
            "center" => {
                alignment.set_horizontal(HorizontalAlignmentValues::Center);
            }
            "right" => {
                alignment.set_horizontal(HorizontalAlignmentValues::Right);
            }
            "fill" => {
                alignment.set_horizontal(HorizontalAlignmentValues::Fill);
            }
            "justify" => {
                alignment.set_horizontal(HorizontalAlignmentValues::Justify);
            }
            "center_across" => {
                alignment.set_horizontal(HorizontalAlignmentValues::CenterContinuous);
            }
            "distributed" => {
                alignment.set_horizontal(HorizontalAlignmentValues::Distributed);
            }
            "top" => {
                alignment.set_vertical(VerticalAlignmentValues::Top);
            }
            "bottom" => {
                alignment.set_vertical(VerticalAlignmentValues::Bottom);
            }
            "vcenter" | "vertical_center" => {
                alignment.set_vertical(VerticalAlignmentValues::Center);
            }
            _ => {}
        }
    }
    if let Some(val) = spec.text_wrap {
        alignment.set_wrap_text(val);
    }
}
