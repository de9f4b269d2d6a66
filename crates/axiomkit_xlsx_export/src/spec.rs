//! Shared export models, options and errors.

use std::collections::BTreeMap;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// RGB font/fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpecRgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl SpecRgb {
    /// Build color from channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Packed `0xRRGGBB` value.
    pub fn to_u32(self) -> u32 {
        (u32::from(self.red) << 16) | (u32::from(self.green) << 8) | u32::from(self.blue)
    }
}

/// Partial cell style.
///
/// Every attribute is optional so that overlaying a partial override onto a
/// base never clobbers attributes the override leaves unset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,
    /// Font color.
    pub font_color: Option<SpecRgb>,
    /// Background fill color.
    pub bg_color: Option<SpecRgb>,
    /// Thin bottom border.
    pub bottom_border: Option<bool>,
    /// Horizontal/vertical alignment keyword (`left`, `center`, `vcenter`, ...).
    pub align: Option<String>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Column width in character units. Only meaningful on column formats.
    pub width: Option<f64>,
}

impl SpecCellFormat {
    /// Empty format (every attribute unset).
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            font_color: other.font_color.or(self.font_color),
            bg_color: other.bg_color.or(self.bg_color),
            bottom_border: other.bottom_border.or(self.bottom_border),
            align: other.align.clone().or_else(|| self.align.clone()),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            width: other.width.or(self.width),
        }
    }

    /// True when no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn font_name(mut self, value: impl Into<String>) -> Self {
        self.font_name = Some(value.into());
        self
    }

    pub fn font_size(mut self, value: f64) -> Self {
        self.font_size = Some(value);
        self
    }

    pub fn bold(mut self, value: bool) -> Self {
        self.bold = Some(value);
        self
    }

    pub fn italic(mut self, value: bool) -> Self {
        self.italic = Some(value);
        self
    }

    pub fn underline(mut self, value: bool) -> Self {
        self.underline = Some(value);
        self
    }

    /// Set font color from RGB channels.
    pub fn color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.font_color = Some(SpecRgb::new(red, green, blue));
        self
    }

    /// Set background fill from RGB channels.
    pub fn bg_color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.bg_color = Some(SpecRgb::new(red, green, blue));
        self
    }

    pub fn bottom_border(mut self, value: bool) -> Self {
        self.bottom_border = Some(value);
        self
    }

    pub fn align(mut self, value: impl Into<String>) -> Self {
        self.align = Some(value.into());
        self
    }

    pub fn num_format(mut self, value: impl Into<String>) -> Self {
        self.num_format = Some(value.into());
        self
    }

    pub fn text_wrap(mut self, value: bool) -> Self {
        self.text_wrap = Some(value);
        self
    }

    /// Set column width (character units).
    pub fn width(mut self, value: f64) -> Self {
        self.width = Some(value);
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueSpecification

/// Normalized cell value produced by column accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&String> for EnumCellValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<char> for EnumCellValue {
    fn from(value: char) -> Self {
        Self::String(value.to_string())
    }
}

macro_rules! impl_number_cell_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EnumCellValue {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

impl_number_cell_value!(i8, i16, i32, u8, u16, u32, f32, f64);

/// Largest integer magnitude an `f64` holds exactly (2^53).
const N_INT_F64_EXACT_MAX: u128 = 1 << 53;

// Integers wider than 32 bits stay numeric only while `f64` holds them
// exactly; larger magnitudes are written as text so no digit is lost.
macro_rules! impl_wide_integer_cell_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EnumCellValue {
                fn from(value: $ty) -> Self {
                    if (value as i128).unsigned_abs() <= N_INT_F64_EXACT_MAX {
                        Self::Number(value as f64)
                    } else {
                        Self::String(value.to_string())
                    }
                }
            }
        )*
    };
}

impl_wide_integer_cell_value!(i64, isize, u64, usize);

impl<V: Into<EnumCellValue>> From<Option<V>> for EnumCellValue {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(val) => val.into(),
            None => Self::None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridSpecification

/// One rendered cell: value plus fully resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecGridCell {
    /// Cell value.
    pub value: EnumCellValue,
    /// Final style.
    pub format: SpecCellFormat,
}

/// Rendered sheet content, addressed by 1-based `(row, column)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecGrid {
    cells: BTreeMap<(usize, usize), SpecGridCell>,
    widths: BTreeMap<usize, f64>,
    n_rows_freeze: Option<usize>,
}

impl SpecGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a cell; a later write to the same address replaces the earlier one.
    pub fn put_cell(&mut self, row: usize, col: usize, value: EnumCellValue, format: SpecCellFormat) {
        self.cells.insert((row, col), SpecGridCell { value, format });
    }

    pub fn set_column_width(&mut self, col: usize, width: f64) {
        self.widths.insert(col, width);
    }

    /// Freeze rows `1..=n_rows` when writing.
    pub fn set_freeze_rows(&mut self, n_rows: usize) {
        self.n_rows_freeze = Some(n_rows);
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&SpecGridCell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&EnumCellValue> {
        self.cell(row, col).map(|cell| &cell.value)
    }

    pub fn column_width(&self, col: usize) -> Option<f64> {
        self.widths.get(&col).copied()
    }

    pub fn freeze_rows(&self) -> Option<usize> {
        self.n_rows_freeze
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &SpecGridCell)> {
        self.cells
            .iter()
            .map(|((row, col), cell)| (*row, *col, cell))
    }

    /// Explicit column widths by 1-based column.
    pub fn column_widths(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.widths.iter().map(|(col, width)| (*col, *width))
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest occupied row, `0` for an empty grid.
    pub fn last_used_row(&self) -> usize {
        self.cells.keys().next_back().map_or(0, |(row, _)| *row)
    }

    /// Highest occupied column, `0` for an empty grid.
    pub fn last_used_column(&self) -> usize {
        self.cells.keys().map(|(_, col)| *col).max().unwrap_or(0)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Autofit rule for columns without an explicit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit (default).
    #[default]
    None,
    /// Infer width from header cells only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells.
    All,
}

/// Autofit policy applied per sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::None,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Base styles every title/header/body cell is merged onto.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportStyles {
    /// Body cell base format.
    pub fmt_cell: SpecCellFormat,
    /// Header cell base format.
    pub fmt_header: SpecCellFormat,
    /// Title cell base format.
    pub fmt_title: SpecCellFormat,
}

impl Default for SpecExportStyles {
    fn default() -> Self {
        crate::conf::derive_default_export_styles()
    }
}

/// Exporter-wide options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportOptions {
    /// Base styles.
    pub styles: SpecExportStyles,
    /// Blank rows left between the title row and the header/body.
    pub n_rows_title_gap: usize,
    /// Autofit policy for columns lacking an explicit width.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Replace illegal characters and truncate sheet names instead of failing.
    pub if_sanitize_sheet_names: bool,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            styles: SpecExportStyles::default(),
            n_rows_title_gap: 0,
            policy_autofit: SpecAutofitCellsPolicy::default(),
            if_sanitize_sheet_names: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-sheet export summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetReport {
    /// Actual sheet name in the workbook.
    pub sheet_name: String,
    /// Number of data records rendered.
    pub n_rows_data: usize,
    /// Number of visible columns.
    pub n_cols_visible: usize,
    /// Last used 1-based row of the rendered grid.
    pub n_row_last_used: usize,
    /// Last used 1-based column of the rendered grid.
    pub n_col_last_used: usize,
}

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Rendered sheets, in workbook order.
    pub sheets: Vec<SpecSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExportReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        log::warn!("{msg}");
        self.warnings.push(msg.to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Invalid exporter/sheet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Computed column registered with an empty title.
    #[error("computed column requires a non-empty title")]
    MissingColumnTitle,
    /// Field name not declared by the record type.
    #[error("field '{field}' is not a readable field of `{record}`")]
    UnknownField {
        /// Requested field name.
        field: String,
        /// Record type name.
        record: String,
    },
    /// Origin outside 1-based positive range.
    #[error("coordinates must be 1-based and positive, got ({row}, {col})")]
    InvalidCoordinates {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// More configured sheets than the template provides.
    #[error("template has {n_sheets_available} sheet(s) but sheet #{n_idx_sheet} was configured")]
    TemplateSheetOutOfRange {
        /// 1-based configured sheet index.
        n_idx_sheet: usize,
        /// Sheets available in template.
        n_sheets_available: usize,
    },
    /// Fresh-document sheet without a name.
    #[error("sheet #{n_idx_sheet} has no name")]
    MissingSheetName {
        /// 1-based configured sheet index.
        n_idx_sheet: usize,
    },
    /// `.title()`/`.format()` called before any column was added.
    #[error("no column to configure: add a column before setting `{attribute}`")]
    NoColumnToConfigure {
        /// Attribute being set.
        attribute: String,
    },
    /// Rendered content exceeds Excel worksheet limits.
    #[error("sheet '{sheet}' exceeds Excel limits: last cell ({row}, {col})")]
    GridOutOfBounds {
        /// Sheet name.
        sheet: String,
        /// Last 1-based row.
        row: usize,
        /// Last 1-based column.
        col: usize,
    },
    /// Sheet name rejected when sanitizing is disabled.
    #[error("invalid sheet name '{0}'")]
    InvalidSheetName(String),
    /// A new workbook was exported without any configured sheet.
    #[error("no sheet configured: a new workbook needs at least one sheet")]
    NoSheetConfigured,
}

/// Top-level export failure.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    /// Accessor or rule predicate failed on one record.
    #[error("failed to render record #{n_idx_record} of sheet '{sheet}': {message}")]
    Render {
        /// Sheet name.
        sheet: String,
        /// 0-based record index in the data collection.
        n_idx_record: usize,
        /// Failure text from the accessor/predicate.
        message: String,
    },
    /// Spreadsheet reader/writer failure.
    #[error("xlsx codec error: {0}")]
    Codec(String),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Result alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
