//! `axiomkit_xlsx_export` v1:
//! Typed record collections to multi-sheet XLSX workbooks.
//!
//! Modules:
//! - `conf`     : constants and default style presets
//! - `spec`     : formats, cell values, grids, options, reports, errors
//! - `util`     : pure helper functions
//! - `field`    : record reflection (`ExportRecord`, `field!`, `export_record!`)
//! - `column`   : column specs and column sets
//! - `sheet`    : sheet specs, title blocks, format rules
//! - `render`   : sheet to cell grid
//! - `template` : template workbook codec (load, overlay, save)
//! - `writer`   : grid to XLSX writer kernel
//! - `exporter` : multi-sheet export job
pub mod column;
pub mod conf;
pub mod exporter;
pub mod field;
pub mod render;
pub mod sheet;
pub mod spec;
pub mod template;
pub mod util;
pub mod writer;

pub use column::{SpecColumn, SpecColumnSet};
pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_cell_format, derive_default_export_styles, derive_default_header_format,
    derive_default_title_format,
};
pub use exporter::XlsxExporter;
pub use field::{ExportRecord, FieldSelector};
pub use render::render_grid;
pub use sheet::{RenderSheet, SpecFormatRule, SpecSheet, SpecTitleBlock};
pub use spec::{
    ConfigError, EnumAutofitColumnsRule, EnumCellValue, ExportError, Result,
    SpecAutofitCellsPolicy, SpecCellFormat, SpecExportOptions, SpecExportReport,
    SpecExportStyles, SpecGrid, SpecGridCell, SpecRgb, SpecSheetReport,
};
pub use template::{SpecTemplateWorkbook, TemplateOverlay};
pub use util::{derive_unique_sheet_name, sanitize_sheet_name};
pub use writer::XlsxWriter;
