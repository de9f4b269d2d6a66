//! XLSX constants and default style presets.

use crate::spec::{SpecCellFormat, SpecExportStyles};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Body cell preset: plain black 11pt text.
pub fn derive_default_cell_format() -> SpecCellFormat {
    SpecCellFormat::new()
        .bold(false)
        .italic(false)
        .underline(false)
        .bottom_border(false)
        .color(0, 0, 0)
        .font_size(11.0)
}

/// Header cell preset: bold 12pt with a bottom border.
pub fn derive_default_header_format() -> SpecCellFormat {
    derive_default_cell_format().with_(
        SpecCellFormat::new()
            .bold(true)
            .bottom_border(true)
            .font_size(12.0),
    )
}

/// Title cell preset: bold italic 18pt.
pub fn derive_default_title_format() -> SpecCellFormat {
    derive_default_cell_format().with_(
        SpecCellFormat::new()
            .bold(true)
            .italic(true)
            .font_size(18.0),
    )
}

/// Build the default base styles used by [`crate::render::render_grid`].
pub fn derive_default_export_styles() -> SpecExportStyles {
    SpecExportStyles {
        fmt_cell: derive_default_cell_format(),
        fmt_header: derive_default_header_format(),
        fmt_title: derive_default_title_format(),
    }
}
