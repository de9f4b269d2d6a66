//! Sheet configuration: data, placement, title, header, columns and format rules.

use std::fmt;

use crate::column::SpecColumnSet;
use crate::field::ExportRecord;
use crate::render::render_grid;
use crate::spec::{ConfigError, Result, SpecCellFormat, SpecExportOptions, SpecGrid};
use crate::util::validate_coordinates;

////////////////////////////////////////////////////////////////////////////////
// #region FormatRule

/// Predicate evaluated once per data record.
pub type FnRecordPredicate<T> = Box<dyn Fn(&T) -> std::result::Result<bool, String>>;

/// Conditional style override applied to every visible cell of matching rows.
pub struct SpecFormatRule<T> {
    predicate: FnRecordPredicate<T>,
    fmt_patch: SpecCellFormat,
}

impl<T: 'static> SpecFormatRule<T> {
    /// Rule from a predicate and a pure format action.
    ///
    /// The action is evaluated once, on an empty format, to obtain the patch.
    pub fn new<P, A>(predicate: P, action: A) -> Self
    where
        P: Fn(&T) -> bool + 'static,
        A: FnOnce(SpecCellFormat) -> SpecCellFormat,
    {
        Self {
            predicate: Box::new(move |record: &T| Ok(predicate(record))),
            fmt_patch: action(SpecCellFormat::new()),
        }
    }

    /// Rule from a fallible predicate.
    pub fn try_new<P, E, A>(predicate: P, action: A) -> Self
    where
        P: Fn(&T) -> std::result::Result<bool, E> + 'static,
        E: fmt::Display,
        A: FnOnce(SpecCellFormat) -> SpecCellFormat,
    {
        Self {
            predicate: Box::new(move |record: &T| predicate(record).map_err(|err| err.to_string())),
            fmt_patch: action(SpecCellFormat::new()),
        }
    }
}

impl<T> SpecFormatRule<T> {
    pub fn matches(&self, record: &T) -> std::result::Result<bool, String> {
        (self.predicate)(record)
    }

    /// Partial format merged onto matching cells.
    pub fn fmt_patch(&self) -> &SpecCellFormat {
        &self.fmt_patch
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TitleBlock

/// Single-cell title placed at the sheet origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecTitleBlock {
    /// Title text; the sheet name is used when unset.
    pub text: Option<String>,
    /// Patch merged onto the title preset.
    pub format: SpecCellFormat,
}

impl SpecTitleBlock {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn format<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(SpecCellFormat) -> SpecCellFormat,
    {
        self.format = configure(self.format);
        self
    }

    /// Text to render for a sheet named `sheet_name`.
    pub fn resolve_text(&self, sheet_name: &str) -> String {
        self.text
            .clone()
            .unwrap_or_else(|| sheet_name.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSpecification

/// Declarative description of one exported sheet over records of type `T`.
pub struct SpecSheet<T> {
    l_data: Vec<T>,
    name: Option<String>,
    origin: (usize, usize),
    columns: SpecColumnSet<T>,
    title: Option<SpecTitleBlock>,
    if_show_header: bool,
    if_freeze_header: bool,
    l_rules: Vec<SpecFormatRule<T>>,
    l_errors: Vec<ConfigError>,
}

impl<T: ExportRecord> SpecSheet<T> {
    /// Empty sheet with one default column per field of `T`, origin `(1, 1)`.
    pub fn new() -> Self {
        Self {
            l_data: Vec::new(),
            name: None,
            origin: (1, 1),
            columns: SpecColumnSet::from_record(),
            title: None,
            if_show_header: true,
            if_freeze_header: false,
            l_rules: Vec::new(),
            l_errors: Vec::new(),
        }
    }

    /// Records to export, in output order.
    pub fn set_data(mut self, records: impl IntoIterator<Item = T>) -> Self {
        self.l_data = records.into_iter().collect();
        self
    }

    /// Sheet name (ignored when exporting into a template).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 1-based origin of the first rendered cell.
    pub fn set_coordinates(mut self, row: usize, col: usize) -> Self {
        match validate_coordinates(row, col) {
            Ok(()) => self.origin = (row, col),
            Err(err) => self.l_errors.push(err),
        }
        self
    }

    pub fn hide_column_headers(mut self) -> Self {
        self.if_show_header = false;
        self
    }

    /// Show a title holding the sheet name.
    pub fn show_title(self) -> Self {
        self.title(|title| title)
    }

    /// Show a title configured by `configure`.
    pub fn title<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(SpecTitleBlock) -> SpecTitleBlock,
    {
        self.title = Some(configure(self.title.take().unwrap_or_default()));
        self
    }

    /// Reconfigure the column set.
    pub fn columns<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(SpecColumnSet<T>) -> SpecColumnSet<T>,
    {
        self.columns = configure(self.columns);
        let l_errors = self.columns.take_errors();
        self.l_errors.extend(l_errors);
        self
    }

    /// Register a conditional format; rules fold in registration order.
    pub fn add_format_rule<P, A>(mut self, predicate: P, action: A) -> Self
    where
        P: Fn(&T) -> bool + 'static,
        A: FnOnce(SpecCellFormat) -> SpecCellFormat,
    {
        self.l_rules.push(SpecFormatRule::new(predicate, action));
        self
    }

    /// Fallible variant of [`Self::add_format_rule`].
    pub fn try_add_format_rule<P, E, A>(mut self, predicate: P, action: A) -> Self
    where
        P: Fn(&T) -> std::result::Result<bool, E> + 'static,
        E: fmt::Display,
        A: FnOnce(SpecCellFormat) -> SpecCellFormat,
    {
        self.l_rules.push(SpecFormatRule::try_new(predicate, action));
        self
    }

    /// Freeze panes below the header row.
    pub fn freeze_header(mut self) -> Self {
        self.if_freeze_header = true;
        self
    }
}

impl<T: ExportRecord> Default for SpecSheet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SpecSheet<T> {
    pub fn data(&self) -> &[T] {
        &self.l_data
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 1-based `(row, column)` origin.
    pub fn origin(&self) -> (usize, usize) {
        self.origin
    }

    pub fn column_set(&self) -> &SpecColumnSet<T> {
        &self.columns
    }

    /// Title block, present only when requested.
    pub fn title_block(&self) -> Option<&SpecTitleBlock> {
        self.title.as_ref()
    }

    pub fn shows_header(&self) -> bool {
        self.if_show_header
    }

    pub fn freezes_header(&self) -> bool {
        self.if_freeze_header
    }

    pub fn rules(&self) -> &[SpecFormatRule<T>] {
        &self.l_rules
    }

    /// Configuration errors collected so far, in occurrence order.
    pub fn errors(&self) -> &[ConfigError] {
        &self.l_errors
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RenderSheet

/// Type-erased sheet, so one exporter can hold sheets over different records.
pub trait RenderSheet {
    /// Configured name, if any.
    fn configured_name(&self) -> Option<&str>;

    fn n_rows_data(&self) -> usize;

    fn n_cols_visible(&self) -> usize;

    /// Render into a grid for a sheet finally named `sheet_name`.
    fn render(&self, sheet_name: &str, options: &SpecExportOptions) -> Result<SpecGrid>;
}

impl<T: ExportRecord> RenderSheet for SpecSheet<T> {
    fn configured_name(&self) -> Option<&str> {
        self.sheet_name()
    }

    fn n_rows_data(&self) -> usize {
        self.l_data.len()
    }

    fn n_cols_visible(&self) -> usize {
        self.columns.visible_columns().count()
    }

    fn render(&self, sheet_name: &str, options: &SpecExportOptions) -> Result<SpecGrid> {
        render_grid(self, sheet_name, options)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;

    struct Item {
        code: String,
        qty: i32,
    }

    crate::export_record!(Item { code, qty });

    #[test]
    fn test_new_sheet_defaults() {
        let sheet = SpecSheet::<Item>::new();
        assert_eq!(sheet.origin(), (1, 1));
        assert!(sheet.shows_header());
        assert!(sheet.title_block().is_none());
        assert_eq!(sheet.column_set().len(), 2);
        assert!(sheet.errors().is_empty());
    }

    #[test]
    fn test_invalid_coordinates_are_recorded() {
        let sheet = SpecSheet::<Item>::new().set_coordinates(0, 2);
        assert_eq!(sheet.origin(), (1, 1));
        assert_eq!(
            sheet.errors(),
            &[ConfigError::InvalidCoordinates { row: 0, col: 2 }]
        );
    }

    #[test]
    fn test_title_text_defaults_to_sheet_name() {
        let sheet = SpecSheet::<Item>::new().name("Hoja 1").show_title();
        let title = sheet.title_block().expect("title present");
        assert_eq!(title.resolve_text("Hoja 1"), "Hoja 1");

        let sheet = SpecSheet::<Item>::new().title(|t| t.text("Title"));
        let title = sheet.title_block().expect("title present");
        assert_eq!(title.resolve_text("Hoja 1"), "Title");
    }

    #[test]
    fn test_column_errors_bubble_to_sheet() {
        let sheet = SpecSheet::<Item>::new().columns(|cols| {
            cols.clear()
                .add_column(field!(Item, code))
                .add_computed_column(" ", |r: &Item| r.qty * 2)
        });
        assert_eq!(sheet.errors(), &[ConfigError::MissingColumnTitle]);
        assert_eq!(sheet.column_set().len(), 1);
    }

    #[test]
    fn test_format_rule_patch_is_precomputed() {
        let rule = SpecFormatRule::<Item>::new(|r| r.qty > 1, |f| f.bold(true).italic(true));
        assert_eq!(rule.fmt_patch(), &SpecCellFormat::new().bold(true).italic(true));
        let record = Item {
            code: "a".to_string(),
            qty: 2,
        };
        assert_eq!(rule.matches(&record), Ok(true));
    }
}
