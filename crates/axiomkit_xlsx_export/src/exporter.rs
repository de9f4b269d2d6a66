//! Export job: an ordered list of sheets, optionally merged into a template.

use std::path::Path;

use crate::field::ExportRecord;
use crate::sheet::{RenderSheet, SpecSheet};
use crate::spec::{
    ConfigError, ExportError, Result, SpecExportOptions, SpecExportReport, SpecGrid,
    SpecSheetReport,
};
use crate::template::SpecTemplateWorkbook;
use crate::writer::XlsxWriter;

/// Multi-sheet XLSX exporter.
///
/// ```
/// use axiomkit_xlsx_export::{export_record, SpecSheet, XlsxExporter};
///
/// struct Item { code: String, qty: i32 }
/// export_record!(Item { code => "Code", qty });
///
/// let v_bytes = XlsxExporter::new()
///     .add_sheet(|sheet: SpecSheet<Item>| {
///         sheet
///             .name("Items")
///             .set_data(vec![Item { code: "A-1".into(), qty: 3 }])
///             .columns(|cols| cols.add_computed_column("Double", |r: &Item| r.qty * 2))
///     })
///     .expect("valid sheet")
///     .export()
///     .expect("export");
/// assert!(!v_bytes.is_empty());
/// ```
pub struct XlsxExporter {
    l_sheets: Vec<Box<dyn RenderSheet>>,
    template: Option<SpecTemplateWorkbook>,
    options: SpecExportOptions,
}

impl XlsxExporter {
    /// Exporter producing a fresh workbook.
    pub fn new() -> Self {
        Self {
            l_sheets: Vec::new(),
            template: None,
            options: SpecExportOptions::default(),
        }
    }

    /// Exporter writing onto the sheets of an XLSX template payload.
    pub fn from_template(v_bytes: &[u8]) -> Result<Self> {
        Ok(Self::new().with_template(SpecTemplateWorkbook::from_bytes(v_bytes)?))
    }

    pub fn from_template_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new().with_template(SpecTemplateWorkbook::from_path(path)?))
    }

    pub fn with_template(mut self, template: SpecTemplateWorkbook) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_options(mut self, options: SpecExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Configure and append one sheet.
    ///
    /// Returns the first configuration error recorded while `configure` ran.
    pub fn add_sheet<T, F>(mut self, configure: F) -> Result<Self>
    where
        T: ExportRecord,
        F: FnOnce(SpecSheet<T>) -> SpecSheet<T>,
    {
        let sheet = configure(SpecSheet::new());
        if let Some(err) = sheet.errors().first() {
            return Err(err.clone().into());
        }

        if let Some(template) = &self.template
            && self.l_sheets.len() >= template.sheet_count()
        {
            return Err(ConfigError::TemplateSheetOutOfRange {
                n_idx_sheet: self.l_sheets.len() + 1,
                n_sheets_available: template.sheet_count(),
            }
            .into());
        }

        self.l_sheets.push(Box::new(sheet));
        Ok(self)
    }

    pub fn sheet_count(&self) -> usize {
        self.l_sheets.len()
    }

    pub fn options(&self) -> &SpecExportOptions {
        &self.options
    }

    /// Render every sheet and serialize the workbook.
    pub fn export(&self) -> Result<Vec<u8>> {
        self.export_with_report().map(|(v_bytes, _)| v_bytes)
    }

    /// Render every sheet, serialize the workbook and describe what was written.
    pub fn export_with_report(&self) -> Result<(Vec<u8>, SpecExportReport)> {
        let mut report = SpecExportReport::default();
        let v_bytes = match &self.template {
            Some(template) => self.export_into_template(template, &mut report)?,
            None => self.export_into_new_workbook(&mut report)?,
        };

        log::info!(
            "exported {} sheet(s) into {} ({} bytes)",
            self.l_sheets.len(),
            if self.template.is_some() { "template" } else { "new workbook" },
            v_bytes.len()
        );
        Ok((v_bytes, report))
    }

    /// Write the result to `path`.
    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<SpecExportReport> {
        let path = path.as_ref();
        let (v_bytes, report) = self.export_with_report()?;
        std::fs::write(path, v_bytes).map_err(|err| {
            ExportError::Codec(format!("failed to write {}: {err}", path.display()))
        })?;
        Ok(report)
    }

    fn export_into_new_workbook(&self, report: &mut SpecExportReport) -> Result<Vec<u8>> {
        if self.l_sheets.is_empty() {
            return Err(ConfigError::NoSheetConfigured.into());
        }

        let mut writer = XlsxWriter::new(self.options.if_sanitize_sheet_names);
        let mut l_plans: Vec<(String, SpecGrid)> = Vec::with_capacity(self.l_sheets.len());
        for (n_idx_sheet, sheet) in self.l_sheets.iter().enumerate() {
            let name = sheet.configured_name().ok_or(ConfigError::MissingSheetName {
                n_idx_sheet: n_idx_sheet + 1,
            })?;
            let sheet_name = writer.reserve_sheet_name(name, report)?;
            let grid = sheet.render(&sheet_name, &self.options)?;
            l_plans.push((sheet_name, grid));
        }

        for ((sheet_name, grid), sheet) in l_plans.iter().zip(&self.l_sheets) {
            writer.write_sheet(sheet_name, grid)?;
            report
                .sheets
                .push(derive_sheet_report(sheet_name, sheet.as_ref(), grid));
        }
        writer.save_to_buffer()
    }

    /// Overlay the i-th sheet onto the i-th template sheet; the rest of the
    /// template is saved back untouched.
    fn export_into_template(
        &self,
        template: &SpecTemplateWorkbook,
        report: &mut SpecExportReport,
    ) -> Result<Vec<u8>> {
        if self.l_sheets.len() > template.sheet_count() {
            return Err(ConfigError::TemplateSheetOutOfRange {
                n_idx_sheet: self.l_sheets.len(),
                n_sheets_available: template.sheet_count(),
            }
            .into());
        }

        let l_sheet_names = template.sheet_names();
        let mut l_plans: Vec<(&str, SpecGrid)> = Vec::with_capacity(self.l_sheets.len());
        for (sheet, sheet_name) in self.l_sheets.iter().zip(l_sheet_names) {
            let grid = sheet.render(sheet_name, &self.options)?;
            l_plans.push((sheet_name, grid));
        }

        let mut overlay = template.open()?;
        for ((sheet_name, grid), sheet) in l_plans.iter().zip(&self.l_sheets) {
            if grid.freeze_rows().is_some() {
                report.warn(format!(
                    "Sheet '{sheet_name}' keeps the template's panes; freeze_header is not applied."
                ));
            }
            overlay.write_grid(sheet_name, grid)?;
            report
                .sheets
                .push(derive_sheet_report(sheet_name, sheet.as_ref(), grid));
        }
        overlay.save_to_buffer()
    }
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_sheet_report(sheet_name: &str, sheet: &dyn RenderSheet, grid: &SpecGrid) -> SpecSheetReport {
    SpecSheetReport {
        sheet_name: sheet_name.to_string(),
        n_rows_data: sheet.n_rows_data(),
        n_cols_visible: sheet.n_cols_visible(),
        n_row_last_used: grid.last_used_row(),
        n_col_last_used: grid.last_used_column(),
    }
}
