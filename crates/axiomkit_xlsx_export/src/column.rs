//! Column definitions and the ordered column set of one sheet.

use std::fmt;

use crate::field::{ExportRecord, FieldSelector, FnCellAccessor};
use crate::spec::{ConfigError, EnumCellValue, SpecCellFormat};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnSpecification

/// One exported column.
pub struct SpecColumn<T> {
    key: String,
    title: String,
    accessor: FnCellAccessor<T>,
    format: SpecCellFormat,
    if_visible: bool,
    if_computed: bool,
}

impl<T> SpecColumn<T> {
    /// Field name, or the title for computed columns.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Column-level format patch (merged onto header/body presets).
    pub fn format(&self) -> &SpecCellFormat {
        &self.format
    }

    pub fn is_visible(&self) -> bool {
        self.if_visible
    }

    /// True for columns derived by an expression rather than a field read.
    pub fn is_computed(&self) -> bool {
        self.if_computed
    }

    /// Evaluate this column for `record`.
    pub fn read(&self, record: &T) -> Result<EnumCellValue, String> {
        (self.accessor)(record)
    }
}

impl<T> fmt::Debug for SpecColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecColumn")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("format", &self.format)
            .field("if_visible", &self.if_visible)
            .field("if_computed", &self.if_computed)
            .finish_non_exhaustive()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnSet

/// Ordered column collection; render order equals insertion order.
///
/// A new set is seeded with one column per field of `T`. `.title()` and
/// `.format()` configure the column added most recently.
pub struct SpecColumnSet<T> {
    l_columns: Vec<SpecColumn<T>>,
    if_seeded_default: bool,
    l_errors: Vec<ConfigError>,
}

impl<T: ExportRecord> SpecColumnSet<T> {
    /// Seed one visible column per readable field of `T`, in declaration order.
    pub fn from_record() -> Self {
        let l_columns = T::export_fields()
            .into_iter()
            .map(|selector| derive_field_column(&selector, None))
            .collect();
        Self {
            l_columns,
            if_seeded_default: true,
            l_errors: Vec::new(),
        }
    }

    /// Empty set.
    pub fn empty() -> Self {
        Self {
            l_columns: Vec::new(),
            if_seeded_default: false,
            l_errors: Vec::new(),
        }
    }

    /// Drop every column (default seed included) for full explicit control.
    pub fn clear(mut self) -> Self {
        self.l_columns.clear();
        self.if_seeded_default = false;
        self
    }

    /// Append a column reading `selector`'s field.
    ///
    /// The title defaults to the field's declared display name, or its name.
    pub fn add_column(mut self, selector: FieldSelector<T>) -> Self {
        let c_title_declared = selector
            .display_name()
            .map(ToString::to_string)
            .or_else(|| {
                T::export_field(selector.name())
                    .and_then(|declared| declared.display_name().map(ToString::to_string))
            });
        self.l_columns
            .push(derive_field_column(&selector, c_title_declared));
        self.if_seeded_default = false;
        self
    }

    /// Append a column for the declared field `name`.
    pub fn add_field(mut self, name: &str) -> Self {
        match T::export_field(name) {
            Some(selector) => self.add_column(selector),
            None => {
                self.l_errors.push(ConfigError::UnknownField {
                    field: name.to_string(),
                    record: T::record_name().to_string(),
                });
                self
            }
        }
    }

    /// Append a column computed from the whole record. `title` is mandatory.
    pub fn add_computed_column<V, F>(self, title: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> V + 'static,
        V: Into<EnumCellValue>,
    {
        let title = title.into();
        let selector = FieldSelector::new(title.clone(), accessor);
        self.push_computed(title, selector)
    }

    /// Fallible variant of [`Self::add_computed_column`].
    pub fn try_add_computed_column<V, E, F>(self, title: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> Result<V, E> + 'static,
        V: Into<EnumCellValue>,
        E: fmt::Display,
    {
        let title = title.into();
        let selector = FieldSelector::try_new(title.clone(), accessor);
        self.push_computed(title, selector)
    }

    fn push_computed(mut self, title: String, selector: FieldSelector<T>) -> Self {
        if title.trim().is_empty() {
            self.l_errors.push(ConfigError::MissingColumnTitle);
            return self;
        }
        self.l_columns.push(SpecColumn {
            key: title.clone(),
            title,
            accessor: selector.accessor(),
            format: SpecCellFormat::default(),
            if_visible: true,
            if_computed: true,
        });
        self.if_seeded_default = false;
        self
    }

    /// Rename the most recently added column.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        match self.l_columns.last_mut() {
            Some(column) => column.title = title.into(),
            None => self.l_errors.push(ConfigError::NoColumnToConfigure {
                attribute: "title".to_string(),
            }),
        }
        self
    }

    /// Patch the format of the most recently added column.
    pub fn format<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(SpecCellFormat) -> SpecCellFormat,
    {
        match self.l_columns.last_mut() {
            Some(column) => column.format = configure(std::mem::take(&mut column.format)),
            None => self.l_errors.push(ConfigError::NoColumnToConfigure {
                attribute: "format".to_string(),
            }),
        }
        self
    }

    /// Hide every field column matching `selector`'s field.
    pub fn hide_column(self, selector: FieldSelector<T>) -> Self {
        self.hide_field(selector.name())
    }

    /// Hide every field column named `name`.
    ///
    /// While the set still holds only the default seed, matching columns are
    /// removed; otherwise they stay in the set but are marked invisible.
    pub fn hide_field(mut self, name: &str) -> Self {
        let if_matched = self
            .l_columns
            .iter()
            .any(|column| !column.if_computed && column.key == name);
        if !if_matched {
            self.l_errors.push(ConfigError::UnknownField {
                field: name.to_string(),
                record: T::record_name().to_string(),
            });
            return self;
        }

        if self.if_seeded_default {
            self.l_columns.retain(|column| column.key != name);
        } else {
            for column in self
                .l_columns
                .iter_mut()
                .filter(|column| !column.if_computed && column.key == name)
            {
                column.if_visible = false;
            }
        }
        self
    }
}

impl<T> SpecColumnSet<T> {
    /// All columns, hidden ones included.
    pub fn columns(&self) -> &[SpecColumn<T>] {
        &self.l_columns
    }

    /// Columns that occupy a grid column, in render order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &SpecColumn<T>> {
        self.l_columns.iter().filter(|column| column.if_visible)
    }

    pub fn len(&self) -> usize {
        self.l_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_columns.is_empty()
    }

    pub(crate) fn take_errors(&mut self) -> Vec<ConfigError> {
        std::mem::take(&mut self.l_errors)
    }
}

impl<T: ExportRecord> Default for SpecColumnSet<T> {
    fn default() -> Self {
        Self::from_record()
    }
}

fn derive_field_column<T>(selector: &FieldSelector<T>, title: Option<String>) -> SpecColumn<T> {
    SpecColumn {
        key: selector.name().to_string(),
        title: title.unwrap_or_else(|| selector.title().to_string()),
        accessor: selector.accessor(),
        format: SpecCellFormat::default(),
        if_visible: true,
        if_computed: false,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;

    struct Item {
        prop_a: String,
        prop_b: String,
        prop_c: i32,
    }

    crate::export_record!(Item { prop_a => "Prop A", prop_b, prop_c });

    fn derive_titles(cols: &SpecColumnSet<Item>) -> Vec<String> {
        cols.visible_columns()
            .map(|c| c.title().to_string())
            .collect()
    }

    #[test]
    fn test_default_seed_follows_declaration_order() {
        let cols = SpecColumnSet::<Item>::from_record();
        assert_eq!(derive_titles(&cols), vec!["Prop A", "prop_b", "prop_c"]);
    }

    #[test]
    fn test_same_field_twice_yields_two_columns() {
        let mut cols = SpecColumnSet::<Item>::from_record()
            .clear()
            .add_column(field!(Item, prop_a))
            .add_column(field!(Item, prop_a))
            .title("Prop a (2)");
        assert!(cols.take_errors().is_empty());
        assert_eq!(derive_titles(&cols), vec!["Prop A", "Prop a (2)"]);
        assert_eq!(cols.columns()[0].key(), cols.columns()[1].key());
    }

    #[test]
    fn test_hide_on_default_seed_removes_column() {
        let cols = SpecColumnSet::<Item>::from_record().hide_column(field!(Item, prop_b));
        assert_eq!(cols.len(), 2);
        assert_eq!(derive_titles(&cols), vec!["Prop A", "prop_c"]);
    }

    #[test]
    fn test_hide_on_explicit_set_keeps_column_invisible() {
        let cols = SpecColumnSet::<Item>::empty()
            .add_column(field!(Item, prop_a))
            .add_column(field!(Item, prop_b))
            .add_column(field!(Item, prop_c))
            .hide_field("prop_b");
        assert_eq!(cols.len(), 3);
        assert!(!cols.columns()[1].is_visible());
        assert_eq!(derive_titles(&cols), vec!["Prop A", "prop_c"]);
    }

    #[test]
    fn test_computed_column_requires_title() {
        let mut cols = SpecColumnSet::<Item>::empty().add_computed_column("", |r: &Item| r.prop_c);
        assert!(cols.is_empty());
        assert_eq!(cols.take_errors(), vec![ConfigError::MissingColumnTitle]);
    }

    #[test]
    fn test_computed_column_reads_expression() {
        let cols = SpecColumnSet::<Item>::empty().add_computed_column("Plus 1", |r: &Item| r.prop_c + 1);
        let record = Item {
            prop_a: "a".to_string(),
            prop_b: "b".to_string(),
            prop_c: 41,
        };
        let column = &cols.columns()[0];
        assert!(column.is_computed());
        assert_eq!(column.key(), "Plus 1");
        assert_eq!(column.read(&record), Ok(EnumCellValue::Number(42.0)));
    }

    #[test]
    fn test_unknown_field_and_orphan_title_are_recorded() {
        let mut cols = SpecColumnSet::<Item>::empty()
            .title("orphan")
            .add_field("nope")
            .hide_field("prop_a");
        let l_errors = cols.take_errors();
        assert_eq!(l_errors.len(), 3);
        assert!(matches!(l_errors[0], ConfigError::NoColumnToConfigure { .. }));
        assert!(matches!(l_errors[1], ConfigError::UnknownField { .. }));
        assert!(matches!(l_errors[2], ConfigError::UnknownField { .. }));
    }

    #[test]
    fn test_format_applies_to_last_column_cumulatively() {
        let cols = SpecColumnSet::<Item>::empty()
            .add_field("prop_a")
            .format(|f| f.bold(true))
            .format(|f| f.width(150.0))
            .add_field("prop_b");
        assert_eq!(cols.columns()[0].format().bold, Some(true));
        assert_eq!(cols.columns()[0].format().width, Some(150.0));
        assert!(cols.columns()[1].format().is_empty());
    }
}
