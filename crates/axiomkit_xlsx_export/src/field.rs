//! Record field selectors and the default-column provider trait.

use std::fmt;
use std::sync::Arc;

use crate::spec::EnumCellValue;

/// Shared accessor reading one cell value off a record.
pub type FnCellAccessor<T> = Arc<dyn Fn(&T) -> Result<EnumCellValue, String>>;

/// Named value accessor bound to record type `T`.
pub struct FieldSelector<T> {
    name: String,
    display_name: Option<String>,
    read: FnCellAccessor<T>,
}

impl<T: 'static> FieldSelector<T> {
    /// Selector from an infallible accessor.
    pub fn new<V, F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> V + 'static,
        V: Into<EnumCellValue>,
    {
        Self {
            name: name.into(),
            display_name: None,
            read: Arc::new(move |record: &T| Ok(read(record).into())),
        }
    }

    /// Selector from a fallible accessor. The error text surfaces as a render error.
    pub fn try_new<V, E, F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> Result<V, E> + 'static,
        V: Into<EnumCellValue>,
        E: fmt::Display,
    {
        Self {
            name: name.into(),
            display_name: None,
            read: Arc::new(move |record: &T| {
                read(record).map(Into::into).map_err(|err| err.to_string())
            }),
        }
    }
}

impl<T> FieldSelector<T> {
    /// Attach the declared display title.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Source field name (stable identity).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Default column title: display name when declared, else field name.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Read this field from `record`.
    pub fn read(&self, record: &T) -> Result<EnumCellValue, String> {
        (self.read)(record)
    }

    pub(crate) fn accessor(&self) -> FnCellAccessor<T> {
        Arc::clone(&self.read)
    }
}

impl<T> Clone for FieldSelector<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            read: Arc::clone(&self.read),
        }
    }
}

impl<T> fmt::Debug for FieldSelector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSelector")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Record types that can seed a sheet's default columns.
///
/// `export_fields` returns one selector per readable field, in declaration
/// order. Use [`export_record!`](crate::export_record) to implement it.
pub trait ExportRecord: Sized + 'static {
    /// Readable fields in declaration order.
    fn export_fields() -> Vec<FieldSelector<Self>>;

    /// Look up one declared field by name.
    fn export_field(name: &str) -> Option<FieldSelector<Self>> {
        Self::export_fields()
            .into_iter()
            .find(|selector| selector.name() == name)
    }

    /// Type name used in diagnostics.
    fn record_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Build a [`FieldSelector`] reading `record.field`.
///
/// ```
/// use axiomkit_xlsx_export::field;
///
/// struct Item { qty: i32 }
///
/// let selector = field!(Item, qty);
/// assert_eq!(selector.name(), "qty");
/// ```
#[macro_export]
macro_rules! field {
    ($ty:ty, $field:ident) => {
        $crate::field::FieldSelector::<$ty>::new(stringify!($field), |record: &$ty| {
            record.$field.clone()
        })
    };
}

/// Implement [`ExportRecord`] from a field list, optionally with display titles.
///
/// ```
/// use axiomkit_xlsx_export::{export_record, ExportRecord};
///
/// struct Item { name: String, qty: i32 }
/// export_record!(Item { name => "Item name", qty });
///
/// let l_titles: Vec<String> = Item::export_fields()
///     .iter()
///     .map(|f| f.title().to_string())
///     .collect();
/// assert_eq!(l_titles, vec!["Item name", "qty"]);
/// ```
#[macro_export]
macro_rules! export_record {
    ($ty:ty { $( $field:ident $( => $title:expr )? ),* $(,)? }) => {
        impl $crate::field::ExportRecord for $ty {
            fn export_fields() -> Vec<$crate::field::FieldSelector<Self>> {
                vec![
                    $(
                        $crate::field!($ty, $field)$( .with_display_name($title) )?,
                    )*
                ]
            }
        }
    };
}
