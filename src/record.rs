//! Mapping between application records and table columns.
//!
//! A record type describes its column-bound fields once, through
//! [`Record::fields`], instead of inspecting itself on every call. The
//! [`record!`](crate::record) macro generates that description from a
//! struct declaration:
//!
//! ```
//! sqlite_mapper::record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct User {
//!         pub id: i64 => "id",
//!         pub name: Option<String> => "name",
//!         pub scratch: String,
//!     }
//! }
//! ```
//!
//! Fields without a `=> "column"` binding take no part in either
//! direction of the mapping, apart from being reset when a row is fetched.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::value::Value;

/// Column name to string-encoded value, in field declaration order.
pub type ColumnMap = IndexMap<String, String>;

/// Column name to result-column position for the current query.
pub type ColumnIndex = HashMap<String, usize>;

/// Semantic type of a column-bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
}

/// Static description of one column-bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub field: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

/// A Rust type that can back a column-bound field.
///
/// Plain types treat their zero value as "unset": `0`, `0.0` and the empty
/// string are omitted from writes. `Option<T>` marks presence explicitly,
/// so `Some(0)` is written and `None` is omitted.
pub trait ColumnType: Sized + Default {
    const KIND: FieldKind;

    /// Value to write, or `None` when the field is unset.
    fn to_column(&self) -> Option<Value>;

    /// Converts a result column, `None` for NULL or a value with no
    /// reading in this type (text without leading digits for an integer).
    fn try_from_column(value: Value) -> Option<Self>;

    /// Builds the field from a result column. NULL and unconvertible
    /// values produce the zero value, which is `None` for `Option<T>`.
    fn from_column(value: Value) -> Self {
        Self::try_from_column(value).unwrap_or_default()
    }
}

impl ColumnType for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_column(&self) -> Option<Value> {
        (*self != 0).then_some(Value::Integer(*self))
    }

    fn try_from_column(value: Value) -> Option<Self> {
        value.as_integer()
    }
}

impl ColumnType for f64 {
    const KIND: FieldKind = FieldKind::Real;

    fn to_column(&self) -> Option<Value> {
        (*self != 0.0).then_some(Value::Real(*self))
    }

    fn try_from_column(value: Value) -> Option<Self> {
        value.as_real()
    }
}

impl ColumnType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_column(&self) -> Option<Value> {
        (!self.is_empty()).then(|| Value::Text(self.clone()))
    }

    fn try_from_column(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            other => other.as_text(),
        }
    }
}

impl<T: ColumnType + Clone + Into<Value>> ColumnType for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn to_column(&self) -> Option<Value> {
        self.clone().map(Into::into)
    }

    fn try_from_column(value: Value) -> Option<Self> {
        Some(T::try_from_column(value))
    }
}

/// An application record whose fields map to table columns.
///
/// `Default` supplies the zero record that every fetch starts from.
pub trait Record: Default {
    /// Column-bound fields in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Current value of the field bound to `column`; `None` when the field
    /// is unset or no field is bound to `column`.
    fn column_value(&self, column: &str) -> Option<Value>;

    /// Assigns a result value to the field bound to `column`.
    fn set_column(&mut self, column: &str, value: Value);

    /// Set fields as typed values, keyed by column name.
    fn to_values(&self) -> IndexMap<&'static str, Value> {
        Self::fields()
            .iter()
            .filter_map(|def| self.column_value(def.column).map(|v| (def.column, v)))
            .collect()
    }

    /// Set fields rendered as strings. Fields whose rendering is empty are
    /// left out, so an empty string can't be written through this path.
    fn to_column_map(&self) -> ColumnMap {
        self.to_values()
            .into_iter()
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }
}

/// Resets `record` and copies every bound field whose column is present in
/// `columns` from `row`. Fields with no matching column stay at zero.
pub fn populate_record<R: Record>(record: &mut R, columns: &ColumnIndex, row: &[Value]) {
    *record = R::default();
    for def in R::fields() {
        if let Some(value) = columns.get(def.column).and_then(|&i| row.get(i)) {
            record.set_column(def.column, value.clone());
        }
    }
}

/// Declares a struct and implements [`Record`] for it.
///
/// Each field may carry a `=> "column"` binding. The struct must derive or
/// implement `Default`.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $column:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> &'static [$crate::FieldDef] {
                const FIELDS: &[$crate::FieldDef] = &[
                    $($(
                        $crate::FieldDef {
                            field: stringify!($field),
                            column: $column,
                            kind: <$ty as $crate::ColumnType>::KIND,
                        },
                    )?)*
                ];
                FIELDS
            }

            #[allow(unused_variables)]
            fn column_value(&self, column: &str) -> Option<$crate::Value> {
                match column {
                    $($(
                        $column => $crate::ColumnType::to_column(&self.$field),
                    )?)*
                    _ => None,
                }
            }

            #[allow(unused_variables)]
            fn set_column(&mut self, column: &str, value: $crate::Value) {
                match column {
                    $($(
                        $column => self.$field = $crate::ColumnType::from_column(value),
                    )?)*
                    _ => {}
                }
            }
        }
    };
}
