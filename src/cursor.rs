//! Forward-only cursor over a query's result rows.
//!
//! The cursor reads one row ahead: after it is opened, and after each
//! fetch, the next row (if any) is already stepped and held as owned
//! values. `has_next` therefore answers without touching the engine, and
//! the end-of-results flag is set as soon as the last row is consumed.

use rusqlite::Rows;
use std::marker::PhantomData;
use tracing::warn;

use crate::error::{Error, Result};
use crate::record::{populate_record, ColumnIndex, ColumnMap, Record};
use crate::value::Value;

pub struct Cursor<'stmt> {
    rows: Rows<'stmt>,
    columns: ColumnIndex,
    width: usize,
    current: Option<Vec<Value>>,
    eof: bool,
}

impl<'stmt> Cursor<'stmt> {
    /// Wraps freshly started `rows` and steps to the first row.
    pub(crate) fn open(rows: Rows<'stmt>, names: Vec<String>) -> Result<Self> {
        let width = names.len();
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();
        let mut cursor = Self {
            rows,
            columns,
            width,
            current: None,
            eof: false,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = None;
        match self.step() {
            Ok(Some(row)) => {
                self.current = Some(row);
                Ok(())
            }
            Ok(None) => {
                self.eof = true;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "cursor terminated by read failure");
                self.eof = true;
                Err(err)
            }
        }
    }

    fn step(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(row) = self.rows.next()? else {
            return Ok(None);
        };
        let values = (0..self.width)
            .map(|index| row.get::<_, Value>(index))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(values))
    }

    /// True once the result set is exhausted or a read failed.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// True while a row is available to fetch.
    pub fn has_next(&self) -> bool {
        !self.eof
    }

    /// Column name to position for this query's result schema. When a name
    /// repeats, the last position wins.
    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    /// The row the next fetch will return.
    pub fn current(&self) -> Result<&[Value]> {
        self.current.as_deref().ok_or(Error::NoCurrentRow)
    }

    /// Value of `column` in the current row, `None` if the query has no such column.
    pub fn get(&self, column: &str) -> Result<Option<&Value>> {
        let row = self.current()?;
        Ok(self.columns.get(column).and_then(|&index| row.get(index)))
    }

    /// Takes the current row and steps to the next one.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if self.eof {
            return Ok(None);
        }
        let row = self.current.take().ok_or(Error::NoCurrentRow)?;
        self.advance()?;
        Ok(Some(row))
    }

    /// Fills `record` from the current row and steps to the next one.
    ///
    /// Returns `false`, leaving `record` untouched, once the results are
    /// exhausted. Otherwise every field of `record` is reset before the
    /// row is copied, so nothing from an earlier fetch survives.
    ///
    /// If stepping past the populated row fails, `record` holds that row,
    /// the error is returned and the cursor is at end-of-results.
    pub fn fetch<R: Record>(&mut self, record: &mut R) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }
        let row = self.current.take().ok_or(Error::NoCurrentRow)?;
        populate_record(record, &self.columns, &row);
        self.advance()?;
        Ok(true)
    }

    /// Reads the current row as column name to text and steps to the next
    /// one. Values render as SQLite renders them as text (`2.0` for a REAL
    /// two); NULL columns map to the empty string.
    pub fn fetch_map(&mut self) -> Result<Option<ColumnMap>> {
        let Some(row) = self.next_row()? else {
            return Ok(None);
        };
        let mut ordered: Vec<(&String, &usize)> = self.columns.iter().collect();
        ordered.sort_by_key(|&(_, index)| *index);
        Ok(Some(
            ordered
                .into_iter()
                .map(|(name, &index)| (name.clone(), row[index].as_text().unwrap_or_default()))
                .collect(),
        ))
    }

    /// Iterator over the remaining rows as records.
    pub fn records<R: Record>(&mut self) -> Records<'_, 'stmt, R> {
        Records {
            cursor: self,
            marker: PhantomData,
        }
    }

    pub fn collect_records<R: Record>(&mut self) -> Result<Vec<R>> {
        self.records().collect()
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("columns", &self.columns)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`Cursor::records`]. Stops after the first error.
pub struct Records<'c, 'stmt, R> {
    cursor: &'c mut Cursor<'stmt>,
    marker: PhantomData<R>,
}

impl<R: Record> Iterator for Records<'_, '_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = R::default();
        match self.cursor.fetch(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
