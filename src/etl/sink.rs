//! Relational sink for the batch ETL driver.
//!
//! A thin wrapper over a SQLite connection: destructive reset at run start,
//! then append-only chunk writes. Each chunk is written inside one
//! transaction; chunks already committed stay committed if a later chunk
//! fails. The sink is exclusively owned by one ETL run.

use rusqlite::{params, Connection};
use std::path::Path;

use crate::error::EtlResult;
use crate::models::SalesRow;

/// Append-only SQLite sink for sales rows.
pub struct SqliteSink {
    conn: Connection,
    table: String,
}

impl SqliteSink {
    /// Open (or create) the database file.
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> EtlResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// In-memory sink, used by tests.
    pub fn in_memory(table: &str) -> EtlResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Quoted table identifier.
    fn table_ident(&self) -> String {
        format!("\"{}\"", self.table.replace('"', "\"\""))
    }

    /// Drop the table if it exists and recreate it empty.
    pub fn reset(&self) -> EtlResult<()> {
        let table = self.table_ident();
        self.conn
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS {table};
                 CREATE TABLE {table} (
                     date TEXT NOT NULL,
                     product_id TEXT NOT NULL,
                     quantity REAL NOT NULL,
                     revenue REAL NOT NULL
                 );"
            ))?;
        Ok(())
    }

    /// Append a chunk of rows inside one transaction.
    pub fn append(&mut self, rows: &[SalesRow]) -> EtlResult<()> {
        let table = self.table_ident();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (date, product_id, quantity, revenue) VALUES (?1, ?2, ?3, ?4)"
            ))?;
            for row in rows {
                stmt.execute(params![row.date, row.product_id, row.quantity, row.revenue])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of rows currently in the table.
    pub fn row_count(&self) -> EtlResult<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table_ident()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product: &str, revenue: f64) -> SalesRow {
        SalesRow {
            date: "2024-01-01".into(),
            product_id: product.into(),
            quantity: 1.0,
            revenue,
        }
    }

    #[test]
    fn test_append_and_count() {
        let mut sink = SqliteSink::in_memory("sales").unwrap();
        sink.reset().unwrap();
        sink.append(&[row("a", 10.0), row("b", 20.0)]).unwrap();
        sink.append(&[row("c", 30.0)]).unwrap();
        assert_eq!(sink.row_count().unwrap(), 3);
    }

    #[test]
    fn test_reset_is_destructive() {
        let mut sink = SqliteSink::in_memory("sales").unwrap();
        sink.reset().unwrap();
        sink.append(&[row("a", 10.0)]).unwrap();
        sink.reset().unwrap();
        assert_eq!(sink.row_count().unwrap(), 0);
    }

    #[test]
    fn test_table_name_quoting() {
        let sink = SqliteSink::in_memory("sales 2024").unwrap();
        sink.reset().unwrap();
        assert_eq!(sink.row_count().unwrap(), 0);
    }
}
