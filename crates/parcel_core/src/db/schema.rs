//! Versioned bootstrap of the `parcel` table.
//!
//! The whole schema is one step; `PRAGMA user_version` records whether it ran.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Schema version written by `apply_schema`.
pub const SCHEMA_VERSION: u32 = 1;

const PARCEL_SCHEMA_SQL: &str = include_str!("parcel_schema.sql");

/// Creates the parcel schema on a fresh database.
///
/// A database already at `SCHEMA_VERSION` is left untouched. A newer version
/// is refused so an old binary never writes rows it does not understand.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    match schema_version(conn)? {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(PARCEL_SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!("event=db_schema module=db status=ok version={SCHEMA_VERSION}");
            Ok(())
        }
        found => Err(DbError::NewerSchema {
            found,
            supported: SCHEMA_VERSION,
        }),
    }
}

/// Reads `PRAGMA user_version` from the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
