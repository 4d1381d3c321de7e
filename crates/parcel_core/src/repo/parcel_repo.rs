//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `parcel` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every public operation is a single SQL statement.
//! - `add` validates before writing; reads reject invalid persisted state
//!   instead of masking it.
//! - A missing row is reported as `RepoError::NotFound`, never as `Db`.
//! - Plain setters do not check status. The `*_if_status` variants fold the
//!   status check into the write statement so concurrent writers cannot
//!   slip in between check and write.

use crate::db::schema::{schema_version, SCHEMA_VERSION};
use crate::db::DbError;
use crate::model::parcel::{
    validate_address, ClientId, Parcel, ParcelNumber, ParcelStatus, ParcelValidationError,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_TABLE: &str = "parcel";
const PARCEL_COLUMNS: &[&str] = &["number", "client", "status", "address", "created_at"];

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for parcel persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ParcelValidationError),
    Db(DbError),
    NotFound(ParcelNumber),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Whether this error means "no parcel with that number".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ParcelValidationError> for RepoError {
    fn from(value: ParcelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for parcel CRUD operations.
pub trait ParcelRepository {
    /// Inserts a new parcel and returns its store-assigned number.
    ///
    /// `parcel.number` is ignored.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel; `NotFound` when no row matches.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Lists every parcel of `client` ordered by number.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    /// Replaces the delivery address; `NotFound` when no row matches.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    /// Replaces the status; `NotFound` when no row matches.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    /// Deletes a parcel. Deleting an unknown number is a no-op.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
    /// Replaces the address only while the parcel is in `expected`.
    ///
    /// Returns `false` when no row matched number and status together.
    fn set_address_if_status(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<bool>;
    /// Moves the status from `from` to `to` only if it is still `from`.
    ///
    /// Returns `false` when no row matched number and status together.
    fn set_status_if_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool>;
    /// Deletes a parcel only while it is in `expected`.
    ///
    /// Returns `false` when no row matched number and status together.
    fn delete_if_status(&self, number: ParcelNumber, expected: ParcelStatus)
        -> RepoResult<bool>;
}

/// SQLite-backed parcel store over a caller-owned connection.
pub struct ParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ParcelStore<'conn> {
    /// Wraps a connection as-is.
    ///
    /// The caller is responsible for the schema; use `try_new` to check it.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying its schema is ready.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParcelRepository for ParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        parcel.validate()?;

        self.conn.execute(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        let number = self.conn.last_insert_rowid();
        debug!(
            "event=parcel_add module=repo status=ok number={} client={}",
            number, parcel.client
        );
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        if let Some(row) = rows.next()? {
            return parse_parcel_row(row);
        }

        Err(RepoError::NotFound(number))
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{PARCEL_SELECT_SQL}
             WHERE client = ?1
             ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        validate_address(address)?;

        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?1 WHERE number = ?2;",
            params![address, number],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        debug!("event=parcel_set_address module=repo status=ok number={number}");
        Ok(())
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2;",
            params![status.as_str(), number],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        debug!(
            "event=parcel_set_status module=repo status=ok number={} parcel_status={}",
            number, status
        );
        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM parcel WHERE number = ?1;", [number])?;

        debug!("event=parcel_delete module=repo status=ok number={number} changed={changed}");
        Ok(())
    }

    fn set_address_if_status(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<bool> {
        validate_address(address)?;

        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?1 WHERE number = ?2 AND status = ?3;",
            params![address, number, expected.as_str()],
        )?;

        debug!(
            "event=parcel_set_address module=repo status=ok number={} expected_status={} changed={}",
            number, expected, changed
        );
        Ok(changed > 0)
    }

    fn set_status_if_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2 AND status = ?3;",
            params![to.as_str(), number, from.as_str()],
        )?;

        debug!(
            "event=parcel_set_status module=repo status=ok number={} from={} to={} changed={}",
            number, from, to, changed
        );
        Ok(changed > 0)
    }

    fn delete_if_status(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM parcel WHERE number = ?1 AND status = ?2;",
            params![number, expected.as_str()],
        )?;

        debug!(
            "event=parcel_delete module=repo status=ok number={} expected_status={} changed={}",
            number, expected, changed
        );
        Ok(changed > 0)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = SCHEMA_VERSION;
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [PARCEL_TABLE],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(PARCEL_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([PARCEL_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(column) = PARCEL_COLUMNS
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name == column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: PARCEL_TABLE,
            column,
        });
    }

    Ok(())
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let number: ParcelNumber = row.get("number")?;

    let status_text: String = row.get("status")?;
    let status = ParcelStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in parcel.status for number {number}"
        ))
    })?;

    let parcel = Parcel {
        number,
        client: row.get("client")?,
        status,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    };
    parcel
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("parcel {number}: {err}")))?;
    Ok(parcel)
}
