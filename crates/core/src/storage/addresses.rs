//! Address CRUD operations on SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, TransactionBehavior, types::Type};

use super::connection::SqliteStore;
use super::model::{Address, ListParams};
use super::{Storage, Updater};
use crate::error::{Error, Kind, Op, sqlite_kind};

const COLUMNS: &str = "cep, state, city, neighborhood, location, children_json, created_at, updated_at";

fn sqlite_err(op: Op, err: rusqlite::Error) -> Error {
    let kind = sqlite_kind(&err);
    Error::wrap(op, err).with_kind(kind)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Address> {
    let children_json: String = row.get(5)?;
    let children = serde_json::from_str(&children_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Address {
        cep: row.get(0)?,
        state: row.get(1)?,
        city: row.get(2)?,
        neighborhood: row.get(3)?,
        location: row.get(4)?,
        children,
        created_at: Some(parse_timestamp(row, 6)?),
        updated_at: Some(parse_timestamp(row, 7)?),
    })
}

fn select_one(conn: &rusqlite::Connection, cep: &str) -> rusqlite::Result<Option<Address>> {
    conn.query_row(&format!("SELECT {COLUMNS} FROM addresses WHERE cep = ?1"), params![cep], from_row)
        .optional()
}

fn children_json(op: Op, address: &Address) -> Result<String, Error> {
    serde_json::to_string(&address.children).map_err(|e| Error::wrap(op, e).with_kind(Kind::Unexpected))
}

impl SqliteStore {
    /// Current time at the precision persisted in the database.
    fn timestamp(&self) -> DateTime<Utc> {
        (self.now)().trunc_subsecs(6)
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn check(&self) -> Result<(), Error> {
        const OP: Op = "sqlite.check";
        self.conn
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map_err(|e| Error::wrap(OP, Error::from(e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        tracing::info!("closing address database");
        self.conn.clone().close().await.map_err(Error::from)
    }

    async fn create(&self, mut address: Address) -> Result<Address, Error> {
        const OP: Op = "sqlite.create_address";

        if address.cep.trim().is_empty() {
            return Err(Error::bad_request(OP, "cep must not be empty"));
        }

        let now = self.timestamp();
        address.created_at = Some(now);
        address.updated_at = Some(now);

        let children = children_json(OP, &address)?;
        let row = address.clone();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO addresses (
                        cep, state, city, neighborhood, location, children_json, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        &row.cep,
                        &row.state,
                        &row.city,
                        &row.neighborhood,
                        &row.location,
                        &children,
                        format_timestamp(&now),
                        format_timestamp(&now),
                    ],
                )
                .map_err(|e| match sqlite_kind(&e) {
                    Kind::AlreadyExists => {
                        Error::new(OP, Kind::AlreadyExists, format!("cep {} already exists", row.cep))
                    }
                    _ => sqlite_err(OP, e),
                })?;
                Ok(())
            })
            .await?;

        tracing::debug!(cep = %address.cep, "address created");
        Ok(address)
    }

    async fn update(&self, cep: &str, updater: Updater) -> Result<Address, Error> {
        const OP: Op = "sqlite.update_address";

        let cep = cep.to_string();
        let now = self.timestamp();

        let address = self
            .conn
            .call(move |conn| -> Result<Address, Error> {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(|e| sqlite_err(OP, e))?;

                let old = select_one(&tx, &cep)
                    .map_err(|e| sqlite_err(OP, e))?
                    .ok_or_else(|| Error::not_found(OP, format!("cep {cep} not found")))?;

                let created_at = old.created_at;
                let previous_update = old.updated_at;

                let mut address = updater(old).map_err(|e| Error::wrap(OP, e))?;
                if address.cep.trim().is_empty() {
                    return Err(Error::bad_request(OP, "cep must not be empty"));
                }

                address.created_at = created_at;
                address.updated_at = Some(previous_update.map_or(now, |prev| prev.max(now)));

                let children = children_json(OP, &address)?;
                let updated_at = address.updated_at.as_ref().map(format_timestamp);

                tx.execute(
                    "UPDATE addresses SET
                        cep = ?1,
                        state = ?2,
                        city = ?3,
                        neighborhood = ?4,
                        location = ?5,
                        children_json = ?6,
                        updated_at = ?7
                    WHERE cep = ?8",
                    params![
                        &address.cep,
                        &address.state,
                        &address.city,
                        &address.neighborhood,
                        &address.location,
                        &children,
                        &updated_at,
                        &cep,
                    ],
                )
                .map_err(|e| sqlite_err(OP, e))?;

                tx.commit().map_err(|e| sqlite_err(OP, e))?;
                Ok(address)
            })
            .await?;

        tracing::debug!(cep = %address.cep, "address updated");
        Ok(address)
    }

    async fn get(&self, cep: &str) -> Result<Address, Error> {
        const OP: Op = "sqlite.get_address";

        let cep = cep.to_string();
        self.conn
            .call(move |conn| -> Result<Address, Error> {
                select_one(conn, &cep)
                    .map_err(|e| sqlite_err(OP, e))?
                    .ok_or_else(|| Error::not_found(OP, format!("cep {cep} not found")))
            })
            .await
            .map_err(Error::from)
    }

    async fn list(&self, params: ListParams) -> Result<Vec<Address>, Error> {
        const OP: Op = "sqlite.list_addresses";

        let state = params.state.trim().to_uppercase();
        if state.is_empty() {
            return Err(Error::bad_request(OP, "state is required"));
        }

        let pagination = params.pagination.unwrap_or_default();
        let limit = i64::from(pagination.limit);
        let offset = i64::try_from(pagination.offset).unwrap_or(i64::MAX);

        self.conn
            .call(move |conn| -> Result<Vec<Address>, Error> {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {COLUMNS} FROM addresses WHERE state = ?1 ORDER BY cep ASC LIMIT ?2 OFFSET ?3"
                    ))
                    .map_err(|e| sqlite_err(OP, e))?;

                let rows = stmt
                    .query_map(params![state, limit, offset], from_row)
                    .map_err(|e| sqlite_err(OP, e))?;

                rows.collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(|e| sqlite_err(OP, e))
            })
            .await
            .map_err(Error::from)
    }
}
