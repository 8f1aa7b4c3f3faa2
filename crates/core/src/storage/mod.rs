//! Persistent address store.
//!
//! [`Storage`] is the capability the HTTP layer and the resolver depend on.
//! [`SqliteStore`] implements it on top of SQLite with async access via
//! tokio-rusqlite:
//!
//! - Automatic schema migrations
//! - WAL mode for concurrent readers
//! - Serializable read-modify-write updates

pub mod addresses;
pub mod connection;
pub mod migrations;
pub mod model;

use async_trait::async_trait;

use crate::Error;

pub use connection::{Clock, SqliteStore};
pub use model::{Address, ListParams, PAGINATION_LIMIT, Pagination};

/// Read-modify-write transform applied by [`Storage::update`].
pub type Updater = Box<dyn FnOnce(Address) -> Result<Address, Error> + Send + 'static>;

/// Address persistence.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Liveness probe.
    async fn check(&self) -> Result<(), Error>;

    /// Release the underlying connection.
    async fn close(&self) -> Result<(), Error>;

    /// Insert a new record, stamping both timestamps.
    ///
    /// Fails with `AlreadyExists` if the code is already stored.
    async fn create(&self, address: Address) -> Result<Address, Error>;

    /// Apply `updater` to the stored record inside one transaction.
    async fn update(&self, cep: &str, updater: Updater) -> Result<Address, Error>;

    /// Point lookup. A missing code is `NotFound`.
    async fn get(&self, cep: &str) -> Result<Address, Error>;

    /// Records of one state ordered by code.
    async fn list(&self, params: ListParams) -> Result<Vec<Address>, Error>;
}
