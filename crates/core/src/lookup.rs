//! External address source.

use async_trait::async_trait;

use crate::Error;
use crate::storage::Address;

/// Third-party postal-code lookup.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Lightweight reachability probe.
    async fn check(&self) -> Result<(), Error>;

    /// Fetch the address for `cep`.
    ///
    /// Returns `NotFound` when the source has no record for the code and
    /// `Unexpected` for transport, status or payload failures.
    async fn lookup(&self, cep: &str) -> Result<Address, Error>;
}
