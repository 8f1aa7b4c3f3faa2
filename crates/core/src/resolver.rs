//! Read-through address resolution.
//!
//! The local store is the cache; Correios is the source of truth for codes
//! the store has never seen. A store `NotFound` is the only outcome that
//! permits falling back to the external source.

use std::sync::Arc;

use crate::error::{Error, Kind, Op};
use crate::lookup::AddressLookup;
use crate::storage::{Address, Storage};

/// Resolves postal codes from the store, falling back to the external source.
#[derive(Clone)]
pub struct Resolver {
    storage: Arc<dyn Storage>,
    lookup: Arc<dyn AddressLookup>,
}

impl Resolver {
    pub fn new(storage: Arc<dyn Storage>, lookup: Arc<dyn AddressLookup>) -> Self {
        Self { storage, lookup }
    }

    /// Return the stored address for `cep`, fetching and persisting it on a
    /// miss.
    ///
    /// A fetched address is only returned once it has been written. When a
    /// concurrent request persisted the same code first, the stored record
    /// is returned instead.
    pub async fn resolve(&self, cep: &str) -> Result<Address, Error> {
        const OP: Op = "resolver.resolve";

        match self.storage.get(cep).await {
            Ok(address) => {
                tracing::debug!(cep, "cache hit");
                return Ok(address);
            }
            Err(e) if e.is(Kind::NotFound) => tracing::debug!(cep, "cache miss"),
            Err(e) => return Err(Error::wrap(OP, e)),
        }

        let mut fetched = self.lookup.lookup(cep).await.map_err(|e| Error::wrap(OP, e))?;
        // Stored under the requested code so later reads hit.
        fetched.cep = cep.to_string();

        match self.storage.create(fetched).await {
            Ok(stored) => {
                tracing::info!(cep, children = stored.children.len(), "address cached");
                Ok(stored)
            }
            Err(e) if e.is(Kind::AlreadyExists) => {
                tracing::debug!(cep, "address cached concurrently");
                self.storage.get(cep).await.map_err(|e| Error::wrap(OP, e))
            }
            Err(e) => Err(Error::wrap(OP, e)),
        }
    }
}
