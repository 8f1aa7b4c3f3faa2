//! Client code for correios-cep.
//!
//! This crate provides the HTTP client for the Correios postal-code service,
//! exposed to the rest of the workspace through
//! [`AddressLookup`](correios_cep_core::AddressLookup).

pub mod correios;

pub use correios::{CorreiosClient, CorreiosConfig, CorreiosError, LOOKUP_PATH};
