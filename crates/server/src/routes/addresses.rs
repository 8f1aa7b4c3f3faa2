//! Address routes.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use correios_cep_core::{Address, Kind, ListParams, Pagination};
use regex::Regex;
use serde::Deserialize;

use super::AppState;
use crate::error::{ApiError, ApiResult};

static CEP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{5})-?([0-9]{3})$").expect("valid regex"));

/// Canonical eight-digit form of a postal code, accepting `NNNNN-NNN`.
pub fn normalize_cep(raw: &str) -> Option<String> {
    CEP_PATTERN.captures(raw.trim()).map(|c| format!("{}{}", &c[1], &c[2]))
}

/// Query string of the listing route.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub state: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<ListQuery> for ListParams {
    fn from(query: ListQuery) -> Self {
        ListParams {
            state: query.state.unwrap_or_default(),
            pagination: Some(Pagination::new(query.per_page.unwrap_or(0), query.page.unwrap_or(0))),
        }
    }
}

/// `GET /api/v1/addresses?state=&page=&per_page=`
pub async fn list(
    State(state): State<AppState>, query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Address>>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let addresses = state.storage.list(query.into()).await.map_err(|e| {
        if !e.is(Kind::BadRequest) {
            tracing::error!(error = %e, "failed to list addresses");
        }
        ApiError::from(e)
    })?;

    Ok(Json(addresses))
}

/// `GET /api/v1/addresses/{cep}`
pub async fn get(State(state): State<AppState>, Path(raw): Path<String>) -> ApiResult<Json<Address>> {
    let cep = normalize_cep(&raw).ok_or_else(|| {
        ApiError::bad_request("invalid cep").with_details(format!("CEP {raw} must have 8 digits"))
    })?;

    match state.resolver.resolve(&cep).await {
        Ok(address) => Ok(Json(address)),
        Err(e) if e.is(Kind::NotFound) => {
            tracing::info!(cep, "address not found");
            Err(ApiError::not_found("address not found").with_details(format!("CEP {cep} not found")))
        }
        Err(e) => {
            tracing::error!(cep, error = %e, ops = ?e.ops(), "failed to get address");
            Err(e.into())
        }
    }
}
