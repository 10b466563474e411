pub mod admin;
pub mod catalog;
pub mod news;
pub mod routes;
pub mod tickets;

use crate::error::ApiError;
use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::{json, Value};

pub use routes::{build_router, AppState};

/// JSON body whose rejections come back as `ApiError::BadRequest`.
pub(crate) type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Query string, same rejection handling as [`JsonBody`].
pub(crate) type QueryParams<T> = WithRejection<Query<T>, ApiError>;

/// `/:id` segment. Deserialized as a struct so a bad value is reported
/// against the `id` key.
pub(crate) type IdParam = WithRejection<Path<IdPath>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: i64,
}

/// `?ofertas=true` on catalog listings.
#[derive(Debug, Default, Deserialize)]
pub struct OfferFilter {
    #[serde(default, deserialize_with = "offer_flag")]
    pub ofertas: bool,
}

fn offer_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(D::Error::custom(format!(
            "field 'ofertas' must be true or false, got '{}'",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub(crate) fn not_found(what: &str, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", what, id))
}

/// Row or 404.
pub(crate) fn found<T>(row: Option<T>, what: &str, id: i64) -> Result<Json<T>, ApiError> {
    row.map(Json).ok_or_else(|| not_found(what, id))
}

pub(crate) fn deleted(what: &str, id: i64) -> Json<Value> {
    Json(json!({ "message": format!("{} {} deleted", what, id) }))
}
