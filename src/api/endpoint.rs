//! Resource endpoints
//!
//! Every resource (kills, players, messages) is one concrete type behind the
//! [`Endpoint`] trait. [`resource_routes`] mounts any of them as
//!
//!   GET  <path>?alias=..&codename=..&passphrase=..&<filter>  -> get
//!   PUT  <path>  {"credentials": {..}, "data": ..}           -> put
//!
//! Credential keys are never filter fields, so the rest of the query string
//! is the filter.

use std::future::Future;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::error::{GameError, GameResult};
use crate::game::models::Credentials;

/// Body of every PUT and POST submission
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Submission<T> {
    #[serde(default)]
    pub credentials: Credentials,
    pub data: T,
}

/// One resource served under `PATH`
pub trait Endpoint: Clone + Send + Sync + 'static {
    const PATH: &'static str;

    type Filter: DeserializeOwned + Send + 'static;
    type Data: DeserializeOwned + Send + 'static;
    type Item: Serialize + Send + 'static;
    type Receipt: Serialize + Send + 'static;

    fn get(
        &self,
        credentials: Credentials,
        filter: Self::Filter,
    ) -> impl Future<Output = GameResult<Vec<Self::Item>>> + Send;

    fn put(
        &self,
        credentials: Credentials,
        data: Self::Data,
    ) -> impl Future<Output = GameResult<Self::Receipt>> + Send;
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.kind(), "Request failed: {}", self);
        } else {
            debug!(kind = self.kind(), status = %status.as_u16(), "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<QueryRejection> for GameError {
    fn from(rejection: QueryRejection) -> Self {
        GameError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for GameError {
    fn from(rejection: JsonRejection) -> Self {
        GameError::InvalidRequest(rejection.body_text())
    }
}

async fn get_resource<E: Endpoint>(
    State(endpoint): State<E>,
    credentials: Result<Query<Credentials>, QueryRejection>,
    filter: Result<Query<E::Filter>, QueryRejection>,
) -> Result<Json<Vec<E::Item>>, GameError> {
    let Query(credentials) = credentials?;
    let Query(filter) = filter?;
    let items = endpoint.get(credentials, filter).await?;
    Ok(Json(items))
}

async fn put_resource<E: Endpoint>(
    State(endpoint): State<E>,
    submission: Result<Json<Submission<E::Data>>, JsonRejection>,
) -> Result<Json<E::Receipt>, GameError> {
    let Json(submission) = submission?;
    let receipt = endpoint.put(submission.credentials, submission.data).await?;
    Ok(Json(receipt))
}

/// Mount `endpoint` at its path
pub fn resource_routes<E: Endpoint>(endpoint: E) -> Router {
    Router::new()
        .route(E::PATH, get(get_resource::<E>).put(put_resource::<E>))
        .with_state(endpoint)
}
