//! HTTP handlers for the todo routes.
//!
//! Mutating endpoints always answer `200` with an [`Envelope`]; failures are
//! reported in the body. Read endpoints answer an empty result on failure.
//! Only malformed requests get a non-200 status, before any operation runs.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::health::{HealthReport, health_report, health_summary};
use crate::requests::{AddTodoRequest, DeleteTodoRequest, EmailQuery, UpdateTodoRequest};
use crate::server::SharedState;
use crate::storage::StoreResult;
use crate::todos;
use crate::types::{Envelope, Todo, TodoStats};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Body(#[from] JsonRejection),
    #[error(transparent)]
    Query(#[from] QueryRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Body(rejection) => rejection.body_text(),
            ApiError::Query(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        tracing::debug!(%status, %message, "request rejected");
        (status, Json(Envelope::error(message))).into_response()
    }
}

/// JSON body extractor that answers rejections with an error envelope.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor with the same rejection shape as [`Payload`].
pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

fn envelope_or_error(operation: &'static str, result: StoreResult<Envelope>) -> Json<Envelope> {
    match result {
        Ok(envelope) => Json(envelope),
        Err(err) => {
            tracing::warn!(operation, error = %err, "store operation failed");
            Json(Envelope::error(err.to_string()))
        }
    }
}

pub async fn add_todo_endpoint(
    State(state): State<SharedState>,
    Payload(request): Payload<AddTodoRequest>,
) -> Json<Envelope> {
    envelope_or_error("add", todos::add_todo(state.store.as_ref(), &request).await)
}

pub async fn get_todos_endpoint(
    State(state): State<SharedState>,
    Params(query): Params<EmailQuery>,
) -> Json<Vec<Todo>> {
    match todos::get_todos(state.store.as_ref(), &query.email).await {
        Ok(list) => Json(list),
        Err(err) => {
            tracing::error!(email = %query.email, error = %err, "failed to load todos");
            Json(Vec::new())
        }
    }
}

pub async fn update_todo_endpoint(
    State(state): State<SharedState>,
    Payload(request): Payload<UpdateTodoRequest>,
) -> Json<Envelope> {
    envelope_or_error(
        "update",
        todos::update_todo(state.store.as_ref(), &request).await,
    )
}

pub async fn delete_todo_endpoint(
    State(state): State<SharedState>,
    Payload(request): Payload<DeleteTodoRequest>,
) -> Json<Envelope> {
    envelope_or_error(
        "delete",
        todos::delete_todo(state.store.as_ref(), &request).await,
    )
}

pub async fn todo_stats_endpoint(
    State(state): State<SharedState>,
    Params(query): Params<EmailQuery>,
) -> Json<TodoStats> {
    match todos::todo_stats(state.store.as_ref(), &query.email).await {
        Ok(stats) => Json(stats),
        Err(err) => {
            tracing::error!(email = %query.email, error = %err, "failed to compute stats");
            Json(TodoStats::default())
        }
    }
}

pub async fn health_endpoint(State(state): State<SharedState>) -> Json<HealthReport> {
    let report = health_report(&state).await;
    tracing::debug!("health: {}", health_summary(&report));
    Json(report)
}
