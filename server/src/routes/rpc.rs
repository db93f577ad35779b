//! HTTP transport for the remote-procedure layer.
//!
//! `GET /trpc/{path}?input=<json>` runs a query and `POST /trpc/{path}` with
//! a JSON body runs a mutation. A fresh `Context` is built for every call.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::rpc::{ProcedureKind, RpcError, build_context};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QueryParams {
    input: Option<String>,
}

fn envelope(path: &str, result: Result<Value, RpcError>) -> Response {
    match result {
        Ok(data) => Json(json!({ "result": { "data": data } })).into_response(),
        Err(err) => {
            let status = StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                tracing::error!(%path, error = %err, "procedure failed");
            }
            let body = json!({
                "error": {
                    "code": err.code.as_str(),
                    "message": err.message,
                    "httpStatus": status.as_u16(),
                    "path": path,
                }
            });
            (status, Json(body)).into_response()
        }
    }
}

async fn dispatch(state: &AppState, headers: &HeaderMap, path: &str, kind: ProcedureKind, input: Value) -> Response {
    let ctx = build_context(headers, &state.signer, state.sessions.as_ref(), state.users.as_ref()).await;
    let result = state.procedures.call(path, kind, ctx, input).await;
    envelope(path, result)
}

fn decode_input(raw: &[u8]) -> Result<Value, RpcError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw).map_err(|e| RpcError::bad_request(format!("invalid JSON input: {e}")))
}

/// `GET /trpc/{path}`
pub async fn query(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Response {
    let input = match decode_input(params.input.as_deref().unwrap_or_default().as_bytes()) {
        Ok(input) => input,
        Err(err) => return envelope(&path, Err(err)),
    };
    dispatch(&state, &headers, &path, ProcedureKind::Query, input).await
}

/// `POST /trpc/{path}`
pub async fn mutation(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let input = match decode_input(&body) {
        Ok(input) => input,
        Err(err) => return envelope(&path, Err(err)),
    };
    dispatch(&state, &headers, &path, ProcedureKind::Mutation, input).await
}

#[cfg(test)]
#[path = "rpc_test.rs"]
mod tests;
