//! Procedure definitions and the authorization gate.
//!
//! DESIGN
//! ======
//! A procedure is a boxed async function from `(Context, input)` to a JSON
//! value. `public` wraps a body that accepts any caller. `protected` wraps a
//! body that needs an `AuthedContext`; the wrapper converts the context
//! first and returns `UNAUTHORIZED` without ever invoking the body when no
//! user is attached.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::context::{AuthedContext, Context};

pub const UNAUTHORIZED_MESSAGE: &str = "You must be logged in to access this resource";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    Unauthorized,
    BadRequest,
    NotFound,
    MethodNotSupported,
    InternalServerError,
}

impl RpcErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::MethodNotSupported => 405,
            Self::InternalServerError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", code.as_str())]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(RpcErrorCode::Unauthorized, UNAUTHORIZED_MESSAGE)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalServerError, message)
    }
}

// =============================================================================
// PROCEDURES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

type Handler = Arc<dyn Fn(Context, Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

#[derive(Clone)]
pub struct Procedure {
    kind: ProcedureKind,
    handler: Handler,
}

impl std::fmt::Debug for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Procedure {
    #[must_use]
    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    /// Run the procedure with a freshly built context.
    ///
    /// # Errors
    ///
    /// Whatever the body (or the gate in front of it) returns.
    pub async fn call(&self, ctx: Context, input: Value) -> Result<Value, RpcError> {
        (self.handler)(ctx, input).await
    }
}

/// A procedure any caller may invoke.
pub fn public<F, Fut>(kind: ProcedureKind, body: F) -> Procedure
where
    F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    Procedure { kind, handler: Arc::new(move |ctx, input| Box::pin(body(ctx, input))) }
}

/// A procedure that requires an authenticated caller.
pub fn protected<F, Fut>(kind: ProcedureKind, body: F) -> Procedure
where
    F: Fn(AuthedContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    let body = Arc::new(body);
    Procedure {
        kind,
        handler: Arc::new(move |ctx, input| {
            let body = Arc::clone(&body);
            Box::pin(async move {
                let authed = enforce_user(ctx)?;
                body(authed, input).await
            })
        }),
    }
}

/// The gate itself.
///
/// # Errors
///
/// `UNAUTHORIZED` when the context carries no user.
pub fn enforce_user(ctx: Context) -> Result<AuthedContext, RpcError> {
    AuthedContext::try_from(ctx).map_err(|()| RpcError::unauthorized())
}

/// Decode procedure input. A missing input decodes as JSON `null`.
///
/// # Errors
///
/// `BAD_REQUEST` when the value does not match `T`.
pub fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, RpcError> {
    serde_json::from_value(input).map_err(|e| RpcError::bad_request(format!("invalid input: {e}")))
}

/// # Errors
///
/// `INTERNAL_SERVER_ERROR` if `value` cannot be serialized.
pub fn to_output<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal(e.to_string()))
}

#[cfg(test)]
#[path = "procedure_test.rs"]
mod tests;
