//! Typed remote-procedure layer.
//!
//! SYSTEM CONTEXT
//! ==============
//! `routes::rpc` translates `/trpc/{path}` requests into calls on the
//! `ProcedureRouter` held in `AppState`. Every call gets a fresh `Context`
//! from `context::build_context`; nothing is shared between calls.
//!
//! ARCHITECTURE
//! ============
//! Procedures are registered under dotted paths (`hello.me`). Sub-routers
//! are merged under a namespace so each feature owns its own file in
//! `routers/`.

pub mod context;
pub mod procedure;
pub mod routers;

use std::collections::BTreeMap;

use serde_json::Value;

pub use context::{AuthedContext, Context, build_context};
pub use procedure::{Procedure, ProcedureKind, RpcError, RpcErrorCode};

#[derive(Debug, Clone, Default)]
pub struct ProcedureRouter {
    procedures: BTreeMap<String, Procedure>,
}

impl ProcedureRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn procedure(mut self, name: &str, procedure: Procedure) -> Self {
        self.procedures.insert(name.to_owned(), procedure);
        self
    }

    /// Mount every procedure of `other` under `namespace.`.
    #[must_use]
    pub fn merge(mut self, namespace: &str, other: Self) -> Self {
        for (name, procedure) in other.procedures {
            self.procedures.insert(format!("{namespace}.{name}"), procedure);
        }
        self
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Procedure> {
        self.procedures.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }

    /// Dispatch a call.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for an unknown path, `METHOD_NOT_SUPPORTED` when a query
    /// is invoked as a mutation or vice versa, otherwise whatever the
    /// procedure returns.
    pub async fn call(&self, path: &str, kind: ProcedureKind, ctx: Context, input: Value) -> Result<Value, RpcError> {
        let procedure = self
            .get(path)
            .ok_or_else(|| RpcError::new(RpcErrorCode::NotFound, format!("No procedure found on path \"{path}\"")))?;
        if procedure.kind() != kind {
            let expected = match procedure.kind() {
                ProcedureKind::Query => "GET",
                ProcedureKind::Mutation => "POST",
            };
            return Err(RpcError::new(
                RpcErrorCode::MethodNotSupported,
                format!("Procedure \"{path}\" must be called with {expected}"),
            ));
        }
        procedure.call(ctx, input).await
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
