//! Procedure routers, one file per namespace.

pub mod hello;

use super::ProcedureRouter;

/// The full procedure tree served under `/trpc`.
#[must_use]
pub fn app_router() -> ProcedureRouter {
    ProcedureRouter::new().merge("hello", hello::router())
}
