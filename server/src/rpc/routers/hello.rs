//! `hello.*` procedures: one public query, one protected query, one
//! protected mutation.

use serde::{Deserialize, Serialize};

use crate::rpc::{AuthedContext, ProcedureRouter};
use crate::rpc::procedure::{ProcedureKind, parse_input, protected, public, to_output};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Greeting {
    pub greeting: String,
}

#[derive(Debug, Default, Deserialize)]
struct GreetInput {
    name: Option<String>,
}

#[must_use]
pub fn router() -> ProcedureRouter {
    ProcedureRouter::new()
        .procedure(
            "hello",
            public(ProcedureKind::Query, |_ctx, _input| async {
                to_output(&Greeting { greeting: "Hello world".into() })
            }),
        )
        .procedure("me", protected(ProcedureKind::Query, |ctx: AuthedContext, _input| async move { to_output(&ctx.user) }))
        .procedure(
            "greet",
            protected(ProcedureKind::Mutation, |ctx: AuthedContext, input| async move {
                let input: GreetInput = if input.is_null() { GreetInput::default() } else { parse_input(input)? };
                let name = input
                    .name
                    .map(|n| n.trim().to_owned())
                    .filter(|n| !n.is_empty())
                    .unwrap_or(ctx.user.name);
                to_output(&Greeting { greeting: format!("Hello {name}") })
            }),
        )
}

#[cfg(test)]
#[path = "hello_test.rs"]
mod tests;
