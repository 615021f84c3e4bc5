pub mod session;
pub mod resolver;
pub mod fields;
pub mod node;
pub mod selection;
pub mod engine;

pub use session::Session;
pub use resolver::ReferenceResolver;
pub use node::{Node, Resolved};
pub use engine::{FieldError, PathSegment, QueryEngine, Request, Response};

use crate::config::GraphConfig;

/// Open a session from `config`, execute `request` and release the session.
///
/// A session that cannot be opened aborts the request.
pub fn execute(config: &GraphConfig, request: &Request) -> Response {
    match Session::open(config) {
        Ok(session) => QueryEngine::new(&session).execute(request),
        Err(err) => {
            tracing::error!("Cannot open session: {}", err);
            Response::aborted(&err)
        }
    }
}
