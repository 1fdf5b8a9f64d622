//! Task-local request context for web requests.
//!
//! Holds the current request's trace_id and whether error diagnostics may be
//! rendered. `RequestTrace` establishes the scope; error rendering reads it.

use tokio::task_local;

/// Per-request values visible anywhere inside the request future.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
    pub expose_diagnostics: bool,
}

task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Get the trace_id for the current task.
/// Returns "unknown" if no context is set (e.g., outside of a request).
pub fn trace_id() -> String {
    REQUEST_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Whether error envelopes may carry a diagnostic trace. False outside a request.
pub fn diagnostics_enabled() -> bool {
    REQUEST_CONTEXT
        .try_with(|ctx| ctx.expose_diagnostics)
        .unwrap_or(false)
}

/// Run a future within a request context.
pub async fn with_context<F, R>(ctx: RequestContext, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    REQUEST_CONTEXT.scope(ctx, future).await
}
