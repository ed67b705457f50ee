//! Pipeline-level errors.
//!
//! Access denials are not errors: gates translate them into
//! `Response::Forbidden` and the chain returns them as ordinary responses.
//! Everything here propagates to the caller as a failure.

/// Errors surfaced by `InterceptorChain::handle`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The terminal handler failed after all gates passed. The source carries
    /// the underlying cause (e.g. a store-layer failure) for the caller to
    /// retry, alert, or abort.
    #[error("terminal handler failed: {source}")]
    Handler {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    /// Wrap a handler-side failure.
    pub fn handler(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        PipelineError::Handler {
            source: Box::new(source),
        }
    }
}
