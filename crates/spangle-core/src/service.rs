//! Latest-wins render orchestration
//!
//! Each content change triggers a fresh parse-and-convert pass. Rather
//! than letting a stale pass race a newer one into the host's state, every
//! submit takes a generation ticket and only the result whose ticket is
//! still current commits; superseded results are discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::RenderContext;
use crate::pipeline::{Pipeline, Rendered};

/// Async front door to the pipeline
#[derive(Debug, Clone)]
pub struct RenderService {
    pipeline: Arc<Pipeline>,
    generation: Arc<AtomicU64>,
}

impl RenderService {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Render `text` off the async runtime's worker threads
    ///
    /// Returns `None` when a newer submit arrived while this one was
    /// rendering; the caller simply drops stale results.
    pub async fn submit(&self, text: String, ctx: RenderContext) -> Option<Rendered> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let pipeline = Arc::clone(&self.pipeline);
        let result =
            tokio::task::spawn_blocking(move || pipeline.render(&text, &ctx)).await;
        let rendered = match result {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(%err, "render task failed");
                return None;
            }
        };
        if self.generation.load(Ordering::SeqCst) == ticket {
            Some(rendered)
        } else {
            debug!(ticket, "stale render discarded");
            None
        }
    }

    /// Like [`submit`](Self::submit), invoking `on_parsed` exactly once
    /// when the result commits
    ///
    /// The callback drives host-side layout decisions (e.g. read-more
    /// truncation); it never fires for superseded submits.
    pub async fn submit_with(
        &self,
        text: String,
        ctx: RenderContext,
        on_parsed: impl FnOnce(&Rendered),
    ) -> Option<Rendered> {
        let rendered = self.submit(text, ctx).await?;
        on_parsed(&rendered);
        Some(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn service() -> RenderService {
        RenderService::new(Pipeline::new())
    }

    #[tokio::test]
    async fn test_single_submit_commits() {
        let service = service();
        let rendered = service
            .submit("hello".to_string(), RenderContext::default())
            .await
            .expect("committed");
        assert!(!rendered.fallback);
    }

    #[tokio::test]
    async fn test_superseded_submit_is_discarded() {
        let service = service();
        // both futures take their tickets when first polled; the second
        // submit supersedes the first before either render completes
        let (first, second) = tokio::join!(
            service.submit("one".to_string(), RenderContext::default()),
            service.submit("two".to_string(), RenderContext::default()),
        );
        assert!(first.is_none());
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn test_on_parsed_fires_exactly_once_per_commit() {
        let service = service();
        let fired = AtomicUsize::new(0);
        let rendered = service
            .submit_with("hello".to_string(), RenderContext::default(), |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        assert!(rendered.is_some());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let (first, second) = tokio::join!(
            service.submit_with("one".to_string(), RenderContext::default(), |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            }),
            service.submit_with("two".to_string(), RenderContext::default(), |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(first.is_none());
        assert!(second.is_some());
        // only the committed submit fired its callback
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
