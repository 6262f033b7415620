//! Generation sessions: validation, dispatch, and the generated image list.
//!
//! A session owns the newest-first list of generated images plus the last
//! user-visible error. Requests run on the tokio runtime; their results come
//! back over a channel and are applied with [`GenerationSession::next_completion`]
//! or [`GenerationSession::poll_completions`], so all state changes happen on
//! the owner's side.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::GenerationResult;
use crate::provider::ImageGenerator;
use crate::request::{GenerationMode, GenerationRequest};

/// Most generated images kept by a session.
pub const MAX_GENERATED_IMAGES: usize = 12;

const EMPTY_PROMPT: &str = "Please enter a prompt";
const MISSING_API_KEY: &str = "Please configure an API key first";
const MISSING_SOURCE: &str = "Please provide a source image to edit";
const NO_RUNTIME: &str = "No async runtime available to run the request";

/// Identifies a dispatched request.
pub type RequestId = u64;

/// Result of one dispatched request.
#[derive(Debug)]
pub struct Completion {
    /// Request this result belongs to.
    pub id: RequestId,
    /// Generated images or the failure.
    pub result: GenerationResult<Vec<String>>,
}

/// Drives requests against one generator.
pub struct GenerationSession {
    generator: Arc<dyn ImageGenerator>,
    images: Vec<String>,
    error: Option<String>,
    in_flight: usize,
    next_id: RequestId,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl GenerationSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            generator,
            images: Vec::new(),
            error: None,
            in_flight: 0,
            next_id: 0,
            tx,
            rx,
        }
    }

    /// Swap the generator, e.g. after the configuration changed.
    ///
    /// Requests already in flight finish against the old one.
    pub fn set_generator(&mut self, generator: Arc<dyn ImageGenerator>) {
        self.generator = generator;
    }

    /// Generated images, newest first.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Last user-visible error.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while any request is running.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.in_flight > 0
    }

    /// Forget all generated images.
    pub fn clear_images(&mut self) {
        self.images.clear();
    }

    /// Dismiss the current error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn validate(&self, request: &GenerationRequest) -> Result<(), &'static str> {
        if request.prompt.trim().is_empty() {
            return Err(EMPTY_PROMPT);
        }
        if !self.generator.is_configured() {
            return Err(MISSING_API_KEY);
        }
        let has_source = request
            .source_image
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if request.mode == GenerationMode::Edit && !has_source {
            return Err(MISSING_SOURCE);
        }
        Ok(())
    }

    /// Validate and dispatch a request.
    ///
    /// Returns `None` and records an error when validation fails or no tokio
    /// runtime is available; nothing is sent in that case.
    pub fn submit(&mut self, request: GenerationRequest) -> Option<RequestId> {
        if let Err(message) = self.validate(&request) {
            debug!(reason = message, "Generation request rejected");
            self.error = Some(message.to_string());
            return None;
        }
        let Ok(handle) = Handle::try_current() else {
            self.error = Some(NO_RUNTIME.to_string());
            return None;
        };

        self.error = None;
        self.next_id += 1;
        self.in_flight += 1;
        let id = self.next_id;
        let generator = Arc::clone(&self.generator);
        let tx = self.tx.clone();

        info!(id, provider = generator.name(), mode = ?request.mode, "Dispatching generation");
        handle.spawn(async move {
            let result = generator.generate(&request).await;
            // The receiver lives as long as the session.
            let _ = tx.send(Completion { id, result });
        });
        Some(id)
    }

    /// Apply a finished request.
    pub fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion.result {
            Ok(images) => {
                info!(id = completion.id, count = images.len(), "Generation finished");
                for image in images {
                    self.images.insert(0, image);
                }
                self.images.truncate(MAX_GENERATED_IMAGES);
            }
            Err(e) => {
                warn!(id = completion.id, error = %e, "Generation failed");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<RequestId> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        let id = completion.id;
        self.apply(completion);
        Some(id)
    }

    /// Apply every request that has already finished, without waiting.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;

    struct Fixed {
        configured: bool,
        images: usize,
    }

    #[async_trait]
    impl ImageGenerator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<String>> {
            if request.prompt == "fail" {
                return Err(GenerationError::Provider("quota exceeded".to_string()));
            }
            Ok((0..self.images)
                .map(|i| format!("data:image/png;base64,{}-{i}", request.prompt))
                .collect())
        }
    }

    fn session(configured: bool, images: usize) -> GenerationSession {
        GenerationSession::new(Arc::new(Fixed { configured, images }))
    }

    #[test]
    fn test_rejects_empty_prompt() {
        let mut s = session(true, 1);
        assert!(s.submit(GenerationRequest::create("   ")).is_none());
        assert_eq!(s.error(), Some(EMPTY_PROMPT));
        assert!(!s.is_generating());
    }

    #[test]
    fn test_rejects_missing_key() {
        let mut s = session(false, 1);
        assert!(s.submit(GenerationRequest::create("cat")).is_none());
        assert_eq!(s.error(), Some(MISSING_API_KEY));
    }

    #[test]
    fn test_rejects_edit_without_source() {
        let mut s = session(true, 1);
        let mut req = GenerationRequest::edit("cat", "");
        assert!(s.submit(req.clone()).is_none());
        assert_eq!(s.error(), Some(MISSING_SOURCE));
        req.source_image = None;
        assert!(s.submit(req).is_none());
    }

    #[test]
    fn test_submit_without_runtime() {
        let mut s = session(true, 1);
        assert!(s.submit(GenerationRequest::create("cat")).is_none());
        assert_eq!(s.error(), Some(NO_RUNTIME));
        assert!(!s.is_generating());
    }

    #[tokio::test]
    async fn test_success_prepends_newest_first() {
        let mut s = session(true, 2);
        s.submit(GenerationRequest::create("a")).expect("dispatch");
        assert!(s.is_generating());
        s.next_completion().await.expect("completion");
        s.submit(GenerationRequest::create("b")).expect("dispatch");
        s.next_completion().await.expect("completion");

        assert!(!s.is_generating());
        assert_eq!(s.images()[0], "data:image/png;base64,b-1");
        assert_eq!(s.images()[3], "data:image/png;base64,a-0");
        assert!(s.error().is_none());
    }

    #[tokio::test]
    async fn test_list_is_bounded() {
        let mut s = session(true, 5);
        for prompt in ["a", "b", "c"] {
            s.submit(GenerationRequest::create(prompt)).expect("dispatch");
            s.next_completion().await.expect("completion");
        }
        assert_eq!(s.images().len(), MAX_GENERATED_IMAGES);
        assert_eq!(s.images()[0], "data:image/png;base64,c-4");
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_clears_on_next_submit() {
        let mut s = session(true, 1);
        s.submit(GenerationRequest::create("fail")).expect("dispatch");
        s.next_completion().await.expect("completion");
        assert_eq!(s.error(), Some("quota exceeded"));
        assert!(s.images().is_empty());
        assert!(!s.is_generating());

        s.submit(GenerationRequest::create("ok")).expect("dispatch");
        assert!(s.error().is_none());
    }

    #[tokio::test]
    async fn test_next_completion_when_idle() {
        let mut s = session(true, 1);
        assert!(s.next_completion().await.is_none());
        assert_eq!(s.poll_completions(), 0);
    }
}
