use crate::config::PlaybackSettings;
use crate::tts::{AudioPayload, SynthesisClient, SynthesisError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scripted in-memory synthesis client. Records every request and
/// replays queued results; an empty queue yields a placeholder payload,
/// which keeps happy-path tests short.
#[derive(Clone, Default)]
pub struct DummySynthesisClient {
    responses: Arc<Mutex<VecDeque<Result<AudioPayload, SynthesisError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl DummySynthesisClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each request open for `delay`, observing cancellation, so
    /// tests can issue commands while a request is in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_ok(&self, data: &str) {
        lock(&self.responses).push_back(Ok(AudioPayload::new(data)));
    }

    pub fn push_err(&self, error: SynthesisError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// The chunk texts requested so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SynthesisClient for DummySynthesisClient {
    fn synthesize(
        &self,
        text: String,
        _settings: &PlaybackSettings,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<AudioPayload, SynthesisError>> {
        let this = self.clone();
        async move {
            lock(&this.requests).push(text);

            if let Some(delay) = this.delay {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(SynthesisError::Cancelled);
            }

            lock(&this.responses)
                .pop_front()
                .unwrap_or_else(|| Ok(AudioPayload::new("UklGRg==")))
        }
        .boxed()
    }
}
