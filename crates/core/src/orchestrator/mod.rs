//! The playback state machine.
//!
//! One spawned task owns all mutable playback state: the chunk queue
//! and cursor, the settings snapshot, the in-flight synthesis token and
//! the sink handle. Commands, sink events and synthesis completions are
//! multiplexed onto that task with `select!`, so there are no locks and
//! no concurrent writers. Observers see state only through broadcast
//! snapshots or an explicit query.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::chunker::split_text;
use crate::config::{
    resolve_settings, ConfigError, PlaybackSettings, SettingsOverrides, SettingsStore,
    MAX_CHUNK_SIZE,
};
use crate::sink::{SinkCommand, SinkError, SinkEvent, SinkFactory, SinkHandle};
use crate::tts::{
    AudioPayload, SynthesisClient, SynthesisError, MSG_API_KEY_NOT_CONFIGURED,
    MSG_AUDIO_TOO_LARGE, MSG_GENERIC_FAILURE, MSG_INVALID_API_KEY, MSG_INVALID_AUDIO,
    MSG_INVALID_RESPONSE, MSG_NO_AUDIO, MSG_QUOTA_EXCEEDED, MSG_TEMPORARILY_UNAVAILABLE,
};

const COMMAND_BUFFER: usize = 16;
const SINK_EVENT_BUFFER: usize = 16;
const UPDATE_BUFFER: usize = 32;

/// Exactly one value exists per orchestrator at any time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

/// Broadcast to observers on every state transition. Delivery is
/// fire-and-forget; an observer that missed updates can pull via
/// [`OrchestratorHandle::query_state`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateUpdate {
    pub state: PlaybackState,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayRequest {
    pub text: String,
    pub language: Option<String>,
    pub speaker: Option<String>,
    pub pace: Option<f32>,
    pub model: Option<String>,
}

impl PlayRequest {
    pub fn for_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            language: self.language.clone(),
            speaker: self.speaker.clone(),
            pace: self.pace,
            model: self.model.clone(),
        }
    }
}

#[derive(Debug)]
pub enum Command {
    Play(PlayRequest),
    Pause,
    Resume,
    Stop,
    QueryState(oneshot::Sender<PlaybackState>),
}

#[derive(thiserror::Error, Debug)]
pub enum OrchestratorError {
    #[error("orchestrator task is gone")]
    ChannelClosed,
}

#[derive(Clone, Copy, Debug)]
pub struct OrchestratorOptions {
    pub max_chunk_size: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

/// Cloneable front end to the orchestrator task.
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
    updates: broadcast::Sender<StateUpdate>,
}

impl OrchestratorHandle {
    pub async fn play(&self, request: PlayRequest) -> Result<(), OrchestratorError> {
        self.send(Command::Play(request)).await
    }

    pub async fn pause(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Stop).await
    }

    pub async fn query_state(&self) -> Result<PlaybackState, OrchestratorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::QueryState(tx)).await?;
        rx.await.map_err(|_| OrchestratorError::ChannelClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.updates.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), OrchestratorError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| OrchestratorError::ChannelClosed)
    }
}

/// Spawn the orchestrator task and return its handle.
pub fn spawn<C, F, S>(
    client: C,
    sink_factory: F,
    store: S,
    options: OrchestratorOptions,
) -> OrchestratorHandle
where
    C: SynthesisClient + 'static,
    F: SinkFactory + 'static,
    S: SettingsStore + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (sink_event_tx, sink_event_rx) = mpsc::channel(SINK_EVENT_BUFFER);
    let (synth_tx, synth_rx) = mpsc::channel(1);
    let (update_tx, _) = broadcast::channel(UPDATE_BUFFER);

    let engine = Engine {
        client,
        sink_factory,
        store,
        max_chunk_size: options.max_chunk_size,
        commands: command_rx,
        sink_events: sink_event_rx,
        sink_event_tx,
        synth_results: synth_rx,
        synth_tx,
        updates: update_tx.clone(),
        state: PlaybackState::Idle,
        chunks: Vec::new(),
        cursor: 0,
        settings: None,
        generation: 0,
        inflight: None,
        sink: None,
    };
    tokio::spawn(engine.run());

    OrchestratorHandle {
        commands: command_tx,
        updates: update_tx,
    }
}

/// Completion of one spawned synthesis call. Tagged with the request
/// generation so results of superseded requests can be discarded.
struct SynthOutcome {
    generation: u64,
    result: Result<AudioPayload, SynthesisError>,
}

struct Engine<C, F, S> {
    client: C,
    sink_factory: F,
    store: S,
    max_chunk_size: usize,

    commands: mpsc::Receiver<Command>,
    sink_events: mpsc::Receiver<SinkEvent>,
    // Kept so the sink event channel never reads as closed between
    // sink acquisitions.
    sink_event_tx: mpsc::Sender<SinkEvent>,
    synth_results: mpsc::Receiver<SynthOutcome>,
    synth_tx: mpsc::Sender<SynthOutcome>,
    updates: broadcast::Sender<StateUpdate>,

    state: PlaybackState,
    chunks: Vec<String>,
    cursor: usize,
    settings: Option<PlaybackSettings>,
    generation: u64,
    inflight: Option<CancellationToken>,
    sink: Option<SinkHandle>,
}

impl<C, F, S> Engine<C, F, S>
where
    C: SynthesisClient,
    F: SinkFactory,
    S: SettingsStore,
{
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.sink_events.recv() => {
                    self.handle_sink_event(event).await;
                }
                Some(outcome) = self.synth_results.recv() => {
                    self.handle_synthesis(outcome).await;
                }
            }
        }

        // All handles dropped: tear down whatever is still running.
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
        if let Some(sink) = self.sink.take() {
            let _ = sink.send(SinkCommand::Stop).await;
        }
        tracing::debug!("orchestrator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play(request) => self.handle_play(request).await,
            Command::Pause => {
                // Valid only while playing; the transition happens when
                // the sink confirms with its own Paused event.
                if self.state == PlaybackState::Playing {
                    self.send_to_sink(SinkCommand::Pause).await;
                }
            }
            Command::Resume => {
                if self.state == PlaybackState::Paused {
                    self.send_to_sink(SinkCommand::Resume).await;
                }
            }
            Command::Stop => {
                self.supersede();
                self.clear_request();
                if let Some(sink) = self.sink.take() {
                    let _ = sink.send(SinkCommand::Stop).await;
                }
                self.set_state(PlaybackState::Idle, None);
            }
            Command::QueryState(reply) => {
                let _ = reply.send(self.state);
            }
        }
    }

    async fn handle_play(&mut self, request: PlayRequest) {
        self.supersede();
        self.clear_request();

        let settings = match resolve_settings(&request.overrides(), &self.store) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "play request rejected");
                let message = match e {
                    ConfigError::MissingApiKey | ConfigError::EmptyApiKey => {
                        MSG_API_KEY_NOT_CONFIGURED.to_owned()
                    }
                    _ => MSG_GENERIC_FAILURE.to_owned(),
                };
                self.set_state(PlaybackState::Error, Some(message));
                return;
            }
        };

        self.chunks = split_text(&request.text, self.max_chunk_size);
        self.cursor = 0;
        self.settings = Some(settings);
        tracing::info!(chunks = self.chunks.len(), "play request accepted");

        self.process_next_chunk().await;
    }

    /// Dispatch synthesis for the chunk at the cursor, or finish the
    /// request if every chunk has been dispatched and played.
    async fn process_next_chunk(&mut self) {
        if self.cursor >= self.chunks.len() {
            self.finish_playback().await;
            return;
        }
        // Settings can only be absent when a superseding command
        // already cleared the request.
        let Some(settings) = self.settings.clone() else {
            return;
        };

        self.set_state(PlaybackState::Loading, None);

        let token = CancellationToken::new();
        self.inflight = Some(token.clone());
        let generation = self.generation;
        let future = self
            .client
            .synthesize(self.chunks[self.cursor].clone(), &settings, token);
        let results = self.synth_tx.clone();
        tokio::spawn(async move {
            let result = future.await;
            let _ = results.send(SynthOutcome { generation, result }).await;
        });
    }

    async fn handle_synthesis(&mut self, outcome: SynthOutcome) {
        if outcome.generation != self.generation {
            // A newer Play or Stop superseded this request.
            return;
        }
        self.inflight = None;

        match outcome.result {
            Ok(audio) => {
                self.cursor += 1;
                if let Err(e) = self.deliver_to_sink(audio).await {
                    tracing::error!(error = %e, "failed to hand audio to sink");
                    self.fail(sanitize_message(&e.to_string()));
                }
            }
            Err(SynthesisError::Cancelled) => {}
            Err(e) => {
                tracing::error!(error = %e, chunk = self.cursor, "chunk synthesis failed");
                self.fail(e.user_message());
            }
        }
    }

    async fn handle_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::Started => self.set_state(PlaybackState::Playing, None),
            SinkEvent::Paused => {
                if self.state == PlaybackState::Playing {
                    self.set_state(PlaybackState::Paused, None);
                }
            }
            SinkEvent::Ended => {
                // Ignore late end events from audio a newer request has
                // already replaced; a synthesis call is in flight then
                // and drives the queue itself.
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                    self.process_next_chunk().await;
                }
            }
            SinkEvent::Error { detail } => {
                tracing::error!(detail = %detail, "sink reported playback error");
                self.fail(sanitize_message(&detail));
            }
        }
    }

    async fn deliver_to_sink(&mut self, audio: AudioPayload) -> Result<(), SinkError> {
        self.ensure_sink().await?;
        match &self.sink {
            Some(sink) => sink.send(SinkCommand::Load { audio }).await,
            None => Err(SinkError::ChannelClosed),
        }
    }

    /// Lazy acquisition, checking that an existing handle is actually
    /// alive rather than trusting a cached one.
    async fn ensure_sink(&mut self) -> Result<(), SinkError> {
        if let Some(sink) = &self.sink {
            if sink.is_alive() {
                return Ok(());
            }
            self.sink = None;
        }
        let handle = self.sink_factory.acquire(self.sink_event_tx.clone()).await?;
        self.sink = Some(handle);
        Ok(())
    }

    async fn finish_playback(&mut self) {
        self.clear_request();
        if let Some(sink) = self.sink.take() {
            let _ = sink.send(SinkCommand::Stop).await;
        }
        self.set_state(PlaybackState::Idle, None);
    }

    fn fail(&mut self, message: String) {
        self.supersede();
        self.clear_request();
        self.set_state(PlaybackState::Error, Some(message));
    }

    /// Invalidate the current request: any in-flight synthesis is
    /// cancelled and its eventual completion discarded by generation.
    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
    }

    fn clear_request(&mut self) {
        self.chunks.clear();
        self.cursor = 0;
        self.settings = None;
    }

    async fn send_to_sink(&mut self, command: SinkCommand) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.send(command).await {
                tracing::warn!(error = %e, "sink command dropped");
            }
        }
    }

    fn set_state(&mut self, state: PlaybackState, error: Option<String>) {
        self.state = state;
        tracing::debug!(?state, "playback state");
        let _ = self.updates.send(StateUpdate { state, error });
    }
}

/// Collapse an arbitrary failure detail to an allow-listed message.
/// Anything that is not a known message (or an `API error: NNN` status
/// line) becomes the generic retry string.
pub fn sanitize_message(raw: &str) -> String {
    const SAFE: [&str; 8] = [
        MSG_INVALID_API_KEY,
        MSG_QUOTA_EXCEEDED,
        MSG_NO_AUDIO,
        MSG_INVALID_AUDIO,
        MSG_AUDIO_TOO_LARGE,
        MSG_INVALID_RESPONSE,
        MSG_TEMPORARILY_UNAVAILABLE,
        MSG_API_KEY_NOT_CONFIGURED,
    ];

    for safe in SAFE {
        if raw.contains(safe) {
            return safe.to_owned();
        }
    }

    if let Some(rest) = raw.strip_prefix("API error:") {
        let status = rest.trim();
        if status.len() == 3 && status.chars().all(|c| c.is_ascii_digit()) {
            return format!("API error: {status}");
        }
    }

    MSG_GENERIC_FAILURE.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemorySettingsStore, KEY_API_KEY};
    use crate::sink::DummySinkFactory;
    use crate::tts::{AudioPayloadIssue, DummySynthesisClient};
    use std::time::Duration;

    fn test_store() -> MemorySettingsStore {
        MemorySettingsStore::default().with_value(KEY_API_KEY, "test-key")
    }

    fn small_chunks() -> OrchestratorOptions {
        OrchestratorOptions { max_chunk_size: 24 }
    }

    async fn next_update(rx: &mut broadcast::Receiver<StateUpdate>) -> StateUpdate {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a state update")
            .expect("update channel closed")
    }

    async fn wait_for_state(
        rx: &mut broadcast::Receiver<StateUpdate>,
        state: PlaybackState,
    ) -> StateUpdate {
        loop {
            let update = next_update(rx).await;
            if update.state == state {
                return update;
            }
        }
    }

    #[tokio::test]
    async fn uninterrupted_play_synthesizes_every_chunk_in_order() {
        let client = DummySynthesisClient::new();
        let factory = DummySinkFactory::auto_end();
        let handle = spawn(client.clone(), factory.clone(), test_store(), small_chunks());
        let mut updates = handle.subscribe();

        let text = "One two three. Four five six. Seven eight nine.";
        let expected = split_text(text, 24);
        assert!(expected.len() > 1);

        handle.play(PlayRequest::for_text(text)).await.expect("play");
        wait_for_state(&mut updates, PlaybackState::Idle).await;

        assert_eq!(client.requests(), expected);
        assert_eq!(factory.acquisitions(), 1);
    }

    #[tokio::test]
    async fn sink_is_released_after_the_last_chunk() {
        let client = DummySynthesisClient::new();
        let factory = DummySinkFactory::auto_end();
        let handle = spawn(client, factory.clone(), test_store(), small_chunks());
        let mut updates = handle.subscribe();

        handle
            .play(PlayRequest::for_text("A short line."))
            .await
            .expect("play");
        wait_for_state(&mut updates, PlaybackState::Idle).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(factory.releases(), 1);
    }

    #[tokio::test]
    async fn stop_while_loading_goes_idle_and_makes_no_further_calls() {
        let client = DummySynthesisClient::new().with_delay(Duration::from_millis(200));
        let factory = DummySinkFactory::auto_end();
        let handle = spawn(client.clone(), factory, test_store(), small_chunks());
        let mut updates = handle.subscribe();

        let text = "One two three. Four five six. Seven eight nine.";
        handle.play(PlayRequest::for_text(text)).await.expect("play");
        let first = next_update(&mut updates).await;
        assert_eq!(first.state, PlaybackState::Loading);

        handle.stop().await.expect("stop");
        let after_stop = next_update(&mut updates).await;
        assert_eq!(after_stop.state, PlaybackState::Idle);

        // Let the cancelled request drain; nothing else may be issued.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(client.requests().len(), 1);
        assert_eq!(
            handle.query_state().await.expect("query"),
            PlaybackState::Idle
        );
    }

    #[tokio::test]
    async fn a_second_play_supersedes_the_in_flight_request() {
        let client = DummySynthesisClient::new().with_delay(Duration::from_millis(100));
        client.push_ok("c2Vjb25k");
        let factory = DummySinkFactory::auto_end();
        let handle = spawn(
            client.clone(),
            factory.clone(),
            test_store(),
            OrchestratorOptions::default(),
        );
        let mut updates = handle.subscribe();

        handle.play(PlayRequest::for_text("The first text.")).await.expect("play");
        assert_eq!(next_update(&mut updates).await.state, PlaybackState::Loading);

        handle.play(PlayRequest::for_text("The second text.")).await.expect("play");
        wait_for_state(&mut updates, PlaybackState::Idle).await;

        // Both requests were dispatched, but the first was cancelled
        // mid-flight and its completion discarded: only the second
        // request's audio ever reaches the sink.
        assert_eq!(client.requests().len(), 2);
        assert_eq!(factory.loads(), vec![AudioPayload::new("c2Vjb25k")]);
    }

    #[tokio::test]
    async fn stop_while_playing_goes_idle_and_drops_the_queue() {
        let client = DummySynthesisClient::new();
        let factory = DummySinkFactory::new();
        let handle = spawn(client.clone(), factory, test_store(), small_chunks());
        let mut updates = handle.subscribe();

        let text = "One two three. Four five six. Seven eight nine.";
        handle.play(PlayRequest::for_text(text)).await.expect("play");
        wait_for_state(&mut updates, PlaybackState::Playing).await;
        assert_eq!(client.requests().len(), 1);

        handle.stop().await.expect("stop");
        assert_eq!(next_update(&mut updates).await.state, PlaybackState::Idle);

        // The remaining chunks were dropped with the queue.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.requests().len(), 1);
        assert_eq!(
            handle.query_state().await.expect("query"),
            PlaybackState::Idle
        );
    }

    #[tokio::test]
    async fn pause_is_a_no_op_while_idle() {
        let handle = spawn(
            DummySynthesisClient::new(),
            DummySinkFactory::new(),
            test_store(),
            OrchestratorOptions::default(),
        );
        let mut updates = handle.subscribe();

        handle.pause().await.expect("pause");
        assert_eq!(
            handle.query_state().await.expect("query"),
            PlaybackState::Idle
        );
        assert!(matches!(
            updates.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn pause_is_a_no_op_while_already_paused() {
        let client = DummySynthesisClient::new();
        let factory = DummySinkFactory::new();
        let handle = spawn(client, factory, test_store(), OrchestratorOptions::default());
        let mut updates = handle.subscribe();

        handle
            .play(PlayRequest::for_text("Just one chunk."))
            .await
            .expect("play");
        wait_for_state(&mut updates, PlaybackState::Playing).await;
        handle.pause().await.expect("pause");
        wait_for_state(&mut updates, PlaybackState::Paused).await;

        handle.pause().await.expect("pause");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            updates.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(
            handle.query_state().await.expect("query"),
            PlaybackState::Paused
        );
    }

    #[tokio::test]
    async fn quota_exhaustion_surfaces_the_fixed_message() {
        let client = DummySynthesisClient::new();
        client.push_err(SynthesisError::QuotaExceeded);
        let handle = spawn(
            client,
            DummySinkFactory::new(),
            test_store(),
            OrchestratorOptions::default(),
        );
        let mut updates = handle.subscribe();

        handle.play(PlayRequest::for_text("Hello.")).await.expect("play");
        assert_eq!(next_update(&mut updates).await.state, PlaybackState::Loading);
        let error = next_update(&mut updates).await;
        assert_eq!(error.state, PlaybackState::Error);
        assert_eq!(error.error.as_deref(), Some("API quota exceeded"));
    }

    #[tokio::test]
    async fn missing_audio_surfaces_the_fixed_message() {
        let client = DummySynthesisClient::new();
        client.push_err(SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Missing));
        let handle = spawn(
            client,
            DummySinkFactory::new(),
            test_store(),
            OrchestratorOptions::default(),
        );
        let mut updates = handle.subscribe();

        handle.play(PlayRequest::for_text("Hello.")).await.expect("play");
        let error = wait_for_state(&mut updates, PlaybackState::Error).await;
        assert_eq!(error.error.as_deref(), Some("No audio returned from API"));
    }

    #[tokio::test]
    async fn missing_api_key_is_reported_without_a_request() {
        let client = DummySynthesisClient::new();
        let handle = spawn(
            client.clone(),
            DummySinkFactory::new(),
            MemorySettingsStore::default(),
            OrchestratorOptions::default(),
        );
        let mut updates = handle.subscribe();

        handle.play(PlayRequest::for_text("Hello.")).await.expect("play");
        let error = next_update(&mut updates).await;
        assert_eq!(error.state, PlaybackState::Error);
        assert_eq!(error.error.as_deref(), Some("API key not configured"));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn pause_resume_and_natural_end_walk_the_full_state_sequence() {
        let client = DummySynthesisClient::new();
        let factory = DummySinkFactory::new();
        let handle = spawn(
            client,
            factory.clone(),
            test_store(),
            OrchestratorOptions::default(),
        );
        let mut updates = handle.subscribe();

        handle
            .play(PlayRequest::for_text("Just one chunk."))
            .await
            .expect("play");
        let mut observed = Vec::new();

        observed.push(next_update(&mut updates).await.state);
        observed.push(next_update(&mut updates).await.state);
        handle.pause().await.expect("pause");
        observed.push(next_update(&mut updates).await.state);
        handle.resume().await.expect("resume");
        observed.push(next_update(&mut updates).await.state);
        factory.finish_playback();
        observed.push(next_update(&mut updates).await.state);

        assert_eq!(
            observed,
            vec![
                PlaybackState::Loading,
                PlaybackState::Playing,
                PlaybackState::Paused,
                PlaybackState::Playing,
                PlaybackState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn a_new_play_recovers_from_the_error_state() {
        let client = DummySynthesisClient::new();
        client.push_err(SynthesisError::Api(500));
        let factory = DummySinkFactory::auto_end();
        let handle = spawn(client, factory, test_store(), OrchestratorOptions::default());
        let mut updates = handle.subscribe();

        handle.play(PlayRequest::for_text("First try.")).await.expect("play");
        let error = wait_for_state(&mut updates, PlaybackState::Error).await;
        assert_eq!(error.error.as_deref(), Some("API error: 500"));

        handle.play(PlayRequest::for_text("Second try.")).await.expect("play");
        wait_for_state(&mut updates, PlaybackState::Idle).await;
        assert_eq!(
            handle.query_state().await.expect("query"),
            PlaybackState::Idle
        );
    }

    #[test]
    fn sanitize_collapses_unknown_messages() {
        assert_eq!(sanitize_message("API quota exceeded"), "API quota exceeded");
        assert_eq!(
            sanitize_message("wrapped: No audio returned from API"),
            "No audio returned from API"
        );
        assert_eq!(sanitize_message("API error: 503"), "API error: 503");
        assert_eq!(
            sanitize_message("API error: 503 upstream said <secret>"),
            MSG_GENERIC_FAILURE
        );
        assert_eq!(
            sanitize_message("connection reset by peer (10.0.0.3)"),
            MSG_GENERIC_FAILURE
        );
        assert_eq!(sanitize_message(""), MSG_GENERIC_FAILURE);
    }
}
