use crate::sink::{SinkCommand, SinkError, SinkEvent, SinkFactory, SinkHandle};
use crate::tts::AudioPayload;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::io::Cursor;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

const COMMAND_BUFFER: usize = 8;
const END_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawns a rodio-backed sink task per acquisition. The task owns the
/// output stream; when the handle is dropped the task exits and the
/// device is released.
#[derive(Clone, Debug, Default)]
pub struct RodioSinkFactory;

impl RodioSinkFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SinkFactory for RodioSinkFactory {
    fn acquire(
        &self,
        events: mpsc::Sender<SinkEvent>,
    ) -> BoxFuture<'_, Result<SinkHandle, SinkError>> {
        async move {
            let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
            let (ready_tx, ready_rx) = oneshot::channel();

            tokio::spawn(run_sink(command_rx, events, ready_tx));

            match ready_rx.await {
                Ok(Ok(())) => Ok(SinkHandle::new(command_tx)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(SinkError::ChannelClosed),
            }
        }
        .boxed()
    }
}

async fn run_sink(
    mut commands: mpsc::Receiver<SinkCommand>,
    events: mpsc::Sender<SinkEvent>,
    ready: oneshot::Sender<Result<(), SinkError>>,
) {
    // The stream must outlive every clip played through it; opening it
    // per clip truncates playback.
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(SinkError::AudioOutputUnavailable {
                details: e.to_string(),
            }));
            return;
        }
    };

    // Readiness acknowledgment: the acquirer may send Load immediately
    // after this resolves.
    if ready.send(Ok(())).is_err() {
        return;
    }
    tracing::debug!("audio sink ready");

    let mut current: Option<Sink> = None;
    let mut playing = false;
    let mut poll = tokio::time::interval(END_POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(SinkCommand::Load { audio }) => {
                    if let Some(old) = current.take() {
                        old.stop();
                    }
                    playing = false;
                    match load_clip(&stream, &audio) {
                        Ok(sink) => {
                            current = Some(sink);
                            playing = true;
                            emit(&events, SinkEvent::Started).await;
                        }
                        Err(detail) => {
                            tracing::error!(detail = %detail, "failed to load audio clip");
                            emit(&events, SinkEvent::Error { detail }).await;
                        }
                    }
                }
                Some(SinkCommand::Pause) => {
                    if let Some(sink) = &current {
                        // Mirror the natural-end guard: a clip that has
                        // already drained reports Ended, not Paused.
                        if playing && !sink.empty() {
                            sink.pause();
                            playing = false;
                            emit(&events, SinkEvent::Paused).await;
                        }
                    }
                }
                Some(SinkCommand::Resume) => {
                    if let Some(sink) = &current {
                        if !playing && !sink.empty() {
                            sink.play();
                            playing = true;
                            emit(&events, SinkEvent::Started).await;
                        }
                    }
                }
                Some(SinkCommand::Stop) => {
                    if let Some(sink) = current.take() {
                        sink.stop();
                    }
                    playing = false;
                }
            },
            _ = poll.tick() => {
                let drained = matches!(&current, Some(sink) if playing && sink.empty());
                if drained {
                    current = None;
                    playing = false;
                    emit(&events, SinkEvent::Ended).await;
                }
            }
        }
    }

    tracing::debug!("audio sink released");
}

async fn emit(events: &mpsc::Sender<SinkEvent>, event: SinkEvent) {
    let _ = events.send(event).await;
}

fn load_clip(stream: &OutputStream, audio: &AudioPayload) -> Result<Sink, String> {
    let bytes = BASE64
        .decode(audio.as_str())
        .map_err(|e| format!("invalid base64 audio: {e}"))?;
    let source = Decoder::new(Cursor::new(bytes))
        .map_err(|e| format!("undecodable audio: {e}"))?;

    let mixer = stream.mixer();
    let sink = Sink::connect_new(&mixer);
    sink.append(source);
    Ok(sink)
}
