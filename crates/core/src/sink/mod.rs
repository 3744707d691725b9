mod audio;
mod dummy;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::tts::AudioPayload;

pub use audio::RodioSinkFactory;
pub use dummy::DummySinkFactory;

/// Control messages into the sink. `Load` replaces any audio that is
/// currently loaded; there is at most one clip in the sink at a time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SinkCommand {
    Load { audio: AudioPayload },
    Pause,
    Resume,
    Stop,
}

/// Lifecycle events out of the sink. `Ended` is only emitted on natural
/// end of audio, never in response to an explicit `Stop`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SinkEvent {
    Started,
    Paused,
    Ended,
    Error { detail: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },

    #[error("sink channel closed")]
    ChannelClosed,
}

/// Command sender for an acquired sink. Dropping the handle releases
/// the sink: its task drains remaining commands and exits, freeing the
/// output device.
#[derive(Debug)]
pub struct SinkHandle {
    commands: mpsc::Sender<SinkCommand>,
}

impl SinkHandle {
    pub fn new(commands: mpsc::Sender<SinkCommand>) -> Self {
        Self { commands }
    }

    /// Whether the sink task is still listening. A handle can go stale
    /// if the task died, so callers check this rather than trusting
    /// that acquisition once succeeded.
    pub fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }

    pub async fn send(&self, command: SinkCommand) -> Result<(), SinkError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SinkError::ChannelClosed)
    }
}

/// Lazily acquires a sink. `acquire` resolves only once the sink's
/// command listener is registered and it has acknowledged readiness, so
/// the first `Load` can never race the listener coming up.
pub trait SinkFactory: Send + Sync {
    fn acquire(
        &self,
        events: mpsc::Sender<SinkEvent>,
    ) -> BoxFuture<'_, Result<SinkHandle, SinkError>>;
}
