mod dummy;
mod sarvam;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::config::PlaybackSettings;

pub use dummy::DummySynthesisClient;
pub use sarvam::SarvamClient;

// The only strings an observer ever sees for a failed request. Raw
// transport or upstream error text never leaves this module.
pub const MSG_INVALID_API_KEY: &str = "Invalid API key";
pub const MSG_QUOTA_EXCEEDED: &str = "API quota exceeded";
pub const MSG_TEMPORARILY_UNAVAILABLE: &str =
    "Sarvam API temporarily unavailable. Please try again in a moment.";
pub const MSG_INVALID_RESPONSE: &str = "Invalid response from API";
pub const MSG_NO_AUDIO: &str = "No audio returned from API";
pub const MSG_INVALID_AUDIO: &str = "Invalid audio data received from API";
pub const MSG_AUDIO_TOO_LARGE: &str = "Audio data exceeds maximum size limit";
pub const MSG_API_KEY_NOT_CONFIGURED: &str = "API key not configured";
pub const MSG_GENERIC_FAILURE: &str = "TTS request failed. Please try again.";

/// Base64-encoded audio as returned by the synthesis API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AudioPayload(String);

impl AudioPayload {
    pub fn new<S: Into<String>>(data: S) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioPayloadIssue {
    /// The response carried no audio at all.
    Missing,
    /// The audio field was present but empty.
    Empty,
    /// The encoded payload exceeded the hard size ceiling.
    Oversized,
}

impl fmt::Display for AudioPayloadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Missing => "missing",
            Self::Empty => "empty",
            Self::Oversized => "oversized",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("credential rejected by the api")]
    InvalidCredential,
    #[error("api quota exceeded")]
    QuotaExceeded,
    #[error("api temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("api returned status {0}")]
    Api(u16),
    #[error("response body was not valid json")]
    MalformedResponse,
    #[error("audio payload {0}")]
    InvalidAudioPayload(AudioPayloadIssue),
    #[error("request cancelled")]
    Cancelled,
    #[error("transport failure")]
    Transport(#[from] reqwest::Error),
}

impl SynthesisError {
    /// Fixed allow-listed message for observers. `Cancelled` is never
    /// user-facing, so it collapses to the generic string like any
    /// other unexpected condition.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredential => MSG_INVALID_API_KEY.to_owned(),
            Self::QuotaExceeded => MSG_QUOTA_EXCEEDED.to_owned(),
            Self::TemporarilyUnavailable => MSG_TEMPORARILY_UNAVAILABLE.to_owned(),
            Self::Api(status) => format!("API error: {status}"),
            Self::MalformedResponse => MSG_INVALID_RESPONSE.to_owned(),
            Self::InvalidAudioPayload(AudioPayloadIssue::Missing) => MSG_NO_AUDIO.to_owned(),
            Self::InvalidAudioPayload(AudioPayloadIssue::Empty) => MSG_INVALID_AUDIO.to_owned(),
            Self::InvalidAudioPayload(AudioPayloadIssue::Oversized) => {
                MSG_AUDIO_TOO_LARGE.to_owned()
            }
            Self::Cancelled | Self::Transport(_) => MSG_GENERIC_FAILURE.to_owned(),
        }
    }
}

/// One synthesis call for one text chunk. Implementations must observe
/// the cancellation token and fail with [`SynthesisError::Cancelled`]
/// without side effects once it fires.
pub trait SynthesisClient: Send + Sync {
    fn synthesize(
        &self,
        text: String,
        settings: &PlaybackSettings,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<AudioPayload, SynthesisError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_come_from_the_allow_list() {
        assert_eq!(SynthesisError::InvalidCredential.user_message(), MSG_INVALID_API_KEY);
        assert_eq!(SynthesisError::QuotaExceeded.user_message(), MSG_QUOTA_EXCEEDED);
        assert_eq!(
            SynthesisError::TemporarilyUnavailable.user_message(),
            MSG_TEMPORARILY_UNAVAILABLE
        );
        assert_eq!(SynthesisError::Api(418).user_message(), "API error: 418");
        assert_eq!(SynthesisError::MalformedResponse.user_message(), MSG_INVALID_RESPONSE);
        assert_eq!(
            SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Missing).user_message(),
            MSG_NO_AUDIO
        );
        assert_eq!(
            SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Empty).user_message(),
            MSG_INVALID_AUDIO
        );
        assert_eq!(
            SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Oversized).user_message(),
            MSG_AUDIO_TOO_LARGE
        );
        assert_eq!(SynthesisError::Cancelled.user_message(), MSG_GENERIC_FAILURE);
    }
}
