use crate::config::{
    PlaybackSettings, API_ENDPOINT, API_KEY_HEADER, DEFAULT_SAMPLE_RATE, MAX_AUDIO_PAYLOAD_BYTES,
    OUTPUT_AUDIO_CODEC,
};
use crate::tts::{AudioPayload, AudioPayloadIssue, SynthesisClient, SynthesisError};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// HTTP client for the Sarvam text-to-speech endpoint.
#[derive(Clone)]
pub struct SarvamClient {
    client: Client,
    base_url: String,
}

impl SarvamClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: API_ENDPOINT.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for SarvamClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct SarvamRequest {
    text: String,
    target_language_code: String,
    speaker: String,
    model: String,
    speech_sample_rate: u32,
    output_audio_codec: String,
    pace: f32,
}

#[derive(Deserialize)]
struct SarvamResponse {
    #[serde(default)]
    audios: Vec<String>,
}

impl SynthesisClient for SarvamClient {
    fn synthesize(
        &self,
        text: String,
        settings: &PlaybackSettings,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<AudioPayload, SynthesisError>> {
        let this = self.clone();
        let api_key = settings.api_key.clone();
        let request = SarvamRequest {
            text,
            target_language_code: settings.language.as_str().to_owned(),
            speaker: settings.speaker.as_str().to_owned(),
            model: settings.model.as_str().to_owned(),
            speech_sample_rate: DEFAULT_SAMPLE_RATE,
            output_audio_codec: OUTPUT_AUDIO_CODEC.to_owned(),
            pace: settings.pace.get(),
        };

        async move {
            if cancel.is_cancelled() {
                return Err(SynthesisError::Cancelled);
            }

            tracing::debug!(
                chars = request.text.chars().count(),
                language = %request.target_language_code,
                speaker = %request.speaker,
                model = %request.model,
                "sending synthesis request"
            );

            let send = this
                .client
                .post(&this.base_url)
                .header(API_KEY_HEADER, api_key.expose())
                .json(&request)
                .send();

            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
                result = send => result?,
            };

            let status = response.status();
            if !status.is_success() {
                // Log the upstream body truncated; never surface it.
                let body = response.text().await.unwrap_or_default();
                let excerpt: String = body.chars().take(200).collect();
                tracing::error!(
                    status = status.as_u16(),
                    body = %excerpt,
                    "synthesis request rejected"
                );
                return Err(map_status(status.as_u16()));
            }

            let body = tokio::select! {
                _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
                result = response.text() => result?,
            };

            extract_audio(&body)
        }
        .boxed()
    }
}

fn map_status(status: u16) -> SynthesisError {
    match status {
        403 => SynthesisError::InvalidCredential,
        429 => SynthesisError::QuotaExceeded,
        502 | 503 | 504 => SynthesisError::TemporarilyUnavailable,
        other => SynthesisError::Api(other),
    }
}

/// Parse the response body and validate the first audio payload.
fn extract_audio(body: &str) -> Result<AudioPayload, SynthesisError> {
    let parsed: SarvamResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "failed to parse synthesis response");
        SynthesisError::MalformedResponse
    })?;

    let Some(audio) = parsed.audios.into_iter().next() else {
        return Err(SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Missing));
    };
    if audio.is_empty() {
        return Err(SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Empty));
    }
    if audio.len() > MAX_AUDIO_PAYLOAD_BYTES {
        return Err(SynthesisError::InvalidAudioPayload(AudioPayloadIssue::Oversized));
    }

    Ok(AudioPayload::new(audio))
}
