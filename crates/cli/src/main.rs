#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use vani_core::config::{
    model_text_limit, EnvSettingsStore, MemorySettingsStore, SettingsStore, DEFAULT_MODEL,
    ENV_API_KEY, KEY_API_KEY, KEY_LANGUAGE, KEY_MODEL, KEY_PACE, KEY_SPEAKER,
};
use vani_core::orchestrator::{
    self, OrchestratorHandle, OrchestratorOptions, PlayRequest, PlaybackState,
};
use vani_core::sink::RodioSinkFactory;
use vani_core::tts::SarvamClient;

#[derive(Parser, Debug)]
#[command(name = "vani")]
#[command(about = "Read text aloud through the Sarvam text-to-speech API")]
struct Args {
    /// Text to read. Use --file or pipe stdin for longer content.
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Read the text from a file.
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    api_key: Option<String>,

    /// Target language code, e.g. hi-IN or ta-IN.
    #[arg(long)]
    language: Option<String>,

    /// Speaker voice, e.g. shubh or anushka.
    #[arg(long)]
    speaker: Option<String>,

    /// Speech rate multiplier.
    #[arg(long)]
    pace: Option<f32>,

    /// Synthesis model, e.g. bulbul:v3.
    #[arg(long)]
    model: Option<String>,

    /// Accept pause/resume/stop commands on stdin during playback.
    #[arg(long, default_value_t = false)]
    interactive: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    anyhow::ensure!(
        !(args.interactive && args.text.is_none() && args.file.is_none()),
        "--interactive needs --text or --file, since stdin carries the control commands"
    );

    let text = read_text(&args).await?;
    anyhow::ensure!(!text.trim().is_empty(), "no text to read");

    let store = build_store(&args, &EnvSettingsStore);
    warn_if_over_limit(&args, &store, &text);

    let handle = orchestrator::spawn(
        SarvamClient::new(),
        RodioSinkFactory::new(),
        store,
        OrchestratorOptions::default(),
    );
    let mut updates = handle.subscribe();

    handle
        .play(PlayRequest {
            text,
            language: args.language.clone(),
            speaker: args.speaker.clone(),
            pace: args.pace,
            model: args.model.clone(),
        })
        .await?;

    if args.interactive {
        spawn_control_reader(handle.clone());
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => match update.state {
                    PlaybackState::Loading => tracing::info!("loading"),
                    PlaybackState::Playing => tracing::info!("playing"),
                    PlaybackState::Paused => tracing::info!("paused"),
                    PlaybackState::Idle => {
                        tracing::info!("done");
                        break;
                    }
                    PlaybackState::Error => {
                        let message = update
                            .error
                            .unwrap_or_else(|| "TTS request failed. Please try again.".to_owned());
                        anyhow::bail!("{message}");
                    }
                },
                // Missed broadcasts: fall back to an explicit state query.
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                    if handle.query_state().await? == PlaybackState::Idle {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping playback");
                handle.stop().await?;
            }
        }
    }

    Ok(())
}

async fn read_text(args: &Args) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read stdin")?;
    Ok(text)
}

/// The credential and persisted defaults the orchestrator will consult.
/// CLI flags for language/speaker/pace/model travel as per-request
/// overrides instead, so they are not written here.
fn build_store(args: &Args, defaults: &impl SettingsStore) -> MemorySettingsStore {
    let mut store = MemorySettingsStore::default();
    if let Some(key) = &args.api_key {
        store = store.with_value(KEY_API_KEY, key);
    }
    for key in [KEY_LANGUAGE, KEY_SPEAKER, KEY_PACE, KEY_MODEL] {
        if let Some(value) = defaults.get(key) {
            store = store.with_value(key, &value);
        }
    }
    store
}

fn warn_if_over_limit(args: &Args, store: &impl SettingsStore, text: &str) {
    let model = args
        .model
        .clone()
        .or_else(|| store.get(KEY_MODEL))
        .unwrap_or_else(|| DEFAULT_MODEL.to_owned());
    let limit = model_text_limit(&model);
    let chars = text.chars().count();
    if chars > limit {
        tracing::warn!(
            chars,
            limit,
            model = %model,
            "text exceeds the model's single-request limit and will be split into multiple requests"
        );
    }
}

fn spawn_control_reader(handle: OrchestratorHandle) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let result = match line.trim() {
                "pause" => handle.pause().await,
                "resume" => handle.resume().await,
                "stop" => handle.stop().await,
                "" => Ok(()),
                other => {
                    tracing::warn!(command = other, "unknown control command");
                    Ok(())
                }
            };
            if result.is_err() {
                break;
            }
        }
    });
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
