use crate::sink::{SinkCommand, SinkError, SinkEvent, SinkFactory, SinkHandle};
use crate::tts::AudioPayload;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

/// Scripted sink for orchestrator tests: `Load` answers `Started`,
/// `Pause` answers `Paused`, `Resume` answers `Started`. Natural end is
/// emitted either automatically right after each load (`auto_end`) or
/// when the test calls [`DummySinkFactory::finish_playback`].
#[derive(Clone, Default)]
pub struct DummySinkFactory {
    auto_end: bool,
    finish: Arc<Notify>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    loads: Arc<Mutex<Vec<AudioPayload>>>,
}

impl DummySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_end() -> Self {
        Self {
            auto_end: true,
            ..Self::default()
        }
    }

    /// Emit `Ended` for the clip currently playing.
    pub fn finish_playback(&self) {
        self.finish.notify_one();
    }

    pub fn acquisitions(&self) -> usize {
        self.acquired.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    /// Every payload handed to `Load`, in arrival order, across all
    /// acquisitions.
    pub fn loads(&self) -> Vec<AudioPayload> {
        match self.loads.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SinkFactory for DummySinkFactory {
    fn acquire(
        &self,
        events: mpsc::Sender<SinkEvent>,
    ) -> BoxFuture<'_, Result<SinkHandle, SinkError>> {
        let auto_end = self.auto_end;
        let finish = Arc::clone(&self.finish);
        let released = Arc::clone(&self.released);
        let loads = Arc::clone(&self.loads);
        self.acquired.fetch_add(1, Ordering::Relaxed);

        async move {
            let (command_tx, mut command_rx) = mpsc::channel(8);

            tokio::spawn(async move {
                let mut loaded = false;
                let mut playing = false;
                loop {
                    tokio::select! {
                        command = command_rx.recv() => match command {
                            None => break,
                            Some(SinkCommand::Load { audio }) => {
                                match loads.lock() {
                                    Ok(mut guard) => guard.push(audio),
                                    Err(poisoned) => poisoned.into_inner().push(audio),
                                }
                                loaded = true;
                                playing = true;
                                let _ = events.send(SinkEvent::Started).await;
                                if auto_end {
                                    loaded = false;
                                    playing = false;
                                    let _ = events.send(SinkEvent::Ended).await;
                                }
                            }
                            Some(SinkCommand::Pause) => {
                                if playing {
                                    playing = false;
                                    let _ = events.send(SinkEvent::Paused).await;
                                }
                            }
                            Some(SinkCommand::Resume) => {
                                if loaded && !playing {
                                    playing = true;
                                    let _ = events.send(SinkEvent::Started).await;
                                }
                            }
                            Some(SinkCommand::Stop) => {
                                loaded = false;
                                playing = false;
                            }
                        },
                        _ = finish.notified(), if playing => {
                            loaded = false;
                            playing = false;
                            let _ = events.send(SinkEvent::Ended).await;
                        }
                    }
                }
                released.fetch_add(1, Ordering::Relaxed);
            });

            Ok(SinkHandle::new(command_tx))
        }
        .boxed()
    }
}
