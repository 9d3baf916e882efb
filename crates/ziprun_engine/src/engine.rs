use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use ziprun_logging::{ziprun_debug, ziprun_error, ziprun_info, ziprun_warn};

use crate::progress::{open_progress, LogSource, Markers, SseLogSource};
use crate::retrieve::{ReqwestRetriever, Retriever};
use crate::submit::{ReqwestSubmitter, Submitter};
use crate::{CandidateUpload, EngineEvent, EngineSettings, RunId};

enum EngineCommand {
    Submit { run_id: RunId, upload: CandidateUpload },
    OpenStream { run_id: RunId },
    CloseStream { run_id: RunId },
    Retrieve { filename: String },
}

/// IO backends the engine drives.
#[derive(Clone)]
pub struct EngineServices {
    pub submitter: Arc<dyn Submitter>,
    pub log_source: Arc<dyn LogSource>,
    pub retriever: Arc<dyn Retriever>,
    pub markers: Markers,
}

impl EngineServices {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            submitter: Arc::new(ReqwestSubmitter::new(settings.clone())),
            log_source: Arc::new(SseLogSource::new(settings.clone())),
            retriever: Arc::new(ReqwestRetriever::new(settings.clone())),
            markers: settings.markers.clone(),
        }
    }
}

/// Runs submissions, progress streams and downloads on a background tokio runtime.
///
/// Commands are fire-and-forget; results come back as [`EngineEvent`]s in the order
/// they happen. At most one progress stream is live: opening a new one closes the
/// previous.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_services(EngineServices::from_settings(&settings))
    }

    pub fn with_services(services: EngineServices) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    ziprun_error!("Failed to start engine runtime: {}", err);
                    let _ = event_tx.send(EngineEvent::EngineFailed {
                        message: err.to_string(),
                    });
                    return;
                }
            };

            let mut active_stream: Option<(RunId, CancellationToken)> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::OpenStream { run_id } => {
                        if let Some((previous, token)) = active_stream.take() {
                            ziprun_debug!("Closing log stream of run {}", previous);
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        active_stream = Some((run_id, token.clone()));
                        runtime.spawn(pump_stream(
                            services.log_source.clone(),
                            services.markers.clone(),
                            run_id,
                            token,
                            event_tx.clone(),
                        ));
                    }
                    EngineCommand::CloseStream { run_id } => {
                        if matches!(&active_stream, Some((active, _)) if *active == run_id) {
                            if let Some((_, token)) = active_stream.take() {
                                ziprun_debug!("Closing log stream of run {}", run_id);
                                token.cancel();
                            }
                        }
                    }
                    EngineCommand::Submit { run_id, upload } => {
                        let submitter = services.submitter.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = submitter.submit(&upload).await;
                            let _ = event_tx.send(EngineEvent::SubmitCompleted { run_id, result });
                        });
                    }
                    EngineCommand::Retrieve { filename } => {
                        let retriever = services.retriever.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = retriever.retrieve(&filename).await;
                            let _ =
                                event_tx.send(EngineEvent::RetrieveCompleted { filename, result });
                        });
                    }
                }
            }
            if let Some((_, token)) = active_stream {
                token.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, run_id: RunId, upload: CandidateUpload) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { run_id, upload });
    }

    pub fn open_stream(&self, run_id: RunId) {
        let _ = self.cmd_tx.send(EngineCommand::OpenStream { run_id });
    }

    pub fn close_stream(&self, run_id: RunId) {
        let _ = self.cmd_tx.send(EngineCommand::CloseStream { run_id });
    }

    pub fn retrieve(&self, filename: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Retrieve {
            filename: filename.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    ///
    /// `Disconnected` means the engine thread is gone and nothing more will arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}

async fn pump_stream(
    source: Arc<dyn LogSource>,
    markers: Markers,
    run_id: RunId,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        opened = open_progress(source.as_ref(), markers) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(error) => {
            ziprun_warn!("Run {} log stream failed to open: {}", run_id, error);
            let _ = event_tx.send(EngineEvent::StreamFailed { run_id, error });
            return;
        }
    };
    ziprun_info!("Run {} log stream open", run_id);

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                stream.close();
                return;
            }
            next = stream.next() => next,
        };
        match next {
            Some(Ok(line)) => {
                let terminal = line.kind.is_terminal();
                let _ = event_tx.send(EngineEvent::StreamLine { run_id, line });
                if terminal {
                    ziprun_info!("Run {} log stream reached a terminal line", run_id);
                    return;
                }
            }
            Some(Err(error)) => {
                ziprun_warn!("Run {} log stream failed: {}", run_id, error);
                let _ = event_tx.send(EngineEvent::StreamFailed { run_id, error });
                return;
            }
            None => return,
        }
    }
}
