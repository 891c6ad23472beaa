//! Background worker running uploads off the UI loop.

use reqwest::Client;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use crate::{
    config::Config,
    pending::PendingFile,
    transmit::{self, TransmissionResult},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Upload this file; supersedes any upload still running.
    Transmit(PendingFile),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// An upload finished, tagged with the file it was issued for.
    Resolved {
        file_id: Uuid,
        result: TransmissionResult,
    },
    /// Informational log message.
    Log(String),
    /// User-visible error message.
    Error(String),
}

/// Main worker loop: one spawned task per upload, newest wins.
pub async fn run(mut rx: mpsc::Receiver<WorkerCmd>, tx: mpsc::Sender<WorkerEvent>, cfg: Config) {
    // The request timeout bounds how long a file can stay in flight.
    let http = match Client::builder().timeout(cfg.timeout()).build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("http client init failed: {e}");
            let _ = tx
                .send(WorkerEvent::Error(format!("http client init failed: {e}")))
                .await;
            return;
        }
    };
    tracing::info!("worker started, endpoint {}", cfg.upload_url());

    let mut in_flight: Option<JoinHandle<()>> = None;

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::Transmit(file) => {
                // Best effort; a result already queued is dropped by the controller.
                if let Some(prev) = in_flight.take()
                    && !prev.is_finished()
                {
                    tracing::info!("aborting superseded upload");
                    prev.abort();
                }

                let _ = tx
                    .send(WorkerEvent::Log(format!("uploading {}", file.name)))
                    .await;

                let http = http.clone();
                let cfg = cfg.clone();
                let tx = tx.clone();
                in_flight = Some(tokio::spawn(async move {
                    let result = transmit::transmit(&http, &cfg, &file).await;
                    tracing::info!("upload {} resolved: {}", file.id, outcome_label(&result));
                    let _ = tx
                        .send(WorkerEvent::Resolved {
                            file_id: file.id,
                            result,
                        })
                        .await;
                }));
            }
        }
    }
    tracing::info!("worker stopped");
}

fn outcome_label(r: &TransmissionResult) -> &'static str {
    match r {
        TransmissionResult::Report(_) => "report",
        TransmissionResult::Unreadable => "unreadable",
        TransmissionResult::TransportFailure => "transport failure",
    }
}
