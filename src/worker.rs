use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::api::ApiClient;
use crate::photos::list_photos;
use crate::prediction::interpret_prediction;
use crate::state::{Delta, PredictionOutcome, WorkerCommand};
use crate::transform::{TransportEncoding, encode_file};

/// Runs commands one at a time until the command channel closes.
pub fn spawn_worker(
    api: ApiClient,
    tx: Sender<Delta>,
    cmd_rx: Receiver<WorkerCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for cmd in cmd_rx {
            for delta in run_command(&api, cmd) {
                if tx.send(delta).is_err() {
                    return;
                }
            }
        }
    })
}

pub fn run_command(api: &ApiClient, cmd: WorkerCommand) -> Vec<Delta> {
    match cmd {
        WorkerCommand::Login(credentials) => match api.login(&credentials) {
            Ok(()) => vec![Delta::Authorized(credentials)],
            Err(err) => vec![Delta::AuthFailed(err.to_string())],
        },
        WorkerCommand::SignUp(form) => {
            let credentials = match form.validate() {
                Ok(credentials) => credentials,
                Err(err) => return vec![Delta::AuthFailed(err.to_string())],
            };
            match api.sign_up(&form) {
                Ok(()) => vec![Delta::Authorized(credentials)],
                Err(err) => vec![Delta::AuthFailed(err.to_string())],
            }
        }
        WorkerCommand::Predict { credentials, image } => {
            let encoded = match encode_file(&image, TransportEncoding::Raw) {
                Ok(encoded) => encoded,
                Err(err) => {
                    let detail = format!("{err:#}");
                    tracing::warn!(path = %image.display(), error = %detail, "encode failed");
                    return vec![Delta::PredictionFailed(format!(
                        "Could not prepare the photo: {detail}"
                    ))];
                }
            };
            match api.predict(&credentials, encoded) {
                Ok(resp) => {
                    let binary = interpret_prediction(&resp.binary);
                    let multiclass = interpret_prediction(&resp.multiclass);
                    let mut deltas = Vec::new();
                    if binary.is_empty() {
                        tracing::warn!(len = resp.binary.len(), "unexpected binary prediction length");
                        deltas.push(Delta::Log(format!(
                            "[WARN] Binary prediction had {} scores",
                            resp.binary.len()
                        )));
                    }
                    deltas.push(Delta::PredictionReady(PredictionOutcome::new(
                        binary, multiclass,
                    )));
                    deltas
                }
                Err(err) => vec![Delta::PredictionFailed(err.to_string())],
            }
        }
        WorkerCommand::FetchHistory(credentials) => match api.history(&credentials) {
            Ok(entries) => vec![Delta::SetHistory(entries)],
            Err(err) => {
                tracing::warn!(error = %err, "history fetch failed");
                vec![Delta::HistoryFailed(err.to_string())]
            }
        },
        WorkerCommand::ScanPhotos(dir) => match list_photos(&dir) {
            Ok(photos) => vec![Delta::SetPhotos(photos)],
            Err(err) => vec![
                Delta::Log(format!("[WARN] Photo scan error: {err:#}")),
                Delta::SetPhotos(Vec::new()),
            ],
        },
    }
}
