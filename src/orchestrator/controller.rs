//! Session controller.
//!
//! Owns both core units, drives every remote call as a future polled on this
//! task, and emits view events for presentation layers.

use super::generation::{Busy, RequestOrchestrator, Settlement};
use super::history::{log_favorite_outcome, HistorySynchronizer, RefreshTicket};
use crate::api::{ApiError, CaptionApi};
use crate::model::{AppEvent, GenerateRequest, GenerateResponse, HistoryRecord, UiCommand};
use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Outcome of one suspension point, applied back on the controller task.
enum Completion {
    Generated(Result<GenerateResponse, ApiError>),
    Refreshed(RefreshTicket, Result<Vec<HistoryRecord>, ApiError>),
    Favorited,
}

fn generate_call(api: &dyn CaptionApi, req: GenerateRequest) -> BoxFuture<'_, Completion> {
    Box::pin(async move { Completion::Generated(api.generate(&req).await) })
}

fn refresh_call(api: &dyn CaptionApi, ticket: RefreshTicket) -> BoxFuture<'_, Completion> {
    Box::pin(async move { Completion::Refreshed(ticket, api.list_captions().await) })
}

fn favorite_call(api: &dyn CaptionApi, id: String, index: usize) -> BoxFuture<'_, Completion> {
    Box::pin(async move {
        log_favorite_outcome(&id, index, api.favorite(&id, index).await);
        Completion::Favorited
    })
}

/// Serve UI commands until `Quit`. If the command channel closes instead,
/// outstanding calls (and the refreshes they trigger) are driven to completion first.
pub(crate) async fn run_controller(
    api: Arc<dyn CaptionApi>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let api = api.as_ref();
    let mut generation = RequestOrchestrator::default();
    let mut history = HistorySynchronizer::default();
    let mut in_flight: FuturesUnordered<BoxFuture<'_, Completion>> = FuturesUnordered::new();
    let mut commands_open = true;

    in_flight.push(refresh_call(api, history.begin_refresh()));

    loop {
        if !commands_open && in_flight.is_empty() {
            break;
        }

        tokio::select! {
            // Queued commands are seen before completions, so a second submit that
            // arrives while a generation is pending is always rejected.
            biased;

            cmd = cmd_rx.recv(), if commands_open => {
                match cmd {
                    Some(UiCommand::Generate(params)) => match generation.begin(&params) {
                        Ok(req) => {
                            let _ = event_tx.send(AppEvent::GenerationStarted);
                            in_flight.push(generate_call(api, req));
                        }
                        Err(Busy) => {
                            let _ = event_tx.send(AppEvent::Info(
                                "Generation already in progress".into(),
                            ));
                        }
                    },
                    Some(UiCommand::Favorite { id, index }) => {
                        if history.can_favorite(&id) {
                            in_flight.push(favorite_call(api, id, index));
                        } else {
                            tracing::debug!(id = %id, "favorite ignored: already favorited or unknown");
                        }
                    }
                    Some(UiCommand::RefreshHistory) => {
                        in_flight.push(refresh_call(api, history.begin_refresh()));
                    }
                    Some(UiCommand::Quit) => break,
                    None => commands_open = false,
                }
            }
            Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                match done {
                    Completion::Generated(outcome) => {
                        let settled = generation.settle(outcome);
                        let ev = match settled {
                            Settlement::Success => AppEvent::GenerationSucceeded {
                                variants: generation.results().to_vec(),
                            },
                            Settlement::Failed => AppEvent::GenerationFailed {
                                message: generation.error().unwrap_or_default().to_string(),
                            },
                        };
                        let _ = event_tx.send(ev);
                        // Issued only once the success is committed above.
                        if settled.refresh_history() {
                            in_flight.push(refresh_call(api, history.begin_refresh()));
                        }
                    }
                    Completion::Refreshed(ticket, outcome) => {
                        let ev = if history.apply_refresh(ticket, outcome) {
                            AppEvent::HistoryUpdated {
                                records: history.records().to_vec(),
                            }
                        } else {
                            AppEvent::HistoryUnchanged
                        };
                        let _ = event_tx.send(ev);
                    }
                    Completion::Favorited => {
                        in_flight.push(refresh_call(api, history.begin_refresh()));
                    }
                }
            }
        }
    }

    Ok(())
}
