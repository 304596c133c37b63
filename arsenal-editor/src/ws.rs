//! WebSocket session transport
//!
//! One connection owns one instance and at most one in-flight operation.
//! All outbound frames flow through a single-writer queue, so responses and
//! stream chunks keep their order. Cancel is processed out-of-band: the
//! operation task is aborted and the pre-operation snapshot stays
//! authoritative.

use crate::config::EditorConfig;
use crate::protocol::{parse_frame, Command, EditorResponse, OutboundFrame};
use crate::session::{execute_operation, InstanceState};
use arsenal_llm::{CancelFlag, ParserRegistry};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Editor state shared across connections.
pub struct EditorState {
    /// Server configuration.
    pub config: EditorConfig,
    /// Parser registry sessions dispatch through.
    pub registry: Arc<ParserRegistry>,
    /// Active instances, for observability and disconnect bookkeeping.
    pub active: DashMap<Uuid, Option<PathBuf>>,
}

impl EditorState {
    /// Create editor state around a configuration and registry.
    pub fn new(config: EditorConfig, registry: Arc<ParserRegistry>) -> Self {
        Self {
            config,
            registry,
            active: DashMap::new(),
        }
    }
}

/// WebSocket upgrade handler for `GET /ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<EditorState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one WebSocket connection for its whole lifetime.
async fn handle_socket(socket: WebSocket, state: Arc<EditorState>) {
    let instance = match InstanceState::initialize(
        state.config.config_path.as_deref(),
        Arc::clone(&state.registry),
    ) {
        Ok(instance) => instance,
        Err(e) => {
            error!(error = %e, "Failed to initialize session instance");
            return;
        }
    };

    let instance_id = instance.instance_id;
    info!(instance_id = %instance_id, "Editor session connected");
    state.active.insert(instance_id, instance.path.clone());

    let (mut sender, mut receiver) = socket.split();

    // Single-writer queue: every outbound frame goes through here.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundFrame>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to serialize outbound frame");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Inbound text frames; closing the socket ends the channel.
    let (in_tx, in_rx) = mpsc::channel::<String>(16);
    let reader = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if in_tx.send(text).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    let mut final_state = drive_session(in_rx, out_tx.clone(), instance).await;

    // Disconnect: attempt a final save when a path is bound.
    if final_state.path.is_some() {
        match final_state.runtime.save(None, true) {
            Ok(path) => info!(instance_id = %instance_id, path = %path.display(), "Final save"),
            Err(e) => warn!(instance_id = %instance_id, error = %e, "Final save failed"),
        }
    }

    state.active.remove(&instance_id);
    drop(out_tx);
    reader.abort();
    let _ = writer.await;
    info!(instance_id = %instance_id, "Editor session disconnected");
}

// ============================================================================
// SESSION STATE MACHINE
// ============================================================================

type OperationResult = (Option<InstanceState>, EditorResponse);

/// Drive one session over channel-shaped transport.
///
/// Idle: awaiting the next inbound command. Busy: one operation task is
/// running while the loop keeps receiving (for Cancel and rejections).
/// Returns the final state for the disconnect save.
pub async fn drive_session(
    mut inbound: mpsc::Receiver<String>,
    out: mpsc::UnboundedSender<OutboundFrame>,
    mut state: InstanceState,
) -> InstanceState {
    let mut op: Option<(JoinHandle<OperationResult>, CancelFlag)> = None;

    loop {
        let busy = op.is_some();
        tokio::select! {
            result = async {
                let (handle, _) = op.as_mut().expect("polled only while Busy");
                handle.await
            }, if busy => {
                op = None;
                let response = match result {
                    Ok((Some(next), response)) => {
                        state = next;
                        response
                    }
                    Ok((None, response)) => response,
                    Err(join_error) if join_error.is_cancelled() => {
                        EditorResponse::ok(state.id(), "Operation cancelled")
                    }
                    Err(join_error) => {
                        error!(error = %join_error, "Operation task failed");
                        EditorResponse::fail(
                            state.id(),
                            format!("Operation failed: {}", join_error),
                        )
                    }
                };
                let _ = out.send(OutboundFrame::Response(response));
            }

            frame = inbound.recv() => {
                let Some(text) = frame else {
                    // Connection closed; drop any in-flight operation.
                    if let Some((handle, cancel)) = op.take() {
                        cancel.cancel();
                        handle.abort();
                    }
                    break;
                };

                match parse_frame(&text) {
                    Err(reason) => {
                        let _ = out.send(OutboundFrame::Response(EditorResponse::fail(
                            state.id(),
                            format!("Malformed command: {}", reason),
                        )));
                    }

                    Ok(Command::Cancel) => match op.take() {
                        Some((handle, cancel)) => {
                            cancel.cancel();
                            handle.abort();
                            // A result that slipped in before the abort is
                            // discarded: the snapshot stays authoritative.
                            let _ = handle.await;
                            debug!(instance_id = %state.instance_id, "Operation cancelled");
                            let _ = out.send(OutboundFrame::Response(EditorResponse::ok(
                                state.id(),
                                "Operation cancelled; configuration rolled back",
                            )));
                        }
                        None => {
                            let _ = out.send(OutboundFrame::Response(EditorResponse::ok(
                                state.id(),
                                "No operation in progress; nothing to cancel",
                            )));
                        }
                    },

                    Ok(command) if op.is_some() => {
                        let _ = out.send(OutboundFrame::Response(EditorResponse::fail(
                            state.id(),
                            format!("Operation in progress; {} ignored", command.name()),
                        )));
                    }

                    Ok(command) => {
                        debug!(command = command.name(), "Scheduling operation");
                        let cancel = CancelFlag::new();
                        let task = tokio::spawn(execute_operation(
                            command,
                            state.clone(),
                            out.clone(),
                            cancel.clone(),
                        ));
                        op = Some((task, cancel));
                    }
                }
            }
        }
    }

    state
}

// ============================================================================
// TESTS
// ============================================================================
