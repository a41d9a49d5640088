//! Background network work.
//!
//! Each `Spawn*` effect becomes one tokio task. Tasks only hold an
//! `Arc<dyn KokoBackend>` and a channel sender: they never touch `App`, and
//! report back with `Action`s that the event loop drains between frames.

use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use futures::StreamExt;
use log::{debug, info, warn};

use crate::api::{KokoBackend, StreamEvent};
use crate::core::action::{Action, Effect};

/// Send an action to the event loop. Returns false once the loop is gone.
fn send(tx: &mpsc::Sender<Action>, action: Action) -> bool {
    if tx.send(action).is_err() {
        warn!("Failed to send action: receiver dropped");
        return false;
    }
    true
}

/// Start the I/O an effect asks for. `None` and `Quit` are handled by the caller.
pub fn spawn_effect(effect: Effect, backend: &Arc<dyn KokoBackend>, tx: &mpsc::Sender<Action>) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    match effect {
        Effect::None | Effect::Quit => {}
        Effect::SpawnChatStream {
            conversation_id,
            message_id,
            text,
        } => {
            tokio::spawn(async move {
                run_chat_stream(backend, conversation_id, message_id, text, tx).await;
            });
        }
        Effect::SpawnUpload {
            conversation_id,
            message_id,
            path,
        } => {
            tokio::spawn(async move {
                run_upload(backend, conversation_id, message_id, path, tx).await;
            });
        }
        Effect::SpawnLoadMemories => {
            tokio::spawn(async move { run_load_memories(backend, tx).await });
        }
        Effect::SpawnSaveMemory(note) => {
            tokio::spawn(async move { run_save_memory(backend, note, tx).await });
        }
        Effect::SpawnClearMemories => {
            tokio::spawn(async move { run_clear_memories(backend, tx).await });
        }
    }
}

/// Stream a reply into `message_id`, ending with exactly one of
/// `ResponseDone` or `ResponseFailed`.
pub async fn run_chat_stream(
    backend: Arc<dyn KokoBackend>,
    conversation_id: String,
    message_id: String,
    text: String,
    tx: mpsc::Sender<Action>,
) {
    info!("Opening chat stream for {}", conversation_id);
    let request_start = std::time::Instant::now();

    let mut stream = match backend.chat_stream(&text).await {
        Ok(stream) => stream,
        Err(error) => {
            send(
                &tx,
                Action::ResponseFailed {
                    conversation_id,
                    message_id,
                    error,
                },
            );
            return;
        }
    };

    let mut deltas = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(StreamEvent::Delta(text)) => {
                deltas += 1;
                let action = Action::ResponseDelta {
                    conversation_id: conversation_id.clone(),
                    message_id: message_id.clone(),
                    text,
                };
                if !send(&tx, action) {
                    return;
                }
            }
            Ok(StreamEvent::Done) => break,
            Err(error) => {
                send(
                    &tx,
                    Action::ResponseFailed {
                        conversation_id,
                        message_id,
                        error,
                    },
                );
                return;
            }
        }
    }

    debug!(
        "Chat stream for {} finished: {} deltas in {}ms",
        conversation_id,
        deltas,
        request_start.elapsed().as_millis()
    );
    send(
        &tx,
        Action::ResponseDone {
            conversation_id,
            message_id,
        },
    );
}

pub async fn run_upload(
    backend: Arc<dyn KokoBackend>,
    conversation_id: String,
    message_id: String,
    path: PathBuf,
    tx: mpsc::Sender<Action>,
) {
    let action = match backend.upload_document(&path).await {
        Ok(receipt) => Action::UploadSucceeded {
            conversation_id,
            message_id,
            message: receipt.message,
        },
        Err(error) => Action::UploadFailed {
            conversation_id,
            message_id,
            error,
        },
    };
    send(&tx, action);
}

/// A failed load is reported as an empty list.
pub async fn run_load_memories(backend: Arc<dyn KokoBackend>, tx: mpsc::Sender<Action>) {
    let entries = backend.list_memories().await.unwrap_or_else(|error| {
        warn!("Failed to load memories: {}", error);
        Vec::new()
    });
    send(&tx, Action::MemoriesLoaded(entries));
}

pub async fn run_save_memory(backend: Arc<dyn KokoBackend>, note: String, tx: mpsc::Sender<Action>) {
    let action = match backend.save_memory(&note).await {
        Ok(entry) => Action::MemorySaved(entry),
        Err(error) => Action::MemorySaveFailed(error),
    };
    send(&tx, action);
}

pub async fn run_clear_memories(backend: Arc<dyn KokoBackend>, tx: mpsc::Sender<Action>) {
    let action = match backend.clear_memories().await {
        Ok(()) => Action::MemoriesCleared,
        Err(error) => Action::MemoryClearFailed(error),
    };
    send(&tx, action);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MemoryEntry, UploadReceipt};
    use crate::test_support::ScriptedBackend;

    fn backend(scripted: ScriptedBackend) -> Arc<dyn KokoBackend> {
        Arc::new(scripted)
    }

    fn drain(rx: &mpsc::Receiver<Action>) -> Vec<Action> {
        rx.try_iter().collect()
    }

    fn delta(text: &str) -> Action {
        Action::ResponseDelta {
            conversation_id: "c1".into(),
            message_id: "m1".into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn test_chat_stream_forwards_deltas_then_done() {
        let (tx, rx) = mpsc::channel();
        let scripted = ScriptedBackend {
            events: vec![
                Ok(StreamEvent::Delta("Hel".into())),
                Ok(StreamEvent::Delta("lo".into())),
                Ok(StreamEvent::Done),
                Ok(StreamEvent::Delta("ignored".into())),
            ],
            ..Default::default()
        };
        run_chat_stream(backend(scripted), "c1".into(), "m1".into(), "hi".into(), tx).await;
        assert_eq!(
            drain(&rx),
            vec![
                delta("Hel"),
                delta("lo"),
                Action::ResponseDone {
                    conversation_id: "c1".into(),
                    message_id: "m1".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_stream_end_without_done_still_finishes() {
        let (tx, rx) = mpsc::channel();
        let scripted = ScriptedBackend {
            events: vec![Ok(StreamEvent::Delta("partial".into()))],
            ..Default::default()
        };
        run_chat_stream(backend(scripted), "c1".into(), "m1".into(), "hi".into(), tx).await;
        let actions = drain(&rx);
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[1], Action::ResponseDone { .. }));
    }

    #[tokio::test]
    async fn test_chat_stream_error_mid_stream() {
        let (tx, rx) = mpsc::channel();
        let scripted = ScriptedBackend {
            events: vec![
                Ok(StreamEvent::Delta("Hel".into())),
                Err(ApiError::Parse("bad json".into())),
                Ok(StreamEvent::Delta("never".into())),
            ],
            ..Default::default()
        };
        run_chat_stream(backend(scripted), "c1".into(), "m1".into(), "hi".into(), tx).await;
        assert_eq!(
            drain(&rx),
            vec![
                delta("Hel"),
                Action::ResponseFailed {
                    conversation_id: "c1".into(),
                    message_id: "m1".into(),
                    error: ApiError::Parse("bad json".into()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_stream_open_failure() {
        let (tx, rx) = mpsc::channel();
        let error = ApiError::Http {
            status: 500,
            message: "boom".into(),
        };
        let scripted = ScriptedBackend {
            open_error: Some(error.clone()),
            ..Default::default()
        };
        run_chat_stream(backend(scripted), "c1".into(), "m1".into(), "hi".into(), tx).await;
        assert_eq!(
            drain(&rx),
            vec![Action::ResponseFailed {
                conversation_id: "c1".into(),
                message_id: "m1".into(),
                error,
            }]
        );
    }

    #[tokio::test]
    async fn test_upload_success_and_failure() {
        let (tx, rx) = mpsc::channel();
        let ok = ScriptedBackend {
            upload: Ok(UploadReceipt {
                message: Some("Indexed 3 pages".into()),
            }),
            ..Default::default()
        };
        run_upload(backend(ok), "c1".into(), "m1".into(), "a.pdf".into(), tx.clone()).await;

        let failing = ScriptedBackend {
            upload: Err(ApiError::File("missing".into())),
            ..Default::default()
        };
        run_upload(backend(failing), "c1".into(), "m2".into(), "b.pdf".into(), tx).await;

        assert_eq!(
            drain(&rx),
            vec![
                Action::UploadSucceeded {
                    conversation_id: "c1".into(),
                    message_id: "m1".into(),
                    message: Some("Indexed 3 pages".into()),
                },
                Action::UploadFailed {
                    conversation_id: "c1".into(),
                    message_id: "m2".into(),
                    error: ApiError::File("missing".into()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_load_memories_failure_is_empty_list() {
        let (tx, rx) = mpsc::channel();
        let scripted = ScriptedBackend {
            memories: Err(ApiError::Network("refused".into())),
            ..Default::default()
        };
        run_load_memories(backend(scripted), tx).await;
        assert_eq!(drain(&rx), vec![Action::MemoriesLoaded(Vec::new())]);
    }

    #[tokio::test]
    async fn test_save_and_clear_memories() {
        let (tx, rx) = mpsc::channel();
        let entry = MemoryEntry {
            text: "likes tea".into(),
            created_at: "2024-01-01".into(),
        };
        let scripted = ScriptedBackend {
            saved: Ok(Some(entry.clone())),
            cleared: Err(ApiError::Http {
                status: 500,
                message: "Failed to clear memories.".into(),
            }),
            ..Default::default()
        };
        let backend = backend(scripted);
        run_save_memory(Arc::clone(&backend), "likes tea".into(), tx.clone()).await;
        run_clear_memories(backend, tx).await;

        let actions = drain(&rx);
        assert_eq!(actions[0], Action::MemorySaved(Some(entry)));
        assert!(matches!(actions[1], Action::MemoryClearFailed(_)));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_stops_stream() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let scripted = ScriptedBackend {
            events: vec![Ok(StreamEvent::Delta("a".into()))],
            ..Default::default()
        };
        // Must return instead of looping or panicking
        run_chat_stream(backend(scripted), "c1".into(), "m1".into(), "hi".into(), tx).await;
    }

    #[tokio::test]
    async fn test_spawn_effect_reports_back() {
        let (tx, rx) = mpsc::channel();
        let backend = backend(ScriptedBackend::default());
        spawn_effect(Effect::SpawnClearMemories, &backend, &tx);
        let action = tokio::task::spawn_blocking(move || rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(action, Action::MemoriesCleared);
    }
}
