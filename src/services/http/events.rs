use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;

/// Per-user SSE feed of UI notification events. Advisory only: a lagged
/// subscriber skips events rather than stalling the broadcaster.
pub async fn subscribe(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.events.subscribe();

    let stream = stream::unfold((receiver, user_id), |(mut receiver, user_id)| async move {
        loop {
            match receiver.recv().await {
                Ok(event) if event.user_id() == user_id => {
                    let sse_event = Event::default()
                        .event(event.name())
                        .data(serde_json::to_string(&event).unwrap_or_default());
                    return Some((Ok(sse_event), (receiver, user_id)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("SSE subscriber lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
