use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::server::state::AppState;

/// Streams committed votes as server-sent events. Slow clients miss events
/// rather than slowing down voting.
pub async fn vote_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.service.subscribe()).map(|received| {
        let event = match received {
            Ok(vote) => Event::default()
                .event("vote")
                .json_data(&vote)
                .unwrap_or_else(|_| Event::default().comment("unserializable vote event")),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Vote feed subscriber lagged");
                Event::default().comment("lagged")
            }
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
