// Chunked NDJSON streaming of editor notifications
use crate::application::notifications::Notification;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use tokio::sync::broadcast;

/// One notification per line.
fn serialize_line(notification: &Notification) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(notification)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Notifications for `dashboard_id`, or for every dashboard when `None`.
/// A listener that falls behind skips what it missed and keeps going.
pub fn notification_stream(
    mut rx: broadcast::Receiver<Notification>,
    dashboard_id: Option<String>,
) -> impl Stream<Item = Notification> + Send + 'static {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    if dashboard_id.as_deref().is_none_or(|id| id == notification.dashboard_id) {
                        yield notification;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("notification listener lagged, skipped {}", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

pub fn ndjson_response<S>(stream: S) -> impl IntoResponse
where
    S: Stream<Item = Notification> + Send + 'static,
{
    let byte_stream = stream.map(|n| serialize_line(&n));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notifications::{NotificationHub, NotificationKind};

    #[tokio::test]
    async fn test_stream_filters_by_dashboard() {
        let hub = NotificationHub::new();
        let stream = notification_stream(hub.subscribe(), Some("a".to_string()));
        futures::pin_mut!(stream);

        hub.warning("b", NotificationKind::DuplicateId, "ignored");
        hub.error("a", NotificationKind::InvalidImport, "bad file");

        let first = stream.next().await.unwrap();
        assert_eq!(first.dashboard_id, "a");
        assert_eq!(first.kind, NotificationKind::InvalidImport);
    }

    #[test]
    fn test_lines_are_newline_terminated_json() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe();
        hub.info("a", NotificationKind::Saved, "ok");
        let line = serialize_line(&rx.try_recv().unwrap()).unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(&line[..line.len() - 1]).unwrap();
        assert_eq!(value["kind"], "saved");
        assert_eq!(value["dashboardId"], "a");
    }
}
