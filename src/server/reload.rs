// src/server/reload.rs

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::RefreshKind;

/// Message pushed to connected browsers, serialised as
/// `{"type":"reload"}` or `{"type":"inject-css"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReloadEvent {
    Reload,
    InjectCss,
}

impl ReloadEvent {
    pub fn from_refresh(kind: RefreshKind) -> Option<Self> {
        match kind {
            RefreshKind::None => None,
            RefreshKind::Inject => Some(ReloadEvent::InjectCss),
            RefreshKind::Reload => Some(ReloadEvent::Reload),
        }
    }
}

const CHANNEL_CAPACITY: usize = 16;

/// Fan-out of refresh signals to every open WebSocket.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Send `kind` to all subscribers; returns how many received it.
    pub fn notify(&self, kind: RefreshKind) -> usize {
        let Some(event) = ReloadEvent::from_refresh(kind) else {
            return 0;
        };
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                debug!(?event, "no browsers connected");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_tagged_json() {
        assert_eq!(
            serde_json::to_string(&ReloadEvent::Reload).unwrap(),
            r#"{"type":"reload"}"#
        );
        assert_eq!(
            serde_json::to_string(&ReloadEvent::InjectCss).unwrap(),
            r#"{"type":"inject-css"}"#
        );
    }

    #[tokio::test]
    async fn subscribers_receive_refresh_and_none_is_silent() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        assert_eq!(hub.notify(RefreshKind::None), 0);
        assert_eq!(hub.notify(RefreshKind::Inject), 1);
        assert_eq!(rx.recv().await.unwrap(), ReloadEvent::InjectCss);
    }
}
