use tokio::sync::broadcast;

use crate::models::events::UiEvent;

/// Fan-out for UI notification events. Sends are best-effort; an event with no
/// subscriber is simply dropped.
#[derive(Clone)]
pub struct UiEvents {
    sender: broadcast::Sender<UiEvent>,
}

impl UiEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        UiEvents { sender }
    }

    pub fn emit(&self, event: UiEvent) {
        log::debug!("UI event {} for {}", event.name(), event.user_id());
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let events = UiEvents::new(8);
        let mut rx = events.subscribe();

        events.emit(UiEvent::PlanUpdated {
            user_id: "user-1".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "plan-updated");
        assert_eq!(event.user_id(), "user-1");
    }

    #[test]
    fn emit_without_subscriber_is_dropped() {
        let events = UiEvents::new(8);
        events.emit(UiEvent::PlanExhausted {
            user_id: "user-1".to_string(),
        });
    }
}
