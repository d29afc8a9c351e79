use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::billing::BillingRequest;
use super::events::UiEvents;
use super::{RequestHandler, Service, ServiceError};
use crate::models::events::UiEvent;
use crate::models::vpn::VpnStats;

pub const USAGE_TICK_INTERVAL: Duration = Duration::from_secs(30);

pub enum VpnRequest {
    Connect {
        user_id: String,
        response: oneshot::Sender<Result<VpnStats, ServiceError>>,
    },
    Disconnect {
        user_id: String,
        response: oneshot::Sender<Result<VpnStats, ServiceError>>,
    },
    GetStats {
        user_id: String,
        response: oneshot::Sender<Result<VpnStats, ServiceError>>,
    },
}

/// One live session. The id ties a tick task to the connect call that spawned
/// it: a reconnect mints a new id, and a ticker whose id no longer matches the
/// stored session stops instead of double-billing the user.
#[derive(Clone)]
struct VpnSession {
    id: String,
    stats: VpnStats,
}

/// Simulated sessions. No tunnel exists; counters and speeds are synthetic,
/// but the usage ticks feed the real billing dispatcher.
#[derive(Clone)]
pub struct VpnRequestHandler {
    sessions: Arc<DashMap<String, VpnSession>>,
    billing_channel: mpsc::Sender<BillingRequest>,
    events: UiEvents,
}

impl VpnRequestHandler {
    pub fn new(billing_channel: mpsc::Sender<BillingRequest>, events: UiEvents) -> Self {
        VpnRequestHandler {
            sessions: Arc::new(DashMap::new()),
            billing_channel,
            events,
        }
    }

    fn connect(&self, user_id: &str) -> VpnStats {
        if let Some(session) = self.sessions.get(user_id) {
            return session.stats.clone();
        }

        let session_id = Uuid::new_v4().hyphenated().to_string();
        let stats = VpnStats {
            is_connected: true,
            data_used_mb: 0.0,
            data_saved_mb: 0.0,
            download_mbps: 12.5,
            upload_mbps: 8.3,
            connected_since: Some(Utc::now().naive_utc()),
        };
        self.sessions.insert(
            user_id.to_string(),
            VpnSession {
                id: session_id.clone(),
                stats: stats.clone(),
            },
        );
        self.start_usage_tick_task(user_id.to_string(), session_id);

        log::info!("VPN session connected for user {}", user_id);
        stats
    }

    fn disconnect(&self, user_id: &str) -> VpnStats {
        self.sessions.remove(user_id);
        log::info!("VPN session disconnected for user {}", user_id);

        VpnStats::disconnected()
    }

    fn get_stats(&self, user_id: &str) -> VpnStats {
        self.sessions
            .get(user_id)
            .map(|session| session.stats.clone())
            .unwrap_or_else(VpnStats::disconnected)
    }

    /// The tick task runs until its session is removed or replaced by a
    /// reconnect. Each tick simulates 1-5MB of usage with a 60-70% savings
    /// rate and forwards the amount to billing under a fresh event id.
    fn start_usage_tick_task(&self, user_id: String, session_id: String) {
        let sessions = self.sessions.clone();
        let billing_channel = self.billing_channel.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(USAGE_TICK_INTERVAL);
            interval.tick().await;

            loop {
                interval.tick().await;

                let (data_mb, saved_mb, download_mbps, upload_mbps) = {
                    let mut rng = rand::thread_rng();
                    let data_mb: f64 = rng.gen_range(1.0..5.0);
                    let savings_rate: f64 = rng.gen_range(0.6..0.7);
                    (
                        data_mb,
                        data_mb * savings_rate,
                        10.0 + rng.gen_range(0.0..10.0),
                        6.0 + rng.gen_range(0.0..6.0),
                    )
                };

                {
                    let mut session = match sessions.get_mut(&user_id) {
                        Some(session) if session.id == session_id => session,
                        _ => break,
                    };
                    session.stats.data_used_mb += data_mb;
                    session.stats.data_saved_mb += saved_mb;
                    session.stats.download_mbps = download_mbps;
                    session.stats.upload_mbps = upload_mbps;
                }

                events.emit(UiEvent::VpnDataUsage {
                    user_id: user_id.clone(),
                    data_mb,
                });

                let tick = BillingRequest::UsageTick {
                    event_id: Uuid::new_v4().hyphenated().to_string(),
                    user_id: user_id.clone(),
                    data_mb,
                };
                if billing_channel.send(tick).await.is_err() {
                    log::error!("Billing channel closed, stopping tick task");
                    break;
                }
            }
        });
    }
}

#[async_trait]
impl RequestHandler<VpnRequest> for VpnRequestHandler {
    async fn handle_request(&self, request: VpnRequest) {
        match request {
            VpnRequest::Connect { user_id, response } => {
                let stats = self.connect(&user_id);
                let _ = response.send(Ok(stats));
            }
            VpnRequest::Disconnect { user_id, response } => {
                let stats = self.disconnect(&user_id);
                let _ = response.send(Ok(stats));
            }
            VpnRequest::GetStats { user_id, response } => {
                let stats = self.get_stats(&user_id);
                let _ = response.send(Ok(stats));
            }
        }
    }
}

pub struct VpnService;

impl VpnService {
    pub fn new() -> Self {
        VpnService {}
    }
}

#[async_trait]
impl Service<VpnRequest, VpnRequestHandler> for VpnService {}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_with_channel() -> (VpnRequestHandler, mpsc::Receiver<BillingRequest>) {
        let (billing_tx, billing_rx) = mpsc::channel(64);
        (VpnRequestHandler::new(billing_tx, UiEvents::new(8)), billing_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_replaces_the_tick_task() {
        let (handler, mut billing_rx) = handler_with_channel();

        handler.connect("user-1");
        tokio::time::advance(Duration::from_secs(10)).await;
        handler.disconnect("user-1");
        handler.connect("user-1");

        // Two minutes of connected time, stepped so every due timer fires. A
        // single ticker on a 30s interval fits at most five ticks in here; a
        // leaked ticker from the first session would roughly double that.
        for _ in 0..12 {
            tokio::time::advance(Duration::from_secs(10)).await;
        }
        handler.disconnect("user-1");
        tokio::time::advance(USAGE_TICK_INTERVAL * 2).await;

        let mut ticks = 0;
        while let Ok(BillingRequest::UsageTick { .. }) = billing_rx.try_recv() {
            ticks += 1;
        }
        assert!(ticks >= 1, "reconnected session produced no ticks");
        assert!(ticks <= 5, "stale ticker kept billing: {} ticks", ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_stops_the_tick_task() {
        let (handler, mut billing_rx) = handler_with_channel();

        handler.connect("user-1");
        handler.disconnect("user-1");

        tokio::time::advance(USAGE_TICK_INTERVAL * 3).await;

        assert!(billing_rx.try_recv().is_err());
        assert!(!handler.get_stats("user-1").is_connected);
    }
}
