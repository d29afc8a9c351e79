use serde::Serialize;

/// Simulated session counters. The "VPN" is a client-facing mock: no tunnel is
/// established, speeds and savings are synthetic.
#[derive(Clone, Debug, Serialize)]
pub struct VpnStats {
    pub is_connected: bool,
    pub data_used_mb: f64,
    pub data_saved_mb: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub connected_since: Option<chrono::NaiveDateTime>,
}

impl VpnStats {
    pub fn disconnected() -> Self {
        VpnStats {
            is_connected: false,
            data_used_mb: 0.0,
            data_saved_mb: 0.0,
            download_mbps: 0.0,
            upload_mbps: 0.0,
            connected_since: None,
        }
    }

    pub fn savings_percentage(&self) -> i64 {
        let total = self.data_used_mb + self.data_saved_mb;
        if total == 0.0 {
            return 0;
        }

        (self.data_saved_mb / total * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_percentage_of_idle_session_is_zero() {
        assert_eq!(VpnStats::disconnected().savings_percentage(), 0);
    }

    #[test]
    fn savings_percentage_rounds() {
        let stats = VpnStats {
            is_connected: true,
            data_used_mb: 100.0,
            data_saved_mb: 60.0,
            download_mbps: 12.5,
            upload_mbps: 8.3,
            connected_since: None,
        };
        // 60 / 160 = 37.5% -> 38
        assert_eq!(stats.savings_percentage(), 38);
    }
}
