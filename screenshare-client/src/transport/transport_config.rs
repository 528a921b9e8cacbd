use screenshare_core::IceServerConfig;
use screenshare_core::utils::default_stun_urls;
use std::time::Duration;

/// Конфигурация для WebRTC
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Used until the relay announces its own list in `ice-config`.
    pub ice_servers: Vec<IceServerConfig>,
    /// Upper bound for every single transport call.
    pub op_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: default_stun_urls(),
                username: None,
                credential: None,
            }],
            op_timeout: Duration::from_secs(10),
        }
    }
}
