use clap::Parser;
use screenshare_core::IceServerConfig;
use screenshare_core::utils::default_stun_urls;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "screenshare-relay")]
#[command(about = "Signaling relay for peer-to-peer screen sharing rooms")]
pub struct RelayConfig {
    /// Address the WebSocket endpoint listens on.
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// STUN server handed to clients; repeat or comma-separate for several.
    #[arg(long = "stun", env = "RELAY_STUN_URLS", value_delimiter = ',')]
    pub stun_urls: Vec<String>,

    /// Shared access token required in every `join`.
    #[arg(long, env = "RELAY_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl RelayConfig {
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let urls = if self.stun_urls.is_empty() {
            default_stun_urls()
        } else {
            self.stun_urls.clone()
        };

        vec![IceServerConfig {
            urls,
            username: None,
            credential: None,
        }]
    }
}
