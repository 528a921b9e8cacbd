use crate::error::RelayError;
use crate::room::{ConnectionId, MembershipRegistry};
use crate::signaling::ws_handler;
use axum::Router;
use axum::routing::get;
use screenshare_core::IceServerConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

struct SignalingInner {
    ice_servers: Vec<IceServerConfig>,
    access_token: Option<String>,
    next_connection: AtomicU64,
}

#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    registry: Arc<dyn MembershipRegistry>,
}

impl SignalingService {
    pub fn new(
        registry: Arc<dyn MembershipRegistry>,
        ice_servers: Vec<IceServerConfig>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                ice_servers,
                access_token,
                next_connection: AtomicU64::new(1),
            }),
            registry,
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn registry(&self) -> &Arc<dyn MembershipRegistry> {
        &self.registry
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.inner.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    /// Единственный общий секрет; если релей запущен без него, пускаем всех.
    pub fn authorize(&self, token: Option<&str>) -> Result<(), RelayError> {
        match &self.inner.access_token {
            Some(expected) if token != Some(expected.as_str()) => Err(RelayError::Unauthorized),
            _ => Ok(()),
        }
    }

    pub fn router(self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/ws/{participant_id}", get(ws_handler))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }
}
