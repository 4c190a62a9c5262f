use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::ws::broker::RealtimeBroker;
use crate::ws::hub::WsRegistry;

/// Shared application state for the HTTP server.
///
/// The database and the realtime broker are both optional so the app can be
/// constructed in degraded configurations (health checks still respond, and
/// tests can run against a mock connection without Redis). The websocket
/// registry is always present; without a broker it only serves same-process
/// fan-out.
#[derive(Clone)]
pub struct AppState {
    db: Option<Arc<DatabaseConnection>>,
    registry: Arc<WsRegistry>,
    broker: Option<Arc<RealtimeBroker>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db: Some(Arc::new(db)),
            registry: Arc::new(WsRegistry::new()),
            broker: None,
        }
    }

    /// Construct state with no database attached. Handlers that need the
    /// database will fail with DB_UNAVAILABLE.
    pub fn without_db() -> Self {
        Self {
            db: None,
            registry: Arc::new(WsRegistry::new()),
            broker: None,
        }
    }

    pub fn with_broker(mut self, broker: Arc<RealtimeBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_deref()
    }

    pub fn registry(&self) -> Arc<WsRegistry> {
        self.registry.clone()
    }

    pub fn broker(&self) -> Option<&Arc<RealtimeBroker>> {
        self.broker.as_ref()
    }
}
