use std::sync::Arc;

use tracing::{info, warn};

use crate::config::db::DbProfile;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;
use crate::ws::broker::RealtimeBroker;

/// Builder for assembling application state at startup.
pub struct StateBuilder {
    db_profile: Option<DbProfile>,
    redis_url: Option<String>,
}

/// Entry point for building application state.
pub fn build_state() -> StateBuilder {
    StateBuilder {
        db_profile: None,
        redis_url: None,
    }
}

impl StateBuilder {
    /// Attach a database using the given profile. Runs migrations on startup.
    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.db_profile = Some(profile);
        self
    }

    /// Attach a Redis-backed realtime broker.
    pub fn with_redis(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let mut state = match self.db_profile {
            Some(profile) => AppState::new(bootstrap_db(profile).await?),
            None => AppState::without_db(),
        };

        match self.redis_url {
            Some(url) => {
                let broker = Arc::new(RealtimeBroker::connect(&url, state.registry()).await?);
                broker.clone().spawn_subscriber();
                info!("realtime broker connected");
                state = state.with_broker(broker);
            }
            None => {
                warn!("REDIS_URL not set; change feed fan-out is disabled");
            }
        }

        Ok(state)
    }
}
