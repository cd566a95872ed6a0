use std::sync::Arc;

use anyhow::Result;

use super::session::SessionKey;
use crate::config::Config;
use crate::imagegen::{create_provider, ImageProvider};
use crate::service::SmileService;

pub struct State {
    pub service: SmileService,
    pub session_key: SessionKey,
}

impl State {
    /// Builds state talking to the configured images API.
    pub fn new(config: &Config) -> Result<Arc<Self>> {
        let provider = create_provider(config.image_api.clone())?;
        Self::with_provider(config, provider)
    }

    pub fn with_provider(config: &Config, provider: Arc<dyn ImageProvider>) -> Result<Arc<Self>> {
        tracing::info!("Opening application root {}", config.layout.root.display());
        let service = SmileService::open(config.layout.clone(), provider)?;

        if config.uses_default_secret() {
            tracing::warn!("Session cookies are sealed with the default secret; set SMILE_SECRET");
        }
        let session_key = SessionKey::derive(&config.secret)?;

        Ok(Arc::new(Self {
            service,
            session_key,
        }))
    }
}
