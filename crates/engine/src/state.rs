use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Result;

use crate::api::middleware::CorsPolicy;
use crate::config::Config;
use crate::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<Upstream>,
    pub cors: Arc<CorsPolicy>,
    pub clock: Arc<PingClock>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let upstream = Upstream::new(config)?;
        let cors = CorsPolicy::new(config.allowed_origins.iter().cloned());

        Ok(Self {
            upstream: Arc::new(upstream),
            cors: Arc::new(cors),
            clock: Arc::new(PingClock::default()),
        })
    }
}

/// Wall clock in epoch milliseconds that never hands out a smaller value than before.
#[derive(Default)]
pub struct PingClock {
    last: AtomicU64,
}

impl PingClock {
    pub fn now_ms(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let previous = self.last.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}
