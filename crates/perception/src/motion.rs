//! Motion-status polling
//!
//! The frame loop never waits on the network. A background task queries the
//! actuation node on a fixed period and publishes the answer into a cache;
//! any failure publishes `false`.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::PerceptionError;

#[derive(Debug, Deserialize)]
struct MotionStatus {
    moving: bool,
}

/// HTTP client for `GET /is_moving`
#[derive(Debug, Clone)]
pub struct MotionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MotionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PerceptionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PerceptionError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/is_moving", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One bounded query
    pub async fn query(&self) -> Result<bool, PerceptionError> {
        let transport = |e: reqwest::Error| PerceptionError::Transport(e.to_string());

        let status: MotionStatus = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        Ok(status.moving)
    }
}

/// Read side of the motion cache
#[derive(Debug, Clone)]
pub struct MotionCache {
    rx: watch::Receiver<bool>,
}

impl MotionCache {
    /// Cache that always answers `moving`, for replay without an actuation node
    pub fn constant(moving: bool) -> Self {
        let (_tx, rx) = watch::channel(moving);
        Self { rx }
    }

    pub fn is_moving(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Background task keeping a [`MotionCache`] fresh
#[derive(Debug)]
pub struct MotionPoller {
    cache: MotionCache,
    task: JoinHandle<()>,
}

impl MotionPoller {
    /// Start polling; the cache reads `false` until the first successful answer
    pub fn spawn(client: MotionClient, period: Duration, mut shutdown: watch::Receiver<bool>) -> Self {
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!("Polling motion status at {} every {:?}", client.endpoint(), period);
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut failing = false;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match client.query().await {
                            Ok(moving) => {
                                if failing {
                                    info!("Motion status reachable again");
                                    failing = false;
                                }
                                tx.send_replace(moving);
                            }
                            Err(e) => {
                                metrics::counter!("perception_motion_query_failures_total").increment(1);
                                if failing {
                                    debug!("{}", e);
                                } else {
                                    warn!("{}; assuming not moving", e);
                                    failing = true;
                                }
                                tx.send_replace(false);
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Motion poller stopped");
        });

        Self {
            cache: MotionCache { rx },
            task,
        }
    }

    pub fn cache(&self) -> MotionCache {
        self.cache.clone()
    }

    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("Motion poller task failed: {}", e);
        }
    }
}
