//! Round-robin address pool refreshed from discovery

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::BalancerConfig;
use crate::discovery::Discovery;
use crate::error::{ClientError, ClientResult};

/// Shortest refresh period the balancer will run with
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// Addresses plus rotation cursor, always guarded by one lock
#[derive(Debug, Default)]
struct AddressPool {
    addresses: Vec<String>,
    cursor: usize,
}

/// Snapshot of the balancer's refresh health
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancerStatus {
    /// Current number of upstreams
    pub size: usize,
    /// Message of the most recent failed discovery call, cleared by the next success
    pub last_refresh_error: Option<String>,
    /// Successful discovery calls, including the seeding one
    pub refreshes: u64,
    /// Failed discovery calls, including the seeding one
    pub failed_refreshes: u64,
}

#[derive(Debug, Default)]
struct RefreshStats {
    last_error: Option<String>,
    refreshes: u64,
    failed_refreshes: u64,
}

struct Shared {
    pool: Mutex<AddressPool>,
    stats: Mutex<RefreshStats>,
    discovery: Arc<dyn Discovery>,
}

impl Shared {
    /// One discovery round. On failure the previous list is kept.
    async fn refresh(&self) {
        match self.discovery.get().await {
            Ok(addresses) => {
                {
                    let mut pool = self.pool.lock();
                    if pool.addresses != addresses {
                        debug!(
                            previous = pool.addresses.len(),
                            current = addresses.len(),
                            "Upstream list changed"
                        );
                    }
                    pool.addresses = addresses;
                }
                let mut stats = self.stats.lock();
                stats.refreshes += 1;
                stats.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "Discovery refresh failed, keeping previous upstreams");
                let mut stats = self.stats.lock();
                stats.failed_refreshes += 1;
                stats.last_error = Some(err.to_string());
            }
        }
    }
}

/// Round-robin balancer over a periodically refreshed address pool.
///
/// The refresh task runs until [`Balancer::stop`] is called or the balancer is
/// dropped.
pub struct Balancer {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Balancer {
    /// Seed the pool with one discovery call and start the refresh task.
    ///
    /// A failing seed leaves the pool empty; it is not reported as an error.
    pub async fn start(discovery: Arc<dyn Discovery>, mut config: BalancerConfig) -> Self {
        if config.refresh_interval < MIN_REFRESH_INTERVAL {
            warn!(
                requested = ?config.refresh_interval,
                using = ?MIN_REFRESH_INTERVAL,
                "Refresh interval too short, clamping"
            );
            config.refresh_interval = MIN_REFRESH_INTERVAL;
        }

        let shared = Arc::new(Shared {
            pool: Mutex::new(AddressPool::default()),
            stats: Mutex::new(RefreshStats::default()),
            discovery,
        });

        shared.refresh().await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(refresh_loop(
            Arc::clone(&shared),
            config,
            cancel.child_token(),
        ));

        Self {
            shared,
            cancel,
            refresh_task: Mutex::new(Some(task)),
        }
    }

    /// Current address count
    pub fn size(&self) -> usize {
        self.shared.pool.lock().addresses.len()
    }

    /// Next address in rotation
    pub fn next(&self) -> ClientResult<String> {
        let mut pool = self.shared.pool.lock();
        if pool.addresses.is_empty() {
            return Err(ClientError::NoLiveUpstreams);
        }

        let index = pool.cursor % pool.addresses.len();
        pool.cursor = pool.cursor.wrapping_add(1);
        Ok(pool.addresses[index].clone())
    }

    /// Current address list, in rotation order
    pub fn addresses(&self) -> Vec<String> {
        self.shared.pool.lock().addresses.clone()
    }

    pub fn status(&self) -> BalancerStatus {
        let size = self.size();
        let stats = self.shared.stats.lock();
        BalancerStatus {
            size,
            last_refresh_error: stats.last_error.clone(),
            refreshes: stats.refreshes,
            failed_refreshes: stats.failed_refreshes,
        }
    }

    /// Run one discovery round now, outside the periodic schedule
    pub async fn refresh(&self) {
        self.shared.refresh().await;
    }

    /// Cancel the refresh task. The pool keeps its last addresses.
    pub fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
    }

    /// Whether the refresh task is still alive
    pub fn is_running(&self) -> bool {
        self.refresh_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Balancer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Balancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Balancer")
            .field("status", &self.status())
            .finish()
    }
}

async fn refresh_loop(shared: Arc<Shared>, config: BalancerConfig, cancel: CancellationToken) {
    let period = config.refresh_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.refresh() => {}
        }
    }

    debug!("Balancer refresh task stopped");
}
