use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use cf_core::{FabricConfig, NetworkId};
use cf_net::BridgeNetwork;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::{atomic, chain};

struct QueueState {
    networks: HashMap<NetworkId, Arc<AsyncMutex<BridgeNetwork>>>,
    dirty: HashSet<NetworkId>,
    last_commit: HashMap<NetworkId, Instant>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            networks: HashMap::new(),
            dirty: HashSet::new(),
            last_commit: HashMap::new(),
        }
    }
}

struct WorkerHandle {
    join: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

/// Process-wide singleton that coalesces pending filter-chain rebuilds
/// across every bridge using per-pair filtering (SPEC_FULL.md 4.F).
/// Lazily starts a single background worker on first `register`, stops it
/// on the last `unregister`.
pub struct FilterCommitQueue {
    atomic_file: String,
    tick_period: Duration,
    state: Arc<AsyncMutex<QueueState>>,
    commit_lock: Arc<AsyncMutex<()>>,
    worker: AsyncMutex<Option<WorkerHandle>>,
}

impl FilterCommitQueue {
    pub fn new(atomic_file: impl Into<String>, tick_period: Duration) -> Self {
        Self {
            atomic_file: atomic_file.into(),
            tick_period,
            state: Arc::new(AsyncMutex::new(QueueState::new())),
            commit_lock: Arc::new(AsyncMutex::new(())),
            worker: AsyncMutex::new(None),
        }
    }

    /// The process-lifetime instance, initialized from whichever
    /// `FabricConfig` registers first.
    pub fn global(config: &FabricConfig) -> &'static FilterCommitQueue {
        static GLOBAL: OnceLock<FilterCommitQueue> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            FilterCommitQueue::new(config.atomic_file.to_string_lossy().into_owned(), config.tick_period)
        })
    }

    pub async fn register(&self, id: NetworkId, network: Arc<AsyncMutex<BridgeNetwork>>) {
        {
            let mut state = self.state.lock().await;
            state.networks.insert(id, network);
            state.last_commit.insert(id, Instant::now());
        }
        self.start_worker_if_needed().await;
    }

    pub async fn unregister(&self, id: NetworkId) {
        let remaining = {
            let mut state = self.state.lock().await;
            state.networks.remove(&id);
            state.last_commit.remove(&id);
            state.dirty.remove(&id);
            state.networks.len()
        };
        if remaining == 0 {
            self.stop_worker().await;
        }
    }

    pub async fn mark_dirty(&self, id: NetworkId) {
        self.state.lock().await.dirty.insert(id);
    }

    pub async fn is_registered(&self, id: NetworkId) -> bool {
        self.state.lock().await.networks.contains_key(&id)
    }

    async fn start_worker_if_needed(&self) {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let state = self.state.clone();
        let commit_lock = self.commit_lock.clone();
        let atomic_file = self.atomic_file.clone();
        let tick_period = self.tick_period;

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        run_tick(&state, &commit_lock, &atomic_file, tick_period).await;
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        *worker = Some(WorkerHandle {
            join,
            shutdown: shutdown_tx,
        });
    }

    async fn stop_worker(&self) {
        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take() {
            let _ = handle.shutdown.send(());
            let _ = handle.join.await;
        }
    }
}

async fn run_tick(state: &Arc<AsyncMutex<QueueState>>, commit_lock: &Arc<AsyncMutex<()>>, atomic_file: &str, tick_period: Duration) {
    let due: Vec<NetworkId> = {
        let st = state.lock().await;
        let now = Instant::now();
        st.dirty
            .iter()
            .copied()
            .filter(|id| st.networks.contains_key(id))
            .filter(|id| {
                st.last_commit
                    .get(id)
                    .map(|t| now.duration_since(*t) >= tick_period)
                    .unwrap_or(true)
            })
            .collect()
    };

    for id in due {
        let net_arc = {
            let st = state.lock().await;
            st.networks.get(&id).cloned()
        };

        // Network deregistered between the dirty scan and now: drop it
        // from the dirty set without committing anything. This is the
        // stale-network defence from SPEC_FULL.md 4.F.
        let Some(net_arc) = net_arc else {
            state.lock().await.dirty.remove(&id);
            continue;
        };

        let result = {
            let mut bridge = net_arc.lock().await;
            let cmds = chain::build_chain_commands(&mut bridge.base, &bridge.net, atomic_file);
            atomic::commit(&bridge.net, atomic_file, cmds, commit_lock).await
        };

        if let Err(err) = result {
            tracing::warn!(network = %id, %err, "filter commit failed");
        }

        let mut st = state.lock().await;
        st.last_commit.insert(id, Instant::now());
        st.dirty.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{Backend, Interface, NetworkId, Policy};
    use cf_exec::RecordingExecutor;
    use cf_net::{BridgeNetwork, NetClient};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex as AsyncMutex;

    #[tokio::test]
    async fn register_starts_worker_and_unregister_stops_it() {
        let queue = FilterCommitQueue::new("/tmp/test.atomic", Duration::from_millis(20));
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec);
        let bridge = Arc::new(AsyncMutex::new(BridgeNetwork::new(NetworkId(1), "b.1.sess", Policy::Drop, net)));

        queue.register(NetworkId(1), bridge).await;
        assert!(queue.is_registered(NetworkId(1)).await);

        queue.unregister(NetworkId(1)).await;
        assert!(!queue.is_registered(NetworkId(1)).await);
    }

    #[tokio::test]
    async fn dirty_network_is_committed_within_a_couple_ticks() {
        let queue = FilterCommitQueue::new("/tmp/test.atomic", Duration::from_millis(10));
        let exec = Arc::new(RecordingExecutor::new());
        let net = NetClient::new(Backend::LinuxBridge, exec.clone());
        let mut bn = BridgeNetwork::new(NetworkId(2), "b.2.sess", Policy::Drop, net);
        bn.startup().await.unwrap();
        let a = bn.attach(Interface::new("veth0")).await.unwrap();
        let b = bn.attach(Interface::new("veth1")).await.unwrap();
        bn.base.link(a, b).unwrap();
        let bridge = Arc::new(AsyncMutex::new(bn));

        queue.register(NetworkId(2), bridge.clone()).await;
        queue.mark_dirty(NetworkId(2)).await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        let invocations = exec.invocations();
        assert!(invocations.iter().any(|argv| argv.contains(&"ACCEPT".to_string())));
        assert!(bridge.lock().await.base.has_filter_chain);

        queue.unregister(NetworkId(2)).await;
    }
}
