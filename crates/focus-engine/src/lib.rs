//! focus-engine: reactive enforcement of the window-class allow-list.
//!
//! The engine subscribes to the host runtime's window lifecycle events and,
//! when a new window's class is on the allow-list, forces it to the
//! foreground with a short ladder of raise/activate attempts. The ladder
//! exists to win the race against the host's focus-stealing-prevention
//! timer, which may re-steal focus shortly after window creation.
//!
//! Structure:
//! - [`HostOps`]: the boundary trait over the host runtime (attribute
//!   reads plus the `raise`/`activate` effects), with [`MockHost`] for
//!   tests.
//! - [`HostEvent`]: lifecycle events fed into the engine over a channel.
//! - [`Engine::spawn`]: starts the single consumer task.
//!
//! The engine holds no per-window state beyond a bounded dedup cache; a
//! single malformed window degrades to a no-op and never stops the loop.

use std::{collections::HashSet, num::NonZeroUsize, sync::Arc, time::Duration};

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, trace, warn};

use allowlist::{Store, normalize};

mod attempt;
mod events;
mod host;

pub use events::HostEvent;
pub use host::{Effect, HostError, HostOps, HostResult, MockHost, MockWindow, WindowId};

/// Default attempt ladder: immediately, then two short increasing delays.
const DEFAULT_LADDER: [Duration; 3] = [
    Duration::ZERO,
    Duration::from_millis(50),
    Duration::from_millis(300),
];

/// Default capacity of the per-window dedup cache.
const DEFAULT_DEDUP_CAPACITY: usize = 1024;

/// Tuning knobs for the enforcement engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delays before each enforcement attempt, in order. The first entry
    /// is usually zero.
    pub ladder: Vec<Duration>,
    /// Maximum number of window ids remembered for attempt dedup. Eviction
    /// degrades dedup to best-effort for very long-lived sessions.
    pub dedup_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ladder: DEFAULT_LADDER.to_vec(),
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
        }
    }
}

/// Handle to a running enforcement engine.
///
/// Dropping all senders obtained from [`Engine::sender`] together with the
/// handle shuts the consumer task down.
pub struct Engine {
    /// Event intake for the host-side adapter.
    tx: UnboundedSender<HostEvent>,
    /// State shared with the consumer task and attempt ladders.
    shared: Arc<Shared>,
}

/// State shared between the event loop and scheduled attempt ladders.
struct Shared {
    /// Host runtime boundary.
    host: Arc<dyn HostOps>,
    /// Persisted allow-list, re-read on `ConfigChanged`.
    store: Store,
    /// Current normalized allow-list snapshot, replaced wholesale.
    snapshot: RwLock<HashSet<String>>,
    /// Windows that already have a ladder scheduled for this instance.
    scheduled: Mutex<LruCache<WindowId, ()>>,
    /// Attempt delays.
    ladder: Vec<Duration>,
}

impl Engine {
    /// Start the engine: load the initial snapshot and spawn the event
    /// consumer task on the current tokio runtime.
    pub fn spawn(host: Arc<dyn HostOps>, store: Store, config: EngineConfig) -> Self {
        let capacity = NonZeroUsize::new(config.dedup_capacity.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        let shared = Arc::new(Shared {
            host,
            store,
            snapshot: RwLock::new(HashSet::new()),
            scheduled: Mutex::new(LruCache::new(capacity)),
            ladder: config.ladder,
        });
        shared.reload();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let consumer = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                consumer.handle(event);
            }
            debug!("engine event channel closed; stopping");
        });

        Self { tx, shared }
    }

    /// A sender for feeding host lifecycle events into the engine.
    pub fn sender(&self) -> UnboundedSender<HostEvent> {
        self.tx.clone()
    }

    /// Sorted view of the current snapshot keys (introspection/tests).
    pub fn snapshot_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.shared.snapshot.read().iter().cloned().collect();
        keys.sort();
        keys
    }
}

impl Shared {
    /// Dispatch one lifecycle event.
    fn handle(self: &Arc<Self>, event: HostEvent) {
        match event {
            HostEvent::WindowAdded(id) => self.on_added(id),
            HostEvent::WindowActivated(id) => self.on_activated(id),
            HostEvent::ConfigChanged => self.reload(),
        }
    }

    /// Replace the in-memory snapshot from the store, wholesale.
    ///
    /// A missing store file is an empty (unconfigured) list; a hard read
    /// error keeps the previous snapshot rather than wiping a working
    /// configuration.
    fn reload(&self) {
        match self.store.load() {
            Ok(classes) => {
                let keys: HashSet<String> = classes
                    .iter()
                    .map(|c| normalize(c))
                    .filter(|k| !k.is_empty())
                    .collect();
                info!(count = keys.len(), "allow-list snapshot reloaded");
                *self.snapshot.write() = keys;
            }
            Err(e) => warn!("allow-list reload failed; keeping previous snapshot: {e}"),
        }
    }

    /// "Window added": on a match, schedule one attempt ladder per window
    /// instance.
    fn on_added(self: &Arc<Self>, id: WindowId) {
        let Some(key) = self.matched_key(id) else {
            trace!(id, "added window not on allow-list");
            return;
        };

        {
            let mut scheduled = self.scheduled.lock();
            if scheduled.contains(&id) {
                debug!(id, key = %key, "ladder already scheduled for this window");
                return;
            }
            scheduled.put(id, ());
        }

        debug!(id, key = %key, rungs = self.ladder.len(), "scheduling focus enforcement");
        let ladder_state = Arc::clone(self);
        tokio::spawn(async move {
            attempt::run_ladder(&ladder_state, id, &key).await;
        });
    }

    /// "Window activated": the window already has focus; re-issue only
    /// `raise` to correct stacking order without fighting the host.
    fn on_activated(&self, id: WindowId) {
        let Some(key) = self.matched_key(id) else {
            return;
        };
        match self.host.raise(id) {
            Ok(()) => debug!(id, key = %key, "raised on activation"),
            Err(e) => debug!(id, key = %key, "raise on activation failed: {e}"),
        }
    }

    /// Best candidate class for the window, if it normalizes into the
    /// current snapshot. Checked in fixed priority order; a failed read
    /// only skips that candidate.
    fn matched_key(&self, id: WindowId) -> Option<String> {
        let candidates = [
            self.host.desktop_file_name(id),
            self.host.resource_class(id),
            self.host.resource_name(id),
        ];
        let raw = candidates.into_iter().find_map(|res| match res {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                trace!(id, "class candidate read failed: {e}");
                None
            }
        })?;

        let key = normalize(&raw);
        if !key.is_empty() && self.snapshot.read().contains(&key) {
            Some(key)
        } else {
            None
        }
    }
}
