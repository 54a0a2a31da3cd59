//! Host-runtime boundary: window attribute reads and the two effects.
//!
//! The compositor owns every window; the engine only ever holds an opaque
//! [`WindowId`] and queries transient attributes through [`HostOps`]. Any
//! call may fail at any time (the window can die mid-query); callers must
//! treat failures as "leave this window alone", never as fatal.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

/// Opaque per-window identity assigned by the host runtime.
///
/// Stability across the lifetime of a window instance is assumed for
/// attempt dedup; a host that recycles ids degrades dedup to best-effort.
pub type WindowId = u64;

/// Failure of a single host-runtime call.
#[derive(Debug, Error)]
pub enum HostError {
    /// The window no longer exists on the host side.
    #[error("window {0} is gone")]
    Gone(WindowId),
    /// An attribute read or effect call failed inside the host runtime.
    #[error("host call failed: {0}")]
    Call(&'static str),
}

/// Result alias for host-runtime calls.
pub type HostResult<T> = Result<T, HostError>;

/// Window attribute reads and focus effects exposed by the host runtime.
///
/// Candidate class strings are queried individually so a failure of one
/// read degrades only that candidate. `raise` must always be issued before
/// `activate`; an activated-but-buried window does not fix stacking.
pub trait HostOps: Send + Sync {
    /// Platform-native application identifier (e.g. desktop-file name).
    fn desktop_file_name(&self, id: WindowId) -> HostResult<Option<String>>;
    /// Window-manager resource class.
    fn resource_class(&self, id: WindowId) -> HostResult<Option<String>>;
    /// Window-manager resource name.
    fn resource_name(&self, id: WindowId) -> HostResult<Option<String>>;
    /// Whether the window has been closed/destroyed.
    fn is_deleted(&self, id: WindowId) -> HostResult<bool>;
    /// Whether the window is minimized.
    fn is_minimized(&self, id: WindowId) -> HostResult<bool>;
    /// Whether the window currently accepts input focus.
    fn wants_input(&self, id: WindowId) -> HostResult<bool>;
    /// Whether the window is the active (focused) window right now.
    fn is_active(&self, id: WindowId) -> HostResult<bool>;
    /// Restack the window above its siblings.
    fn raise(&self, id: WindowId) -> HostResult<()>;
    /// Give the window input focus.
    fn activate(&self, id: WindowId) -> HostResult<()>;
}

/// A recorded effect call, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `raise` was issued for the window.
    Raise(WindowId),
    /// `activate` was issued for the window.
    Activate(WindowId),
}

/// Scripted window state served by [`MockHost`].
#[derive(Debug, Clone, Default)]
pub struct MockWindow {
    /// Candidate: platform-native application identifier.
    pub desktop_file_name: Option<String>,
    /// Candidate: resource class.
    pub resource_class: Option<String>,
    /// Candidate: resource name.
    pub resource_name: Option<String>,
    /// Window has been destroyed.
    pub deleted: bool,
    /// Window is minimized.
    pub minimized: bool,
    /// Window accepts input focus.
    pub wants_input: bool,
    /// Window is currently active.
    pub active: bool,
    /// Every attribute read on this window fails.
    pub broken_reads: bool,
    /// Every effect call on this window fails.
    pub broken_effects: bool,
}

impl MockWindow {
    /// An ordinary, focusable, inactive window with the given resource
    /// class.
    pub fn with_class(class: &str) -> Self {
        Self {
            resource_class: Some(class.to_string()),
            wants_input: true,
            ..Self::default()
        }
    }
}

/// In-memory [`HostOps`] implementation for tests.
///
/// Records effect calls in order. By default a successful `activate` also
/// marks the window active, mirroring what a real window manager does;
/// disable with [`MockHost::set_auto_activate`] to observe full ladders.
pub struct MockHost {
    /// Scripted windows by id.
    windows: Mutex<HashMap<WindowId, MockWindow>>,
    /// Effect call log.
    effects: Mutex<Vec<Effect>>,
    /// Whether `activate` flips the window's active flag.
    auto_activate: Mutex<bool>,
}

impl MockHost {
    /// New empty mock with auto-activation on.
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            effects: Mutex::new(Vec::new()),
            auto_activate: Mutex::new(true),
        }
    }

    /// Install or replace a scripted window.
    pub fn put(&self, id: WindowId, window: MockWindow) {
        self.windows.lock().insert(id, window);
    }

    /// Mutate a scripted window in place.
    pub fn update(&self, id: WindowId, mutate: impl FnOnce(&mut MockWindow)) {
        if let Some(win) = self.windows.lock().get_mut(&id) {
            mutate(win);
        }
    }

    /// Control whether `activate` marks the window active.
    pub fn set_auto_activate(&self, on: bool) {
        *self.auto_activate.lock() = on;
    }

    /// Snapshot of the effect call log.
    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().clone()
    }

    /// Read a window attribute, honoring the `broken_reads` script.
    fn read<T>(
        &self,
        id: WindowId,
        get: impl FnOnce(&MockWindow) -> T,
    ) -> HostResult<T> {
        let windows = self.windows.lock();
        let win = windows.get(&id).ok_or(HostError::Gone(id))?;
        if win.broken_reads {
            return Err(HostError::Call("scripted read failure"));
        }
        Ok(get(win))
    }
}

impl HostOps for MockHost {
    fn desktop_file_name(&self, id: WindowId) -> HostResult<Option<String>> {
        self.read(id, |w| w.desktop_file_name.clone())
    }

    fn resource_class(&self, id: WindowId) -> HostResult<Option<String>> {
        self.read(id, |w| w.resource_class.clone())
    }

    fn resource_name(&self, id: WindowId) -> HostResult<Option<String>> {
        self.read(id, |w| w.resource_name.clone())
    }

    fn is_deleted(&self, id: WindowId) -> HostResult<bool> {
        self.read(id, |w| w.deleted)
    }

    fn is_minimized(&self, id: WindowId) -> HostResult<bool> {
        self.read(id, |w| w.minimized)
    }

    fn wants_input(&self, id: WindowId) -> HostResult<bool> {
        self.read(id, |w| w.wants_input)
    }

    fn is_active(&self, id: WindowId) -> HostResult<bool> {
        self.read(id, |w| w.active)
    }

    fn raise(&self, id: WindowId) -> HostResult<()> {
        self.read(id, |w| w.broken_effects).and_then(|broken| {
            if broken {
                return Err(HostError::Call("scripted raise failure"));
            }
            self.effects.lock().push(Effect::Raise(id));
            Ok(())
        })
    }

    fn activate(&self, id: WindowId) -> HostResult<()> {
        self.read(id, |w| w.broken_effects).and_then(|broken| {
            if broken {
                return Err(HostError::Call("scripted activate failure"));
            }
            self.effects.lock().push(Effect::Activate(id));
            if *self.auto_activate.lock()
                && let Some(win) = self.windows.lock().get_mut(&id)
            {
                win.active = true;
            }
            Ok(())
        })
    }
}
