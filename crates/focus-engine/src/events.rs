//! Lifecycle events delivered by the host runtime.

use crate::host::WindowId;

/// A notification from the host runtime's event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A window was created and mapped.
    WindowAdded(WindowId),
    /// A window became the active window.
    WindowActivated(WindowId),
    /// The persisted configuration changed; re-read the allow-list.
    ConfigChanged,
}
