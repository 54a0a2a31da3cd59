//! The per-window enforcement attempt ladder.

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{Shared, WindowId};

/// Outcome of an eligibility check at one rung.
enum Eligibility {
    /// Window is present, focusable and not active: apply effects.
    Eligible,
    /// Window already has focus; the ladder's job is done.
    Active,
    /// Window is deleted or minimized; abandon the ladder.
    Gone,
    /// Window is transiently not ready (or a read failed); skip this rung.
    NotReady,
}

/// Run one attempt ladder for a matched window.
///
/// Each rung re-checks eligibility against the live host before issuing
/// `raise` then `activate`. Effect failures degrade to a logged no-op; the
/// ladder never panics or escalates.
pub(crate) async fn run_ladder(shared: &Shared, id: WindowId, key: &str) {
    for (rung, delay) in shared.ladder.iter().enumerate() {
        if !delay.is_zero() {
            sleep(*delay).await;
        }
        match eligibility(shared, id) {
            Eligibility::Active => {
                debug!(id, key, rung, "window already active; ladder done");
                return;
            }
            Eligibility::Gone => {
                debug!(id, key, rung, "window gone; abandoning ladder");
                return;
            }
            Eligibility::NotReady => {
                debug!(id, key, rung, "window not ready; skipping attempt");
            }
            Eligibility::Eligible => {
                // Raise strictly before activate.
                if let Err(e) = shared.host.raise(id) {
                    warn!(id, key, rung, "raise failed: {e}");
                }
                if let Err(e) = shared.host.activate(id) {
                    warn!(id, key, rung, "activate failed: {e}");
                }
            }
        }
    }
}

/// Re-check the window against the live host at attempt time.
fn eligibility(shared: &Shared, id: WindowId) -> Eligibility {
    let host = shared.host.as_ref();
    match host.is_deleted(id) {
        Ok(true) | Err(_) => return Eligibility::Gone,
        Ok(false) => {}
    }
    match host.is_minimized(id) {
        Ok(true) => return Eligibility::Gone,
        Ok(false) => {}
        Err(e) => {
            debug!(id, "minimized read failed: {e}");
            return Eligibility::NotReady;
        }
    }
    match host.is_active(id) {
        Ok(true) => return Eligibility::Active,
        Ok(false) => {}
        Err(e) => {
            debug!(id, "active read failed: {e}");
            return Eligibility::NotReady;
        }
    }
    match host.wants_input(id) {
        Ok(true) => Eligibility::Eligible,
        Ok(false) => Eligibility::NotReady,
        Err(e) => {
            debug!(id, "wants-input read failed: {e}");
            Eligibility::NotReady
        }
    }
}
