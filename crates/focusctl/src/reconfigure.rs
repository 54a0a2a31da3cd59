//! Best-effort reconfigure signaling to the KWin session.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// qdbus binaries to probe, newest first.
const QDBUS_CANDIDATES: [&str; 4] = ["qdbus6", "qdbus-qt6", "qdbus-qt5", "qdbus"];

/// Ask KWin to reload its configuration so allow-list edits take effect
/// without a session restart.
///
/// Never escalates: a failure is logged and reported as `false`, since the
/// engine will also pick the change up on its next configuration-changed
/// event.
pub fn request() -> bool {
    for prog in QDBUS_CANDIDATES {
        let status = Command::new(prog)
            .args(["org.kde.KWin", "/KWin", "reconfigure"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(st) if st.success() => {
                debug!(prog, "requested KWin reconfigure");
                return true;
            }
            Ok(st) => debug!(prog, code = ?st.code(), "qdbus exited nonzero"),
            Err(e) => debug!(prog, "qdbus not runnable: {e}"),
        }
    }
    warn!("could not signal KWin; run `qdbus org.kde.KWin /KWin reconfigure` inside the session");
    false
}
