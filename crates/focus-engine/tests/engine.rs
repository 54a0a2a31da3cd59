//! Engine behavior tests against a scripted mock host.
//!
//! All timing runs on tokio's paused virtual clock, so ladder delays
//! resolve instantly and deterministically.

use std::{sync::Arc, time::Duration};

use allowlist::Store;
use focus_engine::{Effect, Engine, EngineConfig, HostEvent, MockHost, MockWindow};
use tempfile::TempDir;

/// Spawn an engine over a fresh store seeded with `classes`.
fn engine_with(classes: &[&str], host: &Arc<MockHost>) -> (TempDir, Store, Engine) {
    let dir = TempDir::new().expect("tempdir");
    let store = Store::at_dir(dir.path());
    for class in classes {
        store.add(class).expect("seed class");
    }
    let engine = Engine::spawn(
        Arc::clone(host) as Arc<dyn focus_engine::HostOps>,
        store.clone(),
        EngineConfig::default(),
    );
    (dir, store, engine)
}

/// Let queued events and scheduled ladders run to completion.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(2)).await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn matched_window_gets_raise_then_activate() {
    let host = Arc::new(MockHost::new());
    host.put(1, MockWindow::with_class("ProcletChrome"));
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    engine.sender().send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;

    assert_eq!(host.effects(), vec![Effect::Raise(1), Effect::Activate(1)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unmatched_window_is_ignored() {
    let host = Arc::new(MockHost::new());
    host.put(1, MockWindow::with_class("Firefox"));
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    engine.sender().send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;

    assert!(host.effects().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn desktop_file_name_outranks_resource_class() {
    let host = Arc::new(MockHost::new());
    let mut win = MockWindow::with_class("NotListed");
    win.desktop_file_name = Some("org.kde.Konsole.desktop".to_string());
    host.put(7, win);
    let (_dir, _store, engine) = engine_with(&["org.kde.konsole"], &host);

    engine.sender().send(HostEvent::WindowAdded(7)).expect("send");
    settle().await;

    assert_eq!(host.effects(), vec![Effect::Raise(7), Effect::Activate(7)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn already_active_window_is_suppressed() {
    let host = Arc::new(MockHost::new());
    let mut win = MockWindow::with_class("ProcletChrome");
    win.active = true;
    host.put(1, win);
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    engine.sender().send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;

    assert!(host.effects().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn activation_event_reissues_raise_only() {
    let host = Arc::new(MockHost::new());
    let mut win = MockWindow::with_class("ProcletChrome");
    win.active = true;
    host.put(1, win);
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    engine
        .sender()
        .send(HostEvent::WindowActivated(1))
        .expect("send");
    settle().await;

    assert_eq!(host.effects(), vec![Effect::Raise(1)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn double_added_event_schedules_one_ladder() {
    let host = Arc::new(MockHost::new());
    host.set_auto_activate(false);
    host.put(1, MockWindow::with_class("ProcletChrome"));
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    let tx = engine.sender();
    tx.send(HostEvent::WindowAdded(1)).expect("send");
    tx.send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;

    // One full default ladder (3 rungs), not two.
    let effects = host.effects();
    assert_eq!(effects.len(), 6);
    for pair in effects.chunks(2) {
        assert_eq!(pair, [Effect::Raise(1), Effect::Activate(1)]);
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn config_reload_replaces_snapshot_wholesale() {
    let host = Arc::new(MockHost::new());
    host.put(1, MockWindow::with_class("ProcletChrome"));
    let (_dir, store, engine) = engine_with(&[], &host);
    let tx = engine.sender();

    tx.send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;
    assert!(host.effects().is_empty(), "empty allow-list must be a no-op");

    store.add("ProcletChrome").expect("add");
    tx.send(HostEvent::ConfigChanged).expect("send");
    tx.send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;

    assert_eq!(host.effects(), vec![Effect::Raise(1), Effect::Activate(1)]);
    assert_eq!(engine.snapshot_keys(), vec!["procletchrome".to_string()]);

    store.remove("ProcletChrome").expect("remove");
    tx.send(HostEvent::ConfigChanged).expect("send");
    settle().await;
    assert!(engine.snapshot_keys().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn broken_window_does_not_stop_the_loop() {
    let host = Arc::new(MockHost::new());
    let mut broken = MockWindow::with_class("ProcletChrome");
    broken.broken_reads = true;
    host.put(1, broken);
    host.put(2, MockWindow::with_class("ProcletChrome"));
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    let tx = engine.sender();
    tx.send(HostEvent::WindowAdded(1)).expect("send");
    tx.send(HostEvent::WindowAdded(2)).expect("send");
    settle().await;

    assert_eq!(host.effects(), vec![Effect::Raise(2), Effect::Activate(2)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failed_effects_degrade_to_noop() {
    let host = Arc::new(MockHost::new());
    let mut win = MockWindow::with_class("ProcletChrome");
    win.broken_effects = true;
    host.put(1, win);
    host.put(2, MockWindow::with_class("ProcletChrome"));
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    let tx = engine.sender();
    tx.send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;
    assert!(host.effects().is_empty());

    tx.send(HostEvent::WindowAdded(2)).expect("send");
    settle().await;
    assert_eq!(host.effects(), vec![Effect::Raise(2), Effect::Activate(2)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn transiently_unfocusable_window_is_retried() {
    let host = Arc::new(MockHost::new());
    let mut win = MockWindow::with_class("ProcletChrome");
    win.wants_input = false;
    host.put(1, win);
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    engine.sender().send(HostEvent::WindowAdded(1)).expect("send");
    // First rung fires immediately and must skip.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(host.effects().is_empty());

    host.update(1, |w| w.wants_input = true);
    settle().await;
    assert_eq!(host.effects(), vec![Effect::Raise(1), Effect::Activate(1)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn minimized_window_abandons_the_ladder() {
    let host = Arc::new(MockHost::new());
    host.set_auto_activate(false);
    let mut win = MockWindow::with_class("ProcletChrome");
    win.minimized = true;
    host.put(1, win);
    let (_dir, _store, engine) = engine_with(&["procletchrome"], &host);

    engine.sender().send(HostEvent::WindowAdded(1)).expect("send");
    settle().await;

    assert!(host.effects().is_empty());
}
