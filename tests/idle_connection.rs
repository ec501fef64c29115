//! End-to-end tests of the idle connection monitor against loopback backends.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::time::Instant;

use idle_monitor::health::{HealthBoard, Verdict};
use idle_monitor::lifecycle::MonitorFleet;
use idle_monitor::monitor::{IdleConnectionMonitor, Phase};
use idle_monitor::{MonitorConfig, MonitorSettings, ServerEndpoint, Severity};

mod common;

use common::{closed_port, fast_config, wait_until, within, Event, HoldingBackend, Recorder};

const WAIT: Duration = Duration::from_secs(5);

fn monitor_for(server: ServerEndpoint, recorder: &Arc<Recorder>) -> IdleConnectionMonitor {
    IdleConnectionMonitor::new(server, fast_config(), recorder.clone(), recorder.clone())
}

#[tokio::test]
async fn test_established_connection_reports_up() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(backend.endpoint(), &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || recorder.verdicts() == vec![Event::Up]).await);

    assert_eq!(monitor.verdict(), Verdict::Up);
    assert_eq!(monitor.phase(), Phase::Connected);
    assert_eq!(
        recorder.reports(),
        vec![(
            format!("Connection to {} established.", backend.endpoint()),
            Severity::Info
        )]
    );
    assert!(wait_until(WAIT, || backend.held() == 1).await);

    within(WAIT, monitor.shutdown()).await;
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn test_refused_connection_reports_down_once_and_backs_off() {
    let server = ServerEndpoint::from(closed_port().await);
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(server.clone(), &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || recorder.count_reports("failed.") >= 3).await);

    let verdicts = recorder.verdicts();
    assert_eq!(verdicts.len(), 1, "Down should be reported once: {verdicts:?}");
    assert!(matches!(&verdicts[0], Event::Down(reason) if !reason.is_empty()));
    assert!(recorder
        .reports()
        .iter()
        .all(|(message, severity)| *message == format!("Connection to {server} failed.")
            && *severity == Severity::Warning));
    assert!(monitor.current_delay() > fast_config().initial_reconnect_delay);
    assert!(monitor.current_delay() <= fast_config().max_reconnect_delay);

    within(WAIT, monitor.shutdown()).await;
}

#[tokio::test]
async fn test_reset_goes_down_then_recovers() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(backend.endpoint(), &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || backend.held() == 1).await);

    backend.reset_all();
    assert!(
        wait_until(WAIT, || recorder.verdicts().len() == 3).await,
        "expected Up, Down, Up: {:?}",
        recorder.events()
    );

    let verdicts = recorder.verdicts();
    assert_eq!(verdicts[0], Event::Up);
    assert!(matches!(verdicts[1], Event::Down(_)));
    assert_eq!(verdicts[2], Event::Up);
    assert_eq!(recorder.count_reports("lost."), 1);
    assert_eq!(recorder.count_reports("established."), 2);
    assert!(wait_until(WAIT, || backend.accepted() == 2).await);

    within(WAIT, monitor.shutdown()).await;
}

#[tokio::test]
async fn test_clean_close_reconnects_without_down() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(backend.endpoint(), &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || backend.held() == 1).await);

    backend.close_all_cleanly();
    assert!(wait_until(WAIT, || recorder.count_reports("established.") == 2).await);

    assert_eq!(recorder.verdicts(), vec![Event::Up]);
    assert_eq!(recorder.count_reports("lost."), 0);
    assert_eq!(monitor.verdict(), Verdict::Up);
    assert!(wait_until(WAIT, || backend.accepted() == 2).await);

    within(WAIT, monitor.shutdown()).await;
}

#[tokio::test]
async fn test_clean_close_reconnects_immediately() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let config = MonitorConfig {
        clean_reconnect_delay: Duration::from_secs(10),
        ..fast_config()
    };
    let mut monitor = IdleConnectionMonitor::new(
        backend.endpoint(),
        config,
        recorder.clone(),
        recorder.clone(),
    );
    assert_eq!(monitor.server(), &backend.endpoint());

    monitor.run();
    assert!(wait_until(WAIT, || backend.held() == 1).await);

    let closed_at = Instant::now();
    backend.close_all_cleanly();
    assert!(wait_until(WAIT, || backend.accepted() == 2).await);

    let elapsed = closed_at.elapsed();
    assert!(
        elapsed < Duration::from_secs(2),
        "reconnect after a clean close took {elapsed:?}"
    );
    assert_eq!(recorder.verdicts(), vec![Event::Up]);

    within(WAIT, monitor.shutdown()).await;
}

#[tokio::test]
async fn test_failed_fast_reconnect_goes_down() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(backend.endpoint(), &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || backend.held() == 1).await);

    backend.stop_listening().await;
    backend.close_all_cleanly();

    assert!(wait_until(WAIT, || recorder.verdicts().len() == 2).await);
    assert_eq!(recorder.verdicts()[0], Event::Up);
    assert!(matches!(recorder.verdicts()[1], Event::Down(_)));
    assert_eq!(recorder.count_reports("lost."), 0);
    assert!(recorder.count_reports("failed.") >= 1);

    within(WAIT, monitor.shutdown()).await;
}

#[tokio::test]
async fn test_stop_before_any_event_is_silent() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(backend.endpoint(), &recorder);

    monitor.run();
    monitor.stop();
    monitor.stop();
    assert!(!monitor.is_running());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(recorder.events().is_empty());

    within(WAIT, monitor.shutdown()).await;
    assert_eq!(monitor.phase(), Phase::Stopped);
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_stop_while_backing_off_suppresses_late_events() {
    let server = ServerEndpoint::from(closed_port().await);
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(server, &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || recorder.count_reports("failed.") >= 1).await);

    monitor.stop();
    let seen = recorder.events();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(recorder.events(), seen);

    // A fresh run starts from an unknown verdict and reports again.
    monitor.run();
    assert!(wait_until(WAIT, || recorder.verdicts().len() == 2).await);
    within(WAIT, monitor.shutdown()).await;
}

#[tokio::test]
async fn test_stop_releases_held_connection() {
    let backend = HoldingBackend::start().await;
    let recorder = Arc::new(Recorder::default());
    let mut monitor = monitor_for(backend.endpoint(), &recorder);

    monitor.run();
    assert!(wait_until(WAIT, || backend.held() == 1).await);
    let mut peer = backend.take_held().unwrap();

    within(WAIT, monitor.shutdown()).await;

    let mut buf = [0u8; 16];
    let read = within(WAIT, peer.read(&mut buf)).await.unwrap();
    assert_eq!(read, 0, "monitor should close its side on shutdown");
    assert_eq!(recorder.verdicts(), vec![Event::Up]);
    assert_eq!(backend.accepted(), 1);
}

#[tokio::test]
async fn test_fleet_feeds_health_board() {
    let up = HoldingBackend::start().await;
    let down = closed_port().await;

    let settings: MonitorSettings = toml::from_str(&format!(
        r#"
        [[servers]]
        host = "127.0.0.1"
        port = {}

        [[servers]]
        host = "127.0.0.1"
        port = {}
        [servers.monitor]
        keepalive = false
        "#,
        up.addr.port(),
        down.port()
    ))
    .unwrap();

    let board = Arc::new(HealthBoard::new());
    let recorder = Arc::new(Recorder::default());
    let mut fleet = MonitorFleet::build(&settings, board.clone(), recorder.clone()).unwrap();
    assert_eq!(fleet.len(), 2);
    assert_eq!(board.len(), 2);

    fleet.run();
    let down = ServerEndpoint::from(down);
    assert!(
        wait_until(WAIT, || {
            board.verdict(&up.endpoint()) == Verdict::Up && board.verdict(&down) == Verdict::Down
        })
        .await
    );
    assert_eq!(board.up_count(), 1);
    assert!(board.last_reason(&down).is_some());

    let mut servers: Vec<String> = fleet.monitors().iter().map(|m| m.server().to_string()).collect();
    servers.sort();
    let mut expected = vec![up.endpoint().to_string(), down.to_string()];
    expected.sort();
    assert_eq!(servers, expected);

    within(WAIT, fleet.shutdown()).await;
    assert!(fleet.monitors().iter().all(|m| !m.is_running()));
}
