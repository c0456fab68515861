//! End-to-end tests for SliderIo

use super::*;
use crate::config::NoiseReduction;
use crate::connection::testing::{ScriptedTransport, TransportEvent};
use crate::connection::PortSelector;
use crate::error::ConnectionError;
use crate::sliders::{PACKET_QUEUE_CAPACITY, SENTINEL, SUBSCRIBER_QUEUE_CAPACITY};
use tokio::time::{sleep, timeout};

const TEST_SETTLE: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_millis(200);

fn setup(config: AppConfig) -> (SliderIo, ScriptedTransport, watch::Sender<Arc<AppConfig>>) {
    let transport = ScriptedTransport::new();
    let (config_tx, config_rx) = watch::channel(Arc::new(config));
    let io = SliderIo::with_settle_delay(
        Arc::new(transport.clone()),
        config_rx,
        false,
        TEST_SETTLE,
    );
    (io, transport, config_tx)
}

fn config_with_port(port: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.midi.port = port;
    config
}

async fn next_event(rx: &mut mpsc::Receiver<SliderMoveEvent>) -> Option<SliderMoveEvent> {
    timeout(WAIT, rx.recv()).await.ok().flatten()
}

#[tokio::test]
async fn test_first_report_is_broadcast_to_all_subscribers() {
    let (io, transport, _config_tx) = setup(AppConfig::default());
    let mut first = io.subscribe();
    let mut second = io.subscribe();
    io.start().unwrap();

    // 93/127 normalizes to 0.73
    assert!(transport.inject(&[0x90, 2, 93]));

    let expected = SliderMoveEvent {
        slider_id: 2,
        percent_value: 0.73,
    };
    assert_eq!(next_event(&mut first).await, Some(expected));
    assert_eq!(next_event(&mut second).await, Some(expected));

    assert_eq!(io.sliders().snapshot().await, vec![SENTINEL, SENTINEL, 0.73]);
    assert!(first.try_recv().is_err());
    assert!(second.try_recv().is_err());
}

#[tokio::test]
async fn test_jitter_below_threshold_is_not_broadcast() {
    let mut config = AppConfig::default();
    config.noise_reduction = NoiseReduction::Threshold(0.05);
    let (io, transport, _config_tx) = setup(config);
    let mut events = io.subscribe();
    io.start().unwrap();

    transport.inject(&[0x90, 2, 93]);
    assert!(next_event(&mut events).await.is_some());

    // 94/127 normalizes to 0.74
    transport.inject(&[0x90, 2, 94]);

    assert_eq!(io.sliders().snapshot().await, vec![SENTINEL, SENTINEL, 0.73]);
    assert!(events.try_recv().is_err());
    assert_eq!(io.sliders().stats().await.insignificant, 1);
}

#[tokio::test]
async fn test_wrong_channel_is_dropped() {
    let (io, transport, _config_tx) = setup(AppConfig::default());
    let mut events = io.subscribe();
    io.start().unwrap();

    transport.inject(&[0x93, 1, 100]);

    assert!(io.sliders().snapshot().await.is_empty());
    assert!(events.try_recv().is_err());

    let stats = io.sliders().stats().await;
    assert_eq!(stats.wrong_channel, 1);
    assert_eq!(stats.emitted, 0);
}

#[tokio::test]
async fn test_non_note_messages_are_ignored() {
    let (io, transport, _config_tx) = setup(AppConfig::default());
    io.start().unwrap();

    transport.inject(&[0xB0, 7, 100]);
    transport.inject(&[0xF8]);

    assert!(io.sliders().snapshot().await.is_empty());
    assert_eq!(io.sliders().stats().await.ignored, 2);
}

#[tokio::test]
async fn test_stalled_subscriber_keeps_memory_and_control_bounded() {
    let (io, transport, _config_tx) = setup(AppConfig::default());
    let _stalled = io.subscribe();
    io.start().unwrap();

    // every report moves slider 0 between its end stops
    let total = 10_000u64;
    for i in 0..total {
        let velocity = if i % 2 == 0 { 127 } else { 0 };
        transport.inject(&[0x90, 0, velocity]);
    }

    let stats = timeout(WAIT, io.sliders().stats())
        .await
        .expect("stats should be answered while delivery is stalled");
    assert_eq!(stats.emitted, SUBSCRIBER_QUEUE_CAPACITY as u64 + 1);
    assert_eq!(stats.backlog_dropped, total - PACKET_QUEUE_CAPACITY as u64);

    io.sliders().reset();
    let snapshot = timeout(WAIT, io.sliders().snapshot())
        .await
        .expect("reset should be applied while delivery is stalled");
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_unchanged_reload_resets_without_reconnect() {
    let config = AppConfig::default();
    let (io, transport, config_tx) = setup(config.clone());
    let mut events = io.subscribe();
    io.start().unwrap();

    transport.inject(&[0x90, 0, 64]);
    assert!(next_event(&mut events).await.is_some());
    assert_eq!(io.sliders().snapshot().await.len(), 1);

    config_tx.send_replace(Arc::new(config));
    sleep(WAIT).await;

    assert!(io.sliders().snapshot().await.is_empty());
    assert_eq!(io.connection_state(), ConnectionState::Open);
    assert_eq!(
        transport.events(),
        vec![TransportEvent::Opened(PortSelector::Index(0))]
    );

    // same position again is a fresh baseline
    transport.inject(&[0x90, 0, 64]);
    assert_eq!(
        next_event(&mut events).await,
        Some(SliderMoveEvent {
            slider_id: 0,
            percent_value: 0.5,
        })
    );
}

#[tokio::test]
async fn test_reload_updates_noise_reduction() {
    let (io, transport, config_tx) = setup(AppConfig::default());
    let mut events = io.subscribe();
    io.start().unwrap();

    let mut config = AppConfig::default();
    config.noise_reduction = NoiseReduction::Threshold(0.5);
    config_tx.send_replace(Arc::new(config));
    sleep(WAIT).await;

    transport.inject(&[0x90, 0, 64]);
    assert!(next_event(&mut events).await.is_some());
    transport.inject(&[0x90, 0, 90]);

    assert_eq!(io.sliders().snapshot().await, vec![0.5]);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_changed_port_cycles_connection() {
    let (io, transport, config_tx) = setup(config_with_port(0));
    io.start().unwrap();

    config_tx.send_replace(Arc::new(config_with_port(1)));
    sleep(WAIT).await;

    assert_eq!(
        transport.events(),
        vec![
            TransportEvent::Opened(PortSelector::Index(0)),
            TransportEvent::Stopped("scripted #0".to_string()),
            TransportEvent::Opened(PortSelector::Index(1)),
        ]
    );
    assert_eq!(io.connection_state(), ConnectionState::Open);
    assert_eq!(io.connection_params().port_index, 1);
}

#[tokio::test]
async fn test_failed_reopen_stays_closed_until_next_change() {
    let (io, transport, config_tx) = setup(config_with_port(0));
    transport.fail_open(PortSelector::Index(7));
    io.start().unwrap();

    config_tx.send_replace(Arc::new(config_with_port(7)));
    sleep(WAIT).await;

    assert_eq!(io.connection_state(), ConnectionState::Closed);
    assert_eq!(io.connection_params().port_index, 7);
    assert_eq!(
        transport.events(),
        vec![
            TransportEvent::Opened(PortSelector::Index(0)),
            TransportEvent::Stopped("scripted #0".to_string()),
            TransportEvent::Opened(PortSelector::Index(7)),
        ]
    );

    config_tx.send_replace(Arc::new(config_with_port(1)));
    sleep(WAIT).await;

    assert_eq!(io.connection_state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_channel_change_follows_reconnect() {
    let (io, transport, config_tx) = setup(AppConfig::default());
    let mut events = io.subscribe();
    io.start().unwrap();

    let mut config = AppConfig::default();
    config.midi.channel = 2;
    config_tx.send_replace(Arc::new(config));
    sleep(WAIT).await;

    transport.inject(&[0x90, 0, 127]);
    transport.inject(&[0x92, 0, 127]);

    assert_eq!(
        next_event(&mut events).await,
        Some(SliderMoveEvent {
            slider_id: 0,
            percent_value: 1.0,
        })
    );
    assert_eq!(io.sliders().stats().await.wrong_channel, 1);
    assert_eq!(transport.events().len(), 3);
}

#[tokio::test]
async fn test_lifecycle_api() {
    let (io, transport, _config_tx) = setup(AppConfig::default());
    assert_eq!(io.connection_state(), ConnectionState::Closed);

    io.stop();
    assert!(transport.events().is_empty());

    io.start().unwrap();
    assert_eq!(io.start(), Err(ConnectionError::AlreadyConnected));

    io.stop();
    assert_eq!(io.connection_state(), ConnectionState::Closed);
    io.start().unwrap();

    let sliders = io.sliders().clone();
    io.shutdown().await;
    sleep(Duration::from_millis(20)).await;

    assert!(!sliders.is_alive());
    assert_eq!(transport.events().len(), 4);
}
