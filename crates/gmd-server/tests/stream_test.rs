//! Stream integration tests: ticks drive the broadcast channel that
//! WebSocket subscribers read from.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use gmd_core::models::{LaunchRequest, MissileClass};
use gmd_core::GeoPoint;
use gmd_server::config::Config;
use gmd_server::loops::simulation_loop::{run_simulation_loop, run_tick, LOOP_NAME};
use gmd_server::loops::status_persist_loop::run_status_persist_loop;
use gmd_server::persistence::{init_database, launches as launches_db};
use gmd_server::state::{AppState, StreamEvent};

fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(Config {
        database_path: None,
        ..Config::default()
    }))
}

fn srbm(name: &str) -> LaunchRequest {
    // Roughly 150 km, about 100 s of flight at SRBM speed.
    LaunchRequest::new(
        name,
        MissileClass::Srbm,
        GeoPoint::new(38.0, 127.0),
        GeoPoint::new(39.35, 127.0),
    )
}

fn parse(payload: &str) -> Value {
    serde_json::from_str(payload).expect("stream payload is json")
}

#[tokio::test]
async fn tick_publishes_one_batch_for_all_missiles() {
    let state = test_state();
    let first = state.launch(srbm("First")).unwrap();
    let second = state.launch(srbm("Second")).unwrap();
    let mut rx = state.subscribe();

    let report = run_tick(&state, Utc::now() + ChronoDuration::seconds(10));
    assert_eq!(report.batch.len(), 2);

    let event = parse(&rx.recv().await.unwrap());
    assert_eq!(event["type"], "missile_updates");
    let data = event["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["type"], "missile_update");
    let ids: Vec<&str> = data
        .iter()
        .map(|entry| entry["missile"]["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&first.id.as_str()));
    assert!(ids.contains(&second.id.as_str()));
    assert!(data[0]["threat_assessment"]["threat_score"].as_u64().unwrap() <= 10);
    assert!(data[0]["missile"]["altitude_m"].as_f64().unwrap() > 0.0);

    // Only one message per tick.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn empty_tick_publishes_nothing() {
    let state = test_state();
    let mut rx = state.subscribe();

    let report = run_tick(&state, Utc::now());
    assert!(report.batch.is_empty());
    assert!(rx.try_recv().is_err());
    assert!(state
        .loop_heartbeats()
        .iter()
        .any(|beat| beat.name == LOOP_NAME));
}

#[tokio::test]
async fn arrival_publishes_impact_event_and_purges() {
    let state = test_state();
    let missile = state.launch(srbm("Arriving")).unwrap();
    let mut rx = state.subscribe();

    let report = run_tick(&state, Utc::now() + ChronoDuration::seconds(600));
    assert_eq!(report.impacts.len(), 1);
    assert!(report.batch.is_empty());

    let event = parse(&rx.recv().await.unwrap());
    assert_eq!(event["type"], "impact_event");
    assert_eq!(event["missile_id"], missile.id.as_str());
    assert_eq!(event["name"], "Arriving");
    assert!((event["lat"].as_f64().unwrap() - 39.35).abs() < 1e-6);

    assert!(state.get_missile(&missile.id).is_none());
    assert_eq!(state.active_missile_count(), 0);
}

#[tokio::test]
async fn intercepted_missile_leaves_batches() {
    let state = test_state();
    let tracked = state.launch(srbm("Tracked")).unwrap();
    let stopped = state.launch(srbm("Stopped")).unwrap();
    state.intercept(&stopped.id, "yokosuka").unwrap();
    let mut rx = state.subscribe();

    run_tick(&state, Utc::now() + ChronoDuration::seconds(5));

    let event = parse(&rx.recv().await.unwrap());
    let data = event["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["missile"]["id"], tracked.id.as_str());
}

#[tokio::test]
async fn initial_data_carries_snapshot() {
    let state = test_state();
    state.launch(srbm("Snapshot")).unwrap();

    let payload = StreamEvent::initial_data(state.snapshot())
        .to_payload()
        .unwrap();
    let event = parse(&payload);
    assert_eq!(event["type"], "initial_data");
    assert_eq!(event["missiles"].as_array().unwrap().len(), 1);
    assert_eq!(event["interceptor_sites"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn lagging_subscriber_skips_old_batches() {
    let state = Arc::new(AppState::new(Config {
        database_path: None,
        broadcast_capacity: 2,
        ..Config::default()
    }));
    state.launch(srbm("Lagging")).unwrap();
    let mut rx = state.subscribe();

    let start = Utc::now();
    for step in 1..=5 {
        run_tick(&state, start + ChronoDuration::seconds(step));
    }

    assert!(matches!(
        rx.recv().await,
        Err(broadcast::error::RecvError::Lagged(3))
    ));
    // The newest batches are still delivered after the lag.
    let event = parse(&rx.recv().await.unwrap());
    assert_eq!(event["type"], "missile_updates");
}

#[tokio::test(start_paused = true)]
async fn loop_ticks_until_shutdown() {
    let state = test_state();
    state.launch(srbm("Looped")).unwrap();
    let mut rx = state.subscribe();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(run_simulation_loop(state.clone(), shutdown_rx));

    for _ in 0..3 {
        let event = parse(&rx.recv().await.unwrap());
        assert_eq!(event["type"], "missile_updates");
    }

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop stops on shutdown")
        .unwrap();
}

#[tokio::test]
async fn impact_tick_does_not_wait_on_busy_database() {
    let path = std::env::temp_dir()
        .join(format!("gmd-stream-{}.db", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    let db = init_database(&path, 1).await.unwrap();
    let state = Arc::new(AppState::with_database(
        db.clone(),
        Config {
            database_path: Some(path),
            database_max_connections: 1,
            ..Config::default()
        },
    ));
    let missile = state.launch(srbm("Busy")).unwrap();
    state.record_launch(&missile).await;

    // Hold the pool's only connection across the tick.
    let held = db.pool().acquire().await.unwrap();
    let started = std::time::Instant::now();
    let report = run_tick(&state, Utc::now() + ChronoDuration::seconds(600));
    assert_eq!(report.impacts.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));

    // Once the connection frees up, the queued status reaches the launch log.
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let rx = state.take_status_receiver().expect("status queue");
    let handle = tokio::spawn(run_status_persist_loop(db.clone(), state.clone(), rx, shutdown_rx));
    drop(held);

    let mut status = String::new();
    for _ in 0..100 {
        let records = launches_db::list_launches(db.pool(), 10).await.unwrap();
        status = records[0].status.clone();
        if status == "Impact" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, "Impact");

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}
