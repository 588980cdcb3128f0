mod common;

use common::Fixture;
use fieldveil_engine::{spawn_reload_schedule, ScheduleConfig};
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_secs(5 * 60 * 60);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("fieldveil_engine=debug")
        .try_init();
}

/// Waits (in real time) for the blocking reload kicked off by a tick to
/// finish publishing.
async fn settle(fixture: &Fixture, generation: u64) {
    for _ in 0..500 {
        if fixture.provider.current().generation() >= generation {
            return;
        }
        tokio::task::yield_now().await;
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("reload did not publish generation {generation}");
}

#[tokio::test(start_paused = true)]
async fn schedule_reloads_every_period() {
    init_tracing();
    let fixture = Fixture::standard();
    assert_eq!(fixture.provider.current().generation(), 1);

    let task = spawn_reload_schedule(
        Arc::clone(&fixture.provider),
        ScheduleConfig { period: PERIOD },
    );
    // Let the task register its interval before the clock moves.
    tokio::task::yield_now().await;

    tokio::time::advance(PERIOD + Duration::from_secs(1)).await;
    settle(&fixture, 2).await;

    tokio::time::advance(PERIOD).await;
    settle(&fixture, 3).await;

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn schedule_survives_a_failed_attempt() {
    init_tracing();
    let fixture = Fixture::standard();
    let task = spawn_reload_schedule(
        Arc::clone(&fixture.provider),
        ScheduleConfig { period: PERIOD },
    );

    // First attempt fails; the previous set keeps serving.
    fixture.loader.set_fail_definitions(true);
    tokio::time::advance(PERIOD + Duration::from_secs(1)).await;
    for _ in 0..50 {
        tokio::task::yield_now().await;
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(fixture.provider.current().generation(), 1);

    // Next period succeeds.
    fixture.loader.set_fail_definitions(false);
    tokio::time::advance(PERIOD).await;
    settle(&fixture, 2).await;

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn schedule_stops_after_dispose() {
    init_tracing();
    let fixture = Fixture::standard();
    let task = spawn_reload_schedule(
        Arc::clone(&fixture.provider),
        ScheduleConfig { period: PERIOD },
    );

    fixture.provider.dispose();
    tokio::time::advance(PERIOD + Duration::from_secs(1)).await;

    // The task observes the disposed provider at its next tick and ends.
    task.await.unwrap();
    assert!(fixture.provider.current().is_empty());
}

#[test]
fn default_schedule_is_five_hours() {
    assert_eq!(ScheduleConfig::default().period, Duration::from_secs(18_000));
}
