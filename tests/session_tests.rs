use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use sat_o_track::map::{Layer, Scene};
use sat_o_track::provider::{
    MemoryProvider, Position, ProviderError, SatelliteId, SatelliteRecord,
};
use sat_o_track::tracker::{DetailOutcome, SessionOptions, TrackingSession};

const ISS_TLE: &str = "ISS (ZARYA)\n\
    1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992\n\
    2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

fn record(id: u32) -> SatelliteRecord {
    SatelliteRecord {
        id: SatelliteId(id),
        name: format!("SAT-{id}"),
        designator: format!("2020-{id:03}A"),
        launch_date: "2020-07-12".into(),
    }
}

fn ids(raw: &[u32]) -> Vec<SatelliteId> {
    raw.iter().copied().map(SatelliteId).collect()
}

/// Provider with satellites 100..=104 in category 0, each with a position.
fn five_satellites() -> Arc<MemoryProvider> {
    let provider = Arc::new(MemoryProvider::new());
    provider.set_listing(0, (100..=104).map(record).collect());
    for id in 100..=104 {
        provider.set_position(SatelliteId(id), Position::new(id as f64 / 10.0, -74.0, 420.0));
    }
    provider
}

fn session(provider: &Arc<MemoryProvider>) -> TrackingSession<Scene> {
    TrackingSession::new(provider.clone(), Scene::new(), SessionOptions::default())
}

fn popup_content(session: &TrackingSession<Scene>, id: SatelliteId) -> String {
    let marker = session
        .snapshot()
        .overlays
        .into_iter()
        .find(|o| o.id == id)
        .and_then(|o| o.marker)
        .expect("satellite has a marker");
    session.with_map(|scene| match scene.layer(marker) {
        Some(Layer::Marker { popup, .. }) => popup.content.clone(),
        other => panic!("expected marker layer, got {other:?}"),
    })
}

#[tokio::test]
async fn failures_stay_with_their_satellite() {
    let provider = five_satellites();
    let session = session(&provider);

    assert_eq!(session.select_category(0, 5).await.unwrap(), 5);
    assert_eq!(session.overlay_ids(), ids(&[100, 101, 102, 103, 104]));
    assert_eq!(session.errors_shown(), 0);

    for id in 102..=104 {
        provider.fail_position(SatelliteId(id), ProviderError::Status(503));
    }
    session.tick().await;

    assert_eq!(session.trail_len(SatelliteId(100)), Some(2));
    assert_eq!(session.trail_len(SatelliteId(101)), Some(2));
    for id in 102..=104 {
        assert_eq!(session.trail_len(SatelliteId(id)), Some(1));
    }
    assert_eq!(session.errors_shown(), 3);
    assert_eq!(
        session.error_message().as_deref(),
        Some("Error updating satellite position: HTTP error! status: 503")
    );
}

#[tokio::test]
async fn failed_category_leaves_tracking_untouched() {
    let provider = five_satellites();
    provider.set_trajectory(SatelliteId(100), vec![Position::new(12.0, -70.0, 420.0); 4]);
    provider.fail_listing(3, ProviderError::Transport("connection refused".into()));
    let session = session(&provider);
    session.select_category(0, 5).await.unwrap();
    session.tick().await;
    assert!(session.open_popup(SatelliteId(101)));

    let generation = session.generation();
    let scene = session.with_map(Scene::snapshot);
    let trails: Vec<_> = (100..=104)
        .map(|id| session.trail_points(SatelliteId(id)))
        .collect();
    let overlays = session.snapshot().overlays;
    assert_eq!(session.trail_len(SatelliteId(100)), Some(2));
    assert_eq!(session.trajectory_len(SatelliteId(100)), Some(4));

    let err = session.select_category(3, 5).await.unwrap_err();
    assert_eq!(err, ProviderError::Transport("connection refused".into()));

    assert_eq!(session.category(), Some(0));
    assert_eq!(session.generation(), generation);
    assert_eq!(session.tracked_ids(), ids(&[100, 101, 102, 103, 104]));
    assert_eq!(session.with_map(Scene::snapshot), scene);
    assert_eq!(
        (100..=104)
            .map(|id| session.trail_points(SatelliteId(id)))
            .collect::<Vec<_>>(),
        trails
    );
    assert_eq!(session.snapshot().overlays, overlays);
    assert_eq!(session.errors_shown(), 1);
    assert!(session
        .error_message()
        .unwrap()
        .starts_with("Error fetching satellites: "));
}

#[tokio::test]
async fn lowering_limit_removes_dropped_overlays() {
    let provider = five_satellites();
    let session = session(&provider);
    session.select_category(0, 5).await.unwrap();
    assert_eq!(session.with_map(Scene::layer_count), 10);

    assert_eq!(session.change_limit("2").await.unwrap(), 2);

    assert_eq!(session.limit(), 2);
    assert_eq!(session.tracked_ids(), ids(&[100, 101]));
    assert_eq!(session.overlay_ids(), ids(&[100, 101]));
    // one marker and one trail each
    assert_eq!(session.with_map(Scene::layer_count), 4);
    assert_eq!(session.trail_len(SatelliteId(102)), None);
}

#[tokio::test]
async fn unusable_limit_input_falls_back_to_five() {
    let provider = Arc::new(MemoryProvider::new());
    provider.set_listing(0, (1..=9).map(record).collect());
    let session = session(&provider);
    session.select_category(0, 2).await.unwrap();

    assert_eq!(session.change_limit("lots").await.unwrap(), 5);
    assert_eq!(session.limit(), 5);
}

#[tokio::test(start_paused = true)]
async fn late_responses_for_replaced_set_are_dropped() {
    let provider = five_satellites();
    provider.set_latency(SatelliteId(104), Duration::from_secs(10));
    let session = session(&provider);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.select_category(0, 5).await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.overlay_ids(), ids(&[100, 101, 102, 103]));

    session.change_limit("2").await.unwrap();
    tokio::time::sleep(Duration::from_secs(15)).await;

    assert_eq!(first.await.unwrap().unwrap(), 5);
    assert_eq!(session.overlay_ids(), ids(&[100, 101]));
    assert_eq!(session.with_map(Scene::layer_count), 4);
}

#[tokio::test(start_paused = true)]
async fn late_failures_for_replaced_set_are_not_shown() {
    let provider = five_satellites();
    provider.fail_position(SatelliteId(104), ProviderError::Status(500));
    provider.set_latency(SatelliteId(104), Duration::from_secs(10));
    let session = session(&provider);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.select_category(0, 5).await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    session.change_limit("2").await.unwrap();
    first.await.unwrap().unwrap();

    assert_eq!(session.errors_shown(), 0);
    assert_eq!(session.error_message(), None);
}

#[tokio::test]
async fn trajectory_is_replaced_each_tick() {
    let provider = five_satellites();
    let id = SatelliteId(100);
    provider.set_trajectory(id, vec![Position::new(10.0, 10.0, 420.0); 10]);
    let session = session(&provider);

    session.select_category(0, 1).await.unwrap();
    assert_eq!(session.trajectory_len(id), Some(10));
    assert_eq!(session.with_map(Scene::layer_count), 3);

    provider.set_trajectory(id, vec![Position::new(11.0, 11.0, 420.0); 6]);
    session.tick().await;

    assert_eq!(session.trajectory_len(id), Some(6));
    assert_eq!(session.with_map(Scene::layer_count), 3);
}

#[tokio::test]
async fn empty_trajectory_is_silent() {
    let provider = five_satellites();
    let session = session(&provider);

    session.select_category(0, 1).await.unwrap();

    assert_eq!(session.trajectory_len(SatelliteId(100)), None);
    assert_eq!(session.error_message(), None);
}

#[tokio::test]
async fn trajectory_failure_is_surfaced() {
    let provider = five_satellites();
    provider.fail_trajectory(SatelliteId(100), ProviderError::Status(429));
    let session = session(&provider);

    session.select_category(0, 1).await.unwrap();

    assert_eq!(session.trail_len(SatelliteId(100)), Some(1));
    assert_eq!(
        session.error_message().as_deref(),
        Some("Error fetching satellite trajectory: HTTP error! status: 429")
    );
}

#[tokio::test]
async fn details_merge_into_open_popup_and_survive_refresh() {
    let provider = five_satellites();
    let id = SatelliteId(100);
    provider.set_tle(id, ISS_TLE);
    let session = session(&provider);
    session.select_category(0, 1).await.unwrap();

    assert!(session.open_popup(id));
    assert_eq!(session.load_details(id).await.unwrap(), DetailOutcome::Merged);
    assert!(popup_content(&session, id).contains("1 25544U"));

    session.tick().await;
    assert!(popup_content(&session, id).contains("1 25544U"));

    assert!(session.close_popup(id));
    assert!(!popup_content(&session, id).contains("1 25544U"));
}

#[tokio::test]
async fn details_for_closed_popup_are_a_no_op() {
    let provider = five_satellites();
    let id = SatelliteId(100);
    provider.set_tle(id, ISS_TLE);
    let session = session(&provider);
    session.select_category(0, 1).await.unwrap();

    assert_eq!(
        session.load_details(id).await.unwrap(),
        DetailOutcome::PopupClosed
    );
    assert!(!popup_content(&session, id).contains("1 25544U"));
    assert_eq!(session.errors_shown(), 0);
}

#[tokio::test(start_paused = true)]
async fn popup_closed_while_loading_drops_details() {
    let provider = five_satellites();
    let id = SatelliteId(100);
    provider.set_tle(id, ISS_TLE);
    let session = session(&provider);
    session.select_category(0, 1).await.unwrap();
    provider.set_latency(id, Duration::from_secs(3));

    assert!(session.open_popup(id));
    let loading = tokio::spawn({
        let session = session.clone();
        async move { session.load_details(id).await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(session.close_popup(id));

    assert_eq!(loading.await.unwrap().unwrap(), DetailOutcome::PopupClosed);
    assert!(!popup_content(&session, id).contains("1 25544U"));
    assert_eq!(session.errors_shown(), 0);
}

#[tokio::test]
async fn details_failure_keeps_popup_content() {
    let provider = five_satellites();
    let id = SatelliteId(100);
    provider.fail_tle(id, ProviderError::Transport("timed out".into()));
    let session = session(&provider);
    session.select_category(0, 1).await.unwrap();
    assert!(session.open_popup(id));
    let before = popup_content(&session, id);

    assert!(session.load_details(id).await.is_err());

    assert_eq!(popup_content(&session, id), before);
    assert!(session.snapshot().overlays[0].popup_open);
    assert_eq!(session.errors_shown(), 1);
}
