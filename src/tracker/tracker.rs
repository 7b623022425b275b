use crate::domain::{RoutePoint, TrackedDevice};
use crate::route::{TrackingWindow, merge_route_points, normalize_records};
use crate::traccar::PositionsQuery;
use crate::tracker::position_feed::PositionFeed;
use crate::tracker::snapshot::{TrackingPhase, TrackingSnapshot};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, instrument, warn};

pub const NO_ROUTE_TODAY: &str = "No route recorded for today yet.";
pub const NO_ROUTE_FOR_DATE: &str = "No route recorded for this date.";

/// Owns the tracking session of one vehicle. Every (re)start aborts the previous session, so at
/// most one fetch loop is alive and its updates are the only ones applied.
#[derive(Debug)]
pub struct RouteTracker {
    feed: Arc<dyn PositionFeed>,
    poll_interval: Duration,
    state_tx: watch::Sender<TrackingSnapshot>,
    session: Option<JoinHandle<()>>,
}

impl RouteTracker {
    pub fn new(feed: Arc<dyn PositionFeed>, poll_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(TrackingSnapshot::default());

        RouteTracker {
            feed,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            state_tx,
            session: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|session| !session.is_finished())
    }

    #[instrument(skip_all, fields(device_id = device.traccar_id))]
    pub fn start(&mut self, device: TrackedDevice, window: TrackingWindow) {
        self.abort_session();

        let device_id = device.traccar_id;
        info!(
            should_poll = window.should_poll(),
            "🛰️ Tracking '{}' from {} to {}...",
            device.label,
            window.from(),
            window.to()
        );
        let session = self.reset(|snapshot| {
            snapshot.device = Some(device);
            snapshot.phase = TrackingPhase::FetchingHistory;
        });

        let publisher = SessionPublisher {
            tx: self.state_tx.clone(),
            session,
        };
        let feed = self.feed.clone();
        let poll_interval = self.poll_interval;
        self.session = Some(tokio::spawn(async move {
            track(feed, publisher, device_id, window, poll_interval).await;
        }));
    }

    /// Stops tracking and reports `message`, used when there is nothing to track.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.abort_session();
        let message = message.into();
        warn!("⚠️ Tracking unavailable: {}", message);
        self.reset(|snapshot| snapshot.error = Some(message));
    }

    pub fn cancel(&mut self) {
        if self.session.is_some() {
            info!("🛰️ Tracking cancelled");
        }
        self.abort_session();
        self.reset(|_| {});
    }

    fn abort_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.abort();
        }
    }

    fn reset(&self, init: impl FnOnce(&mut TrackingSnapshot)) -> u64 {
        let mut session = 0;
        self.state_tx.send_modify(|snapshot| {
            session = snapshot.session + 1;
            *snapshot = TrackingSnapshot {
                session,
                ..Default::default()
            };
            init(snapshot);
        });
        session
    }
}

impl Drop for RouteTracker {
    fn drop(&mut self) {
        self.abort_session();
    }
}

#[derive(Debug)]
struct SessionPublisher {
    tx: watch::Sender<TrackingSnapshot>,
    session: u64,
}

impl SessionPublisher {
    fn update(&self, modify: impl FnOnce(&mut TrackingSnapshot)) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.session != self.session {
                return false;
            }
            modify(snapshot);
            true
        })
    }
}

async fn track(feed: Arc<dyn PositionFeed>, publisher: SessionPublisher, device_id: i64, window: TrackingWindow, poll_interval: Duration) {
    let mut last_seen = fetch_history(feed.as_ref(), &publisher, device_id, &window).await;

    if !window.should_poll() {
        publisher.update(|snapshot| snapshot.phase = TrackingPhase::Idle);
        debug!("🛰️ Historical window, not polling device {}", device_id);
        return;
    }

    publisher.update(|snapshot| snapshot.phase = TrackingPhase::Polling);
    info!("🛰️ Polling device {} every {:?}", device_id, poll_interval);

    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(ticker);

    // The first tick completes immediately
    while ticks.next().await.is_some() {
        poll_latest(feed.as_ref(), &publisher, device_id, &mut last_seen).await;
    }
}

/// Loads the full route of the window and replaces the published route with it. Returns the
/// timestamp of the newest point.
#[instrument(skip(feed, publisher, window))]
async fn fetch_history(feed: &dyn PositionFeed, publisher: &SessionPublisher, device_id: i64, window: &TrackingWindow) -> i64 {
    let query = PositionsQuery::between(device_id, window.from(), window.request_to(Utc::now()));
    debug!("🛰️ Fetching route history...");

    let records = match feed.positions(&query).await {
        Ok(records) => records,
        Err(e) => {
            error!("❌ Unable to fetch the route of device {}: {}", device_id, e);
            let message = e.to_string();
            publisher.update(|snapshot| snapshot.error = Some(message));
            return 0;
        }
    };

    let points = normalize_records(&records);
    let last_seen = points.last().map_or(0, |point| point.timestamp);
    let error = if points.is_empty() {
        warn!("⚠️ Traccar returned no positions for device {}", device_id);
        Some(if window.should_poll() { NO_ROUTE_TODAY } else { NO_ROUTE_FOR_DATE }.to_string())
    } else {
        info!("🛰️ Fetching route history... OK, {} point(s) of {} record(s)", points.len(), records.len());
        None
    };

    publisher.update(|snapshot| {
        snapshot.route = points;
        snapshot.last_seen = last_seen;
        snapshot.error = error;
    });

    last_seen
}

/// Fetches the latest positions and merges the ones newer than `last_seen`. Failures only skip
/// this tick.
async fn poll_latest(feed: &dyn PositionFeed, publisher: &SessionPublisher, device_id: i64, last_seen: &mut i64) {
    let records = match feed.positions(&PositionsQuery::latest(device_id)).await {
        Ok(records) => records,
        Err(e) => {
            warn!("⚠️ Unable to poll the position of device {}: {}", device_id, e);
            return;
        }
    };

    let additions: Vec<RoutePoint> = normalize_records(&records)
        .into_iter()
        .filter(|point| point.timestamp > *last_seen)
        .collect();
    let Some(newest) = additions.last().map(|point| point.timestamp) else {
        debug!("🛰️ No new positions for device {}", device_id);
        return;
    };

    *last_seen = (*last_seen).max(newest);
    let last_seen = *last_seen;
    publisher.update(|snapshot| {
        snapshot.route = merge_route_points(&snapshot.route, &additions);
        snapshot.last_seen = last_seen;
        snapshot.error = None;
    });
    debug!("🛰️ Merged {} new position(s) for device {}", additions.len(), device_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traccar::TraccarClientError;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use test_log::test;
    use tokio::time::{sleep, timeout};

    type Response = Result<Vec<Value>, String>;

    #[derive(Debug)]
    struct FakeFeed {
        history: Response,
        polls: Mutex<VecDeque<Response>>,
        queries: Mutex<Vec<PositionsQuery>>,
    }

    impl FakeFeed {
        fn new(history: Response, polls: Vec<Response>) -> Arc<Self> {
            Arc::new(FakeFeed {
                history,
                polls: Mutex::new(polls.into()),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn poll_count(&self) -> usize {
            self.queries.lock().unwrap().iter().filter(|query| query.from.is_none()).count()
        }

        fn history_count(&self) -> usize {
            self.queries.lock().unwrap().iter().filter(|query| query.from.is_some()).count()
        }
    }

    #[async_trait]
    impl PositionFeed for FakeFeed {
        async fn positions(&self, query: &PositionsQuery) -> Result<Vec<Value>, TraccarClientError> {
            self.queries.lock().unwrap().push(query.clone());
            let response = if query.from.is_some() {
                self.history.clone()
            } else {
                self.polls.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
            };
            response.map_err(|message| TraccarClientError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message,
            })
        }
    }

    fn record(timestamp: i64) -> Value {
        json!({ "latitude": -16.5 + timestamp as f64 / 100_000.0, "longitude": -68.1, "timestamp": timestamp })
    }

    fn device(traccar_id: i64) -> TrackedDevice {
        TrackedDevice {
            traccar_id,
            label: format!("ID {}", traccar_id),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap()
    }

    fn live_window() -> TrackingWindow {
        TrackingWindow::for_date("2025-03-10", NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), now()).unwrap()
    }

    fn past_window() -> TrackingWindow {
        TrackingWindow::for_date("2025-03-08", NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), now()).unwrap()
    }

    fn timestamps(snapshot: &TrackingSnapshot) -> Vec<i64> {
        snapshot.route.iter().map(|point| point.timestamp).collect()
    }

    async fn wait_until(rx: &mut watch::Receiver<TrackingSnapshot>, predicate: impl FnMut(&TrackingSnapshot) -> bool) -> TrackingSnapshot {
        timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for the tracker")
            .expect("tracker closed")
            .clone()
    }

    #[test(tokio::test)]
    async fn historical_window_fetches_once_and_never_polls() {
        let feed = FakeFeed::new(Ok(vec![record(100), record(50)]), vec![]);
        let mut tracker = RouteTracker::new(feed.clone(), Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), past_window());
        let snapshot = wait_until(&mut rx, |s| s.phase == TrackingPhase::Idle).await;
        sleep(Duration::from_millis(60)).await;

        assert_eq!(timestamps(&snapshot), vec![50, 100]);
        assert_eq!(snapshot.vehicle_position().map(|p| p.timestamp), Some(100));
        assert_eq!(snapshot.error, None);
        assert_eq!(feed.history_count(), 1);
        assert_eq!(feed.poll_count(), 0);
        assert!(!tracker.is_running());
    }

    #[test(tokio::test)]
    async fn historical_query_is_bounded_to_the_delivery_day() {
        let feed = FakeFeed::new(Ok(vec![]), vec![]);
        let mut tracker = RouteTracker::new(feed.clone(), Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), past_window());
        wait_until(&mut rx, |s| s.phase == TrackingPhase::Idle).await;

        let queries = feed.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![PositionsQuery::between(7, past_window().from(), past_window().to())]
        );
    }

    #[test(tokio::test)]
    async fn empty_history_reports_that_there_is_no_route() {
        let feed = FakeFeed::new(Ok(vec![json!({ "latitude": -16.5 })]), vec![]);
        let mut tracker = RouteTracker::new(feed, Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), past_window());
        let snapshot = wait_until(&mut rx, |s| s.phase == TrackingPhase::Idle).await;

        assert!(snapshot.route.is_empty());
        assert_eq!(snapshot.vehicle_position(), None);
        assert_eq!(snapshot.error.as_deref(), Some(NO_ROUTE_FOR_DATE));
    }

    #[test(tokio::test)]
    async fn live_window_polls_and_merges_only_newer_points() {
        let feed = FakeFeed::new(
            Ok(vec![record(2000), record(1000)]),
            vec![Ok(vec![record(2000), record(3000)]), Ok(vec![record(2500), record(4000)])],
        );
        let mut tracker = RouteTracker::new(feed.clone(), Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), live_window());
        let snapshot = wait_until(&mut rx, |s| s.last_seen == 4000).await;

        assert_eq!(snapshot.phase, TrackingPhase::Polling);
        assert_eq!(timestamps(&snapshot), vec![1000, 2000, 3000, 4000]);
        assert_eq!(snapshot.vehicle_position().map(|p| p.timestamp), Some(4000));
        assert!(tracker.is_running());
    }

    #[test(tokio::test)]
    async fn empty_history_today_clears_once_positions_arrive() {
        let feed = FakeFeed::new(Ok(vec![]), vec![Ok(vec![]), Ok(vec![record(500)])]);
        let mut tracker = RouteTracker::new(feed, Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), live_window());
        let waiting = wait_until(&mut rx, |s| s.phase == TrackingPhase::Polling).await;
        assert_eq!(waiting.error.as_deref(), Some(NO_ROUTE_TODAY));

        let snapshot = wait_until(&mut rx, |s| !s.route.is_empty()).await;
        assert_eq!(timestamps(&snapshot), vec![500]);
        assert_eq!(snapshot.error, None);
    }

    #[test(tokio::test)]
    async fn poll_failures_skip_the_tick() {
        let feed = FakeFeed::new(
            Ok(vec![record(100)]),
            vec![Err("bad gateway".to_string()), Ok(vec![record(200)])],
        );
        let mut tracker = RouteTracker::new(feed.clone(), Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), live_window());
        let snapshot = wait_until(&mut rx, |s| s.last_seen == 200).await;

        assert_eq!(timestamps(&snapshot), vec![100, 200]);
        assert_eq!(snapshot.error, None);
        assert!(feed.poll_count() >= 2);
    }

    #[test(tokio::test)]
    async fn history_failures_are_reported_and_polling_continues() {
        let feed = FakeFeed::new(Err("Device access denied".to_string()), vec![Ok(vec![record(100)])]);
        let mut tracker = RouteTracker::new(feed, Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), live_window());
        let failed = wait_until(&mut rx, |s| s.error.is_some()).await;
        assert_eq!(failed.error.as_deref(), Some("Device access denied"));

        let recovered = wait_until(&mut rx, |s| s.last_seen == 100).await;
        assert_eq!(recovered.error, None);
    }

    #[test(tokio::test)]
    async fn cancel_stops_polling_and_discards_the_route() {
        let feed = FakeFeed::new(Ok(vec![record(100)]), vec![]);
        let mut tracker = RouteTracker::new(feed.clone(), Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), live_window());
        wait_until(&mut rx, |s| s.phase == TrackingPhase::Polling).await;
        tracker.cancel();
        let polls = feed.poll_count();
        sleep(Duration::from_millis(60)).await;

        let snapshot = tracker.snapshot();
        assert_eq!(feed.poll_count(), polls);
        assert_eq!(snapshot.phase, TrackingPhase::Idle);
        assert!(snapshot.route.is_empty());
        assert_eq!(snapshot.device, None);
        assert!(!tracker.is_running());
    }

    #[test(tokio::test)]
    async fn restarting_replaces_the_previous_session() {
        let feed = FakeFeed::new(Ok(vec![record(100)]), vec![]);
        let mut tracker = RouteTracker::new(feed, Duration::from_millis(10));
        let mut rx = tracker.subscribe();

        tracker.start(device(7), live_window());
        wait_until(&mut rx, |s| s.phase == TrackingPhase::Polling).await;
        tracker.start(device(8), past_window());
        let snapshot = wait_until(&mut rx, |s| s.phase == TrackingPhase::Idle).await;

        assert_eq!(snapshot.session, 2);
        assert_eq!(snapshot.device, Some(device(8)));
        assert_eq!(timestamps(&snapshot), vec![100]);
    }

    #[test]
    fn fail_reports_the_message_without_a_session() {
        let feed = FakeFeed::new(Ok(vec![]), vec![]);
        let mut tracker = RouteTracker::new(feed.clone(), Duration::from_millis(10));

        tracker.fail("No GPS device assigned to the vehicle.");

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.error.as_deref(), Some("No GPS device assigned to the vehicle."));
        assert_eq!(snapshot.phase, TrackingPhase::Idle);
        assert_eq!(feed.history_count(), 0);
    }
}
