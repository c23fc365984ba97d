use super::*;

const INTERVAL: Duration = Duration::from_millis(300);

#[test]
fn first_request_fetches_immediately() {
    let mut debouncer = FetchDebouncer::new(INTERVAL);
    assert_eq!(debouncer.request_at(Instant::now()), DebounceDecision::FetchNow);
    assert!(!debouncer.has_pending());
}

#[test]
fn burst_collapses_into_one_trailing_fetch() {
    let mut debouncer = FetchDebouncer::new(INTERVAL);
    let t0 = Instant::now();
    assert_eq!(debouncer.request_at(t0), DebounceDecision::FetchNow);
    for ms in [50, 100, 150, 200] {
        assert_eq!(debouncer.request_at(t0 + Duration::from_millis(ms)), DebounceDecision::Deferred);
    }
    assert_eq!(debouncer.deadline(), Some(t0 + INTERVAL));

    assert!(!debouncer.poll_at(t0 + Duration::from_millis(299)));
    assert!(debouncer.poll_at(t0 + INTERVAL));
    assert!(!debouncer.poll_at(t0 + Duration::from_millis(900)));
    assert_eq!(debouncer.deadline(), None);
}

#[test]
fn quiet_period_allows_direct_fetch() {
    let mut debouncer = FetchDebouncer::new(INTERVAL);
    let t0 = Instant::now();
    debouncer.request_at(t0);
    assert_eq!(debouncer.request_at(t0 + Duration::from_millis(301)), DebounceDecision::FetchNow);
}

#[test]
fn poll_without_request_does_nothing() {
    let mut debouncer = FetchDebouncer::new(INTERVAL);
    assert!(!debouncer.poll_at(Instant::now()));
}

#[test]
fn trailing_fetch_restarts_interval() {
    let mut debouncer = FetchDebouncer::new(INTERVAL);
    let t0 = Instant::now();
    debouncer.request_at(t0);
    debouncer.request_at(t0 + Duration::from_millis(10));
    assert!(debouncer.poll_at(t0 + Duration::from_millis(400)));
    assert_eq!(debouncer.request_at(t0 + Duration::from_millis(500)), DebounceDecision::Deferred);
}
