use super::*;
use crate::client::ClientError;
use crate::time_range::TimeRange;
use std::collections::BTreeMap;
use std::time::Duration;
use wire::{AnnotationKind, AnnotationModel, RawAnnotation, RawEntry, RawRow, RawState, StatesModel, StyleValue};

// =========================================================================
// MockClient
// =========================================================================

#[derive(Default)]
struct MockClient {
    trees: Mutex<Vec<Result<GenericResponse<EntryModel>, ClientError>>>,
    states: Mutex<Option<Result<GenericResponse<StatesModel>, ClientError>>>,
    annotations: Mutex<Option<GenericResponse<AnnotationModel>>>,
    styles: Mutex<Option<StyleModel>>,
    tree_calls: Mutex<u32>,
    style_calls: Mutex<u32>,
    queries: Mutex<Vec<Query>>,
}

impl MockClient {
    fn tree_calls(&self) -> u32 {
        *self.tree_calls.lock().unwrap()
    }

    fn style_calls(&self) -> u32 {
        *self.style_calls.lock().unwrap()
    }
}

#[async_trait]
impl AnalysisClient for MockClient {
    async fn fetch_tree(&self, _key: &OutputKey, _query: &Query) -> Result<GenericResponse<EntryModel>, ClientError> {
        *self.tree_calls.lock().unwrap() += 1;
        let mut trees = self.trees.lock().unwrap();
        if trees.is_empty() {
            Ok(GenericResponse::empty(ResponseStatus::Running, "running"))
        } else {
            trees.remove(0)
        }
    }

    async fn fetch_row_states(
        &self,
        _key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<StatesModel>, ClientError> {
        self.queries.lock().unwrap().push(query.clone());
        match self.states.lock().unwrap().take() {
            Some(result) => result,
            None => Ok(GenericResponse::completed(StatesModel::default())),
        }
    }

    async fn fetch_annotations(
        &self,
        _key: &OutputKey,
        _query: &Query,
    ) -> Result<GenericResponse<AnnotationModel>, ClientError> {
        Ok(self
            .annotations
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| GenericResponse::completed(AnnotationModel::default())))
    }

    async fn fetch_style_model(
        &self,
        _key: &OutputKey,
        _query: &Query,
    ) -> Result<GenericResponse<StyleModel>, ClientError> {
        *self.style_calls.lock().unwrap() += 1;
        match self.styles.lock().unwrap().clone() {
            Some(model) => Ok(GenericResponse::completed(model)),
            None => Err(ClientError::Transport("offline".into())),
        }
    }
}

fn raw_entry(id: i64, label: &str, start: i64, end: i64) -> RawEntry {
    RawEntry { id, parent_id: -1, labels: vec![label.into()], style: None, start, end, has_data: true }
}

fn entries(list: Vec<RawEntry>) -> EntryModel {
    EntryModel { entries: list }
}

fn fast_config() -> TimelineConfig {
    TimelineConfig { tree_poll_interval: Duration::from_millis(10), tree_max_polls: 3, ..TimelineConfig::default() }
}

fn session_with(client: Arc<MockClient>) -> OutputSession<ServerOutput> {
    OutputSession::new(ServerOutput::new(client, OutputKey::new("exp", "threads")), fast_config())
}

// =========================================================================
// fetch_tree
// =========================================================================

#[tokio::test(start_paused = true)]
async fn tree_polled_until_completed() {
    let client = Arc::new(MockClient::default());
    *client.trees.lock().unwrap() = vec![
        Ok(GenericResponse { model: Some(entries(vec![raw_entry(1, "a", 0, 10)])), ..GenericResponse::empty(ResponseStatus::Running, "") }),
        Ok(GenericResponse::completed(entries(vec![raw_entry(1, "a", 0, 10), raw_entry(2, "b", 0, 40)]))),
    ];
    let session = session_with(Arc::clone(&client));
    assert!(!session.is_ready());

    let tree = session.fetch_tree().await;
    assert_eq!(tree.len(), 2);
    assert_eq!(client.tree_calls(), 2);
    assert!(session.is_ready());
    assert_eq!(session.total_length(), 40);
}

#[tokio::test(start_paused = true)]
async fn tree_polling_gives_up_after_max_polls() {
    let client = Arc::new(MockClient::default());
    let session = session_with(Arc::clone(&client));
    let started = tokio::time::Instant::now();
    let tree = session.fetch_tree().await;
    assert!(tree.is_empty());
    assert_eq!(client.tree_calls(), 3);
    assert!(!session.is_ready());
    // Three polls, two waits in between: no wait after the last poll.
    assert_eq!(started.elapsed(), Duration::from_millis(20));
}

#[tokio::test]
async fn tree_failure_leaves_session_not_ready() {
    let client = Arc::new(MockClient::default());
    *client.trees.lock().unwrap() = vec![Err(ClientError::Status { status: 500, body: "boom".into() })];
    let session = session_with(Arc::clone(&client));
    assert!(session.fetch_tree().await.is_empty());
    assert_eq!(client.tree_calls(), 1);
}

// =========================================================================
// style_model
// =========================================================================

#[tokio::test]
async fn style_model_cached_until_forced() {
    let client = Arc::new(MockClient::default());
    let mut styles = BTreeMap::new();
    styles.insert("thread".to_owned(), ElementStyle::default().with("background-color", "#FF0000"));
    *client.styles.lock().unwrap() = Some(StyleModel { styles });
    let session = session_with(Arc::clone(&client));

    session.style_model(false).await;
    session.style_model(false).await;
    assert_eq!(client.style_calls(), 1);

    session.style_model(true).await;
    assert_eq!(client.style_calls(), 2);

    let resolved = session.resolve_style(Some(&ElementStyle::inherit("thread"))).await;
    assert_eq!(resolved.color.rgb, 0x00FF_0000);
    assert_eq!(client.style_calls(), 2);
}

#[tokio::test]
async fn style_fetch_failure_is_not_cached() {
    let client = Arc::new(MockClient::default());
    let session = session_with(Arc::clone(&client));
    let model = session.style_model(false).await;
    assert!(model.styles.is_empty());
    session.style_model(false).await;
    assert_eq!(client.style_calls(), 2);
}

#[test]
fn default_compute_style_without_reference() {
    let output = ServerOutput::new(Arc::new(MockClient::default()), OutputKey::new("e", "o"));
    let resolved = output.compute_style(&StyleModel::default(), None);
    assert_eq!(resolved, ResolvedStyle::default());
    let mut values = BTreeMap::new();
    values.insert("height".to_owned(), StyleValue::Number(0.5));
    let direct = ElementStyle { parent_key: None, values };
    let resolved = output.compute_style(&StyleModel::default(), Some(&direct));
    assert!((resolved.height - 0.5).abs() < f64::EPSILON);
}

// =========================================================================
// refresh
// =========================================================================

#[tokio::test]
async fn refresh_shapes_rows_from_server() {
    let client = Arc::new(MockClient::default());
    *client.trees.lock().unwrap() =
        vec![Ok(GenericResponse::completed(entries(vec![raw_entry(1, "a", 100, 200), raw_entry(2, "b", 100, 200)])))];
    *client.states.lock().unwrap() = Some(Ok(GenericResponse::completed(StatesModel {
        rows: vec![RawRow {
            entry_id: 1,
            states: vec![RawState { start: 110, end: 120, label: Some("run".into()), style: None }],
        }],
    })));
    let mut annotations = BTreeMap::new();
    annotations.insert(
        "marks".to_owned(),
        vec![RawAnnotation {
            time: 150,
            duration: 0,
            entry_id: 2,
            label: "m".into(),
            kind: AnnotationKind::Chart,
            style: None,
        }],
    );
    *client.annotations.lock().unwrap() = Some(GenericResponse::completed(AnnotationModel { annotations }));

    let session = session_with(Arc::clone(&client));
    session.fetch_tree().await;
    let model = session.refresh(&[2, 1], None).await.into_model().unwrap();

    assert_eq!(model.origin_offset, 100);
    assert_eq!(model.rows[0].entry_id, 2);
    assert_eq!(model.rows[0].annotations[0].time, 50);
    assert_eq!(model.rows[1].states[0].label, "run");
    assert_eq!((model.rows[1].states[0].start, model.rows[1].states[0].end), (10, 20));

    let queries = client.queries.lock().unwrap();
    assert_eq!(queries[0].parameters.requested_items, vec![2, 1]);
    let range = queries[0].parameters.requested_timerange.unwrap();
    assert_eq!((range.start, range.end), (100, 200));
}

#[tokio::test]
async fn refresh_degrades_transport_error_to_empty_rows() {
    let client = Arc::new(MockClient::default());
    *client.trees.lock().unwrap() = vec![Ok(GenericResponse::completed(entries(vec![raw_entry(1, "a", 0, 10)])))];
    *client.states.lock().unwrap() = Some(Err(ClientError::Transport("reset".into())));
    let session = session_with(Arc::clone(&client));
    session.fetch_tree().await;

    let model = session.refresh(&[1], None).await.into_model().unwrap();
    assert!(model.rows.is_empty());
    assert_eq!(model.total_length, 10);
}

#[tokio::test]
async fn refresh_before_tree_is_empty() {
    let client = Arc::new(MockClient::default());
    let session = session_with(Arc::clone(&client));
    let model = session.refresh(&[1], None).await.into_model().unwrap();
    assert!(model.rows.is_empty());
    assert!(client.queries.lock().unwrap().is_empty());
}

// =========================================================================
// stale responses
// =========================================================================

/// Capability whose data fetches take the next queued delay.
struct SlowOutput {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl OutputCapability for SlowOutput {
    async fn fetch_tree(&self) -> GenericResponse<EntryModel> {
        GenericResponse::completed(entries(vec![raw_entry(1, "a", 0, 1_000)]))
    }

    async fn fetch_data(&self, ids: &[EntryId], request: &DataRequest) -> RawData {
        let delay = self.delays.lock().unwrap().remove(0);
        tokio::time::sleep(delay).await;
        let label = format!("{}..{}", request.start, request.end);
        RawData {
            rows: Some(vec![RawRow {
                entry_id: ids[0],
                states: vec![RawState { start: 0, end: 10, label: Some(label), style: None }],
            }]),
            annotations: Vec::new(),
        }
    }

    async fn fetch_styles(&self) -> Option<StyleModel> {
        None
    }
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_refresh_is_superseded() {
    let output = SlowOutput { delays: Mutex::new(vec![Duration::from_millis(200), Duration::from_millis(10)]) };
    let session = OutputSession::new(output, TimelineConfig::default());
    session.fetch_tree().await;

    let early = FetchWindow { range: TimeRange::new(0, 100), resolution: 1.0 };
    let late = FetchWindow { range: TimeRange::new(900, 1_000), resolution: 1.0 };
    let (first, second) = tokio::join!(session.refresh(&[1], Some(early)), session.refresh(&[1], Some(late)));

    assert!(matches!(first, FetchOutcome::Superseded(Ticket { class: RequestClass::Rows, seq: 1 })));
    let model = second.into_model().unwrap();
    assert_eq!(model.rows[0].states[0].label, "700..1000");
}
