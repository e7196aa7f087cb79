#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use slotwatch_core::{SlotCandidate, Target};
use slotwatch_notify::{LogWriteError, Notifier, NotifyError, ResultLog, SlotRecord};
use slotwatch_poller::{
    Backoff, FetchWorkerPool, NotificationFanout, RetryPolicy, SweepContext, SweepReport,
    TargetPipeline,
};
use slotwatch_scraper::{
    ExtractionError, RawResponse, SlotExtractor, Transport, TransportError,
};
use tokio_util::sync::CancellationToken;

pub const BASE_URL: &str = "https://booking.test/tag.php";

pub fn url(location_id: u32, service_id: u32) -> String {
    Target::new(location_id, service_id).url(BASE_URL)
}

pub fn ok(body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        body: body.to_owned(),
    }
}

pub fn status(code: u16) -> RawResponse {
    RawResponse {
        status: code,
        body: String::new(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Rotate,
    Fetch(String),
}

/// Transport whose responses are scripted per URL. Once a URL's script runs
/// out, its fallback (or `200` with an empty body) is returned forever.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    fallbacks: HashMap<String, RawResponse>,
    latency: Duration,
    rotation_fails: bool,
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failing_rotation(mut self) -> Self {
        self.rotation_fails = true;
        self
    }

    pub fn script(self, url: String, responses: Vec<RawResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url, responses.into_iter().collect());
        self
    }

    pub fn always(mut self, url: String, response: RawResponse) -> Self {
        self.fallbacks.insert(url, response);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn fetches_of(&self, url: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Fetch(u) if u == url))
            .count()
    }

    pub fn fetch_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Fetch(_)))
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn rotate_identity(&self) -> Result<(), TransportError> {
        self.events.lock().unwrap().push(Event::Rotate);
        if self.rotation_fails {
            return Err(TransportError::IdentityRotation(
                "cannot reach control channel".to_owned(),
            ));
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.events.lock().unwrap().push(Event::Fetch(url.to_owned()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        let response = scripted
            .or_else(|| self.fallbacks.get(url).cloned())
            .unwrap_or_else(|| ok(""));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

/// Reads a body of comma-separated ISO dates. `<broken>` is a page without
/// a calendar.
pub struct DateListExtractor;

impl SlotExtractor for DateListExtractor {
    fn extract(&self, body: &str, url: &str) -> Result<Vec<SlotCandidate>, ExtractionError> {
        if body == "<broken>" {
            return Err(ExtractionError::MissingCalendar {
                url: url.to_owned(),
            });
        }
        body.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|d| SlotCandidate::new(d, url))
                    .map_err(|_| ExtractionError::UnparsableDay {
                        url: url.to_owned(),
                        text: s.to_owned(),
                    })
            })
            .collect()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Target, Vec<SlotCandidate>)>>,
    failing_locations: HashSet<u32>,
}

impl RecordingNotifier {
    pub fn failing_for(location_ids: &[u32]) -> Self {
        Self {
            failing_locations: location_ids.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Target, Vec<SlotCandidate>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, target: &Target, slots: &[SlotCandidate]) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push((*target, slots.to_vec()));
        if self.failing_locations.contains(&target.location_id) {
            return Err(NotifyError::Smtp("535 authentication failed".to_owned()));
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

#[derive(Default)]
pub struct RecordingLog {
    records: Mutex<Vec<SlotRecord>>,
    fail: bool,
}

impl RecordingLog {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<SlotRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultLog for RecordingLog {
    async fn append(&self, record: &SlotRecord) -> Result<(), LogWriteError> {
        if self.fail {
            return Err(LogWriteError::Io {
                path: "dates.log".to_owned(),
                source: std::io::Error::other("read-only file system"),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Collaborators plus the knobs a pool is built from.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub log: Arc<RecordingLog>,
    pub workers: usize,
    pub retry: RetryPolicy,
    pub max_rotation_failures: u32,
    pub max_log_failures: u32,
}

impl Harness {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport: Arc::new(transport),
            notifier: Arc::new(RecordingNotifier::default()),
            log: Arc::new(RecordingLog::default()),
            workers: 3,
            retry: RetryPolicy::bounded(3, Backoff::Fixed(Duration::from_secs(2))),
            max_rotation_failures: 5,
            max_log_failures: 3,
        }
    }

    pub fn pool(&self) -> FetchWorkerPool {
        let transport: Arc<dyn Transport> = self.transport.clone();
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        let log: Arc<dyn ResultLog> = self.log.clone();
        let pipeline = TargetPipeline::new(
            transport,
            Arc::new(DateListExtractor),
            BASE_URL,
            self.retry,
            self.max_rotation_failures,
        );
        let fanout = NotificationFanout::new(notifier, log, self.max_log_failures);
        FetchWorkerPool::new(pipeline, fanout, self.workers)
    }
}

pub async fn sweep(pool: &FetchWorkerPool, targets: Vec<Target>) -> SweepReport {
    pool.run_sweep(targets, &SweepContext::start(1), &CancellationToken::new())
        .await
}
