#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use harvester_core::{ExtractedContent, IdleThreshold, Resource, ResourceId};
use harvester_engine::{
    ContentExtractor, DestroyError, EnumerationError, ExtractionError, IdleEventSource,
    MetadataExtractor, ResourceEnumerator, SubmitOutcome, Submitter,
};
use tokio::sync::Semaphore;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Extracted(ResourceId),
    Submitted { url: String, accepted: bool },
    Destroyed(ResourceId),
}

/// Ordered log of every capability call, shared by all fakes of a test.
#[derive(Debug, Default)]
pub struct Journal {
    events: Mutex<Vec<Event>>,
}

impl Journal {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<ResourceId> {
        let mut ids: Vec<_> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Destroyed(id) => Some(id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn extracted_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Extracted(_)))
            .count()
    }

    pub fn submitted_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Submitted { .. }))
            .count()
    }

    /// Every destroy must follow an accepted submission of the same resource.
    pub fn assert_destroys_follow_acceptance(&self, urls: &HashMap<ResourceId, String>) {
        let events = self.events();
        for (idx, event) in events.iter().enumerate() {
            if let Event::Destroyed(id) = event {
                let url = &urls[id];
                let accepted_before = events[..idx].iter().any(|e| {
                    matches!(e, Event::Submitted { url: u, accepted: true } if u == url)
                });
                assert!(accepted_before, "resource {id} destroyed before acceptance");
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

pub struct FakeHost {
    resources: Mutex<Vec<Resource>>,
    active: Mutex<Vec<ResourceId>>,
    fail_listing: AtomicBool,
    fail_destroy: Mutex<HashSet<ResourceId>>,
    listing_delay: Mutex<Duration>,
    destroy_delay: Mutex<Duration>,
    journal: Arc<Journal>,
}

impl FakeHost {
    pub fn new(resources: Vec<Resource>, active: &[ResourceId], journal: Arc<Journal>) -> Self {
        Self {
            resources: Mutex::new(resources),
            active: Mutex::new(active.to_vec()),
            fail_listing: AtomicBool::new(false),
            fail_destroy: Mutex::new(HashSet::new()),
            listing_delay: Mutex::new(Duration::ZERO),
            destroy_delay: Mutex::new(Duration::ZERO),
            journal,
        }
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    pub fn fail_destroy_of(&self, id: ResourceId) {
        self.fail_destroy.lock().unwrap().insert(id);
    }

    /// Listing calls sleep for `delay` before answering.
    pub fn stall_listing(&self, delay: Duration) {
        *self.listing_delay.lock().unwrap() = delay;
    }

    /// Destroy calls sleep for `delay` before closing anything.
    pub fn stall_destroy(&self, delay: Duration) {
        *self.destroy_delay.lock().unwrap() = delay;
    }

    pub fn open_ids(&self) -> Vec<ResourceId> {
        self.resources.lock().unwrap().iter().map(|r| r.id).collect()
    }

    pub fn urls(&self) -> HashMap<ResourceId, String> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.url.clone().map(|url| (r.id, url)))
            .collect()
    }
}

#[async_trait::async_trait]
impl ResourceEnumerator for FakeHost {
    async fn list_all(&self) -> Result<Vec<Resource>, EnumerationError> {
        let delay = *self.listing_delay.lock().unwrap();
        pause(delay).await;
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(EnumerationError::Unavailable("host went away".into()));
        }
        Ok(self.resources.lock().unwrap().clone())
    }

    async fn list_active(&self) -> Result<Vec<Resource>, EnumerationError> {
        let delay = *self.listing_delay.lock().unwrap();
        pause(delay).await;
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(EnumerationError::Unavailable("host went away".into()));
        }
        let active = self.active.lock().unwrap().clone();
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| active.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn destroy(&self, id: ResourceId) -> Result<(), DestroyError> {
        let delay = *self.destroy_delay.lock().unwrap();
        pause(delay).await;
        if self.fail_destroy.lock().unwrap().contains(&id) {
            return Err(DestroyError::Refused("tab is being dragged".into()));
        }
        let mut resources = self.resources.lock().unwrap();
        let before = resources.len();
        resources.retain(|r| r.id != id);
        if resources.len() == before {
            return Err(DestroyError::NotFound(id));
        }
        self.journal.push(Event::Destroyed(id));
        Ok(())
    }
}

/// Metadata extraction that journals calls and can be told to fail, stall or
/// wait for a permit.
pub struct FakeExtractor {
    journal: Arc<Journal>,
    failing: Mutex<HashSet<ResourceId>>,
    panicking: Mutex<HashSet<ResourceId>>,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            failing: Mutex::new(HashSet::new()),
            panicking: Mutex::new(HashSet::new()),
            delay: Duration::ZERO,
            gate: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every extraction waits for one permit of `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fail_for(&self, id: ResourceId) {
        self.failing.lock().unwrap().insert(id);
    }

    /// Extracting `id` panics instead of returning.
    pub fn panic_for(&self, id: ResourceId) {
        self.panicking.lock().unwrap().insert(id);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, resource: &Resource) -> Result<ExtractedContent, ExtractionError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.lock().unwrap().remove(&resource.id) {
            panic!("extractor blew up on resource {}", resource.id);
        }
        if self.failing.lock().unwrap().contains(&resource.id) {
            return Err(ExtractionError::Unavailable("page crashed".into()));
        }
        self.journal.push(Event::Extracted(resource.id));
        MetadataExtractor.extract(resource).await
    }
}

/// Answers per URL; unknown URLs are accepted.
pub struct ScriptedSubmitter {
    journal: Arc<Journal>,
    answers: Mutex<HashMap<String, SubmitOutcome>>,
    delay: Mutex<Duration>,
}

impl ScriptedSubmitter {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            answers: Mutex::new(HashMap::new()),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn answer(&self, url: &str, outcome: SubmitOutcome) {
        self.answers.lock().unwrap().insert(url.to_string(), outcome);
    }

    /// Every submission sleeps for `delay` before answering.
    pub fn stall(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait::async_trait]
impl Submitter for ScriptedSubmitter {
    async fn submit(&self, content: &ExtractedContent) -> SubmitOutcome {
        let delay = *self.delay.lock().unwrap();
        pause(delay).await;
        let outcome = self
            .answers
            .lock()
            .unwrap()
            .get(&content.source_url)
            .cloned()
            .unwrap_or(SubmitOutcome::Accepted);
        self.journal.push(Event::Submitted {
            url: content.source_url.clone(),
            accepted: outcome.is_accepted(),
        });
        outcome
    }
}

/// Idle source that only remembers the last threshold it was given.
#[derive(Default)]
pub struct RecordingIdleSource {
    applied: Mutex<Vec<IdleThreshold>>,
}

impl RecordingIdleSource {
    pub fn applied(&self) -> Vec<u64> {
        self.applied.lock().unwrap().iter().map(|t| t.secs()).collect()
    }
}

impl IdleEventSource for RecordingIdleSource {
    fn threshold(&self) -> IdleThreshold {
        self.applied
            .lock()
            .unwrap()
            .last()
            .copied()
            .unwrap_or_default()
    }

    fn set_threshold(&self, threshold: IdleThreshold) {
        self.applied.lock().unwrap().push(threshold);
    }
}
