//! Test doubles and common utilities for contract tests
//!
//! These doubles stand in for the network and the disk so the pipeline's
//! guarantees can be checked deterministically.

#![allow(dead_code)]

use async_trait::async_trait;
use parcel_core::{
    Carrier, EngineConfig, Error, Event, HistoryEntry, MemoryParcelStore, Notifier, Parcel,
    ParcelStore, ParcelTracker, Result, TrackingNumber, TrackingProvider, TrackingResolver,
    TrackingResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted provider answers for one tracking number
#[derive(Debug, Clone)]
pub enum Answer {
    Events(Vec<Event>),
    Nothing,
    Fail,
}

/// A provider whose answers are set by the test
pub struct ScriptedProvider {
    name: &'static str,
    carrier: Option<Carrier>,
    answers: Mutex<HashMap<String, Answer>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn universal(name: &'static str) -> Self {
        Self {
            name,
            carrier: None,
            answers: Mutex::new(HashMap::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn dedicated(name: &'static str, carrier: Carrier) -> Self {
        Self {
            carrier: Some(carrier),
            ..Self::universal(name)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn answer(&self, number: &str, answer: Answer) {
        let number = TrackingNumber::parse(number).unwrap();
        self.answers
            .lock()
            .unwrap()
            .insert(number.as_str().to_string(), answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackingProvider for ScriptedProvider {
    async fn track(
        &self,
        number: &TrackingNumber,
        hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let answer = self
            .answers
            .lock()
            .unwrap()
            .get(number.as_str())
            .cloned()
            .unwrap_or(Answer::Nothing);

        match answer {
            Answer::Events(events) => Ok(Some(TrackingResult {
                carrier: hint.map(|c| c.code().to_string()),
                provider: self.name.to_string(),
                status: events
                    .first()
                    .map(|e| e.status.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                events,
            })),
            Answer::Nothing => Ok(None),
            Answer::Fail => Err(Error::http("connection reset by peer")),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn carrier(&self) -> Option<Carrier> {
        self.carrier
    }
}

/// Store wrapper that counts every mutating call
///
/// It can also be told to fail the next `update_parcel` without touching
/// the inner store.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryParcelStore,
    mutations: AtomicUsize,
    fail_next_update: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    fn count(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParcelStore for CountingStore {
    async fn insert(&self, parcel: Parcel) -> Result<Parcel> {
        self.count();
        self.inner.insert(parcel).await
    }

    async fn get(&self, number: &TrackingNumber) -> Result<Option<Parcel>> {
        self.inner.get(number).await
    }

    async fn list(&self) -> Result<Vec<Parcel>> {
        self.inner.list().await
    }

    async fn update_parcel(&self, parcel: &Parcel) -> Result<()> {
        self.count();
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(Error::state_store("disk full"));
        }
        self.inner.update_parcel(parcel).await
    }

    async fn remove(&self, number: &TrackingNumber) -> Result<()> {
        self.count();
        self.inner.remove(number).await
    }

    async fn append_history(&self, number: &TrackingNumber, event: &Event) -> Result<()> {
        self.count();
        self.inner.append_history(number, event).await
    }

    async fn history(&self, number: &TrackingNumber) -> Result<Vec<HistoryEntry>> {
        self.inner.history(number).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Notifier that records messages and can be told to fail
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        if self.fail {
            return Err(Error::notification("transport unavailable"));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

pub fn event(timestamp: &str, status: &str) -> Event {
    Event::new(timestamp, status, "Paris", format!("{} at hub", status))
}

/// Resolver over the given universal providers, in order
pub fn resolver(universal: &[Arc<ScriptedProvider>]) -> TrackingResolver {
    let mut resolver = TrackingResolver::new(Duration::from_secs(5));
    for provider in universal {
        resolver.add_universal(provider.clone());
    }
    resolver
}

pub fn tracker(
    store: Arc<dyn ParcelStore>,
    resolver: TrackingResolver,
    max_concurrent_checks: usize,
) -> ParcelTracker {
    let engine = EngineConfig {
        max_concurrent_checks,
        ..EngineConfig::default()
    };
    ParcelTracker::new(store, resolver, &engine)
}
