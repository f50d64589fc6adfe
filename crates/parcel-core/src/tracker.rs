//! Parcel tracker
//!
//! Ties the pipeline together for the operations a front end needs:
//! adding and removing parcels, one-off lookups, and the check cycle.
//!
//! ## Check cycle
//!
//! ```text
//!   store.list()
//!        │  (newest first)
//!        ▼
//!  ┌─────────────┐   per parcel, at most `max_concurrent_checks` at once
//!  │  resolver   │── TrackingResult ──▶ detector ──▶ Detection
//!  └─────────────┘                                      │
//!                                                       ▼
//!                                  store.update_parcel() + append_history()
//! ```
//!
//! A parcel whose chain yields nothing is untrackable for this cycle and is
//! left untouched. A store failure on one parcel is logged and does not stop
//! the others.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::carrier::{Carrier, TrackingNumber};
use crate::config::EngineConfig;
use crate::detector::{ChangeDetector, Update};
use crate::error::{Error, Result};
use crate::resolver::TrackingResolver;
use crate::traits::{HistoryEntry, Parcel, ParcelStore, TrackingResult};

/// Outcome of one check cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// New events, in list order (newest-created parcel first)
    pub updates: Vec<Update>,
    /// Parcels no provider had data for
    pub untrackable: Vec<TrackingNumber>,
    /// Parcels whose state could not be written
    pub failed: Vec<TrackingNumber>,
    /// Parcels examined
    pub checked: usize,
}

impl CheckReport {
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}

enum Outcome {
    Unchanged,
    Updated(Update),
    Untrackable,
    Failed,
}

/// Front door to the tracking pipeline
pub struct ParcelTracker {
    store: Arc<dyn ParcelStore>,
    resolver: Arc<TrackingResolver>,
    detector: ChangeDetector,
    max_concurrent_checks: usize,
}

impl ParcelTracker {
    pub fn new(
        store: Arc<dyn ParcelStore>,
        resolver: TrackingResolver,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            store,
            resolver: Arc::new(resolver),
            detector: ChangeDetector::new(engine.detection_mode),
            max_concurrent_checks: engine.max_concurrent_checks.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn ParcelStore> {
        &self.store
    }

    pub fn resolver(&self) -> &TrackingResolver {
        &self.resolver
    }

    /// Start tracking a parcel.
    ///
    /// The carrier is detected once, here, and kept as the parcel's hint.
    ///
    /// # Returns
    ///
    /// - `Err(Error::InvalidInput)`: the number is empty or malformed
    /// - `Err(Error::AlreadyExists)`: the number is already tracked
    pub async fn add(
        &self,
        raw: &str,
        alias: Option<String>,
        destination: Option<String>,
    ) -> Result<Parcel> {
        let number = TrackingNumber::parse(raw)?;
        let carrier = self.resolver.matcher().match_carrier(number.as_str());
        let alias = alias.filter(|a| !a.trim().is_empty());
        let destination = destination.filter(|d| !d.trim().is_empty());

        let parcel = self
            .store
            .insert(Parcel::new(number, carrier, alias, destination))
            .await?;
        info!(
            number = %parcel.tracking_number,
            carrier = ?parcel.carrier_hint,
            "parcel added"
        );
        Ok(parcel)
    }

    /// Stop tracking a parcel
    ///
    /// # Returns
    ///
    /// - `Err(Error::NotFound)`: nothing tracked under that number; nothing changed
    pub async fn remove(&self, raw: &str) -> Result<TrackingNumber> {
        let number = TrackingNumber::parse(raw)?;
        self.store.remove(&number).await?;
        info!(number = %number, "parcel removed");
        Ok(number)
    }

    /// All tracked parcels, newest first
    pub async fn list(&self) -> Result<Vec<Parcel>> {
        self.store.list().await
    }

    /// Archived events of a tracked parcel, oldest first
    pub async fn history(&self, raw: &str) -> Result<Vec<HistoryEntry>> {
        let number = TrackingNumber::parse(raw)?;
        if self.store.get(&number).await?.is_none() {
            return Err(Error::not_found(format!("Parcel {} not found", number)));
        }
        self.store.history(&number).await
    }

    /// Carrier inferred from the number's shape
    pub fn detect(&self, raw: &str) -> Result<Option<Carrier>> {
        let number = TrackingNumber::parse(raw)?;
        Ok(self.resolver.matcher().match_carrier(number.as_str()))
    }

    /// One-off lookup through the chain, without touching the store
    pub async fn track(&self, raw: &str) -> Result<Option<TrackingResult>> {
        let number = TrackingNumber::parse(raw)?;
        Ok(self.resolver.resolve(&number, None).await)
    }

    /// Run one check cycle over every tracked parcel
    ///
    /// # Returns
    ///
    /// - `Ok(CheckReport)`: always, unless the parcel list itself cannot be read
    pub async fn check(&self) -> Result<CheckReport> {
        let parcels = self.store.list().await?;
        let mut report = CheckReport {
            checked: parcels.len(),
            ..CheckReport::default()
        };
        if parcels.is_empty() {
            debug!("no parcels to check");
            return Ok(report);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_checks));
        let mut tasks = JoinSet::new();

        for (index, parcel) in parcels.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let store = Arc::clone(&self.store);
            let resolver = Arc::clone(&self.resolver);
            let detector = self.detector;

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = check_parcel(store.as_ref(), &resolver, detector, &parcel).await;
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Outcome>> = parcels.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!(error = %e, "parcel check task failed"),
            }
        }

        for (parcel, outcome) in parcels.into_iter().zip(outcomes) {
            match outcome {
                Some(Outcome::Updated(update)) => report.updates.push(update),
                Some(Outcome::Unchanged) => {}
                Some(Outcome::Untrackable) => report.untrackable.push(parcel.tracking_number),
                Some(Outcome::Failed) | None => report.failed.push(parcel.tracking_number),
            }
        }

        if let Err(e) = self.store.flush().await {
            warn!(error = %e, "failed to flush parcel store after check");
        }

        info!(
            checked = report.checked,
            updates = report.updates.len(),
            untrackable = report.untrackable.len(),
            failed = report.failed.len(),
            "check cycle complete"
        );
        Ok(report)
    }
}

async fn check_parcel(
    store: &dyn ParcelStore,
    resolver: &TrackingResolver,
    detector: ChangeDetector,
    parcel: &Parcel,
) -> Outcome {
    let number = &parcel.tracking_number;

    let Some(result) = resolver.resolve(number, parcel.carrier_hint).await else {
        debug!(number = %number, "no tracking data this cycle");
        return Outcome::Untrackable;
    };

    let Some(detection) = detector.detect(parcel, &result) else {
        debug!(number = %number, provider = %result.provider, "no new events");
        return Outcome::Unchanged;
    };

    // Fingerprints first: once they are durable the event is never re-reported
    if let Err(e) = store.update_parcel(&detection.parcel).await {
        warn!(number = %number, error = %e, "failed to record parcel update");
        return Outcome::Failed;
    }

    for event in &detection.archive {
        if let Err(e) = store.append_history(number, event).await {
            warn!(number = %number, error = %e, "failed to archive event");
        }
    }

    info!(
        number = %number,
        provider = %result.provider,
        status = %detection.update.status,
        "new tracking event"
    );
    Outcome::Updated(detection.update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryParcelStore;
    use crate::traits::{Event, TrackingProvider};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed(Option<TrackingResult>);

    #[async_trait]
    impl TrackingProvider for Fixed {
        async fn track(
            &self,
            _number: &TrackingNumber,
            _hint: Option<Carrier>,
        ) -> Result<Option<TrackingResult>> {
            Ok(self.0.clone())
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn tracker(answer: Option<TrackingResult>) -> ParcelTracker {
        let mut resolver = TrackingResolver::new(Duration::from_secs(5));
        resolver.add_universal(Arc::new(Fixed(answer)));
        ParcelTracker::new(
            Arc::new(MemoryParcelStore::new()),
            resolver,
            &EngineConfig::default(),
        )
    }

    fn delivered() -> TrackingResult {
        TrackingResult {
            carrier: Some("ups".into()),
            provider: "fixed".into(),
            status: "Delivered".into(),
            events: vec![Event::new("2024-03-04 12:00", "Delivered", "Paris", "Handed over")],
        }
    }

    #[tokio::test]
    async fn add_detects_carrier_and_rejects_duplicates() {
        let tracker = tracker(None);
        let parcel = tracker.add("1z999aa1 0123456784", None, None).await.unwrap();
        assert_eq!(parcel.tracking_number.as_str(), "1Z999AA10123456784");
        assert_eq!(parcel.carrier_hint, Some(Carrier::Ups));

        let err = tracker.add("1Z999AA10123456784", None, None).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn add_rejects_invalid_numbers() {
        let tracker = tracker(None);
        assert!(matches!(
            tracker.add("  - ", None, None).await.unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(tracker.add("ABC/123", None, None).await.is_err());
        assert!(tracker.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn check_reports_new_event_once() {
        let tracker = tracker(Some(delivered()));
        tracker.add("1Z999AA10123456784", Some("Laptop".into()), None).await.unwrap();

        let first = tracker.check().await.unwrap();
        assert_eq!(first.updates.len(), 1);
        assert_eq!(first.updates[0].alias.as_deref(), Some("Laptop"));

        let second = tracker.check().await.unwrap();
        assert!(!second.has_updates());
        assert_eq!(second.checked, 1);

        let history = tracker.history("1Z999AA10123456784").await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn untrackable_parcels_are_left_untouched() {
        let tracker = tracker(None);
        let added = tracker.add("AB123456789FR", None, None).await.unwrap();

        let report = tracker.check().await.unwrap();
        assert_eq!(report.untrackable, [added.tracking_number.clone()]);

        let stored = tracker.store().get(&added.tracking_number).await.unwrap().unwrap();
        assert_eq!(stored, added);
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let tracker = tracker(None);
        let err = tracker.remove("XX999").await.unwrap_err();
        assert_eq!(err.to_string(), "Parcel XX999 not found");
    }

    #[tokio::test]
    async fn history_of_unknown_parcel_is_not_found() {
        let tracker = tracker(None);
        assert!(matches!(
            tracker.history("XX999").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn track_does_not_touch_the_store() {
        let tracker = tracker(Some(delivered()));
        let result = tracker.track("1Z999AA10123456784").await.unwrap().unwrap();
        assert_eq!(result.status, "Delivered");
        assert!(tracker.list().await.unwrap().is_empty());
    }

    #[test]
    fn detect_uses_the_rule_table() {
        let tracker = tracker(None);
        assert_eq!(tracker.detect("9400111899223344556677").unwrap(), Some(Carrier::Usps));
        assert_eq!(tracker.detect("HELLO").unwrap(), None);
    }
}
