//! crates/report_dashboard_core/src/store.rs
//!
//! The report store: the authoritative in-memory list of reports, mirrored to
//! local storage after every mutation.
//!
//! Each mutator builds the new list, writes it through [`LocalPersistence`],
//! and only then swaps it into memory, so a failed write leaves memory and
//! storage agreeing on the previous list. Observers learn about changes via
//! [`ReportStore::subscribe`].

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::domain::{ActivityType, NewReport, Report, Severity};
use crate::persistence::{LocalPersistence, PersistenceError};
use crate::ports::{DraftGenerationService, Notifier, PortError, SummarizationService};
use crate::reorder::{move_report, reorder_by_ids};
use crate::search::filter_reports;
use crate::seed::sample_reports;

const EVENT_CAPACITY: usize = 64;
pub const FALLBACK_DRAFT_TITLE: &str = "Untitled Draft";
pub const FALLBACK_DRAFT_CONTENT: &str = "<p>No content generated.</p>";

//=========================================================================================
// Errors and Events
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Report {0} not found")]
    NotFound(String),
    #[error("Persisted reports are unreadable: {0}")]
    CorruptState(String),
    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),
    #[error("Summarization failed: {0}")]
    Summarize(PortError),
    #[error("Draft generation failed: {0}")]
    Draft(PortError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The report was deleted while its summary was being generated.
    #[error("Report {0} was removed before its summary arrived")]
    StaleSummary(String),
}

impl From<PortError> for StoreError {
    fn from(e: PortError) -> Self {
        StoreError::Storage(PersistenceError::Storage(e))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Emitted after a change has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Loaded { count: usize },
    Added { id: String },
    Updated { id: String },
    Deleted { id: String },
    Reordered,
    Summarized { id: String },
    /// Storage held a newer revision than this store last wrote.
    ConflictDetected { persisted: u64, known: u64 },
}

struct StoreState {
    reports: Vec<Report>,
    /// Revision stamp this store last read or wrote.
    revision: u64,
}

//=========================================================================================
// ReportStore
//=========================================================================================

pub struct ReportStore {
    persistence: LocalPersistence,
    summarizer: Arc<dyn SummarizationService>,
    notifier: Arc<dyn Notifier>,
    activity: Arc<ActivityLog>,
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight counter when the guarded operation ends.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ReportStore {
    pub fn new(
        persistence: LocalPersistence,
        summarizer: Arc<dyn SummarizationService>,
        notifier: Arc<dyn Notifier>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            persistence,
            summarizer,
            notifier,
            activity,
            state: RwLock::new(StoreState {
                reports: Vec::new(),
                revision: 0,
            }),
            events,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// A snapshot of the list in display order.
    pub fn reports(&self) -> Vec<Report> {
        self.state.read().reports.clone()
    }

    pub fn get(&self, id: &str) -> Option<Report> {
        self.state.read().reports.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while a fetch or a summarization is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn search(&self, query: &str) -> Vec<Report> {
        filter_reports(&self.state.read().reports, query)
    }

    //-------------------------------------------------------------------------------------
    // Session bootstrap
    //-------------------------------------------------------------------------------------

    /// Loads the persisted list, seeding sample reports on the very first run.
    ///
    /// Unreadable persisted data is reported and left in place; the in-memory
    /// list is not touched in that case.
    pub fn fetch(&self) -> StoreResult<usize> {
        let _loading = LoadingGuard::start(&self.in_flight);
        let mut state = self.state.write();

        let stored = match self.persistence.load_reports() {
            Ok(stored) => stored,
            Err(PersistenceError::Malformed { source, .. }) => {
                drop(state);
                let message = format!("Failed to fetch reports: {}", source);
                warn!("{}", message);
                self.notifier.notify(&message, Severity::Error);
                return Err(StoreError::CorruptState(source.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let initialized = self.persistence.is_initialized()?;

        let reports = match stored {
            None if !initialized => {
                let samples = sample_reports();
                self.persistence.save_reports(&samples)?;
                self.persistence.mark_initialized()?;
                info!("Seeded {} sample reports", samples.len());
                samples
            }
            stored => stored.unwrap_or_default(),
        };

        state.revision = self.persistence.revision()?;
        state.reports = reports;
        let count = state.reports.len();
        drop(state);

        debug!(count, "Reports loaded");
        self.emit(StoreEvent::Loaded { count });
        Ok(count)
    }

    //-------------------------------------------------------------------------------------
    // Mutations
    //-------------------------------------------------------------------------------------

    /// Appends a new report with a fresh id and creation time.
    pub fn add(&self, new_report: NewReport) -> StoreResult<Report> {
        let report = Report {
            id: Uuid::new_v4().to_string(),
            title: new_report.title,
            content: new_report.content,
            created_at: Utc::now(),
            summary: None,
        };

        self.commit(|reports| {
            let mut updated = reports.to_vec();
            updated.push(report.clone());
            updated
        })?;
        self.record(ActivityType::Create, Some(&report.id), None);

        debug!(id = %report.id, "Report added");
        self.emit(StoreEvent::Added {
            id: report.id.clone(),
        });
        Ok(report)
    }

    /// Replaces the report with the same id. Returns `false` when no report
    /// matched; the list is still written back in that case.
    ///
    /// `id` and `createdAt` of the stored report are kept as they were.
    pub fn update(&self, report: Report) -> StoreResult<bool> {
        let mut matched = false;
        self.commit(|reports| {
            reports
                .iter()
                .map(|existing| {
                    if existing.id == report.id {
                        matched = true;
                        Report {
                            created_at: existing.created_at,
                            ..report.clone()
                        }
                    } else {
                        existing.clone()
                    }
                })
                .collect()
        })?;

        if matched {
            self.record(ActivityType::Edit, Some(&report.id), None);
            self.emit(StoreEvent::Updated {
                id: report.id.clone(),
            });
        } else {
            debug!(id = %report.id, "Update for unknown report ignored");
        }
        Ok(matched)
    }

    /// Removes the report with `id`. Deleting an unknown id is a no-op apart
    /// from rewriting the unchanged list.
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut removed = false;
        self.commit(|reports| {
            let updated: Vec<Report> = reports.iter().filter(|r| r.id != id).cloned().collect();
            removed = updated.len() != reports.len();
            updated
        })?;

        if removed {
            self.emit(StoreEvent::Deleted { id: id.to_string() });
        }
        Ok(removed)
    }

    /// Applies a new display order given as a list of reports, e.g. the output
    /// of a drag-and-drop widget. Only the ids are taken from `ordered`.
    pub fn reorder_reports(&self, ordered: &[Report]) -> StoreResult<()> {
        self.reorder_ids(ordered.iter().map(|r| r.id.as_str()))
    }

    /// Applies a new display order. Unknown ids are dropped; reports left out
    /// of `ids` keep their relative order after the named ones.
    pub fn reorder_ids<I, S>(&self, ids: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.commit(|reports| reorder_by_ids(reports, ids))?;
        self.emit(StoreEvent::Reordered);
        Ok(())
    }

    /// Drag-and-drop move: `active_id` takes the slot of `over_id`.
    /// Returns `false` without writing when the move is a no-op.
    pub fn move_report(&self, active_id: &str, over_id: &str) -> StoreResult<bool> {
        let mut moved = false;
        self.commit_if(|reports| {
            let next = move_report(reports, active_id, over_id);
            moved = next.is_some();
            next
        })?;
        if moved {
            self.emit(StoreEvent::Reordered);
        }
        Ok(moved)
    }

    //-------------------------------------------------------------------------------------
    // Remote operations
    //-------------------------------------------------------------------------------------

    /// Sends the report's content to the summarizer and stores the result on it.
    ///
    /// On failure the user is notified and the list is left exactly as it was.
    /// If the report is deleted while the request is in flight the summary is
    /// discarded rather than resurrecting the report.
    pub async fn summarize(&self, id: &str) -> StoreResult<String> {
        let content = match self.get(id) {
            Some(report) => report.content,
            None => {
                warn!(id, "Summarize requested for unknown report");
                return Err(StoreError::NotFound(id.to_string()));
            }
        };

        let _loading = LoadingGuard::start(&self.in_flight);
        let summary = match self.summarizer.summarize(&content).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(id, error = %e, "Summarization failed");
                self.notifier.notify(&e.to_string(), Severity::Error);
                return Err(StoreError::Summarize(e));
            }
        };

        let mut found = false;
        self.commit_if(|reports| {
            found = reports.iter().any(|r| r.id == id);
            found.then(|| {
                reports
                    .iter()
                    .map(|r| {
                        if r.id == id {
                            Report {
                                summary: Some(summary.clone()),
                                ..r.clone()
                            }
                        } else {
                            r.clone()
                        }
                    })
                    .collect()
            })
        })?;

        if !found {
            warn!(id, "Discarding summary for a report deleted while it was pending");
            self.notifier
                .notify("Report was deleted before its summary arrived", Severity::Warning);
            return Err(StoreError::StaleSummary(id.to_string()));
        }

        let mut meta = Map::new();
        meta.insert("summary".to_string(), Value::from(summary.clone()));
        self.record(ActivityType::Summarize, Some(id), Some(meta));
        self.emit(StoreEvent::Summarized { id: id.to_string() });
        Ok(summary)
    }

    /// Generates a draft from `prompt` and adds it as a new report.
    pub async fn add_draft(
        &self,
        generator: &dyn DraftGenerationService,
        prompt: &str,
    ) -> StoreResult<Report> {
        if prompt.trim().is_empty() {
            return Err(StoreError::InvalidInput("prompt must not be empty".to_string()));
        }

        let draft = match generator.generate_draft(prompt).await {
            Ok(draft) => draft,
            Err(e) => {
                self.notifier.notify(&e.to_string(), Severity::Error);
                return Err(StoreError::Draft(e));
            }
        };

        let title = if draft.title.trim().is_empty() {
            FALLBACK_DRAFT_TITLE.to_string()
        } else {
            draft.title
        };
        let content = if draft.content.trim().is_empty() {
            FALLBACK_DRAFT_CONTENT.to_string()
        } else {
            draft.content
        };

        let report = self.add(NewReport::new(title, content))?;
        let mut meta = Map::new();
        meta.insert("prompt".to_string(), Value::from(prompt));
        self.record(ActivityType::Draft, None, Some(meta));
        self.notifier
            .notify("Draft generated successfully", Severity::Success);
        Ok(report)
    }

    //-------------------------------------------------------------------------------------
    // Internals
    //-------------------------------------------------------------------------------------

    fn commit<F>(&self, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&[Report]) -> Vec<Report>,
    {
        self.commit_if(|reports| Some(mutate(reports)))
    }

    /// Persists the list produced by `mutate` and makes it current.
    /// `None` means nothing changed and nothing is written.
    ///
    /// Once the list itself is stored it becomes current even if the revision
    /// stamp cannot be written, so memory never lags behind storage.
    fn commit_if<F>(&self, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&[Report]) -> Option<Vec<Report>>,
    {
        let mut state = self.state.write();
        let Some(updated) = mutate(&state.reports) else {
            return Ok(());
        };

        let persisted = self.persistence.revision()?;
        let known = state.revision;
        let next_revision = persisted.max(known) + 1;
        self.persistence.save_reports(&updated)?;

        state.reports = updated;
        state.revision = match self.persistence.set_revision(next_revision) {
            Ok(()) => next_revision,
            Err(e) => {
                warn!(error = %e, "Failed to write revision stamp");
                persisted
            }
        };
        drop(state);

        if persisted != known {
            warn!(
                persisted,
                known,
                "Reports were changed by another writer; overwriting"
            );
            self.notifier.notify(
                "Reports were changed in another session and will be overwritten",
                Severity::Warning,
            );
            self.emit(StoreEvent::ConflictDetected { persisted, known });
        }
        Ok(())
    }

    fn record(&self, kind: ActivityType, report_id: Option<&str>, meta: Option<Map<String, Value>>) {
        if let Err(e) = self.activity.log(kind, report_id, meta) {
            warn!(error = %e, "Failed to record activity");
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Draft;
    use crate::notify::RecordingNotifier;
    use crate::persistence::{InMemoryStorage, StorageKeys, DEFAULT_INIT_KEY, DEFAULT_REPORTS_KEY};
    use crate::ports::{KeyValueStorage, PortResult};
    use crate::session::UserSession;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::OnceLock;
    use tokio::sync::Notify;

    struct FixedSummarizer(Result<String, String>);

    #[async_trait]
    impl SummarizationService for FixedSummarizer {
        async fn summarize(&self, _content: &str) -> PortResult<String> {
            self.0.clone().map_err(PortError::Upstream)
        }
    }

    /// Blocks until released, so tests can act while a summary is pending.
    struct GatedSummarizer {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SummarizationService for GatedSummarizer {
        async fn summarize(&self, _content: &str) -> PortResult<String> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("late summary".to_string())
        }
    }

    struct FixedDrafts(Draft);

    #[async_trait]
    impl DraftGenerationService for FixedDrafts {
        async fn generate_draft(&self, _prompt: &str) -> PortResult<Draft> {
            Ok(self.0.clone())
        }
    }

    struct Harness {
        storage: Arc<InMemoryStorage>,
        notifier: Arc<RecordingNotifier>,
        activity: Arc<ActivityLog>,
        store: ReportStore,
    }

    fn harness_with(summarizer: Arc<dyn SummarizationService>) -> Harness {
        harness_on(Arc::new(InMemoryStorage::new()), summarizer)
    }

    fn harness_on(storage: Arc<InMemoryStorage>, summarizer: Arc<dyn SummarizationService>) -> Harness {
        let persistence = LocalPersistence::new(storage.clone(), StorageKeys::default());
        let session = Arc::new(UserSession::load(persistence.clone()).unwrap());
        let activity = Arc::new(ActivityLog::load(persistence.clone(), session).unwrap());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = ReportStore::new(persistence, summarizer, notifier.clone(), activity.clone());
        Harness {
            storage,
            notifier,
            activity,
            store,
        }
    }

    /// In-memory storage that refuses writes to one key.
    struct RejectingStorage {
        inner: InMemoryStorage,
        rejected: String,
    }

    impl RejectingStorage {
        fn new(rejected: &str) -> Self {
            Self {
                inner: InMemoryStorage::new(),
                rejected: rejected.to_string(),
            }
        }
    }

    impl KeyValueStorage for RejectingStorage {
        fn get_item(&self, key: &str) -> PortResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
            if key == self.rejected {
                return Err(PortError::Unexpected("quota exceeded".to_string()));
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> PortResult<()> {
            self.inner.remove_item(key)
        }
    }

    fn store_on(
        storage: Arc<dyn KeyValueStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> (ReportStore, Arc<ActivityLog>) {
        let persistence = LocalPersistence::new(storage, StorageKeys::default());
        let session = Arc::new(UserSession::load(persistence.clone()).unwrap());
        let activity = Arc::new(ActivityLog::load(persistence.clone(), session).unwrap());
        let summarizer = Arc::new(FixedSummarizer(Ok(String::new())));
        let store = ReportStore::new(persistence, summarizer, notifier, activity.clone());
        (store, activity)
    }

    /// Looks at the store from inside `notify`, like a toast that shows a count.
    #[derive(Default)]
    struct StoreReadingNotifier {
        store: OnceLock<Arc<ReportStore>>,
        seen_lengths: Mutex<Vec<usize>>,
    }

    impl Notifier for StoreReadingNotifier {
        fn notify(&self, _message: &str, _severity: Severity) {
            if let Some(store) = self.store.get() {
                self.seen_lengths.lock().push(store.len());
            }
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(FixedSummarizer(Ok("A short summary.".to_string()))))
    }

    fn persisted(storage: &InMemoryStorage) -> Vec<Report> {
        let raw = storage.get_item(DEFAULT_REPORTS_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn first_fetch_seeds_samples_and_sets_flag() {
        let h = harness();
        assert_eq!(h.store.fetch().unwrap(), 3);
        assert_eq!(
            h.storage.get_item(DEFAULT_INIT_KEY).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(persisted(&h.storage), h.store.reports());
    }

    #[test]
    fn fetch_is_idempotent() {
        let h = harness();
        h.store.fetch().unwrap();
        let first = h.store.reports();
        h.store.fetch().unwrap();
        assert_eq!(h.store.reports(), first);
    }

    #[test]
    fn initialized_session_without_data_loads_empty_list() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_item(DEFAULT_INIT_KEY, "true").unwrap();
        let h = harness_on(storage, Arc::new(FixedSummarizer(Ok(String::new()))));
        assert_eq!(h.store.fetch().unwrap(), 0);
        assert!(h.store.is_empty());
        assert!(h.storage.get_item(DEFAULT_REPORTS_KEY).unwrap().is_none());
    }

    #[test]
    fn malformed_storage_is_surfaced_and_left_untouched() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_item(DEFAULT_REPORTS_KEY, "[{oops").unwrap();
        let h = harness_on(storage, Arc::new(FixedSummarizer(Ok(String::new()))));

        assert!(matches!(h.store.fetch(), Err(StoreError::CorruptState(_))));
        assert_eq!(
            h.storage.get_item(DEFAULT_REPORTS_KEY).unwrap().as_deref(),
            Some("[{oops")
        );
        assert_eq!(h.notifier.messages()[0].0, Severity::Error);
        assert!(!h.store.is_loading());
    }

    #[test]
    fn add_appends_exactly_one_report_and_persists() {
        let h = harness();
        h.store.fetch().unwrap();
        let before = h.store.len();

        let added = h
            .store
            .add(NewReport::new("Q1 Report", "<p>Revenue</p>"))
            .unwrap();

        assert_eq!(h.store.len(), before + 1);
        let last = h.store.reports().pop().unwrap();
        assert_eq!(last, added);
        assert_eq!(last.title, "Q1 Report");
        assert_eq!(last.content, "<p>Revenue</p>");
        assert_eq!(persisted(&h.storage), h.store.reports());
        assert_eq!(h.activity.entries()[0].kind, ActivityType::Create);
    }

    #[test]
    fn update_replaces_matching_report_but_keeps_creation_time() {
        let h = harness();
        let original = h.store.add(NewReport::new("Draft", "<p>v1</p>")).unwrap();

        let mut edited = original.clone();
        edited.title = "Final".to_string();
        edited.created_at = Utc::now() + chrono::Duration::days(1);
        assert!(h.store.update(edited).unwrap());

        let stored = h.store.get(&original.id).unwrap();
        assert_eq!(stored.title, "Final");
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(persisted(&h.storage), h.store.reports());
    }

    #[test]
    fn update_of_unknown_id_changes_nothing() {
        let h = harness();
        h.store.add(NewReport::new("Keep", "<p>k</p>")).unwrap();
        let before = h.store.reports();

        let mut ghost = before[0].clone();
        ghost.id = "ghost".to_string();
        ghost.title = "Ghost".to_string();
        assert!(!h.store.update(ghost).unwrap());
        assert_eq!(h.store.reports(), before);
    }

    #[test]
    fn delete_of_unknown_id_is_idempotent() {
        let h = harness();
        h.store.fetch().unwrap();
        let before = h.store.reports();

        assert!(!h.store.delete("missing").unwrap());
        assert_eq!(h.store.reports(), before);
        assert_eq!(persisted(&h.storage), before);
    }

    #[test]
    fn delete_removes_only_the_target() {
        let h = harness();
        h.store.fetch().unwrap();
        let target = h.store.reports()[1].id.clone();

        assert!(h.store.delete(&target).unwrap());
        assert_eq!(h.store.len(), 2);
        assert!(h.store.get(&target).is_none());
        assert_eq!(persisted(&h.storage), h.store.reports());
    }

    #[test]
    fn reorder_to_permutation_keeps_members() {
        let h = harness();
        h.store.fetch().unwrap();
        let mut ids: Vec<String> = h.store.reports().into_iter().map(|r| r.id).collect();
        ids.reverse();
        ids.insert(1, "unknown".to_string());

        h.store.reorder_ids(&ids).unwrap();
        let now: Vec<String> = h.store.reports().into_iter().map(|r| r.id).collect();
        ids.retain(|id| id != "unknown");
        assert_eq!(now, ids);
        assert_eq!(persisted(&h.storage), h.store.reports());
    }

    #[test]
    fn reorder_from_report_list_uses_its_order() {
        let h = harness();
        h.store.fetch().unwrap();
        let mut list = h.store.reports();
        list.rotate_left(1);

        h.store.reorder_reports(&list).unwrap();
        assert_eq!(h.store.reports(), list);
    }

    #[test]
    fn move_report_persists_drag_result() {
        let h = harness();
        h.store.fetch().unwrap();
        let ids: Vec<String> = h.store.reports().into_iter().map(|r| r.id).collect();

        assert!(h.store.move_report(&ids[0], &ids[2]).unwrap());
        let now: Vec<String> = h.store.reports().into_iter().map(|r| r.id).collect();
        assert_eq!(now, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        assert!(!h.store.move_report(&ids[0], &ids[0]).unwrap());
    }

    #[tokio::test]
    async fn summarize_success_touches_only_the_target() {
        let h = harness();
        h.store.fetch().unwrap();
        let before = h.store.reports();
        let target = before[1].id.clone();

        let summary = h.store.summarize(&target).await.unwrap();
        assert_eq!(summary, "A short summary.");

        let after = h.store.reports();
        for (old, new) in before.iter().zip(after.iter()) {
            if old.id == target {
                assert_eq!(new.summary.as_deref(), Some("A short summary."));
                assert_eq!(new.content, old.content);
            } else {
                assert_eq!(new, old);
            }
        }
        assert_eq!(persisted(&h.storage), after);
        assert_eq!(h.activity.entries()[0].kind, ActivityType::Summarize);
        assert!(!h.store.is_loading());
    }

    #[tokio::test]
    async fn summarize_failure_leaves_everything_unchanged() {
        let h = harness_with(Arc::new(FixedSummarizer(Err("rate limited".to_string()))));
        h.store.fetch().unwrap();
        let before_memory = h.store.reports();
        let before_raw = h.storage.get_item(DEFAULT_REPORTS_KEY).unwrap();
        let target = before_memory[0].id.clone();

        let result = h.store.summarize(&target).await;
        assert!(matches!(result, Err(StoreError::Summarize(_))));
        assert_eq!(h.store.reports(), before_memory);
        assert_eq!(h.storage.get_item(DEFAULT_REPORTS_KEY).unwrap(), before_raw);
        assert_eq!(
            h.notifier.messages(),
            vec![(Severity::Error, "rate limited".to_string())]
        );
    }

    #[tokio::test]
    async fn summary_for_report_deleted_mid_flight_is_discarded() {
        let gate = Arc::new(GatedSummarizer {
            started: Notify::new(),
            release: Notify::new(),
        });
        let h = Arc::new(harness_with(gate.clone()));
        h.store.fetch().unwrap();
        let target = h.store.reports()[0].id.clone();

        let task = {
            let h = h.clone();
            let target = target.clone();
            tokio::spawn(async move { h.store.summarize(&target).await })
        };
        gate.started.notified().await;
        assert!(h.store.is_loading());
        h.store.delete(&target).unwrap();
        gate.release.notify_one();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(StoreError::StaleSummary(_))));
        assert!(h.store.get(&target).is_none());
        assert_eq!(persisted(&h.storage).len(), 2);
    }

    #[tokio::test]
    async fn summarize_unknown_report_is_not_found() {
        let h = harness();
        let result = h.store.summarize("nope").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn draft_with_blank_fields_uses_fallbacks() {
        let h = harness();
        let drafts = FixedDrafts(Draft {
            title: String::new(),
            content: " ".to_string(),
        });

        let report = h.store.add_draft(&drafts, "quarterly numbers").await.unwrap();
        assert_eq!(report.title, FALLBACK_DRAFT_TITLE);
        assert_eq!(report.content, FALLBACK_DRAFT_CONTENT);

        let kinds: Vec<_> = h.activity.entries().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, [ActivityType::Draft, ActivityType::Create]);
        assert_eq!(
            h.notifier.take(),
            vec![(Severity::Success, "Draft generated successfully".to_string())]
        );
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_generation() {
        let h = harness();
        let drafts = FixedDrafts(Draft {
            title: "t".to_string(),
            content: "c".to_string(),
        });
        let result = h.store.add_draft(&drafts, "   ").await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
        assert!(h.store.is_empty());
    }

    #[test]
    fn subscribers_receive_mutation_events() {
        let h = harness();
        let mut events = h.store.subscribe();
        let report = h.store.add(NewReport::new("A", "<p>a</p>")).unwrap();
        h.store.delete(&report.id).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::Added {
                id: report.id.clone()
            }
        );
        assert_eq!(events.try_recv().unwrap(), StoreEvent::Deleted { id: report.id });
    }

    #[test]
    fn concurrent_writer_is_detected_and_last_write_wins() {
        let storage = Arc::new(InMemoryStorage::new());
        let tab_a = harness_on(storage.clone(), Arc::new(FixedSummarizer(Ok(String::new()))));
        let tab_b = harness_on(storage.clone(), Arc::new(FixedSummarizer(Ok(String::new()))));
        tab_a.store.fetch().unwrap();
        tab_b.store.fetch().unwrap();
        let mut events = tab_b.store.subscribe();

        tab_a.store.add(NewReport::new("From A", "<p>a</p>")).unwrap();
        tab_b.store.add(NewReport::new("From B", "<p>b</p>")).unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            StoreEvent::ConflictDetected {
                persisted: 1,
                known: 0
            }
        ));
        let titles: Vec<String> = persisted(&storage).into_iter().map(|r| r.title).collect();
        assert!(titles.contains(&"From B".to_string()));
        assert!(!titles.contains(&"From A".to_string()));
        assert_eq!(tab_b.notifier.messages()[0].0, Severity::Warning);
    }

    #[test]
    fn list_becomes_current_even_if_revision_stamp_fails() {
        let storage = Arc::new(RejectingStorage::new(&StorageKeys::default().revision));
        let notifier = Arc::new(RecordingNotifier::new());
        let (store, _) = store_on(storage.clone(), notifier.clone());

        let first = store.add(NewReport::new("Kept", "<p>k</p>")).unwrap();
        assert_eq!(store.reports(), vec![first]);
        assert_eq!(persisted(&storage.inner), store.reports());

        store.add(NewReport::new("Also kept", "<p>k</p>")).unwrap();
        assert_eq!(persisted(&storage.inner), store.reports());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn failed_draft_write_leaves_no_draft_activity() {
        let storage = Arc::new(RejectingStorage::new(DEFAULT_REPORTS_KEY));
        let (store, activity) = store_on(storage, Arc::new(RecordingNotifier::new()));
        let drafts = FixedDrafts(Draft {
            title: "Plan".to_string(),
            content: "<p>p</p>".to_string(),
        });

        let result = store.add_draft(&drafts, "hiring plan").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert!(store.is_empty());
        assert!(activity.entries().is_empty());
    }

    #[test]
    fn notifier_may_read_the_store() {
        let storage = Arc::new(InMemoryStorage::new());
        let tab_a = harness_on(storage.clone(), Arc::new(FixedSummarizer(Ok(String::new()))));
        let notifier = Arc::new(StoreReadingNotifier::default());
        let (tab_b, _) = store_on(storage.clone(), notifier.clone());
        let tab_b = Arc::new(tab_b);
        assert!(notifier.store.set(tab_b.clone()).is_ok());

        tab_a.store.fetch().unwrap();
        tab_b.fetch().unwrap();
        tab_a.store.add(NewReport::new("From A", "<p>a</p>")).unwrap();
        tab_b.add(NewReport::new("From B", "<p>b</p>")).unwrap();
        assert_eq!(*notifier.seen_lengths.lock(), vec![4]);

        storage.set_item(DEFAULT_REPORTS_KEY, "not json").unwrap();
        assert!(matches!(tab_b.fetch(), Err(StoreError::CorruptState(_))));
        assert_eq!(*notifier.seen_lengths.lock(), vec![4, 4]);
    }
}
