// 🧭 Session - the application state behind the TUI and CLI
// One explicit state machine per concern: fetch, query/page, edits, bulk send.
// User actions and network completions mutate it; network work leaves as `Effect`s.

use crate::client::{NotificationSender, RecordSource, RecordUpdater};
use crate::edit::{EditController, EditState, FieldKind, SaveRequest};
use crate::error::{ApiError, EditError};
use crate::notifier::{plan_batch, Batch, BulkNotifier, NotifyJob, NotifyProgress, SendOutcome};
use crate::pagination::{PageSizeChoice, Pager};
use crate::phone::is_local_number;
use crate::record::{gender_stats, GenderStats, VoterRecord};
use crate::search::filter_indices;
use crate::suggest::{suggest, Suggestion};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Distinct submitted queries remembered, newest first
pub const HISTORY_LEN: usize = 5;

// ============================================================================
// STATE MACHINES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; previously loaded records (if any) are kept
    Failed(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkState {
    #[default]
    Idle,
    /// Auto-notify waits for the debounce to elapse
    Scheduled { due: Instant },
    Running(NotifyProgress),
    Finished(NotifyProgress),
}

/// Network work requested by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchRecords,
    SaveField(SaveRequest),
    NotifyBatch(Batch),
    NotifyOne(NotifyJob),
}

/// Result of an `Effect`, fed back through `Session::apply`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    RecordsLoaded(Result<Vec<VoterRecord>, ApiError>),
    FieldSaved {
        kind: FieldKind,
        result: Result<String, ApiError>,
    },
    NotifyProgress(NotifyProgress),
    NotifyFinished(NotifyProgress),
    SingleNotified {
        record_id: String,
        result: Result<SendOutcome, ApiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Notify matches automatically after a search
    pub auto_notify: bool,
    pub debounce: Duration,
    /// Messaging credentials are configured
    pub can_notify: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            auto_notify: true,
            debounce: Duration::from_millis(1500),
            can_notify: false,
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Default)]
pub struct Session {
    options: SessionOptions,
    records: Vec<VoterRecord>,
    fetch: FetchState,
    /// Text in the search box
    input: String,
    /// Query the result set was computed for
    query: String,
    /// Positions in `records` matching `query`
    matches: Vec<usize>,
    pager: Pager,
    suggestions: Vec<Suggestion>,
    show_suggestions: bool,
    history: VecDeque<String>,
    edits: EditController,
    bulk: BulkState,
    /// Record whose single notification is on the wire
    single_in_flight: Option<String>,
    status: Option<String>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Session {
            options,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // Fetch
    // ------------------------------------------------------------------------

    /// Request a (re)load unless one is already running
    pub fn load(&mut self) -> Option<Effect> {
        if self.fetch == FetchState::Loading {
            return None;
        }
        self.fetch = FetchState::Loading;
        self.status = Some("माहिती लोड होत आहे...".to_string());
        Some(Effect::FetchRecords)
    }

    // ------------------------------------------------------------------------
    // Query & suggestions
    // ------------------------------------------------------------------------

    /// Replace the search box text. Clearing it also clears the results.
    pub fn set_input(&mut self, value: &str) {
        self.input = value.to_string();

        if self.input.trim().is_empty() {
            self.set_query(String::new());
            self.hide_suggestions();
            return;
        }

        self.suggestions = suggest(&self.records, &self.input);
        self.show_suggestions = !self.suggestions.is_empty();
    }

    pub fn push_char(&mut self, c: char) {
        let mut value = std::mem::take(&mut self.input);
        value.push(c);
        self.set_input(&value);
    }

    pub fn pop_char(&mut self) {
        let mut value = std::mem::take(&mut self.input);
        value.pop();
        self.set_input(&value);
    }

    /// Run the typed query
    pub fn submit(&mut self, now: Instant) {
        let query = self.input.trim().to_string();
        self.hide_suggestions();
        self.remember(&query);
        self.set_query(query);
        self.schedule_auto_notify(now);
    }

    /// Search for the chosen suggestion's display text
    pub fn choose_suggestion(&mut self, index: usize, now: Instant) -> bool {
        let Some(text) = self
            .visible_suggestions()
            .get(index)
            .map(|s| s.search_text.clone())
        else {
            return false;
        };

        self.input = text;
        self.submit(now);
        true
    }

    pub fn clear_search(&mut self) {
        self.input.clear();
        self.hide_suggestions();
        self.set_query(String::new());
    }

    pub fn hide_suggestions(&mut self) {
        self.show_suggestions = false;
    }

    fn set_query(&mut self, query: String) {
        if query != self.query {
            // A pending auto-notify belongs to the previous result set
            if matches!(self.bulk, BulkState::Scheduled { .. }) {
                self.bulk = BulkState::Idle;
            }
        }
        self.query = query;
        self.matches = filter_indices(&self.records, &self.query);
        self.pager.reset();
        debug!(query = %self.query, matches = self.matches.len(), "query applied");
    }

    fn remember(&mut self, query: &str) {
        if query.is_empty() || self.history.iter().any(|q| q == query) {
            return;
        }
        self.history.push_front(query.to_string());
        self.history.truncate(HISTORY_LEN);
    }

    /// Recompute matches after the record set changed, keeping the page
    fn refilter(&mut self) {
        self.matches = filter_indices(&self.records, &self.query);
        self.pager.clamp(self.matches.len());
    }

    // ------------------------------------------------------------------------
    // Paging
    // ------------------------------------------------------------------------

    pub fn next_page(&mut self) -> bool {
        self.pager.next(self.matches.len())
    }

    pub fn previous_page(&mut self) -> bool {
        self.pager.previous(self.matches.len())
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.pager.go_to(page, self.matches.len())
    }

    pub fn select_page_size(&mut self, choice: PageSizeChoice) {
        self.pager.select_size(choice, self.matches.len());
    }

    pub fn cycle_page_size(&mut self) {
        self.pager.cycle_size(self.matches.len());
    }

    // ------------------------------------------------------------------------
    // Inline edits
    // ------------------------------------------------------------------------

    pub fn begin_edit(&mut self, kind: FieldKind, record_id: &str) -> Result<(), EditError> {
        let record = self
            .records
            .iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| EditError::RecordNotFound(record_id.to_string()))?;
        self.edits.begin(kind, record)
    }

    pub fn edit_draft_mut(&mut self, kind: FieldKind) -> Option<&mut String> {
        self.edits.draft_mut(kind)
    }

    pub fn cancel_edit(&mut self, kind: FieldKind) -> bool {
        self.edits.cancel(kind)
    }

    /// Validate the draft; on success the returned effect performs the save
    pub fn save_edit(&mut self, kind: FieldKind) -> Result<Effect, EditError> {
        let request = self.edits.save(kind, &self.records)?;
        self.status = Some("जतन करत आहे...".to_string());
        Ok(Effect::SaveField(request))
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    fn schedule_auto_notify(&mut self, now: Instant) {
        if !self.options.auto_notify || self.matches.is_empty() {
            return;
        }
        if !self.options.can_notify {
            debug!("auto-notify skipped: no messaging credentials");
            return;
        }
        if matches!(self.bulk, BulkState::Running(_)) {
            debug!("auto-notify skipped: a run is already in progress");
            return;
        }
        self.bulk = BulkState::Scheduled {
            due: now + self.options.debounce,
        };
    }

    /// Start a scheduled bulk run once its debounce has elapsed
    pub fn tick(&mut self, now: Instant) -> Option<Effect> {
        let BulkState::Scheduled { due } = self.bulk else {
            return None;
        };
        if now < due {
            return None;
        }
        // Stays scheduled until the single message completes
        if self.single_in_flight.is_some() {
            return None;
        }

        let batch = plan_batch(self.matches.iter().map(|&i| &self.records[i]));
        let progress = NotifyProgress {
            total: batch.jobs.len(),
            skipped: batch.skipped,
            ..NotifyProgress::default()
        };

        if batch.is_empty() {
            info!(skipped = batch.skipped, "no notification candidates");
            self.bulk = BulkState::Finished(progress);
            return None;
        }

        self.bulk = BulkState::Running(progress);
        Some(Effect::NotifyBatch(batch))
    }

    /// Send the detail message for one record
    pub fn notify_record(&mut self, record_id: &str) -> Option<Effect> {
        if !self.options.can_notify {
            self.status = Some(ApiError::MissingCredentials.user_message());
            return None;
        }
        if matches!(self.bulk, BulkState::Running(_)) || self.single_in_flight.is_some() {
            self.status = Some("संदेश पाठवणे आधीच सुरू आहे".to_string());
            return None;
        }

        let record = self.records.iter().find(|r| r.id == record_id)?;
        if !is_local_number(record.mobile_number.trim()) {
            self.status = Some("वैध मोबाईल नंबर उपलब्ध नाही".to_string());
            return None;
        }

        self.single_in_flight = Some(record.id.clone());
        Some(Effect::NotifyOne(NotifyJob::for_record(record)))
    }

    // ------------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------------

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::RecordsLoaded(Ok(records)) => {
                info!(count = records.len(), "records replaced");
                self.records = records;
                self.edits.retain_loaded(&self.records);
                self.fetch = FetchState::Loaded;
                self.status = Some(format!("{} मतदार लोड झाले", self.records.len()));
                self.hide_suggestions();
                self.refilter();
            }
            Completion::RecordsLoaded(Err(err)) => {
                warn!(error = %err, "record fetch failed");
                self.status = Some(err.user_message());
                self.fetch = FetchState::Failed(err);
            }
            Completion::FieldSaved { kind, result } => {
                let outcome = result
                    .as_ref()
                    .map(|_| ())
                    .map_err(ApiError::user_message);

                match self.edits.finish(kind, outcome, &mut self.records) {
                    Ok(()) => {
                        self.status = Some(match &result {
                            Ok(_) => match kind {
                                FieldKind::Mobile => "मोबाईल नंबर अपडेट झाला".to_string(),
                                FieldKind::Address => "पत्ता अपडेट झाला".to_string(),
                            },
                            Err(err) => err.user_message(),
                        });
                        self.refilter();
                    }
                    Err(err) => warn!(error = %err, "save completion without a save in flight"),
                }
            }
            Completion::NotifyProgress(progress) => {
                if matches!(self.bulk, BulkState::Running(_)) {
                    self.bulk = BulkState::Running(progress);
                }
            }
            Completion::NotifyFinished(progress) => {
                self.status = Some(format!(
                    "संदेश पाठवले: {} यशस्वी, {} अयशस्वी, {} वगळले",
                    progress.succeeded, progress.failed, progress.skipped
                ));
                self.bulk = BulkState::Finished(progress);
            }
            Completion::SingleNotified { record_id, result } => {
                self.single_in_flight = None;
                self.status = Some(match result {
                    Ok(SendOutcome::Sent { .. }) => "संदेश पाठवला".to_string(),
                    Ok(SendOutcome::Failed(reason)) => format!("संदेश अयशस्वी: {}", reason),
                    Err(err) => err.user_message(),
                });
                debug!(record = %record_id, "single notification finished");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn records(&self) -> &[VoterRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&VoterRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn matches(&self) -> impl Iterator<Item = &VoterRecord> + '_ {
        self.matches.iter().map(|&i| &self.records[i])
    }

    /// Records on the current page
    pub fn page_records(&self) -> Vec<&VoterRecord> {
        self.pager
            .slice(&self.matches)
            .iter()
            .map(|&i| &self.records[i])
            .collect()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.matches.len())
    }

    /// Suggestions currently on screen (empty when hidden)
    pub fn visible_suggestions(&self) -> &[Suggestion] {
        if self.show_suggestions {
            &self.suggestions
        } else {
            &[]
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &str> + '_ {
        self.history.iter().map(String::as_str)
    }

    pub fn edit_state(&self, kind: FieldKind) -> &EditState {
        self.edits.state(kind)
    }

    pub fn bulk_state(&self) -> BulkState {
        self.bulk
    }

    pub fn is_notifying_one(&self) -> bool {
        self.single_in_flight.is_some()
    }

    pub fn stats(&self) -> GenderStats {
        gender_stats(&self.records)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

// ============================================================================
// EFFECT RUNNER
// ============================================================================

/// Perform one effect against `client`, reporting through `emit`.
///
/// A bulk run emits `NotifyProgress` after every message and one final
/// `NotifyFinished`.
pub async fn execute<C, F>(client: &C, notifier: &BulkNotifier, effect: Effect, mut emit: F)
where
    C: RecordSource + RecordUpdater + NotificationSender,
    F: FnMut(Completion),
{
    match effect {
        Effect::FetchRecords => {
            emit(Completion::RecordsLoaded(client.fetch_records().await));
        }
        Effect::SaveField(request) => {
            let result = client.update_record(&request).await;
            emit(Completion::FieldSaved {
                kind: request.kind,
                result,
            });
        }
        Effect::NotifyBatch(batch) => {
            let progress = notifier
                .run(client, batch, |p| emit(Completion::NotifyProgress(*p)))
                .await;
            emit(Completion::NotifyFinished(progress));
        }
        Effect::NotifyOne(job) => {
            let result = notifier.deliver(client, &job).await;
            emit(Completion::SingleNotified {
                record_id: job.record_id,
                result,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory stand-in for the three remote endpoints
    #[derive(Default)]
    struct FakeRemote {
        records: Vec<VoterRecord>,
        reject_updates: bool,
        sent: Mutex<Vec<String>>,
    }

    impl RecordSource for FakeRemote {
        async fn fetch_records(&self) -> Result<Vec<VoterRecord>, ApiError> {
            Ok(self.records.clone())
        }
    }

    impl RecordUpdater for FakeRemote {
        async fn update_record(&self, _request: &SaveRequest) -> Result<String, ApiError> {
            if self.reject_updates {
                Err(ApiError::Rejected("EPIC ID is required".into()))
            } else {
                Ok("Voter data updated successfully".into())
            }
        }
    }

    impl NotificationSender for FakeRemote {
        async fn send(&self, phone: &str, _message: &str) -> Result<SendOutcome, ApiError> {
            self.sent.lock().unwrap().push(phone.to_string());
            Ok(SendOutcome::Sent { message_id: None })
        }
    }

    fn voter(id: &str, name: &str, mobile: &str) -> VoterRecord {
        VoterRecord {
            id: id.into(),
            serial_number: id.into(),
            name_latin: name.into(),
            voter_card_id: format!("ABC{:0>7}", id),
            mobile_number: mobile.into(),
            gender_latin: "Male".into(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<VoterRecord> {
        vec![
            voter("1", "Ravi Kumar", "9090385555"),
            voter("2", "Ravi Patil", ""),
            voter("3", "Sunita Shinde", "8888888888"),
        ]
    }

    fn loaded(options: SessionOptions) -> Session {
        let mut session = Session::new(options);
        assert_eq!(session.load(), Some(Effect::FetchRecords));
        session.apply(Completion::RecordsLoaded(Ok(sample())));
        session
    }

    fn notifying() -> SessionOptions {
        SessionOptions {
            can_notify: true,
            ..Default::default()
        }
    }

    async fn run(remote: &FakeRemote, effect: Effect) -> Vec<Completion> {
        let mut out = Vec::new();
        execute(remote, &BulkNotifier::new(Duration::ZERO), effect, |c| out.push(c)).await;
        out
    }

    #[test]
    fn test_load_is_not_duplicated() {
        let mut session = Session::new(SessionOptions::default());
        assert!(session.load().is_some());
        assert!(session.load().is_none(), "second load while loading");

        session.apply(Completion::RecordsLoaded(Err(ApiError::Timeout)));
        assert_eq!(session.fetch_state(), &FetchState::Failed(ApiError::Timeout));
        assert!(session.load().is_some(), "retry after failure");
    }

    #[test]
    fn test_search_flow_and_page_reset() {
        let mut session = loaded(SessionOptions::default());
        let now = Instant::now();

        // Nothing is shown before a query is submitted
        assert_eq!(session.match_count(), 0);

        session.set_input("ravi");
        assert_eq!(session.visible_suggestions().len(), 2);

        session.submit(now);
        assert_eq!(session.match_count(), 2);
        assert!(session.visible_suggestions().is_empty());

        session.select_page_size(PageSizeChoice::Fixed(50));
        session.set_input("a");
        session.submit(now);
        assert_eq!(session.pager().page(), 1);

        session.set_input("   ");
        assert_eq!(session.query(), "");
        assert_eq!(session.match_count(), 0);
    }

    #[test]
    fn test_choose_suggestion_runs_query() {
        let mut session = loaded(SessionOptions::default());
        session.set_input("sun");

        assert!(session.choose_suggestion(0, Instant::now()));
        assert_eq!(session.input(), "Sunita Shinde");
        assert_eq!(session.query(), "Sunita Shinde");
        assert_eq!(session.match_count(), 1);
        assert!(!session.choose_suggestion(5, Instant::now()));
    }

    #[test]
    fn test_history_is_distinct_newest_first() {
        let mut session = loaded(SessionOptions::default());
        let now = Instant::now();

        for query in ["a", "b", "a", "c", "d", "e", "f"] {
            session.set_input(query);
            session.submit(now);
        }

        let history: Vec<&str> = session.history().collect();
        assert_eq!(history, vec!["f", "e", "d", "c", "b"]);
    }

    #[test]
    fn test_auto_notify_is_debounced() {
        let mut session = loaded(notifying());
        let now = Instant::now();

        session.set_input("ravi");
        session.submit(now);
        assert!(matches!(session.bulk_state(), BulkState::Scheduled { .. }));
        assert_eq!(session.tick(now + Duration::from_millis(500)), None);

        // A new query replaces the pending trigger
        session.set_input("sunita");
        session.submit(now + Duration::from_millis(1000));
        assert_eq!(session.tick(now + Duration::from_millis(2000)), None);

        match session.tick(now + Duration::from_millis(2600)) {
            Some(Effect::NotifyBatch(batch)) => {
                assert_eq!(batch.jobs.len(), 1);
                assert_eq!(batch.jobs[0].record_id, "3");
            }
            other => panic!("expected a batch, got {:?}", other),
        }
        assert!(matches!(session.bulk_state(), BulkState::Running(_)));

        // No second run while one is in progress
        session.set_input("ravi");
        session.submit(now + Duration::from_secs(3));
        assert!(matches!(session.bulk_state(), BulkState::Running(_)));
    }

    #[test]
    fn test_auto_notify_needs_credentials() {
        let mut session = loaded(SessionOptions::default());
        session.set_input("ravi");
        session.submit(Instant::now());

        assert_eq!(session.bulk_state(), BulkState::Idle);
        assert!(session.notify_record("1").is_none());
        assert_eq!(
            session.status(),
            Some(ApiError::MissingCredentials.user_message().as_str())
        );
    }

    #[test]
    fn test_batch_without_candidates_finishes_immediately() {
        let mut session = loaded(notifying());
        let now = Instant::now();
        session.set_input("patil");
        session.submit(now);

        assert_eq!(session.tick(now + Duration::from_secs(2)), None);
        assert_eq!(
            session.bulk_state(),
            BulkState::Finished(NotifyProgress { skipped: 1, ..Default::default() })
        );
    }

    #[tokio::test]
    async fn test_save_round_trip_patches_record() {
        let remote = FakeRemote::default();
        let mut session = loaded(SessionOptions::default());

        session.begin_edit(FieldKind::Mobile, "2").unwrap();
        *session.edit_draft_mut(FieldKind::Mobile).unwrap() = "7777777777".into();
        let effect = session.save_edit(FieldKind::Mobile).unwrap();

        for completion in run(&remote, effect).await {
            session.apply(completion);
        }

        assert_eq!(session.record("2").unwrap().mobile_number, "7777777777");
        assert_eq!(session.edit_state(FieldKind::Mobile), &EditState::Idle);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft() {
        let remote = FakeRemote {
            reject_updates: true,
            ..Default::default()
        };
        let mut session = loaded(SessionOptions::default());

        session.begin_edit(FieldKind::Address, "1").unwrap();
        *session.edit_draft_mut(FieldKind::Address).unwrap() = "Flat 9".into();
        let effect = session.save_edit(FieldKind::Address).unwrap();

        for completion in run(&remote, effect).await {
            session.apply(completion);
        }

        assert_eq!(session.record("1").unwrap().house_number, "");
        match session.edit_state(FieldKind::Address) {
            EditState::Editing { draft, error, .. } => {
                assert_eq!(draft, "Flat 9");
                assert!(error.is_some());
            }
            other => panic!("expected Editing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_bulk_reports_progress() {
        let remote = FakeRemote::default();
        let mut session = loaded(notifying());
        let now = Instant::now();
        session.set_input("a");
        session.submit(now);

        let effect = session.tick(now + Duration::from_secs(2)).unwrap();
        let completions = run(&remote, effect).await;
        for completion in completions.clone() {
            session.apply(completion);
        }

        // Two progress updates and one finish
        assert_eq!(completions.len(), 3);
        assert_eq!(
            *remote.sent.lock().unwrap(),
            vec!["919090385555", "918888888888"]
        );
        assert_eq!(
            session.bulk_state(),
            BulkState::Finished(NotifyProgress {
                total: 2,
                attempted: 2,
                succeeded: 2,
                failed: 0,
                skipped: 1
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_through_runner() {
        let remote = FakeRemote {
            records: sample(),
            ..Default::default()
        };
        let mut session = Session::new(SessionOptions::default());
        let effect = session.load().unwrap();

        for completion in run(&remote, effect).await {
            session.apply(completion);
        }

        assert_eq!(session.fetch_state(), &FetchState::Loaded);
        assert_eq!(session.stats(), GenderStats { males: 3, females: 0, total: 3 });
    }

    #[test]
    fn test_new_query_returns_to_first_page() {
        let mut session = Session::new(SessionOptions::default());
        let many = (1..=60).map(|n| voter(&n.to_string(), &format!("Voter {}", n), "")).collect();
        session.apply(Completion::RecordsLoaded(Ok(many)));
        let now = Instant::now();

        session.select_page_size(PageSizeChoice::Fixed(50));
        session.set_input("voter");
        session.submit(now);
        assert_eq!(session.match_count(), 60);
        assert!(session.go_to_page(2));
        assert_eq!(session.pager().page(), 2);

        session.set_input("oter");
        session.submit(now);
        assert_eq!(session.match_count(), 60);
        assert_eq!(session.pager().page(), 1);
    }

    #[test]
    fn test_one_single_notification_at_a_time() {
        let mut session = loaded(notifying());
        let now = Instant::now();
        session.set_input("ravi");
        session.submit(now);

        assert!(matches!(session.notify_record("1"), Some(Effect::NotifyOne(_))));
        assert!(session.notify_record("1").is_none(), "second send while the first is out");
        assert!(session.notify_record("3").is_none());

        // The debounced batch waits for the single message
        assert_eq!(session.tick(now + Duration::from_secs(5)), None);
        assert!(matches!(session.bulk_state(), BulkState::Scheduled { .. }));

        session.apply(Completion::SingleNotified {
            record_id: "1".into(),
            result: Ok(SendOutcome::Sent { message_id: None }),
        });
        assert!(!session.is_notifying_one());
        assert!(matches!(
            session.tick(now + Duration::from_secs(5)),
            Some(Effect::NotifyBatch(_))
        ));
        assert!(session.notify_record("3").is_none(), "refused while the batch runs");
    }

    #[test]
    fn test_reload_during_save_leaves_other_voter_alone() {
        let mut session = Session::new(SessionOptions::default());
        session.apply(Completion::RecordsLoaded(Ok(vec![
            voter("1", "Asha Patil", ""),
            voter("2", "Ravi Kumar", ""),
        ])));

        session.begin_edit(FieldKind::Mobile, "2").unwrap();
        *session.edit_draft_mut(FieldKind::Mobile).unwrap() = "9876543210".into();
        session.save_edit(FieldKind::Mobile).unwrap();

        // Same positional ids, different voters
        let mut ravi = voter("1", "Ravi Kumar", "");
        ravi.voter_card_id = "ABC0000002".into();
        let mut sunita = voter("2", "Sunita Shinde", "");
        sunita.voter_card_id = "SUN0000001".into();
        session.apply(Completion::RecordsLoaded(Ok(vec![ravi, sunita])));

        session.apply(Completion::FieldSaved {
            kind: FieldKind::Mobile,
            result: Ok("Voter data updated successfully".into()),
        });

        assert_eq!(session.record("2").unwrap().mobile_number, "");
        assert_eq!(session.edit_state(FieldKind::Mobile), &EditState::Idle);
    }

    #[test]
    fn test_reload_drops_draft_for_departed_voter() {
        let mut session = loaded(SessionOptions::default());
        session.begin_edit(FieldKind::Address, "2").unwrap();

        let mut reshuffled = sample();
        reshuffled[1].voter_card_id = "NEW0000002".into();
        session.apply(Completion::RecordsLoaded(Ok(reshuffled)));

        assert_eq!(session.edit_state(FieldKind::Address), &EditState::Idle);
    }
}
