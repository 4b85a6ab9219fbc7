use crate::interface::{
    Credentials, FilterState, IssueDetail, IssueSummary, IssueTransport, IssueTypeFilter,
    QueryError, StatusFilter,
};
use crate::jql;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Everything the presentation layer observes, published wholesale on every
/// state change. List results and suggestions live in separate slots so a
/// late completion of one kind can never masquerade as the other.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub filter: FilterState,
    pub results: Vec<IssueSummary>,
    pub suggestions: Vec<IssueSummary>,
    pub selected: Option<IssueSummary>,
    pub selected_detail: Option<IssueDetail>,
    pub list_error: Option<QueryError>,
    pub suggestion_error: Option<QueryError>,
    pub detail_error: Option<QueryError>,
}

/// Per-kind generation counters plus the visible snapshot, all behind one
/// mutex so counter bumps and result application are serialized.
struct SessionState {
    credentials: Credentials,
    snapshot: SessionSnapshot,
    list_generation: u64,
    suggestion_generation: u64,
    detail_generation: u64,
}

struct SessionInner {
    transport: Arc<dyn IssueTransport>,
    state: Mutex<SessionState>,
    notifier: watch::Sender<SessionSnapshot>,
}

/// Owns filter and selection state and coordinates the three query kinds
/// (list, suggestion, detail). Each trigger stamps its request with a fresh
/// generation; a completion is applied only if its stamp still matches the
/// counter, so rapid-fire filter changes and keystrokes cannot let a stale
/// response overwrite a newer one. Superseded requests are not aborted,
/// they drain and their results are dropped.
#[derive(Clone)]
pub struct IssueSession {
    inner: Arc<SessionInner>,
}

impl IssueSession {
    pub fn new(transport: Arc<dyn IssueTransport>) -> Self {
        let (notifier, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(SessionInner {
                transport,
                state: Mutex::new(SessionState {
                    credentials: Credentials::default(),
                    snapshot: SessionSnapshot::default(),
                    list_generation: 0,
                    suggestion_generation: 0,
                    detail_generation: 0,
                }),
                notifier,
            }),
        }
    }

    /// Observable state. The receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.notifier.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner
            .state
            .lock()
            .expect("session state lock")
            .snapshot
            .clone()
    }

    /// Stores fresh credentials and reloads the list, as the settings sheet
    /// does on close.
    pub fn set_credentials(&self, credentials: Credentials) {
        {
            let mut state = self.inner.state.lock().expect("session state lock");
            state.credentials = credentials;
        }
        self.trigger_list();
    }

    pub fn set_status(&self, status: StatusFilter) {
        self.update_filter(|filter| filter.status = status);
    }

    pub fn set_issue_type(&self, issue_type: IssueTypeFilter) {
        self.update_filter(|filter| filter.issue_type = issue_type);
    }

    pub fn set_assigned_to_me(&self, assigned_to_me: bool) {
        self.update_filter(|filter| filter.assigned_to_me = assigned_to_me);
    }

    /// Every keystroke lands here. Non-empty text switches the session to
    /// suggestion queries; empty text falls back to the filtered list and
    /// invalidates any suggestion fetch still in flight.
    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        let query = jql::build_suggestion_query(&text);
        {
            let mut state = self.inner.state.lock().expect("session state lock");
            state.snapshot.filter.search_text = text;
            if query.is_none() {
                state.suggestion_generation += 1;
                state.snapshot.suggestions.clear();
                state.snapshot.suggestion_error = None;
            }
            self.inner.publish(&state);
        }
        match query {
            Some(query) => self.trigger_suggestions(query),
            None => self.trigger_list(),
        }
    }

    /// Records the selection and clears the visible detail immediately; the
    /// fetch for the new key repopulates it. Selecting `None` just clears.
    pub fn select(&self, summary: Option<IssueSummary>) {
        let pending = {
            let mut state = self.inner.state.lock().expect("session state lock");
            state.detail_generation += 1;
            state.snapshot.selected = summary.clone();
            state.snapshot.selected_detail = None;
            state.snapshot.detail_error = None;
            self.inner.publish(&state);
            summary.map(|summary| {
                (
                    state.detail_generation,
                    state.credentials.clone(),
                    summary.key,
                )
            })
        };

        let Some((generation, credentials, key)) = pending else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            debug!(%key, generation, "fetching issue detail");
            let result = inner.transport.fetch_issue_detail(&credentials, &key).await;
            inner.apply_detail(generation, result);
        });
    }

    /// Imperative reload of the list query (pull-to-refresh, initial load).
    pub fn refresh(&self) {
        self.trigger_list();
    }

    fn update_filter(&self, apply: impl FnOnce(&mut FilterState)) {
        {
            let mut state = self.inner.state.lock().expect("session state lock");
            apply(&mut state.snapshot.filter);
            // A filter change also invalidates whatever detail is showing.
            state.detail_generation += 1;
            state.snapshot.selected_detail = None;
            self.inner.publish(&state);
        }
        self.trigger_list();
    }

    fn trigger_list(&self) {
        let (generation, credentials, query) = {
            let mut state = self.inner.state.lock().expect("session state lock");
            state.list_generation += 1;
            (
                state.list_generation,
                state.credentials.clone(),
                jql::build_list_query(&state.snapshot.filter),
            )
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            debug!(%query, generation, "fetching issue list");
            let result = inner.transport.fetch_issue_list(&credentials, &query).await;
            inner.apply_list(generation, result);
        });
    }

    fn trigger_suggestions(&self, query: String) {
        let (generation, credentials) = {
            let mut state = self.inner.state.lock().expect("session state lock");
            state.suggestion_generation += 1;
            (state.suggestion_generation, state.credentials.clone())
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            debug!(%query, generation, "fetching search suggestions");
            let result = inner.transport.fetch_suggestions(&credentials, &query).await;
            inner.apply_suggestions(generation, result);
        });
    }
}

impl SessionInner {
    fn apply_list(&self, generation: u64, result: Result<Vec<IssueSummary>, QueryError>) {
        let mut state = self.state.lock().expect("session state lock");
        if state.list_generation != generation {
            debug!(
                generation,
                current = state.list_generation,
                "dropping stale list completion"
            );
            return;
        }
        match result {
            Ok(issues) => {
                state.snapshot.results = issues;
                state.snapshot.list_error = None;
            }
            Err(error) => {
                warn!(%error, "list query failed");
                state.snapshot.list_error = Some(error);
            }
        }
        self.publish(&state);
    }

    fn apply_suggestions(&self, generation: u64, result: Result<Vec<IssueSummary>, QueryError>) {
        let mut state = self.state.lock().expect("session state lock");
        if state.suggestion_generation != generation {
            debug!(
                generation,
                current = state.suggestion_generation,
                "dropping stale suggestion completion"
            );
            return;
        }
        match result {
            Ok(issues) => {
                state.snapshot.suggestions = issues;
                state.snapshot.suggestion_error = None;
            }
            Err(error) => {
                warn!(%error, "suggestion query failed");
                state.snapshot.suggestion_error = Some(error);
            }
        }
        self.publish(&state);
    }

    fn apply_detail(&self, generation: u64, result: Result<IssueDetail, QueryError>) {
        let mut state = self.state.lock().expect("session state lock");
        if state.detail_generation != generation {
            debug!(
                generation,
                current = state.detail_generation,
                "dropping stale detail completion"
            );
            return;
        }
        match result {
            Ok(detail) => {
                state.snapshot.selected_detail = Some(detail);
                state.snapshot.detail_error = None;
            }
            Err(error) => {
                warn!(%error, "detail query failed");
                state.snapshot.detail_error = Some(error);
            }
        }
        self.publish(&state);
    }

    fn publish(&self, state: &SessionState) {
        self.notifier.send_replace(state.snapshot.clone());
    }
}
