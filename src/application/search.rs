//! Debounced, abortable blog search with latest-wins commits.
//!
//! Every submitted input gets a generation number. Submitting aborts the
//! task serving the previous generation, and a finished fetch only commits
//! when its generation is still the newest one issued.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};
use whalefall_api_types::BlogPost;

use crate::application::pagination::list_params;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search rejected: {0}")]
    Rejected(String),
}

/// What the reader typed or picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInput {
    pub text: String,
    pub tag: Option<String>,
    pub page: u32,
}

impl SearchInput {
    pub fn new(text: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            text: text.into(),
            tag,
            page: 1,
        }
    }

    /// Upstream listing parameters; blank filters are left out.
    pub fn params(&self, page_size: u32) -> Vec<(String, String)> {
        let title = Some(self.text.trim()).filter(|t| !t.is_empty());
        let tag = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
        list_params(self.page.max(1), page_size, title, tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub posts: Vec<BlogPost>,
    pub total: u64,
}

/// Where search results come from.
#[async_trait]
pub trait PostSource: Send + Sync + 'static {
    async fn search(&self, params: &[(String, String)]) -> Result<SearchResults, SearchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Idle,
    Ready,
    Failed,
}

/// Last committed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub generation: u64,
    pub input: SearchInput,
    pub posts: Vec<BlogPost>,
    pub total: u64,
    pub outcome: SearchOutcome,
}

impl SearchState {
    fn idle() -> Self {
        Self {
            generation: 0,
            input: SearchInput::default(),
            posts: Vec::new(),
            total: 0,
            outcome: SearchOutcome::Idle,
        }
    }
}

struct Pending {
    input: SearchInput,
    task: Option<JoinHandle<()>>,
}

pub struct SearchController<S: PostSource> {
    source: Arc<S>,
    debounce: Duration,
    page_size: u32,
    generation: Arc<AtomicU64>,
    pending: Mutex<Pending>,
    state: Arc<watch::Sender<SearchState>>,
}

impl<S: PostSource> SearchController<S> {
    pub fn new(source: Arc<S>, debounce: Duration, page_size: u32) -> Self {
        let (state, _) = watch::channel(SearchState::idle());
        Self {
            source,
            debounce,
            page_size,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(Pending {
                input: SearchInput::default(),
                task: None,
            }),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Text or tag changed: back to page one after the debounce delay.
    pub fn submit(&self, text: impl Into<String>, tag: Option<String>) -> u64 {
        self.schedule(SearchInput::new(text, tag), self.debounce)
    }

    /// Page navigation keeps the filters and fetches immediately.
    pub fn go_to_page(&self, page: u32) -> u64 {
        let mut input = self.current_input();
        input.page = page.max(1);
        self.schedule(input, Duration::ZERO)
    }

    /// Abort whatever is still pending.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = pending.task.take() {
            abort_task(task);
        }
    }

    fn current_input(&self) -> SearchInput {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .input
            .clone()
    }

    fn schedule(&self, input: SearchInput, delay: Duration) -> u64 {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(previous) = pending.task.take() {
            abort_task(previous);
        }

        let params = input.params(self.page_size);
        let source = Arc::clone(&self.source);
        let latest = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let task_input = input.clone();

        pending.input = input;
        pending.task = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            debug!(
                target = "application::search::SearchController",
                generation,
                text = %task_input.text,
                page = task_input.page,
                "issuing search"
            );

            let (posts, total, outcome) = match source.search(&params).await {
                Ok(results) => (results.posts, results.total, SearchOutcome::Ready),
                Err(err) => {
                    warn!(
                        target = "application::search::SearchController",
                        generation,
                        error = %err,
                        "search failed; showing empty results"
                    );
                    (Vec::new(), 0, SearchOutcome::Failed)
                }
            };

            state.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != generation || current.generation > generation
                {
                    return false;
                }
                *current = SearchState {
                    generation,
                    input: task_input,
                    posts,
                    total,
                    outcome,
                };
                true
            });
        }));

        generation
    }
}

impl<S: PostSource> Drop for SearchController<S> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.task.take() {
            task.abort();
        }
    }
}

fn abort_task(task: JoinHandle<()>) {
    if !task.is_finished() {
        task.abort();
        metrics::counter!("whalefall_search_aborted_total").increment(1);
    }
}
