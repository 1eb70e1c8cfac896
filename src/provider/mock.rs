use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CategorizationProvider, Prompt, ProviderError, ProviderResult};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Error(ProviderError),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Reply::Error(ProviderError::request(reason))
    }

    fn into_result(self) -> ProviderResult<String> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Error(e) => Err(e),
        }
    }
}

/// Provider answering from per-title scripts, for tests.
///
/// Each title's replies are consumed in order; once exhausted (or for an
/// unscripted title) the default reply is returned.
#[derive(Debug)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    default_reply: Reply,
    delay: Duration,
    calls: AtomicUsize,
    calls_by_title: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    /// Unscripted titles fail with a request error.
    pub fn new() -> Self {
        Self::with_default(Reply::error("unscripted title"))
    }

    pub fn with_default(default_reply: Reply) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            calls_by_title: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues replies for a normalized title.
    pub fn script(&self, title: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.scripts
            .lock()
            .entry(title.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, title: &str) -> usize {
        self.calls_by_title.lock().get(title).copied().unwrap_or(0)
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategorizationProvider for ScriptedProvider {
    async fn complete(&self, prompt: &Prompt) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_title
            .lock()
            .entry(prompt.title().to_string())
            .or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .scripts
            .lock()
            .get_mut(prompt.title())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default_reply.clone());
        reply.into_result()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
