//! Transient user-facing messages with auto-dismiss.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;

/// How long a notification stays up unless told otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Delay between a notification starting to fade and leaving the list.
pub const FADE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    /// Set once dismissal started; the entry disappears after [`FADE_DELAY`].
    pub fading: bool,
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Notification>,
    last_id: u64,
}

/// Notification queue. Clones share the same list.
///
/// Timers run on the ambient tokio runtime; outside of one, notifications
/// simply stay until removed by hand.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    inner: Arc<Mutex<Inner>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a message for [`DEFAULT_TIMEOUT`].
    pub fn add(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.add_with_timeout(kind, message, DEFAULT_TIMEOUT)
    }

    /// Queue a message, replacing any live entry with the same text.
    pub fn add_with_timeout(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        timeout: Duration,
    ) -> u64 {
        let message = message.into();
        let id = {
            let mut inner = self.lock();
            inner.items.retain(|n| n.message != message);

            // Wall-clock based, but strictly increasing even within one millisecond.
            let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
            let id = now.max(inner.last_id + 1);
            inner.last_id = id;

            inner.items.push(Notification {
                id,
                kind,
                message,
                fading: false,
            });
            id
        };

        self.schedule(timeout, move |this| this.remove(id));
        id
    }

    /// Start dismissing a notification: mark it fading, drop it after
    /// [`FADE_DELAY`].
    pub fn remove(&self, id: u64) {
        {
            let mut inner = self.lock();
            match inner.items.iter_mut().find(|n| n.id == id) {
                Some(n) => n.fading = true,
                None => return,
            }
        }

        if !self.schedule(FADE_DELAY, move |this| this.purge(id)) {
            self.purge(id);
        }
    }

    /// Surface an API failure as an error notification.
    pub fn report_error(&self, error: &ApiError) -> u64 {
        tracing::debug!(error = %error, "reporting error to user");
        self.add(NotificationKind::Error, error.user_message())
    }

    /// Every entry, fading ones included, oldest first.
    pub fn list(&self) -> Vec<Notification> {
        self.lock().items.clone()
    }

    /// Entries not yet being dismissed.
    pub fn live(&self) -> Vec<Notification> {
        self.lock().items.iter().filter(|n| !n.fading).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().items.clear();
    }

    fn purge(&self, id: u64) {
        self.lock().items.retain(|n| n.id != id);
    }

    fn schedule<F>(&self, delay: Duration, f: F) -> bool
    where
        F: FnOnce(Notifications) + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no tokio runtime; notification timer not scheduled");
            return false;
        };
        let this = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            f(this);
        });
        true
    }
}
