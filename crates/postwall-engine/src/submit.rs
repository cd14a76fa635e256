//! Post submission.
//!
//! A submission builds the new post's fields, hands them to the store, and
//! tracks the returned write future on the runtime without waiting for it.
//! The UI learns about the new post the same way it learns about anyone
//! else's: through the next live snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use postwall_core::{
    FeedError, RecordFields, WriteFuture, FIELD_AUTHOR_AVATAR_URL, FIELD_AUTHOR_NAME,
    FIELD_DATE_POSTED, FIELD_TEXT,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Called with [`FeedError::WriteFailure`] when a submitted post fails to
/// write.
pub type WriteFailureHook = Arc<dyn Fn(&FeedError) + Send + Sync>;

/// Builds the stored fields of a new post.
///
/// `date_posted` is written as an RFC 3339 string with millisecond
/// precision, which the live mapping reads back as the post's timestamp.
pub fn post_fields(
    text: &str,
    posted_at: DateTime<Utc>,
    author_name: &str,
    author_avatar_url: &str,
) -> RecordFields {
    let mut fields = RecordFields::new();
    fields.insert(FIELD_TEXT.to_string(), Value::from(text));
    fields.insert(
        FIELD_DATE_POSTED.to_string(),
        Value::from(posted_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    fields.insert(FIELD_AUTHOR_NAME.to_string(), Value::from(author_name));
    fields.insert(
        FIELD_AUTHOR_AVATAR_URL.to_string(),
        Value::from(author_avatar_url),
    );
    fields
}

/// Write futures still in flight for one engine.
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PendingWrites {
    /// Drives `write` to completion on `runtime`.
    ///
    /// Failures are logged and passed to `hook`; they never touch the draft
    /// or the published state.
    pub(crate) fn track(
        &self,
        runtime: &Handle,
        collection: &str,
        write: WriteFuture,
        hook: Option<WriteFailureHook>,
    ) {
        let collection = collection.to_string();
        let task = runtime.spawn(async move {
            match write.await {
                Ok(()) => debug!(%collection, "post written"),
                Err(error) => {
                    warn!(%collection, %error, transient = error.is_transient(), "post write failed");
                    if let Some(hook) = hook {
                        hook(&FeedError::WriteFailure(error));
                    }
                }
            }
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// Number of writes not yet finished.
    pub(crate) fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }

    /// Aborts every write still in flight.
    pub(crate) fn abort_all(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
