// 📣 Bulk Notifier - sequential, throttled voter-detail messages
// One message in flight at a time; failures are counted, never fatal.

use crate::client::NotificationSender;
use crate::error::ApiError;
use crate::message::compose;
use crate::phone::{is_local_number, to_international};
use crate::record::VoterRecord;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Most messages dispatched for a single result set
pub const MAX_BATCH: usize = 20;

// ============================================================================
// JOBS & BATCHES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyJob {
    pub record_id: String,
    /// Number as stored on the record; normalized at send time
    pub mobile: String,
    pub message: String,
}

impl NotifyJob {
    pub fn for_record(record: &VoterRecord) -> Self {
        NotifyJob {
            record_id: record.id.clone(),
            mobile: record.mobile_number.trim().to_string(),
            message: compose(record),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub jobs: Vec<NotifyJob>,
    /// Matches left out for lacking a 10-digit mobile number
    pub skipped: usize,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Pick candidates from a result set: valid 10-digit numbers, first 20 only
pub fn plan_batch<'a, I>(matches: I) -> Batch
where
    I: IntoIterator<Item = &'a VoterRecord>,
{
    let mut batch = Batch::default();

    for record in matches {
        if !is_local_number(record.mobile_number.trim()) {
            batch.skipped += 1;
            continue;
        }
        if batch.jobs.len() < MAX_BATCH {
            batch.jobs.push(NotifyJob::for_record(record));
        }
    }

    batch
}

// ============================================================================
// SEND OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { message_id: Option<String> },
    Failed(String),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }

    /// Interpret a proxy (or provider) JSON response.
    ///
    /// Only an explicit `success: true`, or a 2xx body carrying provider
    /// markers (`contacts` / `messages` arrays) without an `error`, counts
    /// as sent.
    pub fn from_response(status: u16, body: &Value) -> SendOutcome {
        match body.get("success").and_then(Value::as_bool) {
            Some(true) => SendOutcome::Sent {
                message_id: body
                    .get("message_id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| first_message_id(body)),
            },
            Some(false) => SendOutcome::Failed(error_text(body)),
            None => {
                let has_markers = body.get("contacts").map_or(false, Value::is_array)
                    || body.get("messages").map_or(false, Value::is_array);
                let ok = (200..300).contains(&status) && body.get("error").is_none();

                if ok && has_markers {
                    SendOutcome::Sent {
                        message_id: first_message_id(body),
                    }
                } else {
                    SendOutcome::Failed(error_text(body))
                }
            }
        }
    }
}

fn first_message_id(body: &Value) -> Option<String> {
    body.pointer("/messages/0/id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn error_text(body: &Value) -> String {
    let from_error = match body.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj @ Value::Object(_)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    from_error
        .or_else(|| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "unexpected response".to_string())
}

// ============================================================================
// PROGRESS
// ============================================================================

/// Running counters for UI progress display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyProgress {
    pub total: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

// ============================================================================
// NOTIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct BulkNotifier {
    pause: Duration,
}

impl BulkNotifier {
    pub fn new(pause: Duration) -> Self {
        BulkNotifier { pause }
    }

    /// Send every job in order, pausing between messages.
    ///
    /// `on_progress` fires after each job with the updated counters.
    pub async fn run<S, F>(&self, sender: &S, batch: Batch, mut on_progress: F) -> NotifyProgress
    where
        S: NotificationSender,
        F: FnMut(&NotifyProgress),
    {
        let mut progress = NotifyProgress {
            total: batch.jobs.len(),
            skipped: batch.skipped,
            ..NotifyProgress::default()
        };

        info!(
            total = progress.total,
            skipped = progress.skipped,
            pause_ms = self.pause.as_millis() as u64,
            "starting bulk notification"
        );

        for (i, job) in batch.jobs.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pause).await;
            }

            progress.attempted += 1;
            match self.deliver(sender, job).await {
                Ok(SendOutcome::Sent { message_id }) => {
                    progress.succeeded += 1;
                    debug!(record = %job.record_id, ?message_id, "message sent");
                }
                Ok(SendOutcome::Failed(reason)) => {
                    progress.failed += 1;
                    warn!(record = %job.record_id, %reason, "message rejected");
                }
                Err(err) => {
                    progress.failed += 1;
                    warn!(record = %job.record_id, error = %err, "message not delivered");
                }
            }

            on_progress(&progress);
        }

        info!(
            attempted = progress.attempted,
            succeeded = progress.succeeded,
            failed = progress.failed,
            "bulk notification finished"
        );

        progress
    }

    /// Normalize the number and send one job. A number that cannot be
    /// normalized fails without touching the network.
    pub async fn deliver<S>(&self, sender: &S, job: &NotifyJob) -> Result<SendOutcome, ApiError>
    where
        S: NotificationSender,
    {
        let phone = match to_international(&job.mobile) {
            Ok(phone) => phone,
            Err(reason) => return Ok(SendOutcome::Failed(format!("invalid number: {}", reason))),
        };

        sender.send(&phone, &job.message).await
    }
}
