// Voter Lookup - Core Library
// Shared by the interactive TUI, the CLI subcommands and the relay server

pub mod client;
pub mod config;
pub mod edit;
pub mod error;
pub mod message;
pub mod notifier;
pub mod pagination;
pub mod phone;
pub mod record;
pub mod relay;
pub mod search;
pub mod session;
pub mod store;
pub mod suggest;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use client::{ApiClient, NotificationSender, RecordSource, RecordUpdater};
pub use config::{ClientConfig, Credentials, ServerConfig};
pub use edit::{EditController, EditState, FieldKind, SaveRequest};
pub use error::{ApiError, EditError, ProxyError, UpdateError};
pub use notifier::{plan_batch, Batch, BulkNotifier, NotifyJob, NotifyProgress, SendOutcome, MAX_BATCH};
pub use pagination::{paginate, total_pages, PageSizeChoice, Pager, PAGE_SIZE_MENU};
pub use phone::{to_international, validate_mobile, MobileRejection};
pub use record::{gender_stats, normalize_payload, Field, Gender, GenderStats, VoterRecord};
pub use search::{filter, Query};
pub use session::{execute, BulkState, Completion, Effect, FetchState, Session, SessionOptions};
pub use suggest::{suggest, Suggestion};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
