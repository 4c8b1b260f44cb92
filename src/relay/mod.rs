// 🔁 Relays - thin backend endpoints between the client and external services
//
// `update` validates and persists record edits; `proxy` forwards messages to
// the provider with credentials attached. `server` wraps both in axum handlers.

pub mod proxy;
pub mod update;

pub use proxy::{forward_message, ProviderSettings, SendReply, SendRequest};
pub use update::{apply_update, validate_update, UpdateReply, UpdateRequest, ValidatedUpdate};
