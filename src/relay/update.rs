// Update Relay - validates mobile/address edits keyed by voter card id

use crate::edit::SaveRequest;
use crate::error::UpdateError;
use crate::phone::is_local_number;
use crate::record::{coerce, VoterRecord};
use crate::store;
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

// ============================================================================
// WIRE TYPES
// ============================================================================

/// `POST` body shared by the client and the relay.
///
/// Every field is optional on the wire; ids may arrive as numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub voter_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub epic_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub house_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial_no: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| coerce(&v)))
}

impl From<&SaveRequest> for UpdateRequest {
    fn from(request: &SaveRequest) -> Self {
        UpdateRequest {
            voter_id: Some(request.record_id.clone()).filter(|id| !VoterRecord::is_positional_id(id)),
            epic_id: Some(request.voter_card_id.clone()),
            mobile: Some(request.mobile.clone()),
            address: Some(request.address.clone()),
            house_number: Some(request.address.clone()),
            serial_no: Some(request.serial_number.clone()),
        }
    }
}

/// `{status: "success"|"error", message, data?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReply {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl UpdateReply {
    pub fn success(message: &str, data: Value) -> Self {
        UpdateReply {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: String) -> Self {
        UpdateReply {
            status: "error".to_string(),
            message,
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// An update that passed validation; everything trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpdate {
    pub voter_id: Option<String>,
    pub epic_id: String,
    /// Empty clears the number
    pub mobile: String,
    /// Empty leaves the stored address alone
    pub address: String,
    pub serial_no: Option<String>,
}

pub fn validate_update(request: &UpdateRequest) -> Result<ValidatedUpdate, UpdateError> {
    let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").to_string();
    let non_empty = |v: &Option<String>| Some(trimmed(v)).filter(|s| !s.is_empty());

    let epic_id = trimmed(&request.epic_id);
    if epic_id.is_empty() {
        return Err(UpdateError::MissingEpicId);
    }

    let mobile = trimmed(&request.mobile);
    if !mobile.is_empty() && !is_local_number(&mobile) {
        return Err(UpdateError::InvalidMobile);
    }

    let address = match &request.address {
        Some(_) => trimmed(&request.address),
        None => trimmed(&request.house_number),
    };

    Ok(ValidatedUpdate {
        voter_id: non_empty(&request.voter_id),
        epic_id,
        mobile,
        address,
        serial_no: non_empty(&request.serial_no),
    })
}

/// Persist when a store is wired in, otherwise echo back a simulated update
pub fn apply_update(store: Option<&Connection>, update: ValidatedUpdate) -> Result<UpdateReply, UpdateError> {
    let Some(conn) = store else {
        info!(epic_id = %update.epic_id, "update simulated (no database configured)");
        return Ok(UpdateReply::success(
            "Voter data update simulated (database not configured)",
            json!({
                "epic_id": update.epic_id,
                "mobile": update.mobile,
                "address": update.address,
                "updated_at": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            }),
        ));
    };

    let contact = store::record_update(conn, &update).map_err(|e| {
        warn!(epic_id = %update.epic_id, error = %e, "update not persisted");
        UpdateError::Storage(e.to_string())
    })?;

    info!(epic_id = %contact.epic_id, "voter contact updated");
    Ok(UpdateReply::success(
        "Voter data updated successfully",
        json!({
            "epic_id": contact.epic_id,
            "mobile": contact.mobile,
            "address": contact.address,
            "updated_at": contact.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }),
    ))
}
