// 🗂️ Record Normalizer - maps remote payload rows into VoterRecord
// Accepts spreadsheet-style Marathi headers, camelCase and snake_case keys

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info};

// ============================================================================
// VOTER RECORD
// ============================================================================

/// One voter as held in memory for the lifetime of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// UI identity key, unique within one load: the external id when
    /// supplied, else the 1-based position (`#`-prefixed when the payload
    /// also carries external ids)
    pub id: String,

    /// Display-only ordinal
    pub serial_number: String,

    /// Editable address field
    pub house_number: String,

    pub name_local: String,
    pub name_latin: String,

    pub gender_local: String,
    pub gender_latin: String,

    pub age: String,

    /// Stable external identifier, used as the update key
    pub voter_card_id: String,

    /// Editable; 10 digits when non-empty
    pub mobile_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl VoterRecord {
    pub fn gender(&self) -> Gender {
        let latin = self.gender_latin.trim();
        let local = self.gender_local.trim();

        if latin.eq_ignore_ascii_case("male") || local == "पुरुष" {
            Gender::Male
        } else if latin.eq_ignore_ascii_case("female") || local == "स्त्री" {
            Gender::Female
        } else {
            Gender::Unknown
        }
    }

    /// Gender label for display, local script first
    pub fn gender_label(&self) -> &str {
        first_non_empty(&[&self.gender_local, &self.gender_latin])
    }

    /// `#`-prefixed ids are positions, not voter ids from the payload
    pub fn is_positional_id(id: &str) -> bool {
        id.starts_with(POSITIONAL_PREFIX)
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::SerialNumber => &self.serial_number,
            Field::HouseNumber => &self.house_number,
            Field::NameLocal => &self.name_local,
            Field::NameLatin => &self.name_latin,
            Field::GenderLocal => &self.gender_local,
            Field::GenderLatin => &self.gender_latin,
            Field::Age => &self.age,
            Field::VoterCardId => &self.voter_card_id,
            Field::MobileNumber => &self.mobile_number,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::SerialNumber => &mut self.serial_number,
            Field::HouseNumber => &mut self.house_number,
            Field::NameLocal => &mut self.name_local,
            Field::NameLatin => &mut self.name_latin,
            Field::GenderLocal => &mut self.gender_local,
            Field::GenderLatin => &mut self.gender_latin,
            Field::Age => &mut self.age,
            Field::VoterCardId => &mut self.voter_card_id,
            Field::MobileNumber => &mut self.mobile_number,
        }
    }
}

fn first_non_empty<'a>(candidates: &[&'a String]) -> &'a str {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

// ============================================================================
// FIELD ALIASES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SerialNumber,
    HouseNumber,
    NameLocal,
    NameLatin,
    GenderLocal,
    GenderLatin,
    Age,
    VoterCardId,
    MobileNumber,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::SerialNumber,
        Field::HouseNumber,
        Field::NameLocal,
        Field::NameLatin,
        Field::GenderLocal,
        Field::GenderLatin,
        Field::Age,
        Field::VoterCardId,
        Field::MobileNumber,
    ];

    /// Payload keys accepted for this field, in lookup order
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::SerialNumber => &["अनु क्र.", "serialNumber", "serial_number", "serial_no", "sr_no"],
            Field::HouseNumber => &["घर क्र.", "houseNumber", "house_number", "house_no", "address"],
            Field::NameLocal => &["नाव (मराठी)", "nameLocal", "name_local", "name_mr", "name_marathi"],
            Field::NameLatin => &["नाव (इंग्रजी)", "nameLatin", "name_latin", "name_en", "name_english", "name"],
            Field::GenderLocal => &["लिंग (मराठी)", "genderLocal", "gender_local", "gender_mr"],
            Field::GenderLatin => &["लिंग (इंग्रजी)", "genderLatin", "gender_latin", "gender_en", "gender"],
            Field::Age => &["वय", "age"],
            Field::VoterCardId => &["मतदान कार्ड क्र.", "voterCardId", "voter_card_id", "epic_id", "epic_no"],
            Field::MobileNumber => &["मोबाईल नं.", "mobileNumber", "mobile_number", "mobile"],
        }
    }
}

const ID_KEYS: [&str; 2] = ["id", "voter_id"];

const POSITIONAL_PREFIX: char = '#';

// ============================================================================
// NORMALIZER
// ============================================================================

/// Unwrap the fetch envelope and normalize its rows.
///
/// Accepts `{success: true, data: [...]}` and `{status: "success", data: [...]}`.
pub fn normalize_payload(body: &Value) -> Result<Vec<VoterRecord>, ApiError> {
    let envelope = body
        .as_object()
        .ok_or_else(|| ApiError::Malformed("expected a JSON object".to_string()))?;

    let succeeded = envelope.get("success").and_then(Value::as_bool) == Some(true)
        || envelope.get("status").and_then(Value::as_str) == Some("success");

    if !succeeded {
        let reason = envelope
            .get("message")
            .or_else(|| envelope.get("error"))
            .map(coerce)
            .filter(|m| !m.is_empty());
        return Err(match reason {
            Some(message) => ApiError::Rejected(message),
            None => ApiError::Malformed("response carries no success flag".to_string()),
        });
    }

    let rows = envelope
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Malformed("response has no data array".to_string()))?;

    let records = normalize_rows(rows);

    if let Some(count) = envelope.get("count").and_then(Value::as_u64) {
        debug!(reported = count, retained = records.len(), "voter count");
    }

    Ok(records)
}

/// Normalize raw rows, dropping header echoes and nameless rows
pub fn normalize_rows(rows: &[Value]) -> Vec<VoterRecord> {
    let mut retained = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let Some(map) = row.as_object() else {
            dropped += 1;
            continue;
        };

        match normalize_row(map) {
            Some(record) => retained.push((record, lookup(map, &ID_KEYS))),
            None => dropped += 1,
        }
    }

    let records = assign_ids(retained);
    info!(retained = records.len(), dropped, "normalized voter rows");
    records
}

/// External ids win on first occurrence. Rows without one, and repeats,
/// fall back to their position; those positions get a `#` prefix whenever
/// external ids are present so the two kinds cannot collide.
fn assign_ids(retained: Vec<(VoterRecord, String)>) -> Vec<VoterRecord> {
    let mixed = retained.iter().any(|(_, external)| !external.is_empty());
    let mut taken = HashSet::new();
    let mut external_ok = Vec::with_capacity(retained.len());

    for (_, external) in &retained {
        let fresh = !external.is_empty() && taken.insert(external.clone());
        if !fresh && !external.is_empty() {
            debug!(id = %external, "duplicate external id, using position");
        }
        external_ok.push(fresh);
    }

    retained
        .into_iter()
        .zip(external_ok)
        .enumerate()
        .map(|(index, ((mut record, external), fresh))| {
            record.id = if fresh {
                external
            } else {
                positional_id(index + 1, mixed, &mut taken)
            };
            record
        })
        .collect()
}

fn positional_id(position: usize, mixed: bool, taken: &mut HashSet<String>) -> String {
    if !mixed {
        return position.to_string();
    }

    let mut id = format!("{}{}", POSITIONAL_PREFIX, position);
    let mut attempt = 1;
    while !taken.insert(id.clone()) {
        attempt += 1;
        id = format!("{}{}-{}", POSITIONAL_PREFIX, position, attempt);
    }
    id
}

fn normalize_row(row: &Map<String, Value>) -> Option<VoterRecord> {
    let mut record = VoterRecord::default();

    for field in Field::ALL {
        *record.field_mut(field) = lookup(row, field.aliases());
    }

    if record.name_latin.is_empty() && record.name_local.is_empty() {
        return None;
    }

    if is_header_echo(&record) {
        return None;
    }

    Some(record)
}

/// First alias carrying a non-empty value
fn lookup(row: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .map(coerce)
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Spreadsheet exports repeat the header row as data
fn is_header_echo(record: &VoterRecord) -> bool {
    [Field::NameLatin, Field::NameLocal].iter().any(|field| {
        let value = record.field(*field);
        field
            .aliases()
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(value))
    })
}

/// Coerce any JSON scalar into a trimmed string; null becomes empty
pub fn coerce(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenderStats {
    pub males: usize,
    pub females: usize,
    pub total: usize,
}

/// Gender counts over the full record set (not the filtered view)
pub fn gender_stats(records: &[VoterRecord]) -> GenderStats {
    let mut stats = GenderStats {
        total: records.len(),
        ..GenderStats::default()
    };

    for record in records {
        match record.gender() {
            Gender::Male => stats.males += 1,
            Gender::Female => stats.females += 1,
            Gender::Unknown => {}
        }
    }

    stats
}
