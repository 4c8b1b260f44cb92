// ✏️ Inline Edit Controller - one edit slot per field kind
// Idle → Editing → Saving → (Idle on success | Editing on failure)

use crate::error::EditError;
use crate::phone::validate_mobile;
use crate::record::VoterRecord;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Mobile,
    Address,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Mobile => write!(f, "mobile"),
            FieldKind::Address => write!(f, "address"),
        }
    }
}

impl FieldKind {
    fn current_value(self, record: &VoterRecord) -> &str {
        match self {
            FieldKind::Mobile => &record.mobile_number,
            FieldKind::Address => &record.house_number,
        }
    }

    fn apply(self, record: &mut VoterRecord, value: String) {
        match self {
            FieldKind::Mobile => record.mobile_number = value,
            FieldKind::Address => record.house_number = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        record_id: String,
        /// Pins the slot to one voter; positional ids are reused across reloads
        voter_card_id: String,
        draft: String,
        /// Last validation or save failure, cleared on the next save attempt
        error: Option<String>,
    },
    Saving {
        record_id: String,
        voter_card_id: String,
        /// Draft as typed, restored if the save fails
        draft: String,
        /// Validated value sent to the relay
        value: String,
    },
}

impl EditState {
    pub fn record_id(&self) -> Option<&str> {
        match self {
            EditState::Idle => None,
            EditState::Editing { record_id, .. } | EditState::Saving { record_id, .. } => {
                Some(record_id)
            }
        }
    }

    /// Whether this slot was opened on `record`
    pub fn targets(&self, record: &VoterRecord) -> bool {
        match self {
            EditState::Idle => false,
            EditState::Editing {
                record_id,
                voter_card_id,
                ..
            }
            | EditState::Saving {
                record_id,
                voter_card_id,
                ..
            } => *record_id == record.id && voter_card_id == record.voter_card_id.trim(),
        }
    }
}

/// Everything the Update Relay needs for one save.
///
/// Mobile and address travel together; the untouched one keeps its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub kind: FieldKind,
    pub record_id: String,
    pub voter_card_id: String,
    pub serial_number: String,
    pub mobile: String,
    pub address: String,
}

impl SaveRequest {
    /// The new value of the field being saved
    pub fn value(&self) -> &str {
        match self.kind {
            FieldKind::Mobile => &self.mobile,
            FieldKind::Address => &self.address,
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct EditController {
    mobile: EditState,
    address: EditState,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, kind: FieldKind) -> &EditState {
        match kind {
            FieldKind::Mobile => &self.mobile,
            FieldKind::Address => &self.address,
        }
    }

    fn slot(&mut self, kind: FieldKind) -> &mut EditState {
        match kind {
            FieldKind::Mobile => &mut self.mobile,
            FieldKind::Address => &mut self.address,
        }
    }

    pub fn is_saving(&self, kind: FieldKind) -> bool {
        matches!(self.state(kind), EditState::Saving { .. })
    }

    /// Enter `Editing` with the draft pre-populated from the record.
    /// Replaces an unsaved draft in the same slot; refused while saving.
    pub fn begin(&mut self, kind: FieldKind, record: &VoterRecord) -> Result<(), EditError> {
        if self.is_saving(kind) {
            return Err(EditError::SaveInFlight(kind));
        }

        debug!(field = %kind, record = %record.id, "begin edit");
        *self.slot(kind) = EditState::Editing {
            record_id: record.id.clone(),
            voter_card_id: record.voter_card_id.trim().to_string(),
            draft: kind.current_value(record).to_string(),
            error: None,
        };
        Ok(())
    }

    /// Mutable draft of an active edit, for keystroke handling
    pub fn draft_mut(&mut self, kind: FieldKind) -> Option<&mut String> {
        match self.slot(kind) {
            EditState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn set_draft(&mut self, kind: FieldKind, value: &str) -> Result<(), EditError> {
        let draft = self.draft_mut(kind).ok_or(EditError::NotEditing(kind))?;
        *draft = value.to_string();
        Ok(())
    }

    /// Drop drafts whose voter left the record set after a reload.
    /// A save in flight is left alone; `finish` only patches its own voter.
    pub fn retain_loaded(&mut self, records: &[VoterRecord]) {
        for kind in [FieldKind::Mobile, FieldKind::Address] {
            let slot = self.slot(kind);
            if matches!(slot, EditState::Editing { .. }) && !records.iter().any(|r| slot.targets(r)) {
                debug!(field = %kind, record = ?slot.record_id(), "draft dropped after reload");
                *slot = EditState::Idle;
            }
        }
    }

    /// Drop the draft without side effects. A save in flight is not cancelled.
    pub fn cancel(&mut self, kind: FieldKind) -> bool {
        if matches!(self.state(kind), EditState::Editing { .. }) {
            *self.slot(kind) = EditState::Idle;
            true
        } else {
            false
        }
    }

    /// Validate the draft and move to `Saving`.
    ///
    /// On a validation failure the slot stays in `Editing` with the error
    /// recorded and nothing is sent.
    pub fn save(&mut self, kind: FieldKind, records: &[VoterRecord]) -> Result<SaveRequest, EditError> {
        let (record_id, voter_card_id, draft) = match self.state(kind) {
            EditState::Idle => return Err(EditError::NotEditing(kind)),
            EditState::Saving { .. } => return Err(EditError::SaveInFlight(kind)),
            EditState::Editing {
                record_id,
                voter_card_id,
                draft,
                ..
            } => (record_id.clone(), voter_card_id.clone(), draft.clone()),
        };

        let checked = self.validate(kind, &draft, records);
        let (record, value) = match checked {
            Ok(ok) => ok,
            Err(err) => {
                warn!(field = %kind, record = %record_id, error = %err, "edit rejected locally");
                if let EditState::Editing { error, .. } = self.slot(kind) {
                    *error = Some(err.to_string());
                }
                return Err(err);
            }
        };

        let (mobile, address) = match kind {
            FieldKind::Mobile => (value.clone(), record.house_number.clone()),
            FieldKind::Address => (record.mobile_number.clone(), value.clone()),
        };

        let request = SaveRequest {
            kind,
            record_id: record_id.clone(),
            voter_card_id: voter_card_id.clone(),
            serial_number: record.serial_number.clone(),
            mobile,
            address,
        };

        *self.slot(kind) = EditState::Saving {
            record_id,
            voter_card_id,
            draft,
            value,
        };

        Ok(request)
    }

    fn validate<'r>(
        &self,
        kind: FieldKind,
        draft: &str,
        records: &'r [VoterRecord],
    ) -> Result<(&'r VoterRecord, String), EditError> {
        let slot = self.state(kind);
        let record = records.iter().find(|r| slot.targets(r)).ok_or_else(|| {
            EditError::RecordNotFound(slot.record_id().unwrap_or_default().to_string())
        })?;

        if record.voter_card_id.trim().is_empty() {
            return Err(EditError::MissingVoterCardId);
        }

        let value = match kind {
            FieldKind::Mobile => validate_mobile(draft).map_err(EditError::InvalidMobile)?,
            FieldKind::Address => draft.trim().to_string(),
        };

        Ok((record, value))
    }

    /// Resolve an in-flight save.
    ///
    /// Success patches the record and returns to `Idle`; failure returns to
    /// `Editing` with the user's draft intact.
    pub fn finish(
        &mut self,
        kind: FieldKind,
        outcome: Result<(), String>,
        records: &mut [VoterRecord],
    ) -> Result<(), EditError> {
        if !self.is_saving(kind) {
            return Err(EditError::NotEditing(kind));
        }

        let saving = std::mem::take(self.slot(kind));
        let target = records.iter().position(|r| saving.targets(r));
        let EditState::Saving {
            record_id,
            voter_card_id,
            draft,
            value,
        } = saving
        else {
            return Err(EditError::NotEditing(kind));
        };

        match outcome {
            Ok(()) => {
                match target.and_then(|index| records.get_mut(index)) {
                    Some(record) => {
                        kind.apply(record, value);
                        info!(field = %kind, record = %record_id, "saved");
                    }
                    // Records were reloaded while the save was in flight
                    None => warn!(field = %kind, record = %record_id, "saved record no longer loaded"),
                }
                Ok(())
            }
            Err(message) => {
                warn!(field = %kind, record = %record_id, error = %message, "save failed");
                *self.slot(kind) = EditState::Editing {
                    record_id,
                    voter_card_id,
                    draft,
                    error: Some(message),
                };
                Ok(())
            }
        }
    }
}
