// 💡 Suggestion Engine - autocomplete candidates for partial search input

use crate::record::VoterRecord;
use std::collections::HashSet;

pub const MAX_SUGGESTIONS: usize = 10;

/// Inputs shorter than this (after trim) produce no suggestions
pub const MIN_INPUT_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub name_latin: String,
    pub name_local: String,
    pub voter_card_id: String,
    pub mobile_number: String,
    /// First non-empty of the four fields above; also the dedup key
    pub search_text: String,
}

impl Suggestion {
    fn from_record(record: &VoterRecord) -> Suggestion {
        let search_text = [
            &record.name_latin,
            &record.name_local,
            &record.voter_card_id,
            &record.mobile_number,
        ]
        .into_iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string();

        Suggestion {
            name_latin: record.name_latin.clone(),
            name_local: record.name_local.clone(),
            voter_card_id: record.voter_card_id.clone(),
            mobile_number: record.mobile_number.clone(),
            search_text,
        }
    }
}

/// Up to ten de-duplicated candidates in source order
pub fn suggest(records: &[VoterRecord], input: &str) -> Vec<Suggestion> {
    let needle = input.trim().to_lowercase();
    if needle.chars().count() < MIN_INPUT_CHARS {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for record in records {
        let hit = [
            &record.name_latin,
            &record.name_local,
            &record.voter_card_id,
            &record.mobile_number,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle));

        if !hit {
            continue;
        }

        let suggestion = Suggestion::from_record(record);
        if seen.insert(suggestion.search_text.to_lowercase()) {
            suggestions.push(suggestion);
            if suggestions.len() == MAX_SUGGESTIONS {
                break;
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(latin: &str, local: &str) -> VoterRecord {
        VoterRecord {
            name_latin: latin.to_string(),
            name_local: local.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_short_input_yields_nothing() {
        let records = vec![named("Ravi Kumar", "")];
        assert!(suggest(&records, "r").is_empty());
        assert!(suggest(&records, "  r  ").is_empty());
        assert!(suggest(&records, "").is_empty());
        assert_eq!(suggest(&records, " ra ").len(), 1);
    }

    #[test]
    fn test_matches_ids_and_mobile() {
        let records = vec![
            VoterRecord {
                voter_card_id: "ABC1234567".into(),
                ..named("", "रवि")
            },
            VoterRecord {
                mobile_number: "9090385555".into(),
                ..named("Asha", "")
            },
        ];

        let by_epic = suggest(&records, "abc12");
        assert_eq!(by_epic.len(), 1);
        assert_eq!(by_epic[0].search_text, "रवि");

        let by_mobile = suggest(&records, "90903");
        assert_eq!(by_mobile[0].search_text, "Asha");
    }

    #[test]
    fn test_dedup_and_cap() {
        let mut records = vec![named("Ravi Kumar", ""), named("ravi kumar", "")];
        for i in 0..20 {
            records.push(named(&format!("Ravi {}", i), ""));
        }

        let suggestions = suggest(&records, "ravi");

        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[0].search_text, "Ravi Kumar");
        assert_eq!(suggestions[1].search_text, "Ravi 0");
    }
}
