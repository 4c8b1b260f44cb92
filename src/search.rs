// 🔍 Search/Filter Engine - free-text matching over the in-memory record set
// Single term: any searchable field. Multiple terms: all terms in one name,
// or the whole query inside an identifier-like field.

use crate::record::{Field, VoterRecord};

/// Fields consulted for single-term queries
const SEARCHABLE: [Field; 7] = [
    Field::NameLatin,
    Field::NameLocal,
    Field::VoterCardId,
    Field::MobileNumber,
    Field::SerialNumber,
    Field::HouseNumber,
    Field::Age,
];

/// Fields matched against the full query when it has several terms
const WHOLE_QUERY: [Field; 5] = [
    Field::VoterCardId,
    Field::MobileNumber,
    Field::SerialNumber,
    Field::HouseNumber,
    Field::Age,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Lowercased, trimmed, untokenized
    whole: String,
    terms: Vec<String>,
}

impl Query {
    /// Returns `None` for an empty or whitespace-only query
    pub fn parse(input: &str) -> Option<Query> {
        let whole = input.trim().to_lowercase();
        if whole.is_empty() {
            return None;
        }

        let terms = whole.split_whitespace().map(str::to_string).collect();
        Some(Query { whole, terms })
    }

    pub fn matches(&self, record: &VoterRecord) -> bool {
        if let [term] = self.terms.as_slice() {
            return SEARCHABLE
                .iter()
                .any(|field| normalized(record.field(*field)).contains(term.as_str()));
        }

        let name_latin = collapse_whitespace(&normalized(&record.name_latin));
        let name_local = collapse_whitespace(&normalized(&record.name_local));

        let all_in = |name: &str| self.terms.iter().all(|term| name.contains(term.as_str()));

        all_in(&name_latin)
            || all_in(&name_local)
            || WHOLE_QUERY
                .iter()
                .any(|field| normalized(record.field(*field)).contains(self.whole.as_str()))
    }
}

/// Matching records in input order. Empty query yields nothing.
pub fn filter<'a>(records: &'a [VoterRecord], query: &str) -> Vec<&'a VoterRecord> {
    filter_indices(records, query)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

/// Positions of matching records in `records`
pub fn filter_indices(records: &[VoterRecord], query: &str) -> Vec<usize> {
    let Some(query) = Query::parse(query) else {
        return Vec::new();
    };

    records
        .iter()
        .enumerate()
        .filter(|(_, record)| query.matches(record))
        .map(|(i, _)| i)
        .collect()
}

fn normalized(value: &str) -> String {
    value.trim().to_lowercase()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(name_latin: &str, name_local: &str, epic: &str, mobile: &str) -> VoterRecord {
        VoterRecord {
            name_latin: name_latin.to_string(),
            name_local: name_local.to_string(),
            voter_card_id: epic.to_string(),
            mobile_number: mobile.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<VoterRecord> {
        vec![
            VoterRecord {
                serial_number: "1".into(),
                house_number: "12A".into(),
                age: "42".into(),
                ..voter("Ravi Kumar", "रवि कुमार", "ABC1234567", "9090385555")
            },
            VoterRecord {
                serial_number: "2".into(),
                house_number: "7".into(),
                age: "35".into(),
                ..voter("Asha  Patil", "आशा पाटील", "XYZ7654321", "")
            },
            VoterRecord {
                serial_number: "3".into(),
                house_number: "12B".into(),
                age: "29".into(),
                ..voter("", "सुनीता कुमार", "PQR1112223", "8888888888")
            },
        ]
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let records = sample();
        assert!(filter(&records, "").is_empty());
        assert!(filter(&records, "   \t ").is_empty());
    }

    #[test]
    fn test_single_term_scenario() {
        let records = vec![voter("Ravi Kumar", "", "", "9090385555")];

        assert_eq!(filter(&records, "Ravi").len(), 1);
        assert_eq!(filter(&records, "kumar ravi").len(), 1);
        assert_eq!(filter(&records, "999").len(), 0);
    }

    #[test]
    fn test_single_term_checks_every_searchable_field() {
        let records = sample();

        for term in ["ravi", "रवि", "abc12", "90903", "12a", "42"] {
            let found = filter(&records, term);
            assert_eq!(found.len(), 1, "term {term} should hit exactly Ravi");
            assert_eq!(found[0].name_latin, "Ravi Kumar");
        }

        // Serial "2" also appears in other fields' digits
        let hits = filter(&records, "2");
        assert!(hits.iter().all(|r| SEARCHABLE
            .iter()
            .any(|f| r.field(*f).to_lowercase().contains('2'))));
    }

    #[test]
    fn test_single_term_excludes_records_without_term() {
        let records = sample();
        let hits = filter(&records, "patil");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].voter_card_id, "XYZ7654321");
    }

    #[test]
    fn test_multi_term_requires_all_terms_in_one_name() {
        let records = sample();

        // Both terms in the Latin name (extra whitespace collapsed)
        assert_eq!(filter(&records, "patil asha").len(), 1);

        // "कुमार" appears in two local names, "सुनीता" only in one
        let hits = filter(&records, "सुनीता कुमार");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].serial_number, "3");

        // Terms split across different names never match
        assert!(filter(&records, "ravi patil").is_empty());
    }

    #[test]
    fn test_multi_term_whole_query_in_identifier_field() {
        let mut records = sample();
        records[1].house_number = "Plot 7 B".into();

        let hits = filter(&records, "plot 7");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].serial_number, "2");
    }

    #[test]
    fn test_order_is_stable() {
        let records = sample();
        let hits = filter_indices(&records, "कुमार");
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let records = vec![VoterRecord::default()];
        assert!(filter(&records, "anything").is_empty());
        assert!(filter(&records, "two terms").is_empty());
    }
}
