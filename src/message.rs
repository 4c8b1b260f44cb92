// 💬 Voter-detail message template

use crate::record::VoterRecord;

const PLACEHOLDER: &str = "-";

fn or_dash(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

/// Fixed multi-line message describing one voter
pub fn compose(record: &VoterRecord) -> String {
    let lines = [
        "🗳️ मतदार माहिती".to_string(),
        String::new(),
        format!("अनु क्र.: {}", or_dash(&record.serial_number)),
        format!("घर क्र.: {}", or_dash(&record.house_number)),
        format!("नाव (मराठी): {}", or_dash(&record.name_local)),
        format!("नाव (इंग्रजी): {}", or_dash(&record.name_latin)),
        format!("लिंग: {}", or_dash(record.gender_label())),
        format!("वय: {}", or_dash(&record.age)),
        format!("मतदान कार्ड क्र.: {}", or_dash(&record.voter_card_id)),
        format!("मोबाईल नं.: {}", or_dash(&record.mobile_number)),
    ];

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_fills_placeholders() {
        let record = VoterRecord {
            name_latin: "Ravi Kumar".into(),
            gender_latin: "Male".into(),
            mobile_number: "9090385555".into(),
            ..Default::default()
        };

        let message = compose(&record);

        assert!(message.contains("नाव (इंग्रजी): Ravi Kumar"));
        assert!(message.contains("लिंग: Male"));
        assert!(message.contains("घर क्र.: -"));
        assert!(message.contains("मतदान कार्ड क्र.: -"));
        assert!(message.ends_with("मोबाईल नं.: 9090385555"));
        assert_eq!(message.lines().count(), 10);
    }
}
