//! Prompt text sent to the model.

use crate::models::BiometricRecord;

pub const SYSTEM_INSTRUCTION: &str = "You are a health and wellness assistant. \
Answer the user's question clearly and kindly. When a biometric snapshot is provided, \
use it to personalize the answer and mention the values you rely on. \
Do not give a diagnosis; recommend consulting a healthcare professional for medical concerns.";

pub const NO_BIOMETRIC_DATA: &str = "No biometric data is available for this user.";

/// User turn combining the biometric snapshot and the question.
pub fn render_user_prompt(prompt: &str, record: &BiometricRecord) -> String {
    let mut out = String::new();

    let entries = record.entries();
    if entries.is_empty() {
        out.push_str(NO_BIOMETRIC_DATA);
        out.push('\n');
    } else {
        out.push_str("Latest biometric data:\n");
        for (label, value) in entries {
            out.push_str(&format!("- {}: {}\n", label, value));
        }
    }

    out.push('\n');
    out.push_str("User question: ");
    out.push_str(prompt);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiometricDocument, Scalar};

    #[test]
    fn empty_record_is_stated_explicitly() {
        let text = render_user_prompt("Am I sleeping enough?", &BiometricRecord::empty());
        assert_eq!(
            text,
            format!("{}\n\nUser question: Am I sleeping enough?", NO_BIOMETRIC_DATA)
        );
    }

    #[test]
    fn present_fields_are_listed_before_the_question() {
        let record = BiometricRecord {
            steps: Some(8000),
            blood_pressure: Some("120/80".to_string()),
            oxygen_saturation: Some(Scalar::Integer(95)),
            ..BiometricRecord::empty()
        };
        let text = render_user_prompt("How am I doing?", &record);

        assert!(text.starts_with("Latest biometric data:\n- Steps: 8000\n"));
        assert!(text.contains("- Oxygen saturation (%): 95\n"));
        assert!(text.contains("- Blood pressure (mmHg): 120/80\n"));
        assert!(!text.contains("Weight"));
        assert!(text.ends_with("\n\nUser question: How am I doing?"));
    }

    #[test]
    fn defaulted_document_lists_zero_totals() {
        let record = BiometricRecord::from_document(&BiometricDocument::default());
        let text = render_user_prompt("hi", &record);
        assert!(text.contains("- Steps: 0\n"));
        assert!(text.contains("- Stress level: Unknown\n"));
        assert!(!text.contains(NO_BIOMETRIC_DATA));
    }
}
