use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use shared::AnalysisResponse;

use crate::classify::gate::Diagnosis;

/// Best-effort unique; storage rows carry their own UUID key, so a collision
/// here only affects display.
pub const ANALYSIS_ID_LEN: usize = 9;

pub fn new_analysis_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ANALYSIS_ID_LEN)
        .map(char::from)
        .collect()
}

/// Merges the resolved record with the measured confidence and fresh request
/// metadata. Pure construction; persistence is the caller's concern.
pub fn compose(diagnosis: Diagnosis) -> AnalysisResponse {
    let Diagnosis {
        record,
        confidence_percent,
    } = diagnosis;

    AnalysisResponse {
        display_name: record.display_name,
        description: record.description,
        severity: record.severity,
        treatment_steps: record.treatment_steps,
        prevention_steps: record.prevention_steps,
        confidence_percent,
        analysis_id: new_analysis_id(),
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::knowledge;

    #[test]
    fn compose_preserves_record_fields_and_confidence() {
        let record = knowledge::lookup("powdery_mildew");
        let diagnosis = Diagnosis {
            record: record.clone(),
            confidence_percent: 73,
        };

        let response = compose(diagnosis);
        assert_eq!(response.display_name, record.display_name);
        assert_eq!(response.description, record.description);
        assert_eq!(response.severity, record.severity);
        assert_eq!(response.treatment_steps, record.treatment_steps);
        assert_eq!(response.prevention_steps, record.prevention_steps);
        assert_eq!(response.confidence_percent, 73);
    }

    #[test]
    fn analysis_ids_are_short_alphanumeric_tokens() {
        let id = new_analysis_id();
        assert_eq!(id.len(), ANALYSIS_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_at_is_a_current_utc_timestamp() {
        let before = Utc::now();
        let response = compose(Diagnosis {
            record: knowledge::healthy().clone(),
            confidence_percent: 50,
        });
        let after = Utc::now();
        assert!(response.generated_at >= before);
        assert!(response.generated_at <= after);
    }
}
