use crate::classify::knowledge::{self, DiseaseRecord};
use crate::inference::client::Prediction;

/// Predictions scoring below this are not trusted as a diagnosis.
pub const MIN_TRUSTED_CONFIDENCE: u8 = 40;

/// Reported when the model returns nothing usable. Carried over from the
/// original service; the value has no documented rationale.
pub const NO_PREDICTION_CONFIDENCE: u8 = 50;

pub const LOW_CONFIDENCE_DESCRIPTION: &str =
    "Analysis confidence too low - please retake the photo with better lighting and focus";

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub record: DiseaseRecord,
    pub confidence_percent: u8,
}

pub fn to_percent(score: f32) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Decides whether the top prediction is trustworthy. Predictions arrive
/// sorted by descending score (upstream model convention).
pub fn resolve(predictions: &[Prediction]) -> Diagnosis {
    let top = match predictions.first() {
        Some(top) if !top.label.trim().is_empty() => top,
        _ => {
            return Diagnosis {
                record: knowledge::healthy().clone(),
                confidence_percent: NO_PREDICTION_CONFIDENCE,
            };
        }
    };

    let confidence_percent = to_percent(top.score);
    if confidence_percent < MIN_TRUSTED_CONFIDENCE {
        let mut record = knowledge::healthy().clone();
        record.description = LOW_CONFIDENCE_DESCRIPTION.to_string();
        return Diagnosis {
            record,
            confidence_percent,
        };
    }

    Diagnosis {
        record: knowledge::lookup(&knowledge::normalize_label(&top.label)),
        confidence_percent,
    }
}
