use lazy_static::lazy_static;
use shared::Severity;

pub const HEALTHY_KEY: &str = "healthy";

/// Keyword routes evaluated in order; first containment match wins.
/// A label carrying several matchable substrings resolves to the earliest entry.
pub const KEYWORD_ROUTES: &[(&str, &str)] = &[
    ("scab", "apple_scab"),
    ("blight", "tomato_blight"),
    ("mildew", "powdery_mildew"),
    ("spot", "leaf_spot"),
    ("rust", "rust"),
    ("healthy", HEALTHY_KEY),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseRecord {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub severity: Severity,
    pub treatment_steps: Vec<String>,
    pub prevention_steps: Vec<String>,
}

fn record(
    key: &str,
    display_name: &str,
    description: &str,
    severity: Severity,
    treatment_steps: &[&str],
    prevention_steps: &[&str],
) -> DiseaseRecord {
    DiseaseRecord {
        key: key.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        severity,
        treatment_steps: treatment_steps.iter().map(|s| s.to_string()).collect(),
        prevention_steps: prevention_steps.iter().map(|s| s.to_string()).collect(),
    }
}

fn build_records() -> Vec<DiseaseRecord> {
    vec![
        record(
            "apple_scab",
            "Apple Scab",
            "Fungal disease causing dark, scabby lesions on leaves and fruit",
            Severity::Medium,
            &[
                "Apply fungicide containing captan or myclobutanil",
                "Remove fallen leaves and infected plant debris",
                "Prune to improve air circulation",
                "Apply dormant oil spray in early spring",
            ],
            &[
                "Choose scab-resistant apple varieties",
                "Ensure good air circulation",
                "Avoid overhead watering",
                "Apply preventive fungicide sprays",
            ],
        ),
        record(
            "tomato_blight",
            "Tomato Late Blight",
            "Devastating fungal disease affecting tomato plants",
            Severity::High,
            &[
                "Apply copper-based fungicide immediately",
                "Remove and destroy affected plants",
                "Improve drainage and air circulation",
                "Avoid watering leaves directly",
            ],
            &[
                "Plant certified disease-free seeds",
                "Rotate crops annually",
                "Water at soil level only",
                "Apply preventive copper sprays",
            ],
        ),
        record(
            "powdery_mildew",
            "Powdery Mildew",
            "White powdery fungal coating on leaf surfaces",
            Severity::Medium,
            &[
                "Spray with baking soda solution (1 tsp per quart)",
                "Apply neem oil in evening hours",
                "Remove severely affected leaves",
                "Increase air circulation around plants",
            ],
            &[
                "Plant in sunny, well-ventilated areas",
                "Avoid overcrowding plants",
                "Water at soil level",
                "Choose resistant plant varieties",
            ],
        ),
        record(
            "leaf_spot",
            "Bacterial Leaf Spot",
            "Bacterial infection causing dark spots with yellow halos",
            Severity::Medium,
            &[
                "Apply copper-based bactericide",
                "Remove infected leaves immediately",
                "Avoid overhead watering",
                "Disinfect pruning tools between cuts",
            ],
            &[
                "Use drip irrigation systems",
                "Provide adequate plant spacing",
                "Avoid working with wet plants",
                "Remove plant debris regularly",
            ],
        ),
        record(
            "rust",
            "Plant Rust",
            "Fungal disease causing orange/brown pustules on leaves",
            Severity::High,
            &[
                "Apply systemic fungicide containing propiconazole",
                "Remove and destroy infected leaves",
                "Improve air circulation",
                "Water early morning at soil level",
            ],
            &[
                "Plant rust-resistant varieties",
                "Ensure proper plant spacing",
                "Avoid evening watering",
                "Remove alternate host plants nearby",
            ],
        ),
        record(
            HEALTHY_KEY,
            "Healthy Plant",
            "No disease detected - plant appears healthy",
            Severity::Low,
            &[
                "Continue current care routine",
                "Monitor regularly for changes",
                "Maintain proper watering schedule",
                "Ensure adequate nutrition",
            ],
            &[
                "Keep consistent watering schedule",
                "Provide adequate sunlight",
                "Use balanced fertilizer monthly",
                "Inspect plants weekly for early detection",
            ],
        ),
    ]
}

fn validate(records: &[DiseaseRecord]) {
    let healthy_count = records.iter().filter(|r| r.key == HEALTHY_KEY).count();
    assert!(
        healthy_count == 1,
        "knowledge base must contain exactly one '{}' record, found {}",
        HEALTHY_KEY,
        healthy_count
    );
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            assert!(a.key != b.key, "duplicate knowledge base key: {}", a.key);
        }
    }
    for (keyword, key) in KEYWORD_ROUTES {
        assert!(
            records.iter().any(|r| r.key == *key),
            "keyword route '{}' points at unknown key '{}'",
            keyword,
            key
        );
    }
}

lazy_static! {
    pub static ref KNOWLEDGE_BASE: Vec<DiseaseRecord> = {
        let records = build_records();
        validate(&records);
        records
    };
}

pub fn by_key(key: &str) -> Option<&'static DiseaseRecord> {
    KNOWLEDGE_BASE.iter().find(|r| r.key == key)
}

pub fn healthy() -> &'static DiseaseRecord {
    by_key(HEALTHY_KEY).expect("validated at initialization: healthy record exists")
}

/// Lowercases a raw model label for substring matching. Labels such as
/// "Apple___Apple_scab" keep their underscores; matching is containment, not
/// equality, so no further tokenization is needed.
pub fn normalize_label(raw: &str) -> String {
    raw.to_lowercase()
}

/// Resolves a normalized label against the keyword table. Unrecognized labels
/// get a synthesized generic record rather than the healthy fallback.
pub fn lookup(normalized_label: &str) -> DiseaseRecord {
    for (keyword, key) in KEYWORD_ROUTES {
        if normalized_label.contains(keyword) {
            if let Some(record) = by_key(key) {
                return record.clone();
            }
        }
    }
    synthesize_generic(normalized_label)
}

fn synthesize_generic(label: &str) -> DiseaseRecord {
    record(
        "unrecognized",
        &title_case(label),
        "Disease detected - consult with a plant specialist for specific treatment",
        Severity::Medium,
        &[
            "Isolate affected plant",
            "Remove infected parts",
            "Apply broad-spectrum fungicide",
            "Monitor closely for changes",
        ],
        &[
            "Maintain good plant hygiene",
            "Ensure proper air circulation",
            "Water at soil level",
            "Regular plant inspection",
        ],
    )
}

/// "leaf_curl_virus" -> "Leaf Curl Virus"; runs of underscores collapse.
pub fn title_case(label: &str) -> String {
    label
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
