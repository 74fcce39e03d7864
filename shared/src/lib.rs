use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Disease severity as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub display_name: String,
    pub description: String,
    pub severity: Severity,
    pub treatment_steps: Vec<String>,
    pub prevention_steps: Vec<String>,
    pub confidence_percent: u8,
    pub analysis_id: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub analysis_id: String,
    pub disease: String,
    pub severity: Severity,
    pub confidence_percent: u8,
    pub image_hash: String,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_analyses: usize,
    pub healthy_plants: usize,
    pub diseases_detected: usize,
    pub last_analysis: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SensorStatus {
    Optimal,
    Warning,
    Critical,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct SensorReading {
    pub value: f64,
    pub status: SensorStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub temperature: SensorReading,
    pub humidity: SensorReading,
    pub light_level: SensorReading,
    pub soil_moisture: SensorReading,
    pub air_quality: SensorReading,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCounters {
    pub total_requests: u64,
    pub analyses_completed: u64,
    pub failed_analyses: u64,
    pub average_confidence: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub sensors: SensorSnapshot,
    pub service: ServiceCounters,
    pub generated_at: DateTime<Utc>,
}
