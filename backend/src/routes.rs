use std::sync::{Arc, Mutex};

use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use log::error;
use sha2::{Digest, Sha256};
use shared::{AnalyzeRequest, HistoryEntry, UserStats};

use crate::classify::{compose, gate};
use crate::db::analysis_repository::{AnalysisRecord, AnalysisRepository};
use crate::error::ApiError;
use crate::inference::client::InferenceClient;
use crate::monitor::MonitorState;

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// Base64 inflates the image by ~4/3; leave headroom over MAX_IMAGE_BYTES.
pub const MAX_JSON_BYTES: usize = 16 * 1024 * 1024;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/analyze").route(web::post().to(analyze)))
        .service(web::resource("/api/history/{user_id}").route(web::get().to(history)))
        .service(web::resource("/api/history/{user_id}/stats").route(web::get().to(history_stats)))
        .service(web::resource("/api/status").route(web::get().to(status)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

async fn analyze(
    request: web::Json<AnalyzeRequest>,
    inference: web::Data<InferenceClient>,
    repo: web::Data<AnalysisRepository>,
    monitor: web::Data<Arc<Mutex<MonitorState>>>,
) -> Result<HttpResponse, ApiError> {
    monitor.lock().unwrap().record_request();

    let request = request.into_inner();
    let (encoded, image_bytes) = decode_image_payload(request.image.as_deref())?;

    if !inference.credential_configured() {
        return Err(ApiError::Configuration(
            "Inference API credential is not configured".to_string(),
        ));
    }

    let predictions = match inference.classify(&encoded).await {
        Ok(predictions) => predictions,
        Err(err) => {
            monitor.lock().unwrap().record_failure();
            return Err(ApiError::Gateway(err));
        }
    };

    let diagnosis = gate::resolve(&predictions);
    let response = compose::compose(diagnosis);
    monitor
        .lock()
        .unwrap()
        .record_analysis(response.confidence_percent);

    // Persistence is fire-and-forget: the analysis response never waits on,
    // or fails because of, the history write.
    if let Some(user_id) = request.user_id.filter(|id| !id.trim().is_empty()) {
        let record = AnalysisRecord::new(user_id, &response, image_hash(&image_bytes));
        let repo = repo.get_ref().clone();
        actix_web::rt::spawn(async move {
            if let Err(err) = repo.save_analysis(&record).await {
                error!(
                    "Failed to persist analysis {} for user {}: {}",
                    record.analysis_id, record.user_id, err
                );
            }
        });
    }

    Ok(HttpResponse::Ok().json(response))
}

async fn history(
    repo: web::Data<AnalysisRepository>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    HttpResponse::Ok().json(fetch_history(&repo, &user_id).await)
}

async fn history_stats(
    repo: web::Data<AnalysisRepository>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    let entries = fetch_history(&repo, &user_id).await;
    HttpResponse::Ok().json(derive_stats(&entries))
}

// History reads degrade to an empty list; persistence problems never become
// error responses.
async fn fetch_history(repo: &AnalysisRepository, user_id: &str) -> Vec<HistoryEntry> {
    match repo.list_for_user(user_id).await {
        Ok(records) => records.iter().map(AnalysisRecord::to_history_entry).collect(),
        Err(err) => {
            error!("Failed to fetch history for user {}: {}", user_id, err);
            Vec::new()
        }
    }
}

async fn status(monitor: web::Data<Arc<Mutex<MonitorState>>>) -> HttpResponse {
    let snapshot = monitor.lock().unwrap().snapshot(Utc::now());
    HttpResponse::Ok().json(snapshot)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Accepts a bare base64 string or a `data:image/...;base64,` URL, validates
/// it decodes to a non-empty payload within the size cap, and returns both
/// the cleaned base64 (forwarded to the gateway) and the decoded bytes
/// (hashed for history rows).
fn decode_image_payload(image: Option<&str>) -> Result<(String, Vec<u8>), ApiError> {
    let raw = image
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("No image provided".to_string()))?;

    let encoded = strip_data_url(raw);
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| ApiError::Validation("Image payload is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(ApiError::Validation("No image provided".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(
            "Image exceeds the 10 MiB size limit".to_string(),
        ));
    }
    Ok((encoded.to_string(), bytes))
}

fn strip_data_url(payload: &str) -> &str {
    match payload.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    }
}

fn image_hash(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

fn derive_stats(entries: &[HistoryEntry]) -> UserStats {
    let total_analyses = entries.len();
    let healthy_plants = entries
        .iter()
        .filter(|e| e.disease.to_lowercase().contains("healthy"))
        .count();

    UserStats {
        total_analyses,
        healthy_plants,
        diseases_detected: total_analyses - healthy_plants,
        last_analysis: entries.iter().map(|e| e.analyzed_at).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Severity;

    #[test]
    fn missing_or_blank_image_is_rejected() {
        assert!(matches!(
            decode_image_payload(None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            decode_image_payload(Some("   ")),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(
            decode_image_payload(Some("not base64!!")),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let encoded = BASE64.encode(b"fake image bytes");
        let payload = format!("data:image/png;base64,{encoded}");
        let (clean, bytes) = decode_image_payload(Some(&payload)).unwrap();
        assert_eq!(clean, encoded);
        assert_eq!(bytes, b"fake image bytes");
    }

    #[test]
    fn bare_base64_passes_through() {
        let encoded = BASE64.encode(b"leaf");
        let (clean, bytes) = decode_image_payload(Some(&encoded)).unwrap();
        assert_eq!(clean, encoded);
        assert_eq!(bytes, b"leaf");
    }

    #[test]
    fn oversized_images_are_rejected() {
        let encoded = BASE64.encode(vec![0u8; MAX_IMAGE_BYTES + 1]);
        assert!(matches!(
            decode_image_payload(Some(&encoded)),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn image_hash_is_sha256_hex() {
        let hash = image_hash(b"leaf");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, image_hash(b"leaf"));
        assert_ne!(hash, image_hash(b"stem"));
    }

    fn entry(disease: &str, minutes_ago: i64) -> HistoryEntry {
        HistoryEntry {
            analysis_id: "abcdef123".to_string(),
            disease: disease.to_string(),
            severity: Severity::Medium,
            confidence_percent: 70,
            image_hash: "00".to_string(),
            analyzed_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn stats_split_healthy_from_diseased() {
        let entries = vec![
            entry("Healthy Plant", 5),
            entry("Tomato Late Blight", 60),
            entry("Plant Rust", 120),
        ];
        let stats = derive_stats(&entries);
        assert_eq!(stats.total_analyses, 3);
        assert_eq!(stats.healthy_plants, 1);
        assert_eq!(stats.diseases_detected, 2);
        assert_eq!(stats.last_analysis, Some(entries[0].analyzed_at));
    }

    #[test]
    fn stats_for_empty_history_are_zeroed() {
        let stats = derive_stats(&[]);
        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.diseases_detected, 0);
        assert!(stats.last_analysis.is_none());
    }
}
