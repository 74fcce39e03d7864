use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use log::{debug, info};
use shared::{AnalysisResponse, HistoryEntry, Severity};
use uuid::Uuid;

/// History reads are capped to the most recent entries.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AnalysisRepository {
    client: Client,
    analyses_table: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

/// One persisted analysis. `id` is the storage key; `analysis_id` is the
/// short token shown to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: String,
    pub analysis_id: String,
    pub disease: String,
    pub severity: Severity,
    pub confidence_percent: u8,
    pub image_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(user_id: String, response: &AnalysisResponse, image_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            analysis_id: response.analysis_id.clone(),
            disease: response.display_name.clone(),
            severity: response.severity,
            confidence_percent: response.confidence_percent,
            image_hash,
            created_at: response.generated_at,
        }
    }

    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            analysis_id: self.analysis_id.clone(),
            disease: self.disease.clone(),
            severity: self.severity,
            confidence_percent: self.confidence_percent,
            image_hash: self.image_hash.clone(),
            analyzed_at: self.created_at,
        }
    }
}

impl AnalysisRepository {
    pub fn new(client: Client, analyses_table: String) -> Self {
        Self {
            client,
            analyses_table,
        }
    }

    pub async fn save_analysis(&self, record: &AnalysisRecord) -> Result<(), RepositoryError> {
        debug!(
            "Writing analysis {} for user {} to table '{}'",
            record.analysis_id, record.user_id, self.analyses_table
        );

        self.client
            .put_item()
            .table_name(&self.analyses_table)
            .set_item(Some(record_to_attributes(record)))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        info!(
            "Saved analysis {} ({}) for user {}",
            record.analysis_id, record.disease, record.user_id
        );
        Ok(())
    }

    /// Equality-filtered scan on `user_id`, newest first, capped at
    /// [`HISTORY_LIMIT`].
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        let result = self
            .client
            .scan()
            .table_name(&self.analyses_table)
            .filter_expression("user_id = :user_id")
            .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        let mut records = Vec::new();
        for item in result.items.unwrap_or_default() {
            records.push(record_from_attributes(&item)?);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(HISTORY_LIMIT);

        debug!("Fetched {} analyses for user {}", records.len(), user_id);
        Ok(records)
    }
}

fn record_to_attributes(record: &AnalysisRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("id".to_string(), AttributeValue::S(record.id.to_string()));
    item.insert(
        "user_id".to_string(),
        AttributeValue::S(record.user_id.clone()),
    );
    item.insert(
        "analysis_id".to_string(),
        AttributeValue::S(record.analysis_id.clone()),
    );
    item.insert(
        "disease".to_string(),
        AttributeValue::S(record.disease.clone()),
    );
    item.insert(
        "severity".to_string(),
        AttributeValue::S(record.severity.to_string()),
    );
    item.insert(
        "confidence_percent".to_string(),
        AttributeValue::N(record.confidence_percent.to_string()),
    );
    item.insert(
        "image_hash".to_string(),
        AttributeValue::S(record.image_hash.clone()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(record.created_at.to_rfc3339()),
    );
    item
}

fn record_from_attributes(
    item: &HashMap<String, AttributeValue>,
) -> Result<AnalysisRecord, RepositoryError> {
    let get_string = |name: &str| -> Result<String, RepositoryError> {
        item.get(name)
            .and_then(|av| av.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidData(format!("missing attribute '{name}'")))
    };

    let id = Uuid::parse_str(&get_string("id")?)
        .map_err(|e| RepositoryError::InvalidData(format!("bad id: {e}")))?;
    let severity = Severity::from_str(&get_string("severity")?)
        .map_err(|e| RepositoryError::InvalidData(format!("bad severity: {e}")))?;
    let confidence_percent = item
        .get("confidence_percent")
        .and_then(|av| av.as_n().ok())
        .ok_or_else(|| RepositoryError::InvalidData("missing attribute 'confidence_percent'".into()))?
        .parse::<u8>()
        .map_err(|e| RepositoryError::InvalidData(format!("bad confidence: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&get_string("created_at")?)
        .map_err(|e| RepositoryError::InvalidData(format!("bad created_at: {e}")))?
        .with_timezone(&Utc);

    Ok(AnalysisRecord {
        id,
        user_id: get_string("user_id")?,
        analysis_id: get_string("analysis_id")?,
        disease: get_string("disease")?,
        severity,
        confidence_percent,
        image_hash: get_string("image_hash")?,
        created_at,
    })
}
