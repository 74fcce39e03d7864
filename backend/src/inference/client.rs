use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_MODEL_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/linkanjarad/mobilenet_v2_1.0_224-plant-disease-identification";

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// One classification candidate from the hosted model, score in [0, 1].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("inference endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("request to inference endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed inference response: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl InferenceClient {
    pub fn new(endpoint: String, api_token: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            api_token,
        })
    }

    pub fn credential_configured(&self) -> bool {
        self.api_token.is_some()
    }

    /// Sends the base64 image to the hosted model and returns its prediction
    /// list, ordered by descending score per the model's convention. No
    /// retries; a single failure fails the request.
    pub async fn classify(&self, image_base64: &str) -> Result<Vec<Prediction>, GatewayError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "inputs": image_base64 }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        debug!("inference endpoint returned {} bytes", body.len());
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        parse_predictions(value)
    }
}

/// Parse-then-validate: the endpoint must return an array of
/// `{ label, score }` objects with finite scores in [0, 1]. Anything else is
/// rejected here rather than propagated downstream.
pub fn parse_predictions(value: serde_json::Value) -> Result<Vec<Prediction>, GatewayError> {
    let predictions: Vec<Prediction> =
        serde_json::from_value(value).map_err(|e| GatewayError::Malformed(e.to_string()))?;

    for prediction in &predictions {
        if !prediction.score.is_finite() || !(0.0..=1.0).contains(&prediction.score) {
            return Err(GatewayError::Malformed(format!(
                "score {} out of range for label {:?}",
                prediction.score, prediction.label
            )));
        }
    }
    Ok(predictions)
}
