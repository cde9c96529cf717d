//! REST client for the transformer-manager backend.
//!
//! The wire format is owned by the backend: annotation records come back
//! with camelCase fields and integer geometry, and a save replaces the
//! whole box set for the annotation, so box ids are never sent back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AnnotateError, Result};
use crate::model::{AnnotationBox, BoxAction, BoxId, FaultType, Provenance, Rect};

// ── Wire DTOs ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationResponse {
    pub id: i64,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub annotation_boxes: Vec<BoxResponse>,
}

#[derive(Debug, Deserialize)]
pub struct BoxResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub box_type: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveRequest {
    pub boxes: Vec<SaveBox>,
    pub comments: String,
}

#[derive(Debug, Serialize)]
pub struct SaveBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "type")]
    pub box_type: String,
    pub confidence: Option<f64>,
    pub action: String,
    pub comments: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ── Domain conversion ───────────────────────────────────────────────────────

/// The annotation record as the rest of the app sees it.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    pub id: i64,
    pub overall_comments: String,
    pub boxes: Vec<AnnotationBox>,
}

impl AnnotationResponse {
    pub fn into_record(self) -> AnnotationRecord {
        let boxes = self
            .annotation_boxes
            .into_iter()
            .enumerate()
            .map(|(index, b)| AnnotationBox {
                // boxes the backend has not persisted yet come without an id
                id: match b.id {
                    Some(id) => BoxId::Server(id),
                    None => BoxId::Local(index as i64),
                },
                rect: Rect::new(b.x, b.y, b.width, b.height),
                fault_type: FaultType::from_label(&b.box_type),
                provenance: Provenance::from_confidence(b.confidence),
                action: b
                    .action
                    .as_deref()
                    .map(BoxAction::parse)
                    .unwrap_or(BoxAction::Unchanged),
                comments: b.comments.unwrap_or_default(),
            })
            .collect();

        AnnotationRecord {
            id: self.id,
            overall_comments: self.comments.unwrap_or_default(),
            boxes,
        }
    }
}

impl SaveRequest {
    /// Geometry is rounded to integer pixels for persistence.
    pub fn new(boxes: &[AnnotationBox], overall_comments: &str) -> Self {
        let boxes = boxes
            .iter()
            .map(|b| SaveBox {
                x: b.rect.x.round() as i32,
                y: b.rect.y.round() as i32,
                width: b.rect.width.round() as i32,
                height: b.rect.height.round() as i32,
                box_type: b.fault_type.label().to_string(),
                confidence: b.provenance.confidence(),
                action: b.action.as_str().to_string(),
                comments: b.comments.clone(),
            })
            .collect();

        Self {
            boxes,
            comments: overall_comments.to_string(),
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────────────

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.resolved_token(),
        })
    }

    pub async fn fetch_annotation(&self, job_id: u64) -> Result<AnnotationRecord> {
        let url = format!("{}/api/annotations/analysis-job/{}", self.base_url, job_id);
        tracing::debug!(%url, "fetching annotation record");

        let response = self.authorize(self.http.get(&url)).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<AnnotationResponse>().await?.into_record())
    }

    pub async fn fetch_image(&self, image_path: &str) -> Result<Vec<u8>> {
        let separator = if image_path.starts_with('/') { "" } else { "/" };
        let url = format!("{}/api/files{}{}", self.base_url, separator, image_path);
        tracing::debug!(%url, "fetching image");

        let response = self.authorize(self.http.get(&url)).send().await?;
        let response = Self::check(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn save_annotation(&self, annotation_id: i64, request: &SaveRequest) -> Result<()> {
        let url = format!("{}/api/annotations/{}", self.base_url, annotation_id);
        tracing::debug!(%url, boxes = request.boxes.len(), "saving annotation");

        let response = self
            .authorize(self.http.put(&url))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Backend errors carry a `message` field; fall back to the HTTP reason.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Err(AnnotateError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
