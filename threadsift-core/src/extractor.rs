use crate::error::CoreError;
use crate::error_utils::ErrorExt;
use crate::types::ExtractionResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Turns one post or video URL into filtered comments plus metadata.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, CoreError>;

    /// Cheap URL shape check; no network.
    fn accepts(&self, url: &str) -> bool;
}

/// Never-failing wrapper used at the route boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ExtractResponse {
    pub fn from_result(result: Result<ExtractionResult, CoreError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                error_code: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.user_friendly_message()),
                error_code: Some(e.error_code().to_string()),
            },
        }
    }
}
