//! Request and response bodies shared by the object routes

use bucketgate_common::CorrelationId;
use serde::{Deserialize, Serialize};

/// JSON body addressing a stored object (`/delete`, `/download`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRequest {
    pub file_name: String,
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

/// Successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    /// Sanitized file name the object was stored under
    pub file_name: String,
    /// Full key, including any folder prefix
    pub key: String,
    pub bucket: String,
    pub size: u64,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    pub correlation_id: CorrelationId,
}

/// Successful delete
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub file_name: String,
    pub key: String,
    pub bucket: String,
    pub correlation_id: CorrelationId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_request_optional_fields() {
        let request: ObjectRequest =
            serde_json::from_str(r#"{"fileName":"a.png"}"#).unwrap();
        assert_eq!(request.file_name, "a.png");
        assert!(request.bucket_name.is_none());
        assert!(request.folder.is_none());
    }

    #[test]
    fn test_upload_response_omits_missing_public_url() {
        let response = UploadResponse {
            success: true,
            message: "Upload successful".to_string(),
            file_name: "a.png".to_string(),
            key: "a.png".to_string(),
            bucket: "photos".to_string(),
            size: 3,
            content_type: "image/png".to_string(),
            public_url: None,
            correlation_id: CorrelationId::new(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("publicUrl").is_none());
        assert_eq!(json["fileName"], "a.png");
        assert_eq!(json["contentType"], "image/png");
    }
}
