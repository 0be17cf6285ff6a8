use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What the staging vendor is asked to do with the photo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransformationType {
    /// Add furniture to an empty or sparse room.
    Furnish,
    /// Remove existing furniture.
    Empty,
    /// Restyle existing furnishings.
    Redesign,
    /// Structural refresh (walls, floors, finishes).
    Renovate,
    /// Exterior / garden staging.
    Outdoor,
}

/// Client request to stage a photo.
///
/// `image` is either an absolute URL the vendor can fetch, or a
/// base64 data URL that gets re-uploaded through the image host first.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StageRequest {
    #[garde(length(min = 1))]
    pub image: String,

    #[garde(skip)]
    pub transformation_type: TransformationType,

    #[garde(length(min = 1, max = 64))]
    pub space_type: String,

    #[garde(length(min = 1, max = 64))]
    pub room_type: String,

    #[garde(length(min = 1, max = 64))]
    pub design_style: String,

    #[garde(skip)]
    #[serde(default)]
    pub update_flooring: bool,

    #[garde(skip)]
    #[serde(default)]
    pub block_decorative: bool,
}

/// Response after a webhook-based submission was accepted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub success: bool,
    pub request_id: String,
    pub webhook_url: String,
}

/// Response for the polled (webhook-less) vendor flow, which runs to a
/// terminal state before answering.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledStageResponse {
    pub success: bool,
    pub request_id: String,
    pub status: String,
    pub images: Vec<String>,
}

/// Inbound vendor callback. The vendor POSTs snake_case keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorCallback {
    pub request_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Query string for reading a result: `GET /webhook-receiver?request_id=`.
#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub request_id: String,
}

/// Client-facing view of a stored (or still pending) result.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_request_accepts_camel_case() {
        let body = r#"{
            "image": "https://cdn.example.com/room.jpg",
            "transformationType": "furnish",
            "spaceType": "interior",
            "roomType": "living_room",
            "designStyle": "scandinavian",
            "updateFlooring": false,
            "blockDecorative": true
        }"#;

        let req: StageRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.transformation_type, TransformationType::Furnish);
        assert!(req.block_decorative);
        assert!(!req.update_flooring);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_stage_request_flags_default_to_false() {
        let body = r#"{
            "image": "https://cdn.example.com/room.jpg",
            "transformationType": "empty",
            "spaceType": "interior",
            "roomType": "bedroom",
            "designStyle": "modern"
        }"#;

        let req: StageRequest = serde_json::from_str(body).unwrap();
        assert!(!req.update_flooring);
        assert!(!req.block_decorative);
    }

    #[test]
    fn test_empty_image_fails_validation() {
        let req = StageRequest {
            image: String::new(),
            transformation_type: TransformationType::Furnish,
            space_type: "interior".to_string(),
            room_type: "living_room".to_string(),
            design_style: "modern".to_string(),
            update_flooring: false,
            block_decorative: false,
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_unknown_transformation_rejected() {
        let body = r#"{
            "image": "https://cdn.example.com/room.jpg",
            "transformationType": "teleport",
            "spaceType": "interior",
            "roomType": "bedroom",
            "designStyle": "modern"
        }"#;

        assert!(serde_json::from_str::<StageRequest>(body).is_err());
    }
}
