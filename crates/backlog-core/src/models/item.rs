//! Backlog item models and request DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;
use crate::models::Patch;
use crate::validation::{validate_safe_text, validate_status, FieldOrder};

/// Accepted status values, sorted for error messages.
pub const ALLOWED_STATUSES: [&str; 3] = ["done", "draft", "in_progress"];

/// Workflow state of a backlog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Draft,
    InProgress,
    Done,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(ItemStatus::Draft),
            "in_progress" => Some(ItemStatus::InProgress),
            "done" => Some(ItemStatus::Done),
            _ => None,
        }
    }

    /// Parse a status filter, answering with a domain validation error on unknown values.
    pub fn parse_filter(value: &str) -> Result<Self, AppError> {
        Self::parse(value).ok_or_else(|| AppError::Validation(status_choices_message()))
    }
}

/// `status must be one of: done, draft, in_progress`
pub fn status_choices_message() -> String {
    format!("status must be one of: {}", ALLOWED_STATUSES.join(", "))
}

/// Backlog item as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ItemStatus,
}

/// Validated values for a new item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub status: ItemStatus,
}

fn default_status() -> String {
    ItemStatus::Draft.as_str().to_string()
}

/// Request DTO for creating a backlog item
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateItemRequest {
    #[validate(
        length(
            min = 1,
            max = 100,
            message = "String should have at least 1 and at most 100 characters"
        ),
        custom(function = "validate_safe_text")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(max = 300, message = "String should have at most 300 characters"),
        custom(function = "validate_safe_text")
    )]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    #[validate(custom(function = "validate_status"))]
    #[schema(value_type = ItemStatus)]
    pub status: String,
}

impl FieldOrder for CreateItemRequest {
    const FIELDS: &'static [&'static str] = &["name", "description", "status"];
}

impl CreateItemRequest {
    /// Convert an already validated request into insertable values.
    pub fn into_new_item(self) -> Result<NewItem, AppError> {
        Ok(NewItem {
            status: ItemStatus::parse_filter(&self.status)?,
            name: self.name,
            description: self.description,
        })
    }
}

/// Request DTO for changing an item. Only the provided fields change;
/// `description: null` clears the description.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<ItemStatus>)]
    pub status: Patch<String>,
}

/// Field rules for the values present in an [`UpdateItemRequest`].
#[derive(Validate)]
struct UpdateItemFields {
    #[validate(
        length(
            min = 1,
            max = 100,
            message = "String should have at least 1 and at most 100 characters"
        ),
        custom(function = "validate_safe_text")
    )]
    name: Option<String>,
    #[validate(
        length(max = 300, message = "String should have at most 300 characters"),
        custom(function = "validate_safe_text")
    )]
    description: Option<String>,
    #[validate(custom(function = "validate_status"))]
    status: Option<String>,
}

impl Validate for UpdateItemRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        UpdateItemFields {
            name: self.name.value().cloned(),
            description: self.description.value().cloned(),
            status: self.status.value().cloned(),
        }
        .validate()
    }
}

impl FieldOrder for UpdateItemRequest {
    const FIELDS: &'static [&'static str] = &["name", "description", "status"];
}

/// Changes extracted from a validated [`UpdateItemRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChanges {
    name: Option<String>,
    description: Patch<String>,
    status: Option<ItemStatus>,
}

impl UpdateItemRequest {
    /// Reject empty updates and nulls for required fields.
    pub fn into_changes(self) -> Result<ItemChanges, AppError> {
        if self.name.is_absent() && self.description.is_absent() && self.status.is_absent() {
            return Err(AppError::Validation(
                "at least one field must be provided".to_string(),
            ));
        }

        let name = match self.name {
            Patch::Null => return Err(AppError::Validation("name cannot be null".to_string())),
            Patch::Absent => None,
            Patch::Value(name) => Some(name),
        };

        let status = match self.status {
            Patch::Null => {
                return Err(AppError::Validation("status cannot be null".to_string()))
            }
            Patch::Absent => None,
            Patch::Value(status) => Some(ItemStatus::parse_filter(&status)?),
        };

        Ok(ItemChanges {
            name,
            description: self.description,
            status,
        })
    }
}

impl ItemChanges {
    /// Merge the provided fields into `item`, leaving the rest untouched.
    pub fn apply(self, item: &mut Item) {
        if let Some(name) = self.name {
            item.name = name;
        }
        self.description.merge_into(&mut item.description);
        if let Some(status) = self.status {
            item.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        Item {
            id: 1,
            name: "Draft plan".to_string(),
            description: Some("v1".to_string()),
            status: ItemStatus::Draft,
        }
    }

    #[test]
    fn test_create_request_defaults_status() {
        let request: CreateItemRequest =
            serde_json::from_str(r#"{"name": "Plan sprint"}"#).unwrap();
        assert!(request.validate().is_ok());
        let new_item = request.into_new_item().unwrap();
        assert_eq!(new_item.status, ItemStatus::Draft);
        assert_eq!(new_item.description, None);
    }

    #[test]
    fn test_create_request_rejects_angle_brackets() {
        let request: CreateItemRequest =
            serde_json::from_str(r#"{"name": "<script>alert(1)</script>"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_create_request_length_boundaries() {
        let ok = CreateItemRequest {
            name: "a".repeat(100),
            description: Some("a".repeat(300)),
            status: "done".to_string(),
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateItemRequest {
            name: "a".repeat(101),
            description: Some("a".repeat(301)),
            status: "done".to_string(),
        };
        let errors = too_long.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn test_create_request_rejects_unknown_status() {
        let request = CreateItemRequest {
            name: "Docs".to_string(),
            description: None,
            status: "archived".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_partial_fields() {
        let request: UpdateItemRequest =
            serde_json::from_str(r#"{"status": "done", "description": null}"#).unwrap();
        assert!(request.validate().is_ok());

        let mut item = sample_item();
        request.into_changes().unwrap().apply(&mut item);
        assert_eq!(item.status, ItemStatus::Done);
        assert_eq!(item.description, None);
        assert_eq!(item.name, "Draft plan");
    }

    #[test]
    fn test_update_rejects_empty_payload() {
        let request: UpdateItemRequest = serde_json::from_str("{}").unwrap();
        match request.into_changes() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("at least one field")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_rejects_null_name_and_status() {
        let request: UpdateItemRequest = serde_json::from_str(r#"{"name": null}"#).unwrap();
        match request.into_changes() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "name cannot be null"),
            other => panic!("Expected validation error, got {:?}", other),
        }

        let request: UpdateItemRequest = serde_json::from_str(r#"{"status": null}"#).unwrap();
        match request.into_changes() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "status cannot be null"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_validates_present_values_only() {
        let request: UpdateItemRequest = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(request.validate().is_err());

        let request: UpdateItemRequest =
            serde_json::from_str(r#"{"description": "fine"}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_status_filter_message() {
        match ItemStatus::parse_filter("unknown") {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "status must be one of: done, draft, in_progress")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert_eq!(
            ItemStatus::parse_filter("in_progress").unwrap(),
            ItemStatus::InProgress
        );
    }
}
