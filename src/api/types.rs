//! Marketo REST API request and response payload types.
//!
//! These types fill the `result` slot of an [`ApiEnvelope`](super::ApiEnvelope).

use serde::{Deserialize, Serialize};

/// A lead record.
///
/// Returned by `GET lead/{id}.json` and `GET list/{id}/leads.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// The lead id.
    pub id: u64,
    /// First name, if known.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name, if known.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Email address, if known.
    #[serde(default)]
    pub email: Option<String>,
    /// Creation timestamp as reported by the API.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp as reported by the API.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Query for the leads of a static list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadsRequest {
    /// The static list id.
    pub list_id: String,
    /// Cursor from a previous page, if continuing.
    pub next_page_token: Option<String>,
}

/// The action applied by a lead sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadAction {
    /// Insert new leads or update existing ones.
    #[default]
    CreateOrUpdate,
    /// Insert new leads only.
    CreateOnly,
    /// Update existing leads only.
    UpdateOnly,
    /// Insert new leads, duplicating on match.
    CreateDuplicate,
}

/// Body of a `POST leads.json` sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    /// What to do with each input record.
    pub action: LeadAction,
    /// The field used to match existing leads (e.g. "email").
    pub lookup_field: String,
    /// The lead records, as free-form JSON objects.
    pub input: Vec<serde_json::Value>,
}

/// Per-record status of a lead sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdateResult {
    /// The lead id, when the record was created or updated.
    #[serde(default)]
    pub id: Option<u64>,
    /// "created", "updated" or "skipped".
    pub status: String,
    /// Reasons a record was skipped.
    #[serde(default)]
    pub reasons: Vec<super::ApiErrorDetail>,
}

/// A named, typed attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Attribute name.
    pub name: String,
    /// Attribute data type (e.g. "string", "integer").
    pub data_type: String,
}

/// An activity type definition.
///
/// Returned by `GET activities/types.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    /// Activity type id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// The primary attribute, if the type has one.
    #[serde(default)]
    pub primary_attribute: Option<AttributeDefinition>,
    /// Secondary attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

/// A name/value attribute on an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value; Marketo mixes strings, numbers and booleans.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Parameters for an activity feed query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityRequest {
    /// Activity type ids to include. Must not be empty.
    pub activity_type_ids: Vec<String>,
    /// Start of the window, in any format accepted by the pager.
    pub since: String,
    /// Restrict to members of this static list.
    pub list_id: Option<String>,
    /// Restrict to these leads.
    pub lead_ids: Vec<String>,
}

/// A single activity record.
///
/// Returned by `GET activities.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity id.
    pub id: u64,
    /// The lead the activity belongs to.
    pub lead_id: u64,
    /// When the activity happened.
    pub activity_date: String,
    /// The activity type id.
    pub activity_type_id: u32,
    /// Id of the primary attribute value.
    #[serde(default)]
    pub primary_attribute_value_id: Option<u64>,
    /// The primary attribute value.
    #[serde(default)]
    pub primary_attribute_value: Option<String>,
    /// Secondary attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A single field change on a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Field id.
    pub id: u64,
    /// Field name.
    pub name: String,
    /// New value.
    #[serde(default)]
    pub new_value: Option<String>,
    /// Previous value.
    #[serde(default)]
    pub old_value: Option<String>,
}

/// A lead change activity.
///
/// Returned by `GET activities/leadchanges.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadChange {
    /// Activity id.
    pub id: u64,
    /// The lead that changed.
    pub lead_id: u64,
    /// When the change happened.
    pub activity_date: String,
    /// The activity type id.
    pub activity_type_id: u32,
    /// The changed fields.
    #[serde(default)]
    pub fields: Vec<FieldChange>,
    /// Additional attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// The count of one error code on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCount {
    /// The error code.
    pub error_code: String,
    /// How many times it occurred.
    pub count: u64,
}

/// Daily API error statistics.
///
/// Returned by `GET stats/errors.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyErrorStats {
    /// The day, as `YYYY-MM-DD`.
    pub date: String,
    /// Total errors on that day.
    pub total: u64,
    /// Per-code breakdown.
    #[serde(default)]
    pub errors: Vec<ErrorCount>,
}
