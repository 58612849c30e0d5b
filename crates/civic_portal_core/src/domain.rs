//! crates/civic_portal_core/src/domain.rs
//!
//! Defines the core data structures of the portal client.
//! Every entity here is a client-side cache of server-owned truth; wire field
//! names follow the backend so the structs deserialize straight off the API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

//=========================================================================================
// Status Values
//=========================================================================================

/// Every status value the backend reports, across all resources.
///
/// Unknown wire values are kept in `Other` so a new server-side status can
/// never break deserialization of a whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Submitted,
    UnderReview,
    UnderInvestigation,
    InProgress,
    Approved,
    Rejected,
    Paid,
    Completed,
    Resolved,
    Closed,
    Pending,
    Failed,
    Refunded,
    Other(String),
}

impl Status {
    pub const REQUEST: &'static [Status] = &[
        Status::Submitted,
        Status::UnderReview,
        Status::Approved,
        Status::Rejected,
        Status::InProgress,
        Status::Paid,
        Status::Completed,
    ];

    pub const COMPLAINT: &'static [Status] = &[
        Status::Submitted,
        Status::UnderInvestigation,
        Status::Resolved,
        Status::Closed,
    ];

    pub const PAYMENT: &'static [Status] = &[
        Status::Pending,
        Status::Completed,
        Status::Failed,
        Status::Refunded,
    ];

    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "SUBMITTED" => Status::Submitted,
            "UNDER_REVIEW" => Status::UnderReview,
            "UNDER_INVESTIGATION" => Status::UnderInvestigation,
            "IN_PROGRESS" => Status::InProgress,
            "APPROVED" => Status::Approved,
            "REJECTED" => Status::Rejected,
            "PAID" => Status::Paid,
            "COMPLETED" => Status::Completed,
            "RESOLVED" => Status::Resolved,
            "CLOSED" => Status::Closed,
            "PENDING" => Status::Pending,
            "FAILED" => Status::Failed,
            "REFUNDED" => Status::Refunded,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Status::Submitted => "SUBMITTED",
            Status::UnderReview => "UNDER_REVIEW",
            Status::UnderInvestigation => "UNDER_INVESTIGATION",
            Status::InProgress => "IN_PROGRESS",
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
            Status::Paid => "PAID",
            Status::Completed => "COMPLETED",
            Status::Resolved => "RESOLVED",
            Status::Closed => "CLOSED",
            Status::Pending => "PENDING",
            Status::Failed => "FAILED",
            Status::Refunded => "REFUNDED",
            Status::Other(raw) => raw,
        }
    }

    /// Human-readable label. Unknown values pass through unchanged.
    pub fn label(&self) -> &str {
        match self {
            Status::Submitted => "Submitted",
            Status::UnderReview => "Under Review",
            Status::UnderInvestigation => "Under Investigation",
            Status::InProgress => "In Progress",
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
            Status::Paid => "Paid",
            Status::Completed => "Completed",
            Status::Resolved => "Resolved",
            Status::Closed => "Closed",
            Status::Pending => "Pending",
            Status::Failed => "Failed",
            Status::Refunded => "Refunded",
            Status::Other(raw) => raw,
        }
    }

    /// Coarse display grouping. Unknown values fall back to `Submitted`.
    pub fn category(&self) -> VisualCategory {
        match self {
            Status::Submitted | Status::Pending | Status::Refunded => VisualCategory::Submitted,
            Status::UnderReview | Status::UnderInvestigation | Status::InProgress => {
                VisualCategory::UnderReview
            }
            Status::Approved => VisualCategory::Approved,
            Status::Rejected | Status::Failed => VisualCategory::Rejected,
            Status::Paid => VisualCategory::Paid,
            Status::Completed | Status::Resolved | Status::Closed => VisualCategory::Completed,
            Status::Other(_) => VisualCategory::Submitted,
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match Status::from_wire(&raw) {
            Status::Other(_) => Status::Other(raw),
            known => known,
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(raw) => raw,
            known => known.as_wire().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The style bucket a status is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualCategory {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Paid,
    Completed,
}

impl VisualCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualCategory::Submitted => "submitted",
            VisualCategory::UnderReview => "under-review",
            VisualCategory::Approved => "approved",
            VisualCategory::Rejected => "rejected",
            VisualCategory::Paid => "paid",
            VisualCategory::Completed => "completed",
        }
    }
}

impl fmt::Display for VisualCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Accounts & Sessions
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Citizen,
    Employee,
    Other(String),
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "citizen" => Role::Citizen,
            "employee" => Role::Employee,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Citizen => "citizen".to_string(),
            Role::Employee => "employee".to_string(),
            Role::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Citizen => f.write_str("citizen"),
            Role::Employee => f.write_str("employee"),
            Role::Other(raw) => f.write_str(raw),
        }
    }
}

/// The minimal profile projection cached alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

/// Answer of `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthToken {
    pub fn profile(&self) -> SessionProfile {
        SessionProfile {
            user_id: self.user_id,
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// Answer of `/auth/me`. The server does not always echo the role.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub account_id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub national_id: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
}

/// Full citizen profile from `/citizens/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitizenProfile {
    pub citizen_id: Option<i64>,
    pub account_id: Option<i64>,
    pub email: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub address: Option<String>,
    pub marital_status: Option<String>,
    pub resident_status: Option<bool>,
    pub is_active: Option<bool>,
}

impl CitizenProfile {
    /// Builds a stand-in profile from the cached session when the server
    /// refuses to hand out the full one.
    pub fn from_session(session: &SessionProfile) -> Self {
        let handle = session
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            account_id: Some(session.user_id),
            email: session.email.clone(),
            first_name: handle.clone(),
            full_name: handle,
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> String {
        let full = self.full_name.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        let joined = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let joined = joined.trim();
        if joined.is_empty() {
            self.email.clone()
        } else {
            joined.to_string()
        }
    }
}

/// Fields a citizen may change on their own profile. Only present fields are sent.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub marital_status: Option<String>,
}

//=========================================================================================
// Resources
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    #[serde(rename = "request_id")]
    pub id: i64,
    pub citizen_id: Option<i64>,
    pub request_type: String,
    pub description: Option<String>,
    pub status: Status,
    pub request_date: String,
    pub assigned_employee_id: Option<i64>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    #[serde(rename = "complaint_id")]
    pub id: i64,
    pub citizen_id: Option<i64>,
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: Option<String>,
    pub status: Status,
    pub submission_date: String,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "payment_id")]
    pub id: i64,
    pub request_id: i64,
    pub request_type: Option<String>,
    pub payment_method: String,
    pub amount: f64,
    pub status: Status,
    pub payment_date: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: i64,
    pub transaction_id: String,
    pub request_id: i64,
    pub request_type: String,
    pub citizen_name: String,
    pub amount: f64,
    pub payment_date: String,
    pub payment_method: String,
    pub receipt_number: String,
    #[serde(default)]
    pub municipality_info: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "notification_id")]
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: String,
    pub request_id: Option<i64>,
    pub complaint_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotificationStats {
    pub total_notifications: u64,
    pub unread_count: u64,
    pub read_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feedback {
    pub feedback_id: i64,
    pub request_id: Option<i64>,
    pub request_type: Option<String>,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Announcement {
    pub announcement_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub issue_date: String,
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub event_date: Option<String>,
    pub event_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileAttachment {
    pub file_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: u64,
    pub file_type: String,
    pub upload_date: Option<String>,
    pub request_id: Option<i64>,
    pub complaint_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadReceipt {
    pub file_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: u64,
    pub file_type: String,
    #[serde(default)]
    pub message: String,
}

/// Server-side dashboard counters from `/citizens/dashboard/stats`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerDashboardStats {
    pub requests: HashMap<String, u64>,
    pub payments: HashMap<String, u64>,
    pub complaints: HashMap<String, u64>,
    pub notifications: HashMap<String, u64>,
    pub feedback: HashMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecentActivity {
    pub recent_requests: Vec<RecentRequest>,
    pub recent_notifications: Vec<RecentNotification>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecentRequest {
    pub request_id: i64,
    #[serde(rename = "type")]
    pub request_type: String,
    pub status: Status,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecentNotification {
    pub notification_id: i64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

//=========================================================================================
// Outgoing Payloads
//=========================================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NewServiceRequest {
    pub request_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceRequestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_employee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComplaint {
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplaintUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_employee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A single file attached to a request or complaint.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

//=========================================================================================
// Dashboard View State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Requests,
    Complaints,
    Payments,
    Notifications,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Requests,
        Resource::Complaints,
        Resource::Payments,
        Resource::Notifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Requests => "requests",
            Resource::Complaints => "complaints",
            Resource::Payments => "payments",
            Resource::Notifications => "notifications",
        }
    }

    /// The status values a filter menu offers for this resource.
    /// Notifications are filtered by read state instead.
    pub fn statuses(&self) -> &'static [Status] {
        match self {
            Resource::Requests => Status::REQUEST,
            Resource::Complaints => Status::COMPLAINT,
            Resource::Payments => Status::PAYMENT,
            Resource::Notifications => &[],
        }
    }

    pub fn accepts(&self, filter: &StatusFilter) -> bool {
        match (self, filter) {
            (_, StatusFilter::All) => true,
            (Resource::Notifications, StatusFilter::Unread | StatusFilter::Read) => true,
            (Resource::Notifications, StatusFilter::Status(_)) => false,
            (_, StatusFilter::Unread | StatusFilter::Read) => false,
            (resource, StatusFilter::Status(status)) => resource.statuses().contains(status),
        }
    }

    /// Every filter token that `accepts` would take, in menu order.
    pub fn filter_tokens(&self) -> Vec<String> {
        let mut tokens = vec!["all".to_string()];
        match self {
            Resource::Notifications => {
                tokens.push("unread".to_string());
                tokens.push("read".to_string());
            }
            _ => tokens.extend(
                self.statuses()
                    .iter()
                    .map(|status| status.as_wire().to_ascii_lowercase()),
            ),
        }
        tokens
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Overview,
    Requests,
    Complaints,
    Payments,
    Notifications,
}

impl Tab {
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Tab::Overview => None,
            Tab::Requests => Some(Resource::Requests),
            Tab::Complaints => Some(Resource::Complaints),
            Tab::Payments => Some(Resource::Payments),
            Tab::Notifications => Some(Resource::Notifications),
        }
    }
}

/// Which subset of a collection is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Status(Status),
    Unread,
    Read,
}

impl StatusFilter {
    /// Parses a filter token as picked from a filter menu: `all`, `read`,
    /// `unread`, or a status value in any case.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case("all") {
            return StatusFilter::All;
        }
        if token.eq_ignore_ascii_case("unread") {
            return StatusFilter::Unread;
        }
        if token.eq_ignore_ascii_case("read") {
            return StatusFilter::Read;
        }
        StatusFilter::Status(Status::from_wire(&token.to_ascii_uppercase().replace(' ', "_")))
    }
}

/// Pure UI state; never persisted and never touches the collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardViewState {
    pub active_tab: Tab,
    pub filters: HashMap<Resource, StatusFilter>,
    pub search_terms: HashMap<Resource, String>,
}

impl DashboardViewState {
    pub fn filter(&self, resource: Resource) -> &StatusFilter {
        static SHOW_ALL: StatusFilter = StatusFilter::All;
        self.filters.get(&resource).unwrap_or(&SHOW_ALL)
    }

    pub fn search_term(&self, resource: Resource) -> &str {
        self.search_terms
            .get(&resource)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_unknown_values_verbatim() {
        let status: Status = serde_json::from_str("\"ON_HOLD\"").unwrap();
        assert_eq!(status, Status::Other("ON_HOLD".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"ON_HOLD\"");
    }

    #[test]
    fn request_deserializes_from_backend_shape() {
        let raw = r#"{
            "request_id": 7,
            "citizen_id": 3,
            "request_type": "Building Permit",
            "request_date": "2024-03-01T09:15:00",
            "description": null,
            "status": "UNDER_REVIEW",
            "assigned_employee_id": null,
            "rejection_reason": null
        }"#;
        let request: ServiceRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.id, 7);
        assert_eq!(request.status, Status::UnderReview);
        assert!(request.description.is_none());
    }

    #[test]
    fn filter_tokens_parse_case_insensitively() {
        assert_eq!(StatusFilter::parse("all"), StatusFilter::All);
        assert_eq!(StatusFilter::parse(""), StatusFilter::All);
        assert_eq!(StatusFilter::parse("Unread"), StatusFilter::Unread);
        assert_eq!(
            StatusFilter::parse("under_review"),
            StatusFilter::Status(Status::UnderReview)
        );
        assert_eq!(
            StatusFilter::parse("In Progress"),
            StatusFilter::Status(Status::InProgress)
        );
    }

    #[test]
    fn session_fallback_profile_uses_email_handle() {
        let session = SessionProfile {
            user_id: 12,
            email: "rana@example.com".to_string(),
            role: Role::Citizen,
        };
        let profile = CitizenProfile::from_session(&session);
        assert_eq!(profile.account_id, Some(12));
        assert_eq!(profile.display_name(), "rana");
    }

    #[test]
    fn filter_menus_follow_each_resource() {
        assert!(Resource::Complaints.accepts(&StatusFilter::parse("under_investigation")));
        assert!(!Resource::Requests.accepts(&StatusFilter::parse("under_investigation")));
        assert!(!Resource::Payments.accepts(&StatusFilter::Unread));
        assert!(Resource::Notifications.accepts(&StatusFilter::parse("unread")));
        assert!(!Resource::Notifications.accepts(&StatusFilter::parse("approved")));
        assert_eq!(
            Resource::Payments.filter_tokens(),
            vec!["all", "pending", "completed", "failed", "refunded"]
        );
        assert_eq!(Resource::Notifications.filter_tokens(), vec!["all", "unread", "read"]);
        for resource in Resource::ALL {
            for token in resource.filter_tokens() {
                assert!(resource.accepts(&StatusFilter::parse(&token)), "{} {}", resource, token);
            }
        }
    }

    #[test]
    fn role_parses_known_and_unknown_values() {
        assert_eq!(Role::from("CITIZEN".to_string()), Role::Citizen);
        assert_eq!(Role::from("auditor".to_string()), Role::Other("auditor".to_string()));
    }
}
