//! crates/civic_portal_core/src/facades.rs
//!
//! One facade per backend resource. Each operation is a fixed mapping from
//! call arguments to (method, endpoint, parameter placement) and carries no
//! business logic of its own.

use crate::client::{ApiCall, ApiClient};
use crate::domain::{
    AccountInfo, Announcement, AuthToken, CitizenProfile, Complaint, ComplaintUpdate,
    Credentials, Feedback, FileAttachment, FileUpload, NewComplaint, NewFeedback,
    NewServiceRequest, Notification, NotificationStats, Payment, PaymentReceipt,
    ProfileUpdate, RecentActivity, Registration, ServerDashboardStats, ServiceRequest,
    ServiceRequestUpdate, Status, UploadReceipt,
};
use crate::ports::PortResult;

/// Optional server-side filters and paging for the `all/...` listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    fn apply(&self, call: ApiCall) -> ApiCall {
        call.query_opt("status_filter", self.status.as_deref())
            .query_opt("category_filter", self.category.as_deref())
            .query_opt("skip", self.skip)
            .query_opt("limit", self.limit)
    }
}

/// Server acknowledgement bodies are free-form; callers only need success.
type Ack = serde_json::Value;

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    pub fn citizens(&self) -> CitizensApi<'_> {
        CitizensApi { client: self }
    }

    pub fn requests(&self) -> RequestsApi<'_> {
        RequestsApi { client: self }
    }

    pub fn complaints(&self) -> ComplaintsApi<'_> {
        ComplaintsApi { client: self }
    }

    pub fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi { client: self }
    }

    pub fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi { client: self }
    }

    pub fn feedback(&self) -> FeedbackApi<'_> {
        FeedbackApi { client: self }
    }

    pub fn files(&self) -> FilesApi<'_> {
        FilesApi { client: self }
    }

    pub fn announcements(&self) -> AnnouncementsApi<'_> {
        AnnouncementsApi { client: self }
    }
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl AuthApi<'_> {
    /// Login is form encoded.
    pub async fn login(self, credentials: &Credentials) -> PortResult<AuthToken> {
        let call = ApiCall::post("/auth/login").form(vec![
            ("email".to_string(), credentials.email.clone()),
            ("password".to_string(), credentials.password.clone()),
        ]);
        self.client.json(call).await
    }

    pub async fn register(self, registration: &Registration) -> PortResult<AuthToken> {
        self.client
            .json(ApiCall::post("/auth/register").json(registration)?)
            .await
    }

    pub async fn me(self) -> PortResult<AccountInfo> {
        self.client.json(ApiCall::get("/auth/me")).await
    }

    pub async fn logout(self) -> PortResult<Ack> {
        self.client.json(ApiCall::post("/auth/logout")).await
    }
}

//=========================================================================================
// Citizens
//=========================================================================================

#[derive(Clone, Copy)]
pub struct CitizensApi<'a> {
    client: &'a ApiClient,
}

impl CitizensApi<'_> {
    pub async fn me(self) -> PortResult<CitizenProfile> {
        self.client.json(ApiCall::get("/citizens/me")).await
    }

    /// The backend reads profile fields from the query string.
    pub async fn update_me(self, update: &ProfileUpdate) -> PortResult<Ack> {
        let call = ApiCall::put("/citizens/me")
            .query_opt("phone", update.phone.as_deref())
            .query_opt("address", update.address.as_deref())
            .query_opt("marital_status", update.marital_status.as_deref());
        self.client.json(call).await
    }

    pub async fn dashboard_stats(self) -> PortResult<ServerDashboardStats> {
        self.client
            .json(ApiCall::get("/citizens/dashboard/stats"))
            .await
    }

    pub async fn recent_activity(self, limit: Option<u32>) -> PortResult<RecentActivity> {
        let call = ApiCall::get("/citizens/dashboard/recent-activity").query_opt("limit", limit);
        self.client.json(call).await
    }

    pub async fn change_password(self, current: &str, new: &str) -> PortResult<Ack> {
        let call = ApiCall::put("/citizens/change-password")
            .query("current_password", current)
            .query("new_password", new);
        self.client.json(call).await
    }
}

//=========================================================================================
// Service Requests
//=========================================================================================

#[derive(Clone, Copy)]
pub struct RequestsApi<'a> {
    client: &'a ApiClient,
}

impl RequestsApi<'_> {
    pub async fn mine(self) -> PortResult<Vec<ServiceRequest>> {
        self.client.json(ApiCall::get("/requests/my-requests")).await
    }

    pub async fn all(self, query: &ListQuery) -> PortResult<Vec<ServiceRequest>> {
        self.client
            .json(query.apply(ApiCall::get("/requests/all/requests")))
            .await
    }

    pub async fn get(self, id: i64) -> PortResult<ServiceRequest> {
        self.client.json(ApiCall::get(format!("/requests/{}", id))).await
    }

    pub async fn create(self, request: &NewServiceRequest) -> PortResult<ServiceRequest> {
        self.client
            .json(ApiCall::post("/requests/").json(request)?)
            .await
    }

    pub async fn update(
        self,
        id: i64,
        update: &ServiceRequestUpdate,
    ) -> PortResult<ServiceRequest> {
        self.client
            .json(ApiCall::put(format!("/requests/{}", id)).json(update)?)
            .await
    }

    pub async fn update_status(
        self,
        id: i64,
        new_status: &Status,
        rejection_reason: Option<&str>,
    ) -> PortResult<Ack> {
        let call = ApiCall::put(format!("/requests/{}/status", id))
            .query("new_status", new_status.as_wire())
            .query_opt("rejection_reason", rejection_reason);
        self.client.json(call).await
    }

    pub async fn delete(self, id: i64) -> PortResult<Ack> {
        self.client
            .json(ApiCall::delete(format!("/requests/{}", id)))
            .await
    }
}

//=========================================================================================
// Complaints
//=========================================================================================

#[derive(Clone, Copy)]
pub struct ComplaintsApi<'a> {
    client: &'a ApiClient,
}

impl ComplaintsApi<'_> {
    pub async fn mine(self) -> PortResult<Vec<Complaint>> {
        self.client
            .json(ApiCall::get("/complaints/my-complaints"))
            .await
    }

    pub async fn all(self, query: &ListQuery) -> PortResult<Vec<Complaint>> {
        self.client
            .json(query.apply(ApiCall::get("/complaints/all/complaints")))
            .await
    }

    pub async fn get(self, id: i64) -> PortResult<Complaint> {
        self.client
            .json(ApiCall::get(format!("/complaints/{}", id)))
            .await
    }

    pub async fn create(self, complaint: &NewComplaint) -> PortResult<Complaint> {
        self.client
            .json(ApiCall::post("/complaints/").json(complaint)?)
            .await
    }

    pub async fn update_status(self, id: i64, update: &ComplaintUpdate) -> PortResult<Complaint> {
        self.client
            .json(ApiCall::put(format!("/complaints/{}/status", id)).json(update)?)
            .await
    }

    pub async fn delete(self, id: i64) -> PortResult<Ack> {
        self.client
            .json(ApiCall::delete(format!("/complaints/{}", id)))
            .await
    }
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Clone, Copy)]
pub struct PaymentsApi<'a> {
    client: &'a ApiClient,
}

impl PaymentsApi<'_> {
    pub async fn mine(self) -> PortResult<Vec<Payment>> {
        self.client.json(ApiCall::get("/payments/my-payments")).await
    }

    pub async fn get(self, id: i64) -> PortResult<Payment> {
        self.client
            .json(ApiCall::get(format!("/payments/{}", id)))
            .await
    }

    pub async fn receipt(self, id: i64) -> PortResult<PaymentReceipt> {
        self.client
            .json(ApiCall::get(format!("/payments/{}/receipt", id)))
            .await
    }
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Clone, Copy)]
pub struct NotificationsApi<'a> {
    client: &'a ApiClient,
}

impl NotificationsApi<'_> {
    pub async fn mine(self, unread_only: bool) -> PortResult<Vec<Notification>> {
        let call = ApiCall::get("/notifications/my-notifications")
            .query_opt("unread_only", unread_only.then_some(true));
        self.client.json(call).await
    }

    pub async fn stats(self) -> PortResult<NotificationStats> {
        self.client.json(ApiCall::get("/notifications/stats")).await
    }

    pub async fn mark_read(self, id: i64) -> PortResult<Ack> {
        self.client
            .json(ApiCall::put(format!("/notifications/{}/read", id)))
            .await
    }

    pub async fn mark_all_read(self) -> PortResult<Ack> {
        self.client
            .json(ApiCall::put("/notifications/mark-all-read"))
            .await
    }

    pub async fn delete(self, id: i64) -> PortResult<Ack> {
        self.client
            .json(ApiCall::delete(format!("/notifications/{}", id)))
            .await
    }
}

//=========================================================================================
// Feedback
//=========================================================================================

#[derive(Clone, Copy)]
pub struct FeedbackApi<'a> {
    client: &'a ApiClient,
}

impl FeedbackApi<'_> {
    pub async fn submit(self, feedback: &NewFeedback) -> PortResult<Feedback> {
        self.client
            .json(ApiCall::post("/feedback/").json(feedback)?)
            .await
    }

    pub async fn mine(self) -> PortResult<Vec<Feedback>> {
        self.client.json(ApiCall::get("/feedback/my-feedbacks")).await
    }
}

//=========================================================================================
// Files
//=========================================================================================

#[derive(Clone, Copy)]
pub struct FilesApi<'a> {
    client: &'a ApiClient,
}

impl FilesApi<'_> {
    pub async fn upload_for_request(
        self,
        request_id: i64,
        file: FileUpload,
    ) -> PortResult<UploadReceipt> {
        let call = ApiCall::post(format!("/files/requests/{}/upload", request_id)).multipart(file);
        self.client.json(call).await
    }

    pub async fn upload_for_complaint(
        self,
        complaint_id: i64,
        file: FileUpload,
    ) -> PortResult<UploadReceipt> {
        let call =
            ApiCall::post(format!("/files/complaints/{}/upload", complaint_id)).multipart(file);
        self.client.json(call).await
    }

    pub async fn for_request(self, request_id: i64) -> PortResult<Vec<FileAttachment>> {
        self.client
            .json(ApiCall::get(format!("/files/requests/{}/files", request_id)))
            .await
    }

    pub async fn for_complaint(self, complaint_id: i64) -> PortResult<Vec<FileAttachment>> {
        self.client
            .json(ApiCall::get(format!("/files/complaints/{}/files", complaint_id)))
            .await
    }
}

//=========================================================================================
// Announcements
//=========================================================================================

#[derive(Clone, Copy)]
pub struct AnnouncementsApi<'a> {
    client: &'a ApiClient,
}

impl AnnouncementsApi<'_> {
    pub async fn active(self, query: &ListQuery) -> PortResult<Vec<Announcement>> {
        let call = ApiCall::get("/announcements/active")
            .query_opt("category", query.category.as_deref())
            .query_opt("skip", query.skip)
            .query_opt("limit", query.limit);
        self.client.json(call).await
    }
}
