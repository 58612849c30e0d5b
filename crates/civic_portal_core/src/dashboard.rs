//! crates/civic_portal_core/src/dashboard.rs
//!
//! The citizen dashboard: one owned snapshot of the signed-in citizen's
//! requests, complaints, payments and notifications, plus the view state that
//! narrows what is shown. All mutation goes through `&mut self`, so whoever
//! owns the `Dashboard` is the only writer.

use futures::join;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::domain::{
    CitizenProfile, Complaint, DashboardViewState, Feedback, FileUpload, NewComplaint,
    NewFeedback, NewServiceRequest, Notification, Payment, ProfileUpdate, Resource,
    ServiceRequest, Status, StatusFilter, Tab, UploadReceipt,
};
use crate::ports::{PortError, PortResult};
use crate::render::{self, Row};
use crate::session;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Where the profile on display came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileSource {
    /// Fetched from `/citizens/me`.
    Server,
    /// Synthesised from the cached session after the server refused.
    Session,
    #[default]
    Missing,
}

/// What a full load managed to fetch. Failures are tolerated, not fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub profile_source: ProfileSource,
    pub failed: Vec<(Resource, PortError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.profile_source == ProfileSource::Server && self.failed.is_empty()
    }
}

/// Result of uploading the optional attachment after a successful create.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentOutcome {
    NotRequested,
    Uploaded(UploadReceipt),
    /// The record exists without its attachment; nothing is rolled back.
    Failed(PortError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Created<T> {
    pub record: T,
    pub attachment: AttachmentOutcome,
}

/// Counters computed from the local snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalStats {
    pub requests: usize,
    pub open_requests: usize,
    pub complaints: usize,
    pub open_complaints: usize,
    pub payments: usize,
    pub total_paid: f64,
    pub unread_notifications: usize,
}

pub struct Dashboard {
    client: ApiClient,
    profile: Option<CitizenProfile>,
    profile_source: ProfileSource,
    requests: Vec<ServiceRequest>,
    complaints: Vec<Complaint>,
    payments: Vec<Payment>,
    notifications: Vec<Notification>,
    view: DashboardViewState,
}

fn settle<T>(
    resource: Resource,
    result: PortResult<Vec<T>>,
    failed: &mut Vec<(Resource, PortError)>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(%resource, error = %e, "Failed to load collection, showing it empty");
            failed.push((resource, e));
            Vec::new()
        }
    }
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            profile: None,
            profile_source: ProfileSource::Missing,
            requests: Vec::new(),
            complaints: Vec::new(),
            payments: Vec::new(),
            notifications: Vec::new(),
            view: DashboardViewState::default(),
        }
    }

    //-------------------------------------------------------------------------------------
    // Sync
    //-------------------------------------------------------------------------------------

    /// Fetches the profile and all four collections concurrently. One
    /// failing resource never blocks the others.
    pub async fn load_all(&mut self) -> LoadReport {
        let client = &self.client;
        let (profile, requests, complaints, payments, notifications) = join!(
            client.citizens().me(),
            client.requests().mine(),
            client.complaints().mine(),
            client.payments().mine(),
            client.notifications().mine(false),
        );

        self.profile_source = match profile {
            Ok(profile) => {
                self.profile = Some(profile);
                ProfileSource::Server
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed, falling back to cached session");
                match session::stored_profile(self.client.storage().as_ref()) {
                    Some(cached) => {
                        self.profile = Some(CitizenProfile::from_session(&cached));
                        ProfileSource::Session
                    }
                    None => {
                        self.profile = None;
                        ProfileSource::Missing
                    }
                }
            }
        };

        let mut failed = Vec::new();
        self.requests = settle(Resource::Requests, requests, &mut failed);
        self.complaints = settle(Resource::Complaints, complaints, &mut failed);
        self.payments = settle(Resource::Payments, payments, &mut failed);
        self.notifications = settle(Resource::Notifications, notifications, &mut failed);

        info!(
            requests = self.requests.len(),
            complaints = self.complaints.len(),
            payments = self.payments.len(),
            notifications = self.notifications.len(),
            failed = failed.len(),
            "Dashboard loaded"
        );

        LoadReport {
            profile_source: self.profile_source,
            failed,
        }
    }

    /// Reloads a single collection with the same failure tolerance as
    /// `load_all`. Returns the tolerated error, if any.
    pub async fn refresh(&mut self, resource: Resource) -> Option<PortError> {
        let mut failed = Vec::new();
        match resource {
            Resource::Requests => {
                let result = self.client.requests().mine().await;
                self.requests = settle(resource, result, &mut failed);
            }
            Resource::Complaints => {
                let result = self.client.complaints().mine().await;
                self.complaints = settle(resource, result, &mut failed);
            }
            Resource::Payments => {
                let result = self.client.payments().mine().await;
                self.payments = settle(resource, result, &mut failed);
            }
            Resource::Notifications => {
                let result = self.client.notifications().mine(false).await;
                self.notifications = settle(resource, result, &mut failed);
            }
        }
        failed.pop().map(|(_, e)| e)
    }

    //-------------------------------------------------------------------------------------
    // View state
    //-------------------------------------------------------------------------------------

    pub fn set_tab(&mut self, tab: Tab) {
        self.view.active_tab = tab;
    }

    /// Narrows a list to "all" or one status (`read`/`unread` for
    /// notifications). Never refetches.
    pub fn apply_filter(&mut self, resource: Resource, token: &str) {
        self.view.filters.insert(resource, StatusFilter::parse(token));
    }

    pub fn apply_search(&mut self, resource: Resource, term: &str) {
        self.view.search_terms.insert(resource, term.to_string());
    }

    pub fn view(&self) -> &DashboardViewState {
        &self.view
    }

    pub fn requests_view(&self) -> Vec<&ServiceRequest> {
        let resource = Resource::Requests;
        render::visible(
            &self.requests,
            self.view.filter(resource),
            self.view.search_term(resource),
        )
    }

    pub fn complaints_view(&self) -> Vec<&Complaint> {
        let resource = Resource::Complaints;
        render::visible(
            &self.complaints,
            self.view.filter(resource),
            self.view.search_term(resource),
        )
    }

    pub fn payments_view(&self) -> Vec<&Payment> {
        let resource = Resource::Payments;
        render::visible(
            &self.payments,
            self.view.filter(resource),
            self.view.search_term(resource),
        )
    }

    pub fn notifications_view(&self) -> Vec<&Notification> {
        let resource = Resource::Notifications;
        render::visible(
            &self.notifications,
            self.view.filter(resource),
            self.view.search_term(resource),
        )
    }

    /// Display rows for one resource under the current filter and search term.
    pub fn rows(&self, resource: Resource) -> Vec<Row> {
        let filter = self.view.filter(resource);
        let term = self.view.search_term(resource);
        match resource {
            Resource::Requests => render::render_requests(&self.requests, filter, term),
            Resource::Complaints => render::render_complaints(&self.complaints, filter, term),
            Resource::Payments => render::render_payments(&self.payments, filter, term),
            Resource::Notifications => {
                render::render_notifications(&self.notifications, filter, term)
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Snapshot reads
    //-------------------------------------------------------------------------------------

    pub fn profile(&self) -> Option<&CitizenProfile> {
        self.profile.as_ref()
    }

    pub fn profile_source(&self) -> ProfileSource {
        self.profile_source
    }

    pub fn requests(&self) -> &[ServiceRequest] {
        &self.requests
    }

    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    pub fn stats(&self) -> LocalStats {
        LocalStats {
            requests: self.requests.len(),
            open_requests: self
                .requests
                .iter()
                .filter(|r| !matches!(r.status, Status::Completed | Status::Rejected))
                .count(),
            complaints: self.complaints.len(),
            open_complaints: self
                .complaints
                .iter()
                .filter(|c| !matches!(c.status, Status::Resolved | Status::Closed))
                .count(),
            payments: self.payments.len(),
            total_paid: self
                .payments
                .iter()
                .filter(|p| matches!(p.status, Status::Completed | Status::Paid))
                .map(|p| p.amount)
                .sum(),
            unread_notifications: self.unread_count(),
        }
    }

    //-------------------------------------------------------------------------------------
    // User actions
    //-------------------------------------------------------------------------------------

    /// Creates a request, uploads its attachment against the new id, then
    /// refreshes the requests list only.
    pub async fn create_request(
        &mut self,
        request: &NewServiceRequest,
        file: Option<FileUpload>,
    ) -> PortResult<Created<ServiceRequest>> {
        let created = self.client.requests().create(request).await?;
        info!(
            request_id = created.id,
            request_type = %created.request_type,
            "Service request created"
        );

        let attachment = match file {
            None => AttachmentOutcome::NotRequested,
            Some(file) => match self.client.files().upload_for_request(created.id, file).await {
                Ok(receipt) => AttachmentOutcome::Uploaded(receipt),
                Err(e) => {
                    warn!(
                        request_id = created.id,
                        error = %e,
                        "Request created but attachment upload failed"
                    );
                    AttachmentOutcome::Failed(e)
                }
            },
        };

        self.refresh(Resource::Requests).await;
        Ok(Created {
            record: created,
            attachment,
        })
    }

    pub async fn create_complaint(
        &mut self,
        complaint: &NewComplaint,
        file: Option<FileUpload>,
    ) -> PortResult<Created<Complaint>> {
        let created = self.client.complaints().create(complaint).await?;
        info!(complaint_id = created.id, "Complaint submitted");

        let attachment = match file {
            None => AttachmentOutcome::NotRequested,
            Some(file) => match self.client.files().upload_for_complaint(created.id, file).await {
                Ok(receipt) => AttachmentOutcome::Uploaded(receipt),
                Err(e) => {
                    warn!(
                        complaint_id = created.id,
                        error = %e,
                        "Complaint created but attachment upload failed"
                    );
                    AttachmentOutcome::Failed(e)
                }
            },
        };

        self.refresh(Resource::Complaints).await;
        Ok(Created {
            record: created,
            attachment,
        })
    }

    /// Feedback is not listed on the dashboard, so nothing is refreshed.
    pub async fn submit_feedback(&mut self, feedback: &NewFeedback) -> PortResult<Feedback> {
        if !(MIN_RATING..=MAX_RATING).contains(&feedback.rating) {
            return Err(PortError::invalid(format!(
                "Please select a rating between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        let saved = self.client.feedback().submit(feedback).await?;
        info!(feedback_id = saved.feedback_id, rating = saved.rating, "Feedback submitted");
        Ok(saved)
    }

    /// The local flag only flips after the server confirms.
    pub async fn mark_notification_read(&mut self, id: i64) -> PortResult<()> {
        self.client.notifications().mark_read(id).await?;
        if let Some(notification) = self.notifications.iter_mut().find(|n| n.id == id) {
            notification.is_read = true;
        }
        Ok(())
    }

    pub async fn mark_all_notifications_read(&mut self) -> PortResult<()> {
        self.client.notifications().mark_all_read().await?;
        for notification in &mut self.notifications {
            notification.is_read = true;
        }
        Ok(())
    }

    /// Saves the profile, then reloads everything so every derived display
    /// agrees with it.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> PortResult<LoadReport> {
        self.client.citizens().update_me(update).await?;
        info!("Profile updated, reloading dashboard");
        Ok(self.load_all().await)
    }
}
