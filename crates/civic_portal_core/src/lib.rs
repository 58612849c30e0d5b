pub mod client;
pub mod dashboard;
pub mod domain;
pub mod facades;
pub mod ports;
pub mod render;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiCall, ApiClient};
pub use dashboard::{AttachmentOutcome, Created, Dashboard, LoadReport, LocalStats, ProfileSource};
pub use domain::{
    CitizenProfile, Complaint, Credentials, FileUpload, NewComplaint, NewFeedback,
    NewServiceRequest, Notification, Payment, ProfileUpdate, Registration, Resource, Role,
    ServiceRequest, SessionProfile, Status, StatusFilter, Tab,
};
pub use facades::ListQuery;
pub use ports::{
    ApiRequest, HttpTransport, Method, PortError, PortResult, RawResponse, RequestBody,
    SessionStorage, StorageScope,
};
pub use session::{Access, AuthState, AuthStore};
