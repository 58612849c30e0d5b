//! crates/civic_portal_core/src/render.rs
//!
//! Pure projections from (collection, filter, search term) to display rows.
//! Nothing in here mutates state or performs I/O.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::{
    Complaint, Notification, Payment, ServiceRequest, Status, StatusFilter, VisualCategory,
};

/// Label for a raw status value; unknown values pass through unchanged.
pub fn format_status(raw: &str) -> String {
    Status::from_wire(raw).label().to_string()
}

/// Visual category for a raw status value; unknown values map to `submitted`.
pub fn status_class(raw: &str) -> VisualCategory {
    Status::from_wire(raw).category()
}

//=========================================================================================
// Record Traits
//=========================================================================================

/// A record that can be matched by the dashboard search box.
pub trait Searchable {
    /// The fixed set of text fields a search term is matched against.
    fn search_fields(&self) -> Vec<&str>;
}

/// A record that can be narrowed by a dashboard filter.
pub trait Filterable {
    fn matches_filter(&self, filter: &StatusFilter) -> bool;
}

fn status_matches(status: &Status, filter: &StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Status(wanted) => status == wanted,
        StatusFilter::Unread | StatusFilter::Read => false,
    }
}

impl Searchable for ServiceRequest {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.request_type.as_str(),
            self.description.as_deref().unwrap_or_default(),
            self.status.as_wire(),
            self.status.label(),
        ]
    }
}

impl Filterable for ServiceRequest {
    fn matches_filter(&self, filter: &StatusFilter) -> bool {
        status_matches(&self.status, filter)
    }
}

impl Searchable for Complaint {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.category.as_str(),
            self.description.as_str(),
            self.location.as_deref().unwrap_or_default(),
            self.status.as_wire(),
            self.status.label(),
        ]
    }
}

impl Filterable for Complaint {
    fn matches_filter(&self, filter: &StatusFilter) -> bool {
        status_matches(&self.status, filter)
    }
}

impl Searchable for Payment {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.payment_method.as_str(),
            self.request_type.as_deref().unwrap_or_default(),
            self.transaction_id.as_deref().unwrap_or_default(),
            self.status.as_wire(),
            self.status.label(),
        ]
    }
}

impl Filterable for Payment {
    fn matches_filter(&self, filter: &StatusFilter) -> bool {
        status_matches(&self.status, filter)
    }
}

impl Searchable for Notification {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.message.as_str()]
    }
}

impl Filterable for Notification {
    fn matches_filter(&self, filter: &StatusFilter) -> bool {
        match filter {
            StatusFilter::All => true,
            StatusFilter::Unread => !self.is_read,
            StatusFilter::Read => self.is_read,
            StatusFilter::Status(_) => false,
        }
    }
}

//=========================================================================================
// Search & Filter
//=========================================================================================

pub fn matches_search<T: Searchable>(item: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Case-insensitive substring search. A blank term keeps everything.
pub fn filter_by_search<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items.iter().filter(|item| matches_search(*item, term)).collect()
}

/// The derived view: filter ∩ search, in collection order.
pub fn visible<'a, T>(items: &'a [T], filter: &StatusFilter, term: &str) -> Vec<&'a T>
where
    T: Searchable + Filterable,
{
    items
        .iter()
        .filter(|item| item.matches_filter(filter) && matches_search(*item, term))
        .collect()
}

//=========================================================================================
// Rows
//=========================================================================================

/// One line of a dashboard list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: i64,
    pub title: String,
    pub detail: String,
    pub status_label: String,
    pub status_class: VisualCategory,
    pub date: String,
    pub amount: Option<String>,
    pub unread: bool,
}

pub fn request_row(request: &ServiceRequest) -> Row {
    Row {
        id: request.id,
        title: request.request_type.clone(),
        detail: request
            .description
            .clone()
            .unwrap_or_else(|| "No description".to_string()),
        status_label: request.status.label().to_string(),
        status_class: request.status.category(),
        date: format_date(&request.request_date),
        amount: None,
        unread: false,
    }
}

pub fn complaint_row(complaint: &Complaint) -> Row {
    let detail = match &complaint.location {
        Some(location) if !location.is_empty() => format!("{} · {}", complaint.category, location),
        _ => complaint.category.clone(),
    };
    Row {
        id: complaint.id,
        title: complaint.title.clone(),
        detail,
        status_label: complaint.status.label().to_string(),
        status_class: complaint.status.category(),
        date: format_date(&complaint.submission_date),
        amount: None,
        unread: false,
    }
}

pub fn payment_row(payment: &Payment) -> Row {
    Row {
        id: payment.id,
        title: payment
            .request_type
            .clone()
            .unwrap_or_else(|| format!("Request #{}", payment.request_id)),
        detail: payment.payment_method.clone(),
        status_label: payment.status.label().to_string(),
        status_class: payment.status.category(),
        date: format_date(&payment.payment_date),
        amount: Some(format_currency(payment.amount)),
        unread: false,
    }
}

pub fn notification_row(notification: &Notification) -> Row {
    let status = if notification.is_read {
        Status::Completed
    } else {
        Status::Submitted
    };
    Row {
        id: notification.id,
        title: notification.title.clone(),
        detail: notification.message.clone(),
        status_label: if notification.is_read { "Read" } else { "Unread" }.to_string(),
        status_class: status.category(),
        date: format_date(&notification.created_at),
        amount: None,
        unread: !notification.is_read,
    }
}

pub fn render_requests(items: &[ServiceRequest], filter: &StatusFilter, term: &str) -> Vec<Row> {
    visible(items, filter, term).into_iter().map(request_row).collect()
}

pub fn render_complaints(items: &[Complaint], filter: &StatusFilter, term: &str) -> Vec<Row> {
    visible(items, filter, term).into_iter().map(complaint_row).collect()
}

pub fn render_payments(items: &[Payment], filter: &StatusFilter, term: &str) -> Vec<Row> {
    visible(items, filter, term).into_iter().map(payment_row).collect()
}

pub fn render_notifications(items: &[Notification], filter: &StatusFilter, term: &str) -> Vec<Row> {
    visible(items, filter, term)
        .into_iter()
        .map(notification_row)
        .collect()
}

//=========================================================================================
// Formatting
//=========================================================================================

/// Renders a backend timestamp as "Mar 01, 2024". Anything unparseable is
/// shown as-is.
pub fn format_date(raw: &str) -> String {
    const DISPLAY: &str = "%b %d, %Y";
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format(DISPLAY).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format(DISPLAY).to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.format(DISPLAY).to_string();
    }
    raw.to_string()
}

/// "$1,234.50"
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
