//! services/portal/src/bin/portal.rs

use bytes::Bytes;
use civic_portal_core::{
    dashboard::AttachmentOutcome,
    domain::{
        Credentials, FileUpload, NewComplaint, NewFeedback, NewServiceRequest, ProfileUpdate,
        Registration, Resource, StatusFilter, Tab,
    },
    facades::ListQuery,
    render::{self, Row},
    session::AuthStore,
    ApiClient, Dashboard,
};
use clap::{Parser, Subcommand, ValueEnum};
use portal_lib::{
    adapters::{FileSessionStorage, ReqwestTransport},
    config::Config,
    error::PortalError,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Citizen dashboard for the municipal services portal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        /// Keep the session only for this process instead of remembering it.
        #[arg(long)]
        forget: bool,
    },
    /// Create a citizen account and sign in.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        middle_name: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Sign out and forget the stored session.
    Logout {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the signed-in account.
    Whoami,
    /// Load everything and show one tab of the dashboard.
    Dashboard {
        #[arg(long, value_enum, default_value_t = TabArg::Overview)]
        tab: TabArg,
        /// `all`, a status such as `under_review`, or `read`/`unread` for notifications.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Submit a service request, optionally with one attachment.
    NewRequest {
        #[arg(long = "type")]
        request_type: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Submit a complaint, optionally with one attachment.
    NewComplaint {
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Rate a service, 1 to 5.
    Feedback {
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        request_id: Option<i64>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Mark one notification as read.
    Read { id: i64 },
    /// Mark every notification as read.
    ReadAll,
    /// Change phone, address or marital status.
    ProfileUpdate {
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        marital_status: Option<String>,
    },
    /// List active announcements.
    Announcements {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TabArg {
    Overview,
    Requests,
    Complaints,
    Payments,
    Notifications,
}

impl From<TabArg> for Tab {
    fn from(arg: TabArg) -> Self {
        match arg {
            TabArg::Overview => Tab::Overview,
            TabArg::Requests => Tab::Requests,
            TabArg::Complaints => Tab::Complaints,
            TabArg::Payments => Tab::Payments,
            TabArg::Notifications => Tab::Notifications,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", PortalError::from(e));
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(origin = %config.origin, "Configuration loaded");

    // --- 2. Run the Command ---
    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.requires_login() => {
            eprintln!("Your session has ended. Please log in with `portal login`.");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<(), PortalError> {
    // --- Initialize Adapters & the Session ---
    let transport = Arc::new(ReqwestTransport::new(config.api_base(), config.timeout)?);
    let storage = Arc::new(FileSessionStorage::new(&config.session_dir));
    let client = ApiClient::new(transport, storage);
    let mut auth = AuthStore::restore(client.clone());

    match command {
        Command::Login {
            email,
            password,
            forget,
        } => {
            let profile = auth
                .login(&Credentials { email, password }, !forget)
                .await
                .map_err(PortalError::from_sign_in)?;
            if forget {
                warn!("Session was not remembered; it ends with this process");
            }
            println!("Signed in as {} ({})", profile.email, profile.role);
        }
        Command::Register {
            email,
            password,
            national_id,
            first_name,
            last_name,
            date_of_birth,
            phone,
            middle_name,
            address,
        } => {
            let registration = Registration {
                email,
                password,
                phone,
                national_id,
                first_name,
                middle_name,
                last_name,
                date_of_birth,
                father_name: None,
                mother_name: None,
                address,
                marital_status: None,
            };
            let profile = auth
                .register(&registration, true)
                .await
                .map_err(PortalError::from_sign_in)?;
            println!("Account created. Signed in as {}", profile.email);
        }
        Command::Logout { yes } => {
            if auth.logout(|prompt| yes || confirm(prompt)).await {
                println!("Signed out.");
            } else {
                println!("Still signed in.");
            }
        }
        Command::Whoami => {
            require_session(&auth)?;
            let profile = auth.current_user().await?;
            println!("{} (id {}, {})", profile.email, profile.user_id, profile.role);
        }
        Command::Dashboard { tab, filter, search } => {
            require_session(&auth)?;
            let tab = Tab::from(tab);
            if let (Some(resource), Some(token)) = (tab.resource(), &filter) {
                if !resource.accepts(&StatusFilter::parse(token)) {
                    return Err(PortalError::Usage(format!(
                        "Unknown {} filter '{}'; expected one of: {}",
                        resource,
                        token,
                        resource.filter_tokens().join(", ")
                    )));
                }
            }

            let mut dashboard = Dashboard::new(client);
            let report = dashboard.load_all().await;
            for (resource, e) in &report.failed {
                eprintln!("Could not load {}: {}", resource, e);
            }

            dashboard.set_tab(tab);
            match tab.resource() {
                Some(resource) => {
                    if let Some(token) = &filter {
                        dashboard.apply_filter(resource, token);
                    }
                    if let Some(term) = &search {
                        dashboard.apply_search(resource, term);
                    }
                    print_rows(resource, &dashboard.rows(resource));
                }
                None => print_overview(&dashboard),
            }
        }
        Command::NewRequest {
            request_type,
            description,
            file,
        } => {
            require_session(&auth)?;
            let upload = read_upload(file.as_deref()).await?;
            let mut dashboard = Dashboard::new(client);
            let created = dashboard
                .create_request(
                    &NewServiceRequest {
                        request_type,
                        description,
                    },
                    upload,
                )
                .await?;
            println!(
                "Request #{} submitted ({})",
                created.record.id,
                created.record.status.label()
            );
            report_attachment(&created.attachment);
        }
        Command::NewComplaint {
            category,
            title,
            description,
            location,
            file,
        } => {
            require_session(&auth)?;
            let upload = read_upload(file.as_deref()).await?;
            let mut dashboard = Dashboard::new(client);
            let created = dashboard
                .create_complaint(
                    &NewComplaint {
                        category,
                        title,
                        description,
                        location,
                    },
                    upload,
                )
                .await?;
            println!("Complaint #{} submitted", created.record.id);
            report_attachment(&created.attachment);
        }
        Command::Feedback {
            rating,
            request_id,
            comment,
        } => {
            require_session(&auth)?;
            let mut dashboard = Dashboard::new(client);
            dashboard
                .submit_feedback(&NewFeedback {
                    request_id,
                    rating,
                    comment,
                })
                .await?;
            println!("Thank you for your feedback.");
        }
        Command::Read { id } => {
            require_session(&auth)?;
            let mut dashboard = Dashboard::new(client);
            dashboard.mark_notification_read(id).await?;
            println!("Notification #{} marked as read.", id);
        }
        Command::ReadAll => {
            require_session(&auth)?;
            let mut dashboard = Dashboard::new(client);
            dashboard.mark_all_notifications_read().await?;
            println!("All notifications marked as read.");
        }
        Command::ProfileUpdate {
            phone,
            address,
            marital_status,
        } => {
            require_session(&auth)?;
            if phone.is_none() && address.is_none() && marital_status.is_none() {
                return Err(PortalError::Usage(
                    "Nothing to update; pass --phone, --address or --marital-status".to_string(),
                ));
            }
            let mut dashboard = Dashboard::new(client);
            dashboard
                .update_profile(&ProfileUpdate {
                    phone,
                    address,
                    marital_status,
                })
                .await?;
            if let Some(profile) = dashboard.profile() {
                println!("Profile updated for {}", profile.display_name());
            }
        }
        Command::Announcements { category, limit } => {
            let query = ListQuery {
                category,
                limit,
                ..Default::default()
            };
            let announcements = client.announcements().active(&query).await?;
            if announcements.is_empty() {
                println!("No active announcements.");
            }
            for announcement in announcements {
                println!(
                    "[{}] {} ({}, {})\n    {}",
                    announcement.priority,
                    announcement.title,
                    announcement.category,
                    render::format_date(&announcement.issue_date),
                    announcement.content
                );
            }
        }
    }
    Ok(())
}

fn require_session(auth: &AuthStore) -> Result<(), PortalError> {
    if auth.is_authenticated() {
        Ok(())
    } else {
        Err(PortalError::LoginRequired)
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn read_upload(path: Option<&Path>) -> Result<Option<FileUpload>, PortalError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PortalError::Usage(format!("{} is not a file", path.display())))?;
    Ok(Some(FileUpload {
        content_type: guess_content_type(&file_name).map(str::to_string),
        file_name,
        bytes: Bytes::from(bytes),
    }))
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

fn report_attachment(outcome: &AttachmentOutcome) {
    match outcome {
        AttachmentOutcome::NotRequested => {}
        AttachmentOutcome::Uploaded(receipt) => {
            println!("Attached {}", receipt.original_filename);
        }
        AttachmentOutcome::Failed(e) => {
            eprintln!("Submitted, but the attachment could not be uploaded: {}", e);
        }
    }
}

fn print_overview(dashboard: &Dashboard) {
    if let Some(profile) = dashboard.profile() {
        println!("Welcome, {}", profile.display_name());
    }
    let stats = dashboard.stats();
    println!(
        "Requests: {} ({} open)   Complaints: {} ({} open)",
        stats.requests, stats.open_requests, stats.complaints, stats.open_complaints
    );
    println!(
        "Payments: {} ({} paid)   Unread notifications: {}",
        stats.payments,
        render::format_currency(stats.total_paid),
        stats.unread_notifications
    );
    for resource in Resource::ALL {
        let rows = dashboard.rows(resource);
        if !rows.is_empty() {
            println!();
            print_rows(resource, &rows[..rows.len().min(5)]);
        }
    }
}

fn print_rows(resource: Resource, rows: &[Row]) {
    println!("== {} ==", resource);
    if rows.is_empty() {
        println!("  (nothing to show)");
    }
    for row in rows {
        let marker = if row.unread { "*" } else { " " };
        let amount = row.amount.as_deref().unwrap_or("");
        println!(
            "{}#{:<5} {:<32} {:<20} {:<14} {}",
            marker, row.id, row.title, row.status_label, row.date, amount
        );
    }
}
