// ABOUTME: Screen actions against the API, each reporting exactly one outcome
// Translates backend results into status reports so screens never inspect errors themselves

use crate::data::backend::Backend;
use crate::data::models::{Customer, DashboardStats, Loan, LoanStatus, Page, Record, ResourceKind};
use crate::status::{StatusCode, StatusStore};
use crate::utils::error::LoanDeskError;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct ScreenOps {
    backend: Arc<dyn Backend>,
    status: StatusStore,
}

impl ScreenOps {
    pub fn new(backend: Arc<dyn Backend>, status: StatusStore) -> Self {
        Self { backend, status }
    }

    pub fn status(&self) -> &StatusStore {
        &self.status
    }

    fn report_failure(&self, err: &LoanDeskError, fallback: &str) {
        let message = err.server_message().unwrap_or(fallback);
        warn!("{} ({})", message, err);
        self.status.report_error(message, err.status_code());
    }

    /// Loads a whole collection.
    pub async fn load(&self, kind: ResourceKind) -> Option<Vec<Record>> {
        match self.backend.list(kind).await {
            Ok(response) => {
                self.status.report_success(
                    format!("Successfully loaded {} {}", response.data.len(), kind.plural()),
                    Some(StatusCode::Http(response.status)),
                );
                Some(response.data)
            }
            Err(err) => {
                // Server messages are ignored here, as they are for every fetch
                let message = format!(
                    "Failed to fetch {}. Make sure the backend is running.",
                    kind.plural()
                );
                warn!("{} ({})", message, err);
                self.status.report_error(message, err.status_code());
                None
            }
        }
    }

    /// Loads a collection for use in a picker without reporting success.
    pub async fn load_quietly(&self, kind: ResourceKind) -> Option<Vec<Record>> {
        match self.backend.list(kind).await {
            Ok(response) => Some(response.data),
            Err(err) => {
                warn!("Failed to fetch {}: {}", kind.plural(), err);
                None
            }
        }
    }

    /// Creates the record, or updates it when `editing` carries an id.
    pub async fn save(&self, record: Record, editing: Option<i64>) -> Option<Record> {
        let kind = record.kind();
        let result = match editing {
            Some(id) => self.backend.update(id, &record).await,
            None => self.backend.create(&record).await,
        };

        match result {
            Ok(response) => {
                let verb = if editing.is_some() { "updated" } else { "created" };
                self.status.report_success(
                    format!("{} {} successfully", kind.title(), verb),
                    Some(StatusCode::Http(response.status)),
                );
                Some(response.data)
            }
            Err(err) => {
                self.report_failure(&err, &format!("Failed to save {}", kind.singular()));
                None
            }
        }
    }

    pub async fn remove(&self, kind: ResourceKind, id: i64) -> bool {
        match self.backend.delete(kind, id).await {
            Ok(response) => {
                self.status.report_success(
                    format!("{} deleted successfully", kind.title()),
                    Some(StatusCode::Http(response.status)),
                );
                true
            }
            Err(err) => {
                self.report_failure(&err, &format!("Failed to delete {}", kind.singular()));
                false
            }
        }
    }

    pub async fn loans_by_status(&self, status: LoanStatus) -> Option<Vec<Loan>> {
        match self.backend.loans_by_status(status).await {
            Ok(response) => {
                self.status.report_info(
                    format!("Found {} loans with status: {}", response.data.len(), status),
                    Some(StatusCode::Http(response.status)),
                );
                Some(response.data)
            }
            Err(err) => {
                warn!("Loan status filter failed: {}", err);
                self.status
                    .report_error("No loans found with this status", err.status_code());
                None
            }
        }
    }

    /// Empty input is ignored without a report.
    pub async fn customer_by_email(&self, email: &str) -> Option<Customer> {
        let email = email.trim();
        if email.is_empty() {
            return None;
        }
        match self.backend.customer_by_email(email).await {
            Ok(response) => {
                self.status.report_info(
                    format!("Found customer with email: {}", email),
                    Some(StatusCode::Http(response.status)),
                );
                Some(response.data)
            }
            Err(err) => {
                warn!("Email lookup failed: {}", err);
                self.status
                    .report_error("Customer not found with this email", err.status_code());
                None
            }
        }
    }

    pub async fn customers_by_credit_score(&self, min_score: f64) -> Option<Vec<Customer>> {
        match self.backend.customers_by_credit_score(min_score).await {
            Ok(response) => {
                self.status.report_info(
                    format!(
                        "Found {} customers with credit score >= {}",
                        response.data.len(),
                        min_score
                    ),
                    Some(StatusCode::Http(response.status)),
                );
                Some(response.data)
            }
            Err(err) => {
                warn!("Credit score filter failed: {}", err);
                self.status.report_error(
                    "No customers found with this credit score",
                    err.status_code(),
                );
                None
            }
        }
    }

    pub async fn customers_page(&self, page: u32, size: u32) -> Option<Page<Customer>> {
        match self.backend.customers_page(page, size).await {
            Ok(response) => {
                let total = response.data.total_pages.max(1);
                self.status.report_info(
                    format!("Showing page {} of {}", page + 1, total),
                    Some(StatusCode::Http(response.status)),
                );
                Some(response.data)
            }
            Err(err) => {
                self.report_failure(&err, "Failed to fetch customers page");
                None
            }
        }
    }

    /// Fetches every collection concurrently and aggregates the totals.
    pub async fn dashboard(&self) -> Option<DashboardStats> {
        let result = futures::try_join!(
            self.backend.list(ResourceKind::Customer),
            self.backend.list(ResourceKind::Loan),
            self.backend.list(ResourceKind::LoanType),
            self.backend.list(ResourceKind::Guarantor),
            self.backend.list(ResourceKind::Payment),
        );

        match result {
            Ok((customers, loans, loan_types, guarantors, payments)) => {
                Some(DashboardStats::from_collections(
                    &customers.data,
                    &loans.data,
                    &loan_types.data,
                    &guarantors.data,
                    &payments.data,
                ))
            }
            Err(err) => {
                let message = format!(
                    "Failed to fetch statistics. Make sure the backend is running on {}",
                    self.backend.base_url()
                );
                warn!("{} ({})", message, err);
                self.status.report_error(message, err.status_code());
                None
            }
        }
    }

    /// Reports a form that could not be turned into a request.
    pub fn reject(&self, err: &LoanDeskError) {
        let message = match err {
            LoanDeskError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        };
        self.status.report_error(message, err.status_code());
    }
}
