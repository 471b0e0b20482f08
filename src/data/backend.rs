// ABOUTME: Backend trait abstraction for the loan management API
// Screens talk to this interface so the REST client can be swapped for a mock in tests

use crate::data::models::{Customer, Loan, LoanStatus, Page, Record, ResourceKind};
use crate::utils::error::Result;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// A successful API answer: the decoded body plus the HTTP status it came with.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, data: T) -> Self {
        Self { status, data }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            data: f(self.data),
        }
    }
}

/// Trait for abstracting access to the loan management API
///
/// Every resource collection supports the same five operations; the few
/// filtered lookups the API offers get their own methods.
/// All implementations must be thread-safe (Send + Sync).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Base URL requests are sent to, for diagnostics.
    fn base_url(&self) -> String;

    /// Fetch every record of a collection.
    async fn list(&self, kind: ResourceKind) -> Result<ApiResponse<Vec<Record>>>;

    /// Fetch one record by id.
    async fn get(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse<Record>>;

    /// Create a record. The kind is taken from the record itself.
    async fn create(&self, record: &Record) -> Result<ApiResponse<Record>>;

    /// Replace the record with the given id.
    async fn update(&self, id: i64, record: &Record) -> Result<ApiResponse<Record>>;

    /// Delete a record. The API answers with plain text, which is discarded.
    async fn delete(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse<()>>;

    /// Look up a customer by exact email address.
    async fn customer_by_email(&self, email: &str) -> Result<ApiResponse<Customer>>;

    /// Customers whose credit score is at least `min_score`.
    async fn customers_by_credit_score(&self, min_score: f64) -> Result<ApiResponse<Vec<Customer>>>;

    /// One page of customers; `page` is zero-based.
    async fn customers_page(&self, page: u32, size: u32) -> Result<ApiResponse<Page<Customer>>>;

    /// Loans in the given status. An empty result is not an error.
    async fn loans_by_status(&self, status: LoanStatus) -> Result<ApiResponse<Vec<Loan>>>;
}
