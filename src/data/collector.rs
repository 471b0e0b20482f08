// ABOUTME: Runs screen actions as background tasks and stores their results
// Keeps network calls off the UI thread; the UI picks up changes on the next frame

use crate::app::state::{AppEvent, AppState, PageCursor, Tab};
use crate::data::models::{LoanStatus, Record, ResourceKind};
use crate::data::operations::ScreenOps;
use crate::utils::error::{LoanDeskError, Result};
use crossbeam_channel::Sender;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct DataCollector {
    ops: ScreenOps,
    state: Arc<AppState>,
    event_tx: Sender<AppEvent>,
}

impl DataCollector {
    pub fn new(ops: ScreenOps, state: Arc<AppState>, event_tx: Sender<AppEvent>) -> Self {
        Self {
            ops,
            state,
            event_tx,
        }
    }

    pub fn ops(&self) -> &ScreenOps {
        &self.ops
    }

    fn spawn<F>(&self, task: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        state.begin_request();
        tokio::spawn(async move {
            task.await;
            state.end_request();
        })
    }

    fn send_event(tx: &Sender<AppEvent>, event: AppEvent) -> Result<()> {
        tx.send(event)?;
        Ok(())
    }

    fn notify(tx: &Sender<AppEvent>, event: AppEvent) {
        if let Err(e) = Self::send_event(tx, event) {
            debug!("UI gone, dropping event: {}", e);
        }
    }

    /// Stores a collection. Its filter label and page cursor belong to the tab,
    /// so they are only applied while that tab is still the active one.
    fn publish(
        &self,
        kind: ResourceKind,
        records: Vec<Record>,
        filter: Option<String>,
        page: Option<PageCursor>,
    ) {
        self.state.set_records(kind, records);
        if self.state.active_tab().resource() == Some(kind) {
            self.state.set_filter(filter);
            self.state.set_customer_page(page);
        }
    }

    /// Reloads whatever the tab shows, plus its form pickers.
    pub fn refresh(&self, tab: Tab) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        self.spawn(async move {
            match tab.resource() {
                None => {
                    if let Some(stats) = this.ops.dashboard().await {
                        this.state.set_dashboard(stats);
                    }
                    Self::notify(&this.event_tx, AppEvent::DashboardUpdated);
                }
                Some(kind) => {
                    if let Some(records) = this.ops.load(kind).await {
                        this.publish(kind, records, None, None);
                    }
                    for lookup in tab.lookups() {
                        if let Some(records) = this.ops.load_quietly(*lookup).await {
                            this.state.set_lookup(*lookup, records);
                        }
                    }
                    Self::notify(&this.event_tx, AppEvent::DataUpdated(kind));
                }
            }
        })
    }

    /// Re-fetches a collection after a mutation without replacing the mutation's report.
    async fn reload_quietly(&self, kind: ResourceKind) {
        if let Some(records) = self.ops.load_quietly(kind).await {
            self.publish(kind, records, None, None);
        }
        Self::notify(&self.event_tx, AppEvent::DataUpdated(kind));
    }

    pub fn save(&self, record: Record, editing: Option<i64>) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        self.spawn(async move {
            let kind = record.kind();
            if this.ops.save(record, editing).await.is_some() {
                this.reload_quietly(kind).await;
            }
        })
    }

    pub fn delete(&self, kind: ResourceKind, id: i64) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        self.spawn(async move {
            if this.ops.remove(kind, id).await {
                this.reload_quietly(kind).await;
            }
        })
    }

    pub fn filter_loans(&self, status: LoanStatus) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        self.spawn(async move {
            let loans = this.ops.loans_by_status(status).await.unwrap_or_default();
            this.publish(
                ResourceKind::Loan,
                loans.into_iter().map(Record::Loan).collect(),
                Some(format!("status: {}", status)),
                None,
            );
            Self::notify(&this.event_tx, AppEvent::DataUpdated(ResourceKind::Loan));
        })
    }

    pub fn search_email(&self, email: String) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        self.spawn(async move {
            if email.trim().is_empty() {
                return;
            }
            let found = this.ops.customer_by_email(&email).await;
            this.publish(
                ResourceKind::Customer,
                found.into_iter().map(Record::Customer).collect(),
                Some(format!("email: {}", email.trim())),
                None,
            );
            Self::notify(&this.event_tx, AppEvent::DataUpdated(ResourceKind::Customer));
        })
    }

    pub fn filter_credit_score(&self, min_score: f64) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        self.spawn(async move {
            let customers = this
                .ops
                .customers_by_credit_score(min_score)
                .await
                .unwrap_or_default();
            this.publish(
                ResourceKind::Customer,
                customers.into_iter().map(Record::Customer).collect(),
                Some(format!("credit score >= {}", min_score)),
                None,
            );
            Self::notify(&this.event_tx, AppEvent::DataUpdated(ResourceKind::Customer));
        })
    }

    pub fn customer_page(&self, page: u32) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        let size = self.state.config.page_size;
        self.spawn(async move {
            if let Some(result) = this.ops.customers_page(page, size).await {
                let cursor = PageCursor {
                    page: result.number,
                    total_pages: result.total_pages.max(1),
                };
                this.publish(
                    ResourceKind::Customer,
                    result.content.into_iter().map(Record::Customer).collect(),
                    None,
                    Some(cursor),
                );
            }
            Self::notify(&this.event_tx, AppEvent::DataUpdated(ResourceKind::Customer));
        })
    }

    /// Reports a form that failed validation; nothing is sent.
    pub fn reject(&self, err: &LoanDeskError) {
        self.ops.reject(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::AppConfig;
    use crate::data::backend::{ApiResponse, MockBackend};
    use crate::data::models::{loan_ref, Customer, Guarantor, LoanType};
    use crate::status::{StatusCode, StatusKind, StatusStore};
    use crossbeam_channel::unbounded;

    fn collector(mock: MockBackend) -> (DataCollector, Arc<AppState>, StatusStore) {
        let store = StatusStore::new();
        let state = Arc::new(AppState::new(AppConfig::default()));
        let (tx, _rx) = unbounded();
        let ops = ScreenOps::new(Arc::new(mock), store.clone());
        (DataCollector::new(ops, Arc::clone(&state), tx), state, store)
    }

    #[tokio::test]
    async fn test_refresh_loans_fills_lookups() {
        let mut mock = MockBackend::new();
        mock.expect_list().returning(|kind| {
            let data = match kind {
                ResourceKind::Loan => vec![Record::Loan(loan_ref(1))],
                ResourceKind::Customer => vec![Record::Customer(Customer::default())],
                ResourceKind::LoanType => vec![
                    Record::LoanType(LoanType::default()),
                    Record::LoanType(LoanType::default()),
                ],
                _ => Vec::new(),
            };
            Ok(ApiResponse::new(200, data))
        });
        let (collector, state, store) = collector(mock);

        collector.refresh(Tab::Loans).await.unwrap();
        assert_eq!(state.records(ResourceKind::Loan).len(), 1);
        assert_eq!(state.lookup(ResourceKind::Customer).len(), 1);
        assert_eq!(state.lookup(ResourceKind::LoanType).len(), 2);
        assert!(!state.is_loading());
        // Only the table load reports
        assert_eq!(store.current().unwrap().message, "Successfully loaded 1 loans");
    }

    #[tokio::test]
    async fn test_save_keeps_mutation_report() {
        let mut mock = MockBackend::new();
        mock.expect_create()
            .returning(|record| Ok(ApiResponse::new(201, record.clone())));
        mock.expect_list().returning(|_| {
            Ok(ApiResponse::new(
                200,
                vec![Record::Guarantor(Guarantor::default())],
            ))
        });
        let (collector, state, store) = collector(mock);

        collector
            .save(Record::Guarantor(Guarantor::default()), None)
            .await
            .unwrap();
        assert_eq!(state.records(ResourceKind::Guarantor).len(), 1);
        let status = store.current().unwrap();
        assert_eq!(status.kind, StatusKind::Success);
        assert_eq!(status.message, "Guarantor created successfully");
    }

    #[tokio::test]
    async fn test_late_load_leaves_other_tab_alone() {
        let mut mock = MockBackend::new();
        mock.expect_list().returning(|kind| {
            let data = match kind {
                ResourceKind::Customer => vec![Record::Customer(Customer::default())],
                _ => Vec::new(),
            };
            Ok(ApiResponse::new(200, data))
        });
        let (collector, state, _store) = collector(mock);

        // The user moved on to a filtered loans view before customers arrived
        state.set_active_tab(Tab::Loans);
        state.set_records(
            ResourceKind::Loan,
            (1..=3).map(|id| Record::Loan(loan_ref(id))).collect(),
        );
        state.move_selection(2);
        state.set_filter(Some("status: PENDING".to_string()));

        collector.refresh(Tab::Customers).await.unwrap();

        assert_eq!(state.records(ResourceKind::Customer).len(), 1);
        assert_eq!(state.filter().as_deref(), Some("status: PENDING"));
        assert_eq!(state.selected(), 2);
    }

    #[test]
    fn test_closed_ui_channel_is_channel_send_error() {
        let (tx, rx) = unbounded();
        drop(rx);
        let err = DataCollector::send_event(&tx, AppEvent::DashboardUpdated).unwrap_err();
        assert!(matches!(err, LoanDeskError::ChannelSend(_)));
        assert_eq!(err.status_code(), Some(StatusCode::UnknownError));
    }

    #[tokio::test]
    async fn test_failed_loan_filter_empties_table() {
        let mut mock = MockBackend::new();
        mock.expect_loans_by_status().returning(|_| {
            Err(LoanDeskError::Http {
                status: 500,
                message: None,
            })
        });
        let (collector, state, store) = collector(mock);
        state.set_active_tab(Tab::Loans);
        state.set_records(ResourceKind::Loan, vec![Record::Loan(loan_ref(4))]);

        collector.filter_loans(LoanStatus::Rejected).await.unwrap();
        assert!(state.records(ResourceKind::Loan).is_empty());
        assert_eq!(state.filter().as_deref(), Some("status: REJECTED"));
        assert_eq!(store.current().unwrap().kind, StatusKind::Error);
    }
}
