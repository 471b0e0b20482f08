// ABOUTME: Central application state shared by the UI thread and request tasks
// Holds the loaded collections, the active tab and request bookkeeping

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::config::AppConfig;
use crate::data::models::{DashboardStats, Record, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Dashboard,
    Customers,
    Loans,
    LoanTypes,
    Guarantors,
    Payments,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Customers,
        Tab::Loans,
        Tab::LoanTypes,
        Tab::Guarantors,
        Tab::Payments,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Customers => "Customers",
            Tab::Loans => "Loans",
            Tab::LoanTypes => "Loan Types",
            Tab::Guarantors => "Guarantors",
            Tab::Payments => "Payments",
        }
    }

    /// The collection a tab manages; the dashboard has none.
    pub fn resource(&self) -> Option<ResourceKind> {
        match self {
            Tab::Dashboard => None,
            Tab::Customers => Some(ResourceKind::Customer),
            Tab::Loans => Some(ResourceKind::Loan),
            Tab::LoanTypes => Some(ResourceKind::LoanType),
            Tab::Guarantors => Some(ResourceKind::Guarantor),
            Tab::Payments => Some(ResourceKind::Payment),
        }
    }

    /// Collections a tab's form needs for its pickers.
    pub fn lookups(&self) -> &'static [ResourceKind] {
        match self {
            Tab::Loans => &[ResourceKind::Customer, ResourceKind::LoanType],
            Tab::Payments => &[ResourceKind::Loan],
            _ => &[],
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Tab> {
        Self::ALL.get(index).copied()
    }

    pub fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Position within the paginated customer listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub active_tab: Mutex<Tab>,
    pub records: Mutex<HashMap<ResourceKind, Vec<Record>>>,
    // Picker data for forms, kept apart so it never replaces a filtered table
    pub lookups: Mutex<HashMap<ResourceKind, Vec<Record>>>,
    pub dashboard: Mutex<Option<DashboardStats>>,
    pub selected: Mutex<usize>,
    /// Describes a filter currently applied to the active table.
    pub filter: Mutex<Option<String>>,
    pub customer_page: Mutex<Option<PageCursor>>,
    pub last_refresh: Mutex<Option<DateTime<Local>>>,
    pending_requests: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            active_tab: Mutex::new(Tab::Dashboard),
            records: Mutex::new(HashMap::new()),
            lookups: Mutex::new(HashMap::new()),
            dashboard: Mutex::new(None),
            selected: Mutex::new(0),
            filter: Mutex::new(None),
            customer_page: Mutex::new(None),
            last_refresh: Mutex::new(None),
            pending_requests: AtomicUsize::new(0),
        }
    }

    pub fn active_tab(&self) -> Tab {
        *lock(&self.active_tab)
    }

    /// Switches tab, resetting the selection and any filter.
    pub fn set_active_tab(&self, tab: Tab) {
        *lock(&self.active_tab) = tab;
        *lock(&self.selected) = 0;
        *lock(&self.filter) = None;
        *lock(&self.customer_page) = None;
    }

    pub fn records(&self, kind: ResourceKind) -> Vec<Record> {
        lock(&self.records).get(&kind).cloned().unwrap_or_default()
    }

    /// Stores a collection. The selection is shared by all tabs, so it is only
    /// clamped when `kind` is the one on screen.
    pub fn set_records(&self, kind: ResourceKind, records: Vec<Record>) {
        let len = records.len();
        lock(&self.records).insert(kind, records);
        if self.active_tab().resource() == Some(kind) {
            let mut selected = lock(&self.selected);
            if *selected >= len {
                *selected = len.saturating_sub(1);
            }
        }
        *lock(&self.last_refresh) = Some(Local::now());
    }

    pub fn lookup(&self, kind: ResourceKind) -> Vec<Record> {
        lock(&self.lookups).get(&kind).cloned().unwrap_or_default()
    }

    pub fn set_lookup(&self, kind: ResourceKind, records: Vec<Record>) {
        lock(&self.lookups).insert(kind, records);
    }

    pub fn dashboard(&self) -> Option<DashboardStats> {
        lock(&self.dashboard).clone()
    }

    pub fn set_dashboard(&self, stats: DashboardStats) {
        *lock(&self.dashboard) = Some(stats);
        *lock(&self.last_refresh) = Some(Local::now());
    }

    pub fn selected(&self) -> usize {
        *lock(&self.selected)
    }

    /// The highlighted record of the active tab, if any.
    pub fn selected_record(&self) -> Option<Record> {
        let kind = self.active_tab().resource()?;
        let index = self.selected();
        lock(&self.records).get(&kind)?.get(index).cloned()
    }

    pub fn move_selection(&self, delta: isize) {
        let Some(kind) = self.active_tab().resource() else {
            return;
        };
        let len = lock(&self.records).get(&kind).map_or(0, Vec::len);
        let mut selected = lock(&self.selected);
        if len == 0 {
            *selected = 0;
            return;
        }
        let next = (*selected as isize + delta).clamp(0, len as isize - 1);
        *selected = next as usize;
    }

    pub fn filter(&self) -> Option<String> {
        lock(&self.filter).clone()
    }

    pub fn set_filter(&self, label: Option<String>) {
        *lock(&self.filter) = label;
    }

    pub fn customer_page(&self) -> Option<PageCursor> {
        *lock(&self.customer_page)
    }

    pub fn set_customer_page(&self, cursor: Option<PageCursor>) {
        *lock(&self.customer_page) = cursor;
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        *lock(&self.last_refresh)
    }

    pub fn begin_request(&self) {
        self.pending_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end_request(&self) {
        // Saturating: never wrap below zero
        let _ = self
            .pending_requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    pub fn is_loading(&self) -> bool {
        self.pending_requests.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A collection finished loading (or failed; the status says which).
    DataUpdated(ResourceKind),
    DashboardUpdated,
    Tick,
    Input(crossterm::event::KeyEvent),
    Resize(u16, u16),
    Quit,
}
