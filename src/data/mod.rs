pub mod backend;
pub mod collector;
pub mod models;
pub mod operations;
pub mod rest;


pub use backend::{ApiResponse, Backend};
pub use collector::DataCollector;
pub use models::{
    Customer, DashboardStats, Guarantor, Loan, LoanStatus, LoanType, Page, Payment, Record,
    ResourceKind,
};
pub use operations::ScreenOps;
pub use rest::RestBackend;
