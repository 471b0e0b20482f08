// ABOUTME: Resource models exchanged with the loan management API
// Field names follow the API's camelCase JSON

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Customer,
    Loan,
    LoanType,
    Guarantor,
    Payment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        Self::Customer,
        Self::Loan,
        Self::LoanType,
        Self::Guarantor,
        Self::Payment,
    ];

    /// Collection path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Loan => "loans",
            Self::LoanType => "loantypes",
            Self::Guarantor => "guarantors",
            Self::Payment => "payments",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Loan => "loan",
            Self::LoanType => "loan type",
            Self::Guarantor => "guarantor",
            Self::Payment => "payment",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Loan => "loans",
            Self::LoanType => "loan types",
            Self::Guarantor => "guarantors",
            Self::Payment => "payments",
        }
    }

    /// Singular label with a leading capital, for status messages.
    pub fn title(&self) -> String {
        let singular = self.singular();
        let mut chars = singular.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plural())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub credit_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_type_id: Option<i64>,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<i64>,
    #[serde(default)]
    pub loan_amount: Option<f64>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
    #[serde(default)]
    pub tenure_months: Option<i32>,
    /// Kept as text so unexpected server values still display.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub loan_type: Option<LoanType>,
}

impl Loan {
    pub fn loan_status(&self) -> Option<LoanStatus> {
        self.status.as_deref().and_then(LoanStatus::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guarantor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarantor_id: Option<i64>,
    #[serde(default)]
    pub guarantor_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub credit_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<i64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default, with = "payment_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub loan: Option<Loan>,
}

// The API sends either `2024-03-01` or a full timestamp. Anything else is rejected
// rather than dropped, so an edit never sends back a blank date.
mod payment_date {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| {
            let day = s.get(..10).unwrap_or(s.as_str());
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|e| D::Error::custom(format!("invalid paymentDate '{}': {}", s, e)))
        })
        .transpose()
    }
}

/// Reference to a related resource by id, as the API expects in request bodies.
pub fn customer_ref(id: i64) -> Customer {
    Customer {
        customer_id: Some(id),
        ..Customer::default()
    }
}

pub fn loan_type_ref(id: i64) -> LoanType {
    LoanType {
        loan_type_id: Some(id),
        ..LoanType::default()
    }
}

pub fn loan_ref(id: i64) -> Loan {
    Loan {
        loan_id: Some(id),
        loan_amount: None,
        interest_rate: None,
        tenure_months: None,
        status: None,
        customer: None,
        loan_type: None,
    }
}

/// Any one resource, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Customer(Customer),
    Loan(Loan),
    LoanType(LoanType),
    Guarantor(Guarantor),
    Payment(Payment),
}

impl Record {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Record::Customer(_) => ResourceKind::Customer,
            Record::Loan(_) => ResourceKind::Loan,
            Record::LoanType(_) => ResourceKind::LoanType,
            Record::Guarantor(_) => ResourceKind::Guarantor,
            Record::Payment(_) => ResourceKind::Payment,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Record::Customer(c) => c.customer_id,
            Record::Loan(l) => l.loan_id,
            Record::LoanType(t) => t.loan_type_id,
            Record::Guarantor(g) => g.guarantor_id,
            Record::Payment(p) => p.payment_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Record::Customer(c) => serde_json::to_value(c),
            Record::Loan(l) => serde_json::to_value(l),
            Record::LoanType(t) => serde_json::to_value(t),
            Record::Guarantor(g) => serde_json::to_value(g),
            Record::Payment(p) => serde_json::to_value(p),
        }
    }

    pub fn from_json(kind: ResourceKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            ResourceKind::Customer => Record::Customer(serde_json::from_value(value)?),
            ResourceKind::Loan => Record::Loan(serde_json::from_value(value)?),
            ResourceKind::LoanType => Record::LoanType(serde_json::from_value(value)?),
            ResourceKind::Guarantor => Record::Guarantor(serde_json::from_value(value)?),
            ResourceKind::Payment => Record::Payment(serde_json::from_value(value)?),
        })
    }

    pub fn list_from_json(kind: ResourceKind, value: serde_json::Value) -> serde_json::Result<Vec<Self>> {
        let items: Vec<serde_json::Value> = serde_json::from_value(value)?;
        items.into_iter().map(|v| Self::from_json(kind, v)).collect()
    }
}

/// Paginated envelope returned by `/customers/page/{page}/{size}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// Aggregates shown on the dashboard tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub customers: usize,
    pub loans: usize,
    pub loan_types: usize,
    pub guarantors: usize,
    pub payments: usize,
    pub total_loan_amount: f64,
    pub total_payments: f64,
}

impl DashboardStats {
    pub fn from_collections(
        customers: &[Record],
        loans: &[Record],
        loan_types: &[Record],
        guarantors: &[Record],
        payments: &[Record],
    ) -> Self {
        let total_loan_amount = loans
            .iter()
            .filter_map(|r| match r {
                Record::Loan(l) => l.loan_amount,
                _ => None,
            })
            .sum();
        let total_payments = payments
            .iter()
            .filter_map(|r| match r {
                Record::Payment(p) => p.amount,
                _ => None,
            })
            .sum();

        Self {
            customers: customers.len(),
            loans: loans.len(),
            loan_types: loan_types.len(),
            guarantors: guarantors.len(),
            payments: payments.len(),
            total_loan_amount,
            total_payments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loan_deserializes_nested_refs() {
        let value = json!({
            "loanId": 3,
            "loanAmount": 250000.0,
            "interestRate": 8.5,
            "tenureMonths": 240,
            "status": "APPROVED",
            "customer": {"customerId": 1, "customerName": "Asha Rao", "email": "asha@example.com"},
            "loanType": {"loanTypeId": 2, "typeName": "Home Loan", "interestRate": 8.5}
        });
        let record = Record::from_json(ResourceKind::Loan, value).unwrap();
        assert_eq!(record.id(), Some(3));
        assert_eq!(record.kind(), ResourceKind::Loan);
        match record {
            Record::Loan(loan) => {
                assert_eq!(loan.loan_status(), Some(LoanStatus::Approved));
                assert_eq!(loan.customer.unwrap().customer_name, "Asha Rao");
                assert_eq!(loan.loan_type.unwrap().type_name, "Home Loan");
            }
            other => panic!("expected loan, got {:?}", other),
        }
    }

    #[test]
    fn test_new_record_omits_id() {
        let customer = Customer {
            customer_name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            credit_score: Some(710.0),
            ..Customer::default()
        };
        let value = Record::Customer(customer).to_json().unwrap();
        assert!(value.get("customerId").is_none());
        assert_eq!(value["customerName"], "Ravi");
        assert_eq!(value["creditScore"], 710.0);
    }

    #[test]
    fn test_payment_date_accepts_timestamps() {
        let value = json!({"paymentId": 9, "amount": 1200.0, "paymentDate": "2024-03-01T00:00:00.000+00:00"});
        let payment: Payment = serde_json::from_value(value).unwrap();
        assert_eq!(payment.payment_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let out = serde_json::to_value(&payment).unwrap();
        assert_eq!(out["paymentDate"], "2024-03-01");
    }

    #[test]
    fn test_malformed_payment_date_is_an_error() {
        let value = json!({"paymentId": 9, "amount": 1200.0, "paymentDate": "01/03/2024"});
        assert!(serde_json::from_value::<Payment>(value).is_err());

        let value = json!({"paymentId": 9, "amount": 1200.0, "paymentDate": null});
        let payment: Payment = serde_json::from_value(value).unwrap();
        assert_eq!(payment.payment_date, None);
    }

    #[test]
    fn test_page_envelope() {
        let value = json!({
            "content": [{"customerId": 1, "customerName": "A", "email": "a@x.io"}],
            "totalElements": 11,
            "totalPages": 2,
            "number": 0,
            "size": 10
        });
        let page: Page<Customer> = serde_json::from_value(value).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_dashboard_totals() {
        let loans = vec![
            Record::Loan(Loan { loan_amount: Some(1000.0), ..loan_ref(1) }),
            Record::Loan(Loan { loan_amount: None, ..loan_ref(2) }),
            Record::Loan(Loan { loan_amount: Some(2500.5), ..loan_ref(3) }),
        ];
        let payments = vec![Record::Payment(Payment {
            payment_id: Some(1),
            amount: Some(300.0),
            payment_date: None,
            loan: Some(loan_ref(1)),
        })];
        let stats = DashboardStats::from_collections(&[], &loans, &[], &[], &payments);
        assert_eq!(stats.loans, 3);
        assert_eq!(stats.total_loan_amount, 3500.5);
        assert_eq!(stats.total_payments, 300.0);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ResourceKind::LoanType.path(), "loantypes");
        assert_eq!(ResourceKind::LoanType.title(), "Loan type");
        assert_eq!(ResourceKind::Guarantor.plural(), "guarantors");
    }
}
