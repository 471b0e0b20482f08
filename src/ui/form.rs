// ABOUTME: Keyboard-driven forms for creating, editing and filtering records
// Converts typed field values into API records with the same validation rules as the web forms

use crate::data::models::{
    customer_ref, loan_ref, loan_type_ref, Customer, Guarantor, Loan, LoanStatus, LoanType,
    Payment, Record, ResourceKind,
};
use crate::utils::error::{LoanDeskError, Result};
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const LOAN_STATUSES: &[&str] = &["PENDING", "APPROVED", "REJECTED"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPurpose {
    Create(ResourceKind),
    Edit(ResourceKind, i64),
    LoanStatusFilter,
    CreditScoreFilter,
    EmailSearch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub required: bool,
    /// Fixed set of values cycled with ←/→.
    pub choices: &'static [&'static str],
    pub hint: Option<String>,
}

impl FormField {
    fn new(label: &'static str, value: impl Into<String>, required: bool) -> Self {
        Self {
            label,
            value: value.into(),
            required,
            choices: &[],
            hint: None,
        }
    }

    fn with_choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    fn cycle(&mut self, forward: bool) {
        if self.choices.is_empty() {
            return;
        }
        let len = self.choices.len();
        let next = match self.choices.iter().position(|c| *c == self.value) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.value = self.choices[next].to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Editing,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub purpose: FormPurpose,
    pub fields: Vec<FormField>,
    pub focus: usize,
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl FormState {
    /// Blank form for a new record.
    pub fn create(kind: ResourceKind) -> Self {
        let fields = match kind {
            ResourceKind::Customer => vec![
                FormField::new("Customer Name", "", true),
                FormField::new("Email", "", true),
                FormField::new("Phone Number", "", false),
                FormField::new("Address", "", false),
                FormField::new("Credit Score", "", false),
            ],
            ResourceKind::Loan => vec![
                FormField::new("Loan Amount", "", true),
                FormField::new("Interest Rate (%)", "", false),
                FormField::new("Tenure (Months)", "", false),
                FormField::new("Status", "", true).with_choices(LOAN_STATUSES),
                FormField::new("Customer ID", "", true),
                FormField::new("Loan Type ID", "", true),
            ],
            ResourceKind::LoanType => vec![
                FormField::new("Type Name", "", true),
                FormField::new("Description", "", false),
                FormField::new("Interest Rate (%)", "", false),
            ],
            ResourceKind::Guarantor => vec![
                FormField::new("Guarantor Name", "", true),
                FormField::new("Email", "", false),
                FormField::new("Phone Number", "", false),
                FormField::new("Address", "", false),
                FormField::new("Credit Score", "", false),
            ],
            ResourceKind::Payment => vec![
                FormField::new("Payment Amount", "", true),
                FormField::new(
                    "Payment Date",
                    Local::now().date_naive().format("%Y-%m-%d").to_string(),
                    true,
                ),
                FormField::new("Loan ID", "", true),
            ],
        };

        Self {
            purpose: FormPurpose::Create(kind),
            fields,
            focus: 0,
        }
    }

    /// Form pre-filled from an existing record. Returns `None` for records without an id.
    pub fn edit(record: &Record) -> Option<Self> {
        let id = record.id()?;
        let kind = record.kind();
        let mut form = Self::create(kind);
        form.purpose = FormPurpose::Edit(kind, id);

        let values: Vec<String> = match record {
            Record::Customer(c) => vec![
                c.customer_name.clone(),
                c.email.clone(),
                text(&c.phone_number),
                text(&c.address),
                number(c.credit_score),
            ],
            Record::Loan(l) => vec![
                number(l.loan_amount),
                number(l.interest_rate),
                number(l.tenure_months),
                text(&l.status),
                number(l.customer.as_ref().and_then(|c| c.customer_id)),
                number(l.loan_type.as_ref().and_then(|t| t.loan_type_id)),
            ],
            Record::LoanType(t) => vec![
                t.type_name.clone(),
                text(&t.description),
                number(t.interest_rate),
            ],
            Record::Guarantor(g) => vec![
                g.guarantor_name.clone(),
                text(&g.email),
                text(&g.phone_number),
                text(&g.address),
                number(g.credit_score),
            ],
            Record::Payment(p) => vec![
                number(p.amount),
                p.payment_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                number(p.loan.as_ref().and_then(|l| l.loan_id)),
            ],
        };

        for (field, value) in form.fields.iter_mut().zip(values) {
            field.value = value;
        }
        Some(form)
    }

    /// Single-field prompt for a filter or search.
    pub fn prompt(purpose: FormPurpose) -> Self {
        let field = match purpose {
            FormPurpose::LoanStatusFilter => {
                FormField::new("Status", "PENDING", true).with_choices(LOAN_STATUSES)
            }
            FormPurpose::CreditScoreFilter => FormField::new("Minimum Credit Score", "", true),
            FormPurpose::EmailSearch => FormField::new("Email", "", true),
            FormPurpose::Create(kind) | FormPurpose::Edit(kind, _) => return Self::create(kind),
        };
        Self {
            purpose,
            fields: vec![field],
            focus: 0,
        }
    }

    pub fn title(&self) -> String {
        match self.purpose {
            FormPurpose::Create(kind) => format!("Add New {}", title_case(kind.singular())),
            FormPurpose::Edit(kind, id) => format!("Edit {} #{}", title_case(kind.singular()), id),
            FormPurpose::LoanStatusFilter => "Filter Loans by Status".to_string(),
            FormPurpose::CreditScoreFilter => "Filter Customers by Credit Score".to_string(),
            FormPurpose::EmailSearch => "Search Customer by Email".to_string(),
        }
    }

    pub fn set_hint(&mut self, label: &str, hint: String) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label) {
            field.hint = Some(hint);
        }
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        let len = self.fields.len().max(1);
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Enter => return FormOutcome::Submit,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % len,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + len - 1) % len,
            KeyCode::Left | KeyCode::Right => {
                if let Some(field) = self.focused_mut() {
                    field.cycle(key.code == KeyCode::Right);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.focused_mut() {
                    field.value.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = self.focused_mut() {
                    field.value.push(c);
                }
            }
            _ => {}
        }
        FormOutcome::Editing
    }

    fn focused_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focus)
    }

    fn required(&self, label: &'static str) -> Result<String> {
        let value = self.value(label).trim();
        if value.is_empty() {
            return Err(LoanDeskError::Validation(format!("{} is required", label)));
        }
        Ok(value.to_string())
    }

    fn optional(&self, label: &'static str) -> Option<String> {
        let value = self.value(label).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    fn optional_number(&self, label: &'static str, min: f64, max: Option<f64>) -> Result<Option<f64>> {
        let Some(raw) = self.optional(label) else {
            return Ok(None);
        };
        let value: f64 = raw
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| LoanDeskError::Validation(format!("{} must be a number", label)))?;
        match max {
            Some(max) if value < min || value > max => Err(LoanDeskError::Validation(format!(
                "{} must be between {} and {}",
                label, min, max
            ))),
            None if value < min => Err(LoanDeskError::Validation(format!(
                "{} must be at least {}",
                label, min
            ))),
            _ => Ok(Some(value)),
        }
    }

    fn required_number(&self, label: &'static str, min: f64) -> Result<f64> {
        self.required(label)?;
        self.optional_number(label, min, None)?
            .ok_or_else(|| LoanDeskError::Validation(format!("{} is required", label)))
    }

    fn required_id(&self, label: &'static str) -> Result<i64> {
        self.required(label)?
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| LoanDeskError::Validation(format!("{} must be a positive whole number", label)))
    }

    fn email(&self, label: &'static str, required: bool) -> Result<Option<String>> {
        let value = if required {
            Some(self.required(label)?)
        } else {
            self.optional(label)
        };
        match value {
            Some(v) if !v.contains('@') => Err(LoanDeskError::Validation(format!(
                "{} must be a valid email address",
                label
            ))),
            other => Ok(other),
        }
    }

    /// Builds the record this form describes, or the first validation failure.
    pub fn to_record(&self) -> Result<Record> {
        let (kind, id) = match self.purpose {
            FormPurpose::Create(kind) => (kind, None),
            FormPurpose::Edit(kind, id) => (kind, Some(id)),
            _ => {
                return Err(LoanDeskError::Validation(
                    "This form does not describe a record".to_string(),
                ))
            }
        };

        let record = match kind {
            ResourceKind::Customer => Record::Customer(Customer {
                customer_id: id,
                customer_name: self.required("Customer Name")?,
                email: self.email("Email", true)?.unwrap_or_default(),
                phone_number: self.optional("Phone Number"),
                address: self.optional("Address"),
                credit_score: self.optional_number("Credit Score", 300.0, Some(850.0))?,
            }),
            ResourceKind::Loan => {
                let amount = self.required_number("Loan Amount", 1000.0)?;
                let tenure = self
                    .optional_number("Tenure (Months)", 1.0, None)?
                    .map(|months| {
                        if months.fract() != 0.0 || months > i32::MAX as f64 {
                            Err(LoanDeskError::Validation(
                                "Tenure (Months) must be a whole number".to_string(),
                            ))
                        } else {
                            Ok(months as i32)
                        }
                    })
                    .transpose()?;
                let status = LoanStatus::parse(&self.required("Status")?).ok_or_else(|| {
                    LoanDeskError::Validation(
                        "Status must be PENDING, APPROVED or REJECTED".to_string(),
                    )
                })?;

                Record::Loan(Loan {
                    loan_amount: Some(amount),
                    interest_rate: self.optional_number("Interest Rate (%)", 0.0, None)?,
                    tenure_months: tenure,
                    status: Some(status.as_str().to_string()),
                    customer: Some(customer_ref(self.required_id("Customer ID")?)),
                    loan_type: Some(loan_type_ref(self.required_id("Loan Type ID")?)),
                    loan_id: id,
                })
            }
            ResourceKind::LoanType => Record::LoanType(LoanType {
                loan_type_id: id,
                type_name: self.required("Type Name")?,
                description: self.optional("Description"),
                interest_rate: self.optional_number("Interest Rate (%)", 0.0, None)?,
            }),
            ResourceKind::Guarantor => Record::Guarantor(Guarantor {
                guarantor_id: id,
                guarantor_name: self.required("Guarantor Name")?,
                email: self.email("Email", false)?,
                phone_number: self.optional("Phone Number"),
                address: self.optional("Address"),
                credit_score: self.optional_number("Credit Score", 300.0, Some(850.0))?,
            }),
            ResourceKind::Payment => {
                let raw_date = self.required("Payment Date")?;
                let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|_| {
                    LoanDeskError::Validation("Payment Date must be YYYY-MM-DD".to_string())
                })?;
                Record::Payment(Payment {
                    payment_id: id,
                    amount: Some(self.required_number("Payment Amount", 1.0)?),
                    payment_date: Some(date),
                    loan: Some(loan_ref(self.required_id("Loan ID")?)),
                })
            }
        };
        Ok(record)
    }

    /// Value of a filter prompt as a loan status.
    pub fn loan_status(&self) -> Result<LoanStatus> {
        LoanStatus::parse(self.value("Status")).ok_or_else(|| {
            LoanDeskError::Validation("Status must be PENDING, APPROVED or REJECTED".to_string())
        })
    }

    /// Value of a filter prompt as a minimum credit score.
    pub fn credit_score(&self) -> Result<f64> {
        self.required_number("Minimum Credit Score", 0.0)
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
