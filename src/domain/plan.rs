use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Exempt,
    Installment,
    Deferred,
    Stipend,
    Scholarship,
}

impl PlanType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exempt => "exempt",
            Self::Installment => "installment",
            Self::Deferred => "deferred",
            Self::Stipend => "stipend",
            Self::Scholarship => "scholarship",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Exempt => "إعفاء",
            Self::Installment => "تقسيط",
            Self::Deferred => "تأجيل",
            Self::Stipend => "خصم من المكافأة",
            Self::Scholarship => "ابتعاث",
        }
    }
}

/// Shape of the plan. Each variant carries only the schedule it uses, so a
/// deferred plan can never hold installments and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanKind {
    Exempt,
    Installment {
        installments: Vec<Installment>,
    },
    Deferred {
        #[serde(rename = "deferredUntil")]
        deferred_until: NaiveDate,
    },
    Stipend {
        #[serde(rename = "stipendDeductions")]
        stipend_deductions: Vec<Installment>,
    },
    Scholarship,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    #[serde(flatten)]
    pub kind: PlanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
}

impl PaymentPlan {
    pub fn new(kind: PlanKind) -> Self {
        Self {
            kind,
            notes: None,
            completed_date: None,
        }
    }

    pub fn plan_type(&self) -> PlanType {
        match self.kind {
            PlanKind::Exempt => PlanType::Exempt,
            PlanKind::Installment { .. } => PlanType::Installment,
            PlanKind::Deferred { .. } => PlanType::Deferred,
            PlanKind::Stipend { .. } => PlanType::Stipend,
            PlanKind::Scholarship => PlanType::Scholarship,
        }
    }

    /// Installments or stipend deductions; empty for every other plan type.
    pub fn entries(&self) -> &[Installment] {
        match &self.kind {
            PlanKind::Installment { installments } => installments,
            PlanKind::Stipend { stipend_deductions } => stipend_deductions,
            _ => &[],
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(
            self.kind,
            PlanKind::Installment { .. } | PlanKind::Stipend { .. }
        )
    }

    pub fn paid_total(&self) -> f64 {
        self.entries()
            .iter()
            .filter(|entry| entry.is_paid)
            .map(|entry| entry.amount)
            .sum()
    }

    /// True only for scheduled plans whose every entry is paid.
    pub fn is_fully_paid(&self) -> bool {
        self.is_scheduled() && self.entries().iter().all(|entry| entry.is_paid)
    }
}
