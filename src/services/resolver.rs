use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{PaymentPlan, PaymentStatus, PlanKind, PlanType, Unit};

/// One unpaid amount. `date` is `None` when the amount is due immediately
/// (a deferral that was never given a plan).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueEntry {
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub days_late: i64,
}

impl DueEntry {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.date {
            Some(date) => date < today,
            None => true,
        }
    }
}

/// What a unit still owes, as of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Obligation {
    pub total_rent: f64,
    pub total_paid: f64,
    pub remaining: f64,
    pub plan_type: Option<PlanType>,
    pub due_date: Option<NaiveDate>,
    pub due_dates: Vec<DueEntry>,
    pub is_overdue: bool,
    pub needs_plan: bool,
    pub paid_count: usize,
    pub unpaid_count: usize,
    pub total_installments_count: usize,
    pub overdue_count: usize,
    pub upcoming_count: usize,
    pub days_until_due: Option<i64>,
}

impl Obligation {
    fn settled(total_rent: f64, total_paid: f64, plan_type: Option<PlanType>) -> Self {
        Self {
            total_rent,
            total_paid,
            remaining: 0.0,
            plan_type,
            due_date: None,
            due_dates: Vec::new(),
            is_overdue: false,
            needs_plan: false,
            paid_count: 0,
            unpaid_count: 0,
            total_installments_count: 0,
            overdue_count: 0,
            upcoming_count: 0,
            days_until_due: None,
        }
    }

    pub fn overdue_entries(&self) -> impl Iterator<Item = &DueEntry> {
        self.due_dates.iter().filter(|entry| entry.days_late > 0 || entry.date.is_none())
    }

    pub fn first_overdue(&self) -> Option<&DueEntry> {
        self.overdue_entries().next()
    }

    pub fn first_upcoming(&self, today: NaiveDate) -> Option<&DueEntry> {
        self.due_dates
            .iter()
            .find(|entry| entry.date.is_some_and(|date| date >= today))
    }
}

/// Resolves the outstanding obligation of `unit` on `today`. Pure read.
pub fn resolve(unit: &Unit, today: NaiveDate) -> Obligation {
    let total_rent = unit.base_rent;
    let plan = unit.payment_plan.as_ref();
    let plan_type = plan.map(PaymentPlan::plan_type);

    if unit.payment_status == Some(PaymentStatus::PaidInFull) {
        let count = plan.map(|plan| plan.entries().len()).unwrap_or(0);
        return Obligation {
            paid_count: count,
            total_installments_count: count,
            ..Obligation::settled(total_rent, total_rent, plan_type)
        };
    }

    let Some(plan) = plan else {
        return match unit.payment_status {
            Some(PaymentStatus::Deferred) => {
                // No plan yet: the whole rent is treated as due now.
                Obligation {
                    total_paid: 0.0,
                    remaining: total_rent,
                    due_dates: vec![DueEntry {
                        date: None,
                        amount: total_rent,
                        days_late: 0,
                    }],
                    is_overdue: true,
                    needs_plan: true,
                    unpaid_count: 1,
                    total_installments_count: 1,
                    overdue_count: 1,
                    ..Obligation::settled(total_rent, 0.0, None)
                }
            }
            Some(PaymentStatus::Paid) => Obligation::settled(total_rent, total_rent, None),
            _ => Obligation::settled(total_rent, 0.0, None),
        };
    };

    match &plan.kind {
        PlanKind::Installment { .. } | PlanKind::Stipend { .. } => {
            resolve_schedule(plan, total_rent, today)
        }
        PlanKind::Deferred { deferred_until } => {
            let due = *deferred_until;
            let is_overdue = due < today;
            Obligation {
                remaining: total_rent,
                due_date: Some(due),
                due_dates: vec![DueEntry {
                    date: Some(due),
                    amount: total_rent,
                    days_late: days_between(due, today).max(0),
                }],
                is_overdue,
                unpaid_count: 1,
                total_installments_count: 1,
                overdue_count: usize::from(is_overdue),
                upcoming_count: usize::from(!is_overdue),
                days_until_due: (!is_overdue).then(|| days_between(today, due)),
                ..Obligation::settled(total_rent, 0.0, plan_type)
            }
        }
        PlanKind::Exempt | PlanKind::Scholarship => {
            Obligation::settled(total_rent, 0.0, plan_type)
        }
    }
}

fn resolve_schedule(plan: &PaymentPlan, total_rent: f64, today: NaiveDate) -> Obligation {
    let entries = plan.entries();
    let total_paid = plan.paid_total();

    let mut due_dates = entries
        .iter()
        .filter(|entry| !entry.is_paid)
        .map(|entry| DueEntry {
            date: Some(entry.due_date),
            amount: entry.amount,
            days_late: days_between(entry.due_date, today).max(0),
        })
        .collect::<Vec<_>>();
    due_dates.sort_by_key(|entry| entry.date);

    let overdue_count = due_dates
        .iter()
        .filter(|entry| entry.is_overdue(today))
        .count();
    let upcoming_count = due_dates.len() - overdue_count;
    let days_until_due = due_dates
        .iter()
        .filter_map(|entry| entry.date)
        .find(|date| *date >= today)
        .map(|date| days_between(today, date));
    let paid_count = entries.len() - due_dates.len();

    Obligation {
        total_rent,
        total_paid,
        remaining: total_rent - total_paid,
        plan_type: Some(plan.plan_type()),
        due_date: due_dates.first().and_then(|entry| entry.date),
        is_overdue: overdue_count > 0,
        needs_plan: false,
        paid_count,
        unpaid_count: due_dates.len(),
        total_installments_count: entries.len(),
        overdue_count,
        upcoming_count,
        days_until_due,
        due_dates,
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Payment fields the store writes when a plan is set or cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentDerivation {
    pub payment_status: PaymentStatus,
    pub actual_rent: f64,
    pub completed_date: Option<DateTime<Utc>>,
}

pub fn derive_payment_state(
    plan: Option<&PaymentPlan>,
    base_rent: f64,
    now: DateTime<Utc>,
) -> PaymentDerivation {
    let Some(plan) = plan else {
        return PaymentDerivation {
            payment_status: PaymentStatus::Paid,
            actual_rent: base_rent,
            completed_date: None,
        };
    };

    if plan.is_fully_paid() {
        return PaymentDerivation {
            payment_status: PaymentStatus::PaidInFull,
            actual_rent: base_rent,
            completed_date: Some(now),
        };
    }

    match plan.kind {
        PlanKind::Exempt => PaymentDerivation {
            payment_status: PaymentStatus::Exempt,
            actual_rent: 0.0,
            completed_date: None,
        },
        PlanKind::Scholarship => PaymentDerivation {
            payment_status: PaymentStatus::Scholarship,
            actual_rent: 0.0,
            completed_date: None,
        },
        PlanKind::Deferred { .. } => PaymentDerivation {
            payment_status: PaymentStatus::Deferred,
            actual_rent: 0.0,
            completed_date: None,
        },
        PlanKind::Installment { .. } | PlanKind::Stipend { .. } => PaymentDerivation {
            payment_status: PaymentStatus::PaymentPlan,
            actual_rent: plan.paid_total(),
            completed_date: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_payment_state, resolve};
    use crate::domain::{
        Installment, Occupancy, PaymentPlan, PaymentStatus, PlanKind, Unit, UnitType,
    };
    use chrono::{NaiveDate, Utc};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn rented_unit(base_rent: f64) -> Unit {
        let mut unit = Unit::new("B1-F1-A001".to_string(), 1, 1, UnitType::Apartment, 1, base_rent);
        unit.occupancy = Occupancy::Rented;
        unit
    }

    fn installment(amount: f64, due: &str, is_paid: bool) -> Installment {
        Installment {
            amount,
            due_date: date(due),
            is_paid,
        }
    }

    fn with_installments(mut unit: Unit, entries: Vec<Installment>) -> Unit {
        unit.payment_status = Some(PaymentStatus::PaymentPlan);
        unit.payment_plan = Some(PaymentPlan::new(PlanKind::Installment {
            installments: entries,
        }));
        unit
    }

    #[test]
    fn paid_in_full_owes_nothing_whatever_the_plan_says() {
        let mut unit = with_installments(
            rented_unit(1700.0),
            vec![
                installment(850.0, "2020-01-01", false),
                installment(850.0, "2020-02-01", false),
            ],
        );
        unit.payment_status = Some(PaymentStatus::PaidInFull);
        let obligation = resolve(&unit, date("2026-01-01"));
        assert_eq!(obligation.remaining, 0.0);
        assert!(!obligation.is_overdue);
        assert!(obligation.due_dates.is_empty());
        assert_eq!(obligation.paid_count, 2);
    }

    #[test]
    fn remaining_is_rent_minus_paid_entries() {
        let today = date("2026-01-15");
        let cases = vec![
            (vec![], 1700.0),
            (vec![installment(850.0, "2026-01-01", true)], 850.0),
            (
                vec![
                    installment(600.0, "2026-01-01", true),
                    installment(500.0, "2026-02-01", true),
                    installment(600.0, "2026-03-01", false),
                ],
                600.0,
            ),
            (
                vec![
                    installment(850.0, "2026-01-01", true),
                    installment(850.0, "2026-02-01", true),
                ],
                0.0,
            ),
        ];
        for (entries, expected) in cases {
            let unit = with_installments(rented_unit(1700.0), entries);
            assert_eq!(resolve(&unit, today).remaining, expected);
        }
    }

    #[test]
    fn unpaid_past_entry_is_overdue_until_paid() {
        let today = date("2026-02-15");
        let unit = with_installments(
            rented_unit(1700.0),
            vec![
                installment(850.0, "2026-02-01", false),
                installment(850.0, "2026-03-01", false),
            ],
        );
        let obligation = resolve(&unit, today);
        assert!(obligation.is_overdue);
        assert_eq!(obligation.overdue_count, 1);
        assert_eq!(obligation.upcoming_count, 1);
        assert_eq!(obligation.due_date, Some(date("2026-02-01")));
        assert_eq!(obligation.due_dates[0].days_late, 14);
        assert_eq!(obligation.days_until_due, Some(14));

        let paid = with_installments(
            rented_unit(1700.0),
            vec![
                installment(850.0, "2026-02-01", true),
                installment(850.0, "2026-03-01", false),
            ],
        );
        let obligation = resolve(&paid, today);
        assert!(!obligation.is_overdue);
        assert_eq!(obligation.due_date, Some(date("2026-03-01")));
    }

    #[test]
    fn entry_due_today_is_not_overdue() {
        let today = date("2026-02-01");
        let unit = with_installments(
            rented_unit(1700.0),
            vec![installment(1700.0, "2026-02-01", false)],
        );
        let obligation = resolve(&unit, today);
        assert!(!obligation.is_overdue);
        assert_eq!(obligation.days_until_due, Some(0));
    }

    #[test]
    fn next_due_date_is_the_earliest_unpaid_entry() {
        let unit = with_installments(
            rented_unit(1700.0),
            vec![
                installment(850.0, "2026-04-01", false),
                installment(850.0, "2026-03-01", false),
            ],
        );
        let obligation = resolve(&unit, date("2026-01-01"));
        assert_eq!(obligation.due_date, Some(date("2026-03-01")));
    }

    #[test]
    fn deferred_without_plan_is_due_now() {
        let mut unit = rented_unit(1700.0);
        unit.payment_status = Some(PaymentStatus::Deferred);
        let obligation = resolve(&unit, date("2026-01-01"));
        assert_eq!(obligation.remaining, 1700.0);
        assert!(obligation.is_overdue);
        assert!(obligation.needs_plan);
        assert_eq!(obligation.due_date, None);
        assert_eq!(obligation.unpaid_count, 1);
    }

    #[test]
    fn deferred_plan_uses_its_single_date() {
        let mut unit = rented_unit(3000.0);
        unit.payment_status = Some(PaymentStatus::Deferred);
        unit.payment_plan = Some(PaymentPlan::new(PlanKind::Deferred {
            deferred_until: date("2026-03-01"),
        }));
        let before = resolve(&unit, date("2026-02-01"));
        assert_eq!(before.remaining, 3000.0);
        assert!(!before.is_overdue);
        assert_eq!(before.days_until_due, Some(28));

        let after = resolve(&unit, date("2026-03-02"));
        assert!(after.is_overdue);
        assert_eq!(after.due_dates[0].days_late, 1);
    }

    #[test]
    fn exempt_and_scholarship_owe_nothing() {
        for kind in [PlanKind::Exempt, PlanKind::Scholarship] {
            let mut unit = rented_unit(1700.0);
            unit.payment_plan = Some(PaymentPlan::new(kind));
            let obligation = resolve(&unit, date("2026-01-01"));
            assert_eq!(obligation.remaining, 0.0);
            assert!(obligation.due_date.is_none());
        }
        assert_eq!(resolve(&rented_unit(1700.0), date("2026-01-01")).remaining, 0.0);
    }

    #[test]
    fn derivation_tracks_plan_contents() {
        let now = Utc::now();
        let cleared = derive_payment_state(None, 1700.0, now);
        assert_eq!(cleared.payment_status, PaymentStatus::Paid);
        assert_eq!(cleared.actual_rent, 1700.0);

        let partial = PaymentPlan::new(PlanKind::Installment {
            installments: vec![
                installment(850.0, "2026-01-01", true),
                installment(850.0, "2026-02-01", false),
            ],
        });
        let derived = derive_payment_state(Some(&partial), 1700.0, now);
        assert_eq!(derived.payment_status, PaymentStatus::PaymentPlan);
        assert_eq!(derived.actual_rent, 850.0);
        assert!(derived.completed_date.is_none());

        let done = PaymentPlan::new(PlanKind::Stipend {
            stipend_deductions: vec![installment(1700.0, "2026-01-01", true)],
        });
        let derived = derive_payment_state(Some(&done), 1700.0, now);
        assert_eq!(derived.payment_status, PaymentStatus::PaidInFull);
        assert_eq!(derived.actual_rent, 1700.0);
        assert_eq!(derived.completed_date, Some(now));

        let deferred = PaymentPlan::new(PlanKind::Deferred {
            deferred_until: date("2026-05-01"),
        });
        let derived = derive_payment_state(Some(&deferred), 1700.0, now);
        assert_eq!(derived.payment_status, PaymentStatus::Deferred);
        assert_eq!(derived.actual_rent, 0.0);
    }
}
