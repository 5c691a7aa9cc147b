use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::money::{percentage, round2};
use super::resolver::{resolve, Obligation};
use crate::domain::{
    BuildingData, MaintenanceRecord, PaymentStatus, PlanType, Unit, UnitStatus, UnitType,
    VacancyReason,
};

/// Identity columns shared by every unit-level report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRef {
    pub building_id: u32,
    pub unit_id: String,
    pub unit_number: u32,
    pub unit_type: UnitType,
    pub label: String,
}

impl From<&Unit> for UnitRef {
    fn from(unit: &Unit) -> Self {
        Self {
            building_id: unit.building_id,
            unit_id: unit.id.clone(),
            unit_number: unit.unit_number,
            unit_type: unit.unit_type,
            label: unit.display_label(),
        }
    }
}

fn units_in_order(buildings: &[BuildingData]) -> impl Iterator<Item = &Unit> {
    buildings.iter().flat_map(BuildingData::units)
}

fn by_building_and_number(a: &Unit, b: &Unit) -> std::cmp::Ordering {
    a.building_id
        .cmp(&b.building_id)
        .then(a.unit_number.cmp(&b.unit_number))
}

// ---------------------------------------------------------------------------
// Dues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuesView {
    Overdue,
    Upcoming,
}

impl DuesView {
    pub fn title(self) -> &'static str {
        match self {
            Self::Overdue => "مديونيات مالية تم استحقاقها",
            Self::Upcoming => "المستحقات المالية القادمة",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesRow {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub rent: f64,
    pub plan_type: Option<PlanType>,
    pub installments_count: usize,
    pub paid_count: usize,
    pub due_date: Option<NaiveDate>,
    pub delay_days: Option<i64>,
    pub days_remaining: Option<i64>,
    pub installment_amount: Option<f64>,
    pub remaining: f64,
    pub claim_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesSummary {
    pub total_due_amount: f64,
    pub overdue_units_count: usize,
    pub total_overdue_installments: usize,
    pub total_upcoming_installments: usize,
    pub total_partially_paid_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesReport {
    pub view: DuesView,
    pub title: String,
    pub rows: Vec<DuesRow>,
    pub total_remaining: f64,
    pub summary: DuesSummary,
}

/// Units whose payment status carries open dues, split into those already
/// overdue and those with an upcoming instalment. A unit can appear in both.
pub fn dues_report(buildings: &[BuildingData], view: DuesView, today: NaiveDate) -> DuesReport {
    let mut summary = DuesSummary::default();
    let mut rows = Vec::new();

    for unit in units_in_order(buildings) {
        let open = unit
            .payment_status
            .is_some_and(PaymentStatus::has_open_dues);
        if !open {
            continue;
        }
        let obligation = resolve(unit, today);

        summary.total_overdue_installments += obligation.overdue_count;
        summary.total_upcoming_installments += obligation.upcoming_count;
        if obligation.paid_count > 0 {
            summary.total_partially_paid_amount += obligation.total_paid;
        }
        if obligation.is_overdue {
            summary.overdue_units_count += 1;
            summary.total_due_amount += obligation.remaining;
        }

        let row = match view {
            DuesView::Overdue if obligation.is_overdue => {
                let first = obligation.first_overdue();
                Some(DuesRow {
                    due_date: first.and_then(|entry| entry.date),
                    delay_days: first
                        .filter(|entry| entry.days_late > 0)
                        .map(|entry| entry.days_late),
                    days_remaining: None,
                    installment_amount: first.map(|entry| entry.amount),
                    ..dues_row(unit, &obligation)
                })
            }
            DuesView::Upcoming if obligation.upcoming_count > 0 => {
                let first = obligation.first_upcoming(today);
                Some(DuesRow {
                    due_date: first.and_then(|entry| entry.date),
                    delay_days: None,
                    days_remaining: first
                        .and_then(|entry| entry.date)
                        .map(|date| (date - today).num_days()),
                    installment_amount: first.map(|entry| entry.amount),
                    ..dues_row(unit, &obligation)
                })
            }
            _ => None,
        };
        rows.extend(row);
    }

    summary.total_due_amount = round2(summary.total_due_amount);
    summary.total_partially_paid_amount = round2(summary.total_partially_paid_amount);
    let total_remaining = round2(rows.iter().map(|row| row.remaining).sum());

    DuesReport {
        view,
        title: view.title().to_string(),
        rows,
        total_remaining,
        summary,
    }
}

fn dues_row(unit: &Unit, obligation: &Obligation) -> DuesRow {
    DuesRow {
        unit: UnitRef::from(unit),
        rent: unit.collected_rent(),
        plan_type: obligation.plan_type,
        installments_count: obligation.total_installments_count,
        paid_count: obligation.paid_count,
        due_date: None,
        delay_days: None,
        days_remaining: None,
        installment_amount: None,
        remaining: obligation.remaining,
        claim_count: unit.claim_history.len(),
    }
}

// ---------------------------------------------------------------------------
// Payment plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRow {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub payment_status: Option<PaymentStatus>,
    pub plan_archived: bool,
    pub obligation: Obligation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlansOverview {
    pub active: Vec<PlanRow>,
    pub completed: Vec<PlanRow>,
    pub overdue_count: usize,
}

fn matches_search(unit: &Unit, search: Option<&str>) -> bool {
    match search.map(str::trim).filter(|term| !term.is_empty()) {
        None => true,
        Some(term) => {
            unit.building_id.to_string().contains(term)
                || unit.unit_number.to_string().contains(term)
        }
    }
}

pub fn payment_plans_overview(
    buildings: &[BuildingData],
    today: NaiveDate,
    search: Option<&str>,
) -> PaymentPlansOverview {
    let mut active = Vec::new();
    let mut completed = Vec::new();

    for unit in units_in_order(buildings) {
        let status = unit.payment_status;
        let is_active = status.is_some_and(PaymentStatus::has_open_dues);
        let is_completed = matches!(
            status,
            Some(PaymentStatus::PaidInFull | PaymentStatus::Exempt | PaymentStatus::Scholarship)
        ) || (unit.plan_archived && !is_active);

        if is_active && matches_search(unit, search) {
            active.push((unit, resolve(unit, today)));
        } else if is_completed {
            completed.push((unit, resolve(unit, today)));
        }
    }

    active.sort_by(|(a, a_due), (b, b_due)| {
        b_due
            .is_overdue
            .cmp(&a_due.is_overdue)
            .then(b_due.needs_plan.cmp(&a_due.needs_plan))
            .then_with(|| by_building_and_number(a, b))
    });

    let into_rows = |rows: Vec<(&Unit, Obligation)>| {
        rows.into_iter()
            .map(|(unit, obligation)| PlanRow {
                unit: UnitRef::from(unit),
                payment_status: unit.payment_status,
                plan_archived: unit.plan_archived,
                obligation,
            })
            .collect::<Vec<_>>()
    };
    let active = into_rows(active);
    let overdue_count = active.iter().filter(|row| row.obligation.is_overdue).count();

    PaymentPlansOverview {
        active,
        completed: into_rows(completed),
        overdue_count,
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastClaim {
    pub action: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRow {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub payment_status: Option<PaymentStatus>,
    pub due_date: Option<NaiveDate>,
    pub remaining: f64,
    pub claim_count: usize,
    pub last_claim: Option<LastClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsQueue {
    pub active_dues: Vec<ClaimRow>,
    pub with_claim_history: Vec<ClaimRow>,
}

fn claim_row(unit: &Unit, obligation: &Obligation) -> ClaimRow {
    ClaimRow {
        unit: UnitRef::from(unit),
        payment_status: unit.payment_status,
        due_date: obligation.due_date,
        remaining: obligation.remaining,
        claim_count: unit.claim_history.len(),
        last_claim: unit.last_claim().map(|claim| LastClaim {
            action: claim.action.clone(),
            date: claim.date,
        }),
    }
}

/// Rented units with overdue dues, never-claimed units first, plus every
/// unit that has been claimed at least once.
pub fn claims_queue(buildings: &[BuildingData], today: NaiveDate) -> ClaimsQueue {
    let mut active = Vec::new();
    let mut with_claim_history = Vec::new();

    for unit in units_in_order(buildings) {
        let obligation = resolve(unit, today);
        let needs_claim = unit.is_rented()
            && unit.payment_status.is_some_and(PaymentStatus::has_open_dues)
            && obligation.is_overdue;
        if needs_claim {
            active.push((unit, claim_row(unit, &obligation)));
        }
        if !unit.claim_history.is_empty() {
            with_claim_history.push(claim_row(unit, &obligation));
        }
    }

    active.sort_by(|(a, _), (b, _)| {
        let a_claimed = !a.claim_history.is_empty();
        let b_claimed = !b.claim_history.is_empty();
        a_claimed
            .cmp(&b_claimed)
            .then_with(|| by_building_and_number(a, b))
    });

    ClaimsQueue {
        active_dues: active.into_iter().map(|(_, row)| row).collect(),
        with_claim_history,
    }
}

// ---------------------------------------------------------------------------
// Lost revenue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCause {
    Available,
    UnderMaintenance,
    Office,
    DeferredPayment,
    Scholarship,
    Exempt,
    MaintenanceCost,
}

impl LossCause {
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "وحدات متاحة (شاغرة)",
            Self::UnderMaintenance => "وحدات تحت الصيانة",
            Self::Office => "وحدات إدارية (مكاتب)",
            Self::DeferredPayment => "مبالغ متبقية (خطط سداد)",
            Self::Scholarship => "طالبات ابتعاث",
            Self::Exempt => "إعفاء من السداد",
            Self::MaintenanceCost => "تكاليف الصيانة",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LossSection {
    pub cause: LossCause,
    pub title: String,
    pub total_lost: f64,
    /// Units for every cause except maintenance cost, which counts jobs.
    pub unit_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub rented: usize,
    pub available: usize,
    pub under_maintenance: usize,
    pub office: usize,
    pub paid: usize,
    pub paid_in_full: usize,
    pub deferred: usize,
    pub payment_plan: usize,
    pub exempt: usize,
    pub scholarship: usize,
    pub occupancy_percentage: f64,
}

impl StatusCounts {
    fn record(&mut self, unit: &Unit) {
        self.total += 1;
        match unit.status() {
            UnitStatus::Rented => {
                self.rented += 1;
                match unit.payment_status {
                    Some(PaymentStatus::Paid) => self.paid += 1,
                    Some(PaymentStatus::PaidInFull) => self.paid_in_full += 1,
                    Some(PaymentStatus::Deferred) => self.deferred += 1,
                    Some(PaymentStatus::PaymentPlan) => self.payment_plan += 1,
                    Some(PaymentStatus::Exempt) => self.exempt += 1,
                    Some(PaymentStatus::Scholarship) => self.scholarship += 1,
                    None => {}
                }
            }
            UnitStatus::Available => self.available += 1,
            UnitStatus::UnderMaintenance => self.under_maintenance += 1,
            UnitStatus::Office => self.office += 1,
        }
    }

    /// Offices are not rentable and are left out of occupancy.
    fn finish(&mut self) {
        let rentable = self.total.saturating_sub(self.office);
        self.occupancy_percentage = percentage(self.rented as f64, rentable as f64);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingPerformance {
    pub building_id: u32,
    pub name: String,
    pub expected: f64,
    pub actual: f64,
    pub lost: f64,
    pub lost_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LostRevenueReport {
    pub total_expected_revenue: f64,
    pub total_actual_revenue: f64,
    pub total_lost_revenue: f64,
    pub lost_revenue_percentage: f64,
    pub total_maintenance_cost: f64,
    pub sections: Vec<LossSection>,
    pub apartments: StatusCounts,
    pub suites: StatusCounts,
    pub buildings: Vec<BuildingPerformance>,
}

/// Revenue actually collected from a unit this term.
fn realized_revenue(unit: &Unit, obligation: &Obligation) -> f64 {
    if !unit.is_rented() {
        return 0.0;
    }
    match unit.payment_status {
        Some(PaymentStatus::Paid | PaymentStatus::PaidInFull) => unit.base_rent,
        Some(PaymentStatus::PaymentPlan) => obligation.total_paid,
        _ => 0.0,
    }
}

fn loss_cause(unit: &Unit, obligation: &Obligation) -> Option<(LossCause, f64)> {
    match unit.status() {
        UnitStatus::Rented => match unit.payment_status {
            Some(PaymentStatus::Deferred | PaymentStatus::PaymentPlan)
                if obligation.remaining > 0.0 =>
            {
                Some((LossCause::DeferredPayment, obligation.remaining))
            }
            Some(PaymentStatus::Scholarship) => Some((LossCause::Scholarship, unit.base_rent)),
            Some(PaymentStatus::Exempt) => Some((LossCause::Exempt, unit.base_rent)),
            _ => None,
        },
        UnitStatus::Available => Some((LossCause::Available, unit.base_rent)),
        UnitStatus::UnderMaintenance => Some((LossCause::UnderMaintenance, unit.base_rent)),
        UnitStatus::Office => Some((LossCause::Office, unit.base_rent)),
    }
}

pub fn lost_revenue_report(buildings: &[BuildingData], today: NaiveDate) -> LostRevenueReport {
    let mut totals: BTreeMap<LossCause, (f64, usize)> = [
        LossCause::Available,
        LossCause::UnderMaintenance,
        LossCause::Office,
        LossCause::DeferredPayment,
        LossCause::Scholarship,
        LossCause::Exempt,
    ]
    .into_iter()
    .map(|cause| (cause, (0.0, 0)))
    .collect();
    let mut apartments = StatusCounts::default();
    let mut suites = StatusCounts::default();
    let mut maintenance_cost = 0.0;
    let mut maintenance_jobs = 0;
    let mut performance = Vec::with_capacity(buildings.len());

    for building in buildings {
        let mut expected = 0.0;
        let mut actual = 0.0;
        for unit in building.units() {
            let obligation = resolve(unit, today);
            expected += unit.base_rent;
            actual += realized_revenue(unit, &obligation);

            match unit.unit_type {
                UnitType::Apartment => apartments.record(unit),
                UnitType::Suite => suites.record(unit),
            }
            if let Some((cause, amount)) = loss_cause(unit, &obligation) {
                let entry = totals.entry(cause).or_insert((0.0, 0));
                entry.0 += amount;
                entry.1 += 1;
            }
            maintenance_cost += unit
                .maintenance_history
                .iter()
                .map(|record| record.cost)
                .sum::<f64>();
            maintenance_jobs += unit.maintenance_history.len();
        }
        performance.push(BuildingPerformance {
            building_id: building.id,
            name: building.name.clone(),
            expected: round2(expected),
            actual: round2(actual),
            lost: round2(expected - actual),
            lost_percentage: percentage(expected - actual, expected),
        });
    }
    totals.insert(LossCause::MaintenanceCost, (maintenance_cost, maintenance_jobs));
    apartments.finish();
    suites.finish();

    let mut sections = totals
        .into_iter()
        .map(|(cause, (total_lost, unit_count))| LossSection {
            cause,
            title: cause.label().to_string(),
            total_lost: round2(total_lost),
            unit_count,
        })
        .collect::<Vec<_>>();
    sections.sort_by(|a, b| b.total_lost.total_cmp(&a.total_lost));

    let total_expected: f64 = performance.iter().map(|row| row.expected).sum();
    let total_actual: f64 = performance.iter().map(|row| row.actual).sum();
    let total_lost = total_expected - total_actual;

    LostRevenueReport {
        total_expected_revenue: round2(total_expected),
        total_actual_revenue: round2(total_actual),
        total_lost_revenue: round2(total_lost),
        lost_revenue_percentage: percentage(total_lost, total_expected),
        total_maintenance_cost: round2(maintenance_cost),
        sections,
        apartments,
        suites,
        buildings: performance,
    }
}

// ---------------------------------------------------------------------------
// Building revenue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRevenueRow {
    pub building_id: u32,
    pub name: String,
    pub total_units: usize,
    pub rented_apartments: usize,
    pub rented_suites: usize,
    pub expected_revenue: f64,
    pub actual_revenue: f64,
    pub deficit: f64,
}

/// Revenue of one unit type across all buildings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSource {
    pub unit_type: UnitType,
    pub expected_revenue: f64,
    pub actual_revenue: f64,
    pub achievement_percentage: f64,
    /// Part of the total actual revenue this type brings in.
    pub share_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRevenueReport {
    pub rows: Vec<BuildingRevenueRow>,
    pub total_expected_revenue: f64,
    pub total_actual_revenue: f64,
    pub total_deficit: f64,
    pub deficit_percentage: f64,
    /// Actual revenue against the potential of every unit.
    pub achievement_percentage: f64,
    /// Rented units out of all units that are not offices.
    pub occupancy_percentage: f64,
    pub revenue_by_type: Vec<RevenueSource>,
}

fn rented_count(units: &[Unit]) -> usize {
    units.iter().filter(|unit| unit.is_rented()).count()
}

fn expected_revenue<'a>(units: impl Iterator<Item = &'a Unit>) -> f64 {
    units.map(|unit| unit.base_rent).sum()
}

fn actual_revenue<'a>(units: impl Iterator<Item = &'a Unit>) -> f64 {
    units
        .filter(|unit| unit.is_rented())
        .map(Unit::collected_rent)
        .sum()
}

fn revenue_by_type(buildings: &[BuildingData], total_actual: f64) -> Vec<RevenueSource> {
    [UnitType::Apartment, UnitType::Suite]
        .into_iter()
        .map(|unit_type| {
            let units = || {
                units_in_order(buildings).filter(move |unit| unit.unit_type == unit_type)
            };
            let expected = expected_revenue(units());
            let actual = actual_revenue(units());
            RevenueSource {
                unit_type,
                expected_revenue: round2(expected),
                actual_revenue: round2(actual),
                achievement_percentage: percentage(actual, expected),
                share_percentage: percentage(actual, total_actual),
            }
        })
        .collect()
}

pub fn building_revenue_report(buildings: &[BuildingData]) -> BuildingRevenueReport {
    let rows = buildings
        .iter()
        .map(|building| {
            let expected = expected_revenue(building.units());
            let actual = actual_revenue(building.units());
            BuildingRevenueRow {
                building_id: building.id,
                name: building.name.clone(),
                total_units: building.unit_count(),
                rented_apartments: rented_count(&building.apartments.units),
                rented_suites: rented_count(&building.suites.units),
                expected_revenue: round2(expected),
                actual_revenue: round2(actual),
                deficit: round2(expected - actual),
            }
        })
        .collect::<Vec<_>>();

    let total_expected: f64 = rows.iter().map(|row| row.expected_revenue).sum();
    let total_actual: f64 = rows.iter().map(|row| row.actual_revenue).sum();
    let total_deficit = total_expected - total_actual;

    let rentable = units_in_order(buildings)
        .filter(|unit| unit.status() != UnitStatus::Office)
        .count();
    let rented = units_in_order(buildings).filter(|unit| unit.is_rented()).count();

    BuildingRevenueReport {
        rows,
        total_expected_revenue: round2(total_expected),
        total_actual_revenue: round2(total_actual),
        total_deficit: round2(total_deficit),
        deficit_percentage: percentage(total_deficit, total_expected),
        achievement_percentage: percentage(total_actual, total_expected),
        occupancy_percentage: percentage(rented as f64, rentable as f64),
        revenue_by_type: revenue_by_type(buildings, total_actual),
    }
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMaintenanceRow {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub vacancy_reason: VacancyReason,
    pub maintenance_cost: Option<f64>,
    pub start_date: NaiveDate,
    pub expected_end_date: Option<NaiveDate>,
    pub days_open: i64,
    pub is_past_expected_end: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedMaintenanceRow {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub record: MaintenanceRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Punctuality {
    Early,
    OnTime,
    Delayed,
}

impl Punctuality {
    /// Records without an expected end date count as on time.
    pub fn of(record: &MaintenanceRecord) -> Self {
        match record.expected_end_date {
            Some(expected) if record.end_date > expected => Self::Delayed,
            Some(expected) if record.end_date < expected => Self::Early,
            _ => Self::OnTime,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PunctualityCounts {
    pub early: usize,
    pub on_time: usize,
    pub delayed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceByUnit {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub jobs: usize,
    pub total_cost: f64,
    pub actual_revenue: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub active: Vec<ActiveMaintenanceRow>,
    pub archived: Vec<ArchivedMaintenanceRow>,
    pub total_jobs: usize,
    pub total_cost: f64,
    pub average_cost: f64,
    pub reason_counts: BTreeMap<&'static str, usize>,
    pub punctuality: PunctualityCounts,
    /// Sorted by revenue minus maintenance cost, worst first.
    pub by_unit: Vec<MaintenanceByUnit>,
}

pub fn maintenance_report(buildings: &[BuildingData], today: NaiveDate) -> MaintenanceReport {
    let mut active = Vec::new();
    let mut archived = Vec::new();
    let mut by_unit = Vec::new();
    let mut punctuality = PunctualityCounts::default();
    let mut reason_counts = VacancyReason::ALL
        .iter()
        .map(|reason| (reason.as_str(), 0))
        .collect::<BTreeMap<_, _>>();

    for unit in units_in_order(buildings) {
        if let Some(open) = unit.active_maintenance() {
            active.push(ActiveMaintenanceRow {
                unit: UnitRef::from(unit),
                vacancy_reason: open.vacancy_reason,
                maintenance_cost: open.maintenance_cost,
                start_date: open.maintenance_start_date,
                expected_end_date: open.maintenance_end_date,
                days_open: (today - open.maintenance_start_date).num_days().max(0),
                is_past_expected_end: open.maintenance_end_date.is_some_and(|end| end < today),
            });
        }

        if unit.maintenance_history.is_empty() {
            continue;
        }
        let mut unit_cost = 0.0;
        for record in &unit.maintenance_history {
            unit_cost += record.cost;
            *reason_counts.entry(record.kind.as_str()).or_insert(0) += 1;
            match Punctuality::of(record) {
                Punctuality::Early => punctuality.early += 1,
                Punctuality::OnTime => punctuality.on_time += 1,
                Punctuality::Delayed => punctuality.delayed += 1,
            }
            archived.push(ArchivedMaintenanceRow {
                unit: UnitRef::from(unit),
                record: record.clone(),
            });
        }
        let actual_revenue = if unit.is_rented() {
            unit.collected_rent()
        } else {
            0.0
        };
        by_unit.push(MaintenanceByUnit {
            unit: UnitRef::from(unit),
            jobs: unit.maintenance_history.len(),
            total_cost: round2(unit_cost),
            actual_revenue,
            net: round2(actual_revenue - unit_cost),
        });
    }

    by_unit.sort_by(|a, b| a.net.total_cmp(&b.net));
    archived.sort_by(|a, b| b.record.end_date.cmp(&a.record.end_date));
    let total_jobs = archived.len();
    let total_cost: f64 = archived.iter().map(|row| row.record.cost).sum();
    let average_cost = if total_jobs > 0 {
        round2(total_cost / total_jobs as f64)
    } else {
        0.0
    };

    MaintenanceReport {
        active,
        archived,
        total_jobs,
        total_cost: round2(total_cost),
        average_cost,
        reason_counts,
        punctuality,
        by_unit,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        building_revenue_report, claims_queue, dues_report, lost_revenue_report,
        maintenance_report, payment_plans_overview, DuesView, LossCause,
    };
    use crate::domain::{
        BuildingData, ClaimRecord, Installment, MaintenanceRecord, Occupancy, PaymentPlan,
        PaymentStatus, PlanKind, RoomData, Unit, UnitType, VacancyReason,
    };
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn today() -> NaiveDate {
        date("2026-02-15")
    }

    fn rented(building_id: u32, number: u32, status: Option<PaymentStatus>) -> Unit {
        let mut unit = Unit::new(
            format!("B{building_id}-F1-A{number:03}"),
            building_id,
            1,
            UnitType::Apartment,
            number,
            1700.0,
        );
        unit.occupancy = Occupancy::Rented;
        unit.payment_status = status;
        unit.actual_rent = match status {
            Some(PaymentStatus::Paid) => Some(1700.0),
            _ => Some(0.0),
        };
        unit
    }

    fn with_installments(mut unit: Unit, entries: &[(f64, &str, bool)]) -> Unit {
        let plan = PaymentPlan::new(PlanKind::Installment {
            installments: entries
                .iter()
                .map(|(amount, due, is_paid)| Installment {
                    amount: *amount,
                    due_date: date(due),
                    is_paid: *is_paid,
                })
                .collect(),
        });
        unit.actual_rent = Some(plan.paid_total());
        unit.payment_plan = Some(plan);
        unit.payment_status = Some(PaymentStatus::PaymentPlan);
        unit
    }

    fn building(id: u32, units: Vec<Unit>) -> BuildingData {
        BuildingData {
            id,
            name: format!("مبنى {id}"),
            apartments: RoomData::new(1700.0, units),
            suites: RoomData::new(3000.0, Vec::new()),
        }
    }

    fn sample() -> Vec<BuildingData> {
        vec![
            building(
                1,
                vec![
                    rented(1, 1, Some(PaymentStatus::Paid)),
                    with_installments(
                        rented(1, 2, None),
                        &[(850.0, "2026-01-10", true), (850.0, "2026-02-01", false)],
                    ),
                    with_installments(
                        rented(1, 3, None),
                        &[(600.0, "2026-02-01", false), (1100.0, "2026-04-01", false)],
                    ),
                ],
            ),
            building(
                2,
                vec![
                    rented(2, 1, Some(PaymentStatus::Deferred)),
                    with_installments(rented(2, 2, None), &[(1700.0, "2026-03-01", false)]),
                    rented(2, 3, Some(PaymentStatus::Scholarship)),
                ],
            ),
        ]
    }

    #[test]
    fn overdue_footer_equals_sum_of_rows() {
        let report = dues_report(&sample(), DuesView::Overdue, today());
        let ids = report
            .rows
            .iter()
            .map(|row| row.unit.unit_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["B1-F1-A002", "B1-F1-A003", "B2-F1-A001"]);
        let sum: f64 = report.rows.iter().map(|row| row.remaining).sum();
        assert_eq!(report.total_remaining, sum);
        assert_eq!(report.total_remaining, 850.0 + 1700.0 + 1700.0);

        let first = &report.rows[0];
        assert_eq!(first.delay_days, Some(14));
        assert_eq!(first.installment_amount, Some(850.0));
        assert_eq!(first.paid_count, 1);

        let plan_less = &report.rows[2];
        assert_eq!(plan_less.due_date, None);
        assert_eq!(plan_less.delay_days, None);
        assert_eq!(report.summary.overdue_units_count, 3);
        assert_eq!(report.summary.total_partially_paid_amount, 850.0);
    }

    #[test]
    fn upcoming_view_reports_days_remaining() {
        let report = dues_report(&sample(), DuesView::Upcoming, today());
        let rows = report
            .rows
            .iter()
            .map(|row| (row.unit.unit_id.as_str(), row.days_remaining))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![("B1-F1-A003", Some(45)), ("B2-F1-A002", Some(14))]
        );
        assert_eq!(
            report.total_remaining,
            report.rows.iter().map(|row| row.remaining).sum::<f64>()
        );
    }

    #[test]
    fn plans_sort_overdue_then_needs_plan_then_position() {
        let mut buildings = sample();
        let mut archived = rented(2, 4, Some(PaymentStatus::Paid));
        archived.plan_archived = true;
        buildings[1].apartments.units.push(archived);

        let overview = payment_plans_overview(&buildings, today(), None);
        let order = overview
            .active
            .iter()
            .map(|row| row.unit.unit_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec!["B2-F1-A001", "B1-F1-A002", "B1-F1-A003", "B2-F1-A002"]
        );
        assert_eq!(overview.overdue_count, 3);
        let completed = overview
            .completed
            .iter()
            .map(|row| row.unit.unit_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(completed, vec!["B2-F1-A003", "B2-F1-A004"]);

        let searched = payment_plans_overview(&buildings, today(), Some("2"));
        assert!(searched.active.iter().all(|row| row.unit.building_id == 2
            || row.unit.unit_number.to_string().contains('2')));
    }

    #[test]
    fn claims_queue_puts_unclaimed_units_first() {
        let mut buildings = sample();
        buildings[0].apartments.units[1].claim_history.push(ClaimRecord {
            id: "claim-1".to_string(),
            date: Utc
                .with_ymd_and_hms(2026, 2, 10, 9, 0, 0)
                .single()
                .expect("instant"),
            action: "مطالبة عبر واتساب".to_string(),
        });

        let queue = claims_queue(&buildings, today());
        let order = queue
            .active_dues
            .iter()
            .map(|row| row.unit.unit_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["B1-F1-A003", "B2-F1-A001", "B1-F1-A002"]);
        assert_eq!(queue.with_claim_history.len(), 1);
        let last = queue.active_dues[2].last_claim.as_ref().expect("claimed");
        assert_eq!(last.action, "مطالبة عبر واتساب");
    }

    #[test]
    fn lost_revenue_breaks_down_by_cause() {
        let mut buildings = sample();
        let mut vacant = Unit::new("B2-F1-A009".to_string(), 2, 1, UnitType::Apartment, 9, 1700.0);
        vacant.maintenance_history.push(MaintenanceRecord {
            id: "m1".to_string(),
            start_date: date("2026-01-01"),
            end_date: date("2026-01-05"),
            expected_end_date: None,
            cost: 300.0,
            kind: VacancyReason::Painting,
            description: String::new(),
        });
        buildings[1].apartments.units.push(vacant);

        let report = lost_revenue_report(&buildings, today());
        let section = |cause| {
            report
                .sections
                .iter()
                .find(|section| section.cause == cause)
                .map(|section| (section.total_lost, section.unit_count))
        };
        assert_eq!(section(LossCause::DeferredPayment), Some((850.0 + 1700.0 + 1700.0 + 1700.0, 4)));
        assert_eq!(section(LossCause::Scholarship), Some((1700.0, 1)));
        assert_eq!(section(LossCause::Available), Some((1700.0, 1)));
        assert_eq!(section(LossCause::MaintenanceCost), Some((300.0, 1)));
        assert!(report
            .sections
            .windows(2)
            .all(|pair| pair[0].total_lost >= pair[1].total_lost));

        assert_eq!(report.total_expected_revenue, 7.0 * 1700.0);
        assert_eq!(report.total_actual_revenue, 1700.0 + 850.0);
        assert_eq!(report.apartments.rented, 6);
        assert_eq!(report.apartments.available, 1);
    }

    #[test]
    fn building_revenue_uses_collected_rent_of_rented_units() {
        let report = building_revenue_report(&sample());
        assert_eq!(report.rows[0].expected_revenue, 5100.0);
        assert_eq!(report.rows[0].actual_revenue, 1700.0 + 850.0);
        assert_eq!(report.rows[0].rented_apartments, 3);
        assert_eq!(
            report.total_deficit,
            report.total_expected_revenue - report.total_actual_revenue
        );
    }

    #[test]
    fn building_revenue_reports_achievement_and_type_split() {
        let mut vacant = rented(1, 2, None);
        vacant.occupancy = Occupancy::Available;
        vacant.payment_status = None;
        vacant.actual_rent = None;
        let suite = |number: u32, occupancy: Occupancy| {
            let mut unit = Unit::new(
                format!("B1-F1-S{number:03}"),
                1,
                1,
                UnitType::Suite,
                number,
                3000.0,
            );
            unit.occupancy = occupancy;
            unit
        };
        let campus = vec![BuildingData {
            id: 1,
            name: "مبنى 1".to_string(),
            apartments: RoomData::new(
                1700.0,
                vec![rented(1, 1, Some(PaymentStatus::Paid)), vacant],
            ),
            suites: RoomData::new(
                3000.0,
                vec![suite(1, Occupancy::Rented), suite(2, Occupancy::Office)],
            ),
        }];

        let report = building_revenue_report(&campus);
        assert_eq!(report.total_expected_revenue, 9400.0);
        assert_eq!(report.total_actual_revenue, 4700.0);
        assert_eq!(report.achievement_percentage, 50.0);
        assert_eq!(report.occupancy_percentage, 66.67);

        let apartments = &report.revenue_by_type[0];
        assert_eq!(apartments.unit_type, UnitType::Apartment);
        assert_eq!(apartments.expected_revenue, 3400.0);
        assert_eq!(apartments.actual_revenue, 1700.0);
        assert_eq!(apartments.share_percentage, 36.17);
        let suites = &report.revenue_by_type[1];
        assert_eq!(suites.unit_type, UnitType::Suite);
        assert_eq!(suites.actual_revenue, 3000.0);
        assert_eq!(suites.achievement_percentage, 50.0);
        assert_eq!(suites.share_percentage, 63.83);
    }

    #[test]
    fn building_revenue_kpis_are_zero_without_units() {
        let report = building_revenue_report(&[]);
        assert_eq!(report.achievement_percentage, 0.0);
        assert_eq!(report.occupancy_percentage, 0.0);
        assert!(report
            .revenue_by_type
            .iter()
            .all(|source| source.share_percentage == 0.0));
    }

    #[test]
    fn maintenance_punctuality_and_costs() {
        let mut unit = rented(1, 1, Some(PaymentStatus::Paid));
        for (index, (end, expected, cost)) in [
            ("2026-01-05", Some("2026-01-10"), 100.0),
            ("2026-01-10", Some("2026-01-10"), 200.0),
            ("2026-01-20", Some("2026-01-10"), 300.0),
            ("2026-01-20", None, 0.0),
        ]
        .into_iter()
        .enumerate()
        {
            unit.maintenance_history.push(MaintenanceRecord {
                id: format!("m{index}"),
                start_date: date("2026-01-01"),
                end_date: date(end),
                expected_end_date: expected.map(date),
                cost,
                kind: VacancyReason::Electrical,
                description: String::new(),
            });
        }
        let report = maintenance_report(&[building(1, vec![unit])], today());
        assert_eq!(report.total_jobs, 4);
        assert_eq!(report.total_cost, 600.0);
        assert_eq!(report.average_cost, 150.0);
        assert_eq!(report.punctuality.early, 1);
        assert_eq!(report.punctuality.on_time, 2);
        assert_eq!(report.punctuality.delayed, 1);
        assert_eq!(report.reason_counts.get("electrical"), Some(&4));
        assert_eq!(report.by_unit[0].net, 1100.0);
    }
}
