use std::borrow::Cow;
use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::{
    BuildingData, Installment, PaymentPlan, PaymentStatus, PlanKind, PlanType, UnitStatus,
    UnitType, VacancyReason, YearlyForecastInput,
};
use crate::error::AppError;
use crate::services::reports::DuesView;
use crate::store::actions::{
    BulkPaymentStatus, FloorLayout, MaintenancePatch, NewBuilding, RentedScope, UnitPatch,
};

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

// ---------------------------------------------------------------------------
// Paths and queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingPath {
    pub building_id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitPath {
    pub building_id: u32,
    pub unit_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitsQuery {
    pub building_id: Option<u32>,
    pub unit_type: Option<UnitType>,
    pub status: Option<UnitStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub search: Option<String>,
}

fn default_dues_view() -> DuesView {
    DuesView::Overdue
}

#[derive(Debug, Clone, Deserialize)]
pub struct DuesQuery {
    #[serde(default = "default_dues_view")]
    pub view: DuesView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastQuery {
    pub years: Option<usize>,
}

// ---------------------------------------------------------------------------
// Buildings and units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_layout"))]
pub struct CreateBuildingInput {
    #[validate(length(min = 3, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub floors: Vec<FloorLayout>,
    #[validate(range(min = 0.0))]
    pub apartment_rent: f64,
    #[validate(range(min = 0.0))]
    pub suite_rent: f64,
}

const MAX_UNITS_PER_FLOOR: u32 = 200;
const MAX_UNITS_PER_BUILDING: u64 = 2_000;

fn validate_layout(input: &CreateBuildingInput) -> Result<(), ValidationError> {
    if input
        .floors
        .iter()
        .any(|floor| floor.apartments > MAX_UNITS_PER_FLOOR || floor.suites > MAX_UNITS_PER_FLOOR)
    {
        return Err(invalid(
            "floor_too_large",
            "a floor holds at most 200 apartments and 200 suites",
        ));
    }
    let units: u64 = input
        .floors
        .iter()
        .map(|floor| u64::from(floor.apartments) + u64::from(floor.suites))
        .sum();
    if units == 0 {
        return Err(invalid("empty_layout", "a building needs at least one unit"));
    }
    if units > MAX_UNITS_PER_BUILDING {
        return Err(invalid(
            "layout_too_large",
            "a building holds at most 2000 units",
        ));
    }
    Ok(())
}

impl From<CreateBuildingInput> for NewBuilding {
    fn from(input: CreateBuildingInput) -> Self {
        NewBuilding {
            name: input.name.trim().to_string(),
            floors: input.floors,
            apartment_rent: input.apartment_rent,
            suite_rent: input.suite_rent,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddUnitInput {
    pub unit_type: UnitType,
    #[validate(range(min = 1))]
    pub floor: u32,
    #[validate(range(min = 1))]
    pub unit_number: u32,
    /// Falls back to the group's rent.
    #[validate(range(min = 0.0))]
    pub base_rent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitInput {
    #[validate(range(min = 0.0))]
    pub base_rent: Option<f64>,
    #[validate(range(min = 0.0))]
    pub actual_rent: Option<f64>,
    pub rent_date: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
    pub vacancy_reason: Option<VacancyReason>,
    #[validate(range(min = 0.0))]
    pub maintenance_cost: Option<f64>,
    pub maintenance_start_date: Option<NaiveDate>,
    pub maintenance_end_date: Option<NaiveDate>,
}

impl UpdateUnitInput {
    pub fn into_patch(self) -> UnitPatch {
        let maintenance = MaintenancePatch {
            vacancy_reason: self.vacancy_reason,
            maintenance_cost: self.maintenance_cost,
            maintenance_start_date: self.maintenance_start_date,
            maintenance_end_date: self.maintenance_end_date,
        };
        UnitPatch {
            base_rent: self.base_rent,
            actual_rent: self.actual_rent,
            rent_date: self.rent_date,
            payment_status: self.payment_status,
            maintenance: (maintenance != MaintenancePatch::default()).then_some(maintenance),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatusInput {
    pub status: UnitStatus,
    pub vacancy_reason: Option<VacancyReason>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMaintenanceInput {
    #[validate(custom(function = "specified_reason"))]
    pub vacancy_reason: VacancyReason,
    pub maintenance_end_date: NaiveDate,
    #[validate(range(min = 0.0))]
    pub maintenance_cost: Option<f64>,
}

fn specified_reason(reason: &VacancyReason) -> Result<(), ValidationError> {
    if *reason == VacancyReason::None {
        return Err(invalid("reason_required", "choose a maintenance reason"));
    }
    Ok(())
}

impl CompleteMaintenanceInput {
    pub fn patch(&self) -> UnitPatch {
        UnitPatch {
            maintenance: Some(MaintenancePatch {
                vacancy_reason: Some(self.vacancy_reason),
                maintenance_cost: self.maintenance_cost,
                maintenance_start_date: None,
                maintenance_end_date: Some(self.maintenance_end_date),
            }),
            ..UnitPatch::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Payment plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_plan"))]
pub struct PaymentPlanInput {
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub deferred_until: Option<NaiveDate>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub stipend_deductions: Vec<Installment>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn validate_plan(input: &PaymentPlanInput) -> Result<(), ValidationError> {
    match input.plan_type {
        PlanType::Deferred if input.deferred_until.is_none() => Err(invalid(
            "deferred_until_required",
            "a deferred plan needs a deferral date",
        )),
        PlanType::Installment | PlanType::Stipend if input.entries().is_empty() => Err(invalid(
            "entries_required",
            "add at least one installment",
        )),
        _ if input.entries().iter().any(|entry| entry.amount < 0.0) => Err(invalid(
            "amount_negative",
            "installment amounts cannot be negative",
        )),
        _ => Ok(()),
    }
}

impl PaymentPlanInput {
    fn entries(&self) -> &[Installment] {
        match self.plan_type {
            PlanType::Installment => &self.installments,
            PlanType::Stipend => &self.stipend_deductions,
            _ => &[],
        }
    }

    /// Only the schedule matching the plan type is kept.
    pub fn into_plan(self) -> Result<PaymentPlan, AppError> {
        let kind = match self.plan_type {
            PlanType::Exempt => PlanKind::Exempt,
            PlanType::Scholarship => PlanKind::Scholarship,
            PlanType::Installment => PlanKind::Installment {
                installments: self.installments,
            },
            PlanType::Stipend => PlanKind::Stipend {
                stipend_deductions: self.stipend_deductions,
            },
            PlanType::Deferred => PlanKind::Deferred {
                deferred_until: self.deferred_until.ok_or_else(|| {
                    AppError::UnprocessableEntity("deferredUntil is required.".to_string())
                })?,
            },
        };
        let mut plan = PaymentPlan::new(kind);
        plan.notes = self
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());
        Ok(plan)
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogClaimInput {
    #[validate(length(min = 1, max = 200))]
    pub action: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappClaimInput {
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate(length(max = 4000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailClaimInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 4000))]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Bulk updates, forecast and state import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkBaseRentsInput {
    #[validate(range(min = 0.0))]
    pub apartment_rent: f64,
    #[validate(range(min = 0.0))]
    pub suite_rent: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPaymentStatusInput {
    pub scope: RentedScope,
    pub payment_status: BulkPaymentStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForecastInputs {
    #[validate(length(min = 1, max = 20), custom(function = "non_negative_forecast"))]
    pub inputs: Vec<YearlyForecastInput>,
}

fn non_negative_forecast(inputs: &[YearlyForecastInput]) -> Result<(), ValidationError> {
    let negative = inputs
        .iter()
        .flat_map(|input| input.semesters.iter())
        .any(|semester| semester.has_negative_amounts());
    if negative {
        return Err(invalid("negative_amount", "amounts cannot be negative"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceBuildingsInput {
    #[validate(custom(function = "consistent_buildings"))]
    pub buildings: Vec<BuildingData>,
}

/// Building ids are unique and every unit sits in the building and group it
/// claims to.
fn consistent_buildings(buildings: &[BuildingData]) -> Result<(), ValidationError> {
    let mut building_ids = HashSet::new();
    for building in buildings {
        if !building_ids.insert(building.id) {
            return Err(invalid("duplicate_building", "building ids must be unique"));
        }
        let mut unit_ids = HashSet::new();
        for (unit_type, group) in [
            (UnitType::Apartment, &building.apartments),
            (UnitType::Suite, &building.suites),
        ] {
            for unit in &group.units {
                if unit.building_id != building.id || unit.unit_type != unit_type {
                    return Err(invalid(
                        "misplaced_unit",
                        "units must match their building and group",
                    ));
                }
                if !unit_ids.insert(unit.id.as_str()) {
                    return Err(invalid("duplicate_unit", "unit ids must be unique per building"));
                }
            }
        }
    }
    Ok(())
}
