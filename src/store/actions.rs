use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    BuildingData, Occupancy, PaymentPlan, PaymentStatus, Unit, UnitStatus, UnitType,
    VacancyReason, YearlyForecastInput,
};

/// Every mutation the dashboard can make. Each one targets explicit keys and
/// replaces the whole document when reduced.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UpdateUnit {
        building_id: u32,
        unit_id: String,
        patch: UnitPatch,
    },
    UpdateUnitStatus {
        building_id: u32,
        unit_type: UnitType,
        unit_id: String,
        status: UnitStatus,
        reason: Option<VacancyReason>,
    },
    UpdatePaymentPlan {
        building_id: u32,
        unit_id: String,
        plan: Option<PaymentPlan>,
    },
    ArchiveCompletedPlan {
        building_id: u32,
        unit_id: String,
    },
    /// Applies the closing edits, if any, and archives the episode in one step.
    CompleteMaintenance {
        building_id: u32,
        unit_id: String,
        patch: Option<UnitPatch>,
    },
    CancelMaintenance {
        building_id: u32,
        unit_id: String,
    },
    AddBuilding(NewBuilding),
    DeleteBuilding {
        building_id: u32,
    },
    AddUnit {
        building_id: u32,
        unit_type: UnitType,
        floor: u32,
        unit_number: u32,
        base_rent: f64,
    },
    DeleteUnit {
        building_id: u32,
        unit_id: String,
    },
    LogClaimAction {
        building_id: u32,
        unit_id: String,
        action: String,
    },
    UpdateAllBaseRents {
        apartment_rent: f64,
        suite_rent: f64,
    },
    UpdateAllPaymentStatuses {
        scope: RentedScope,
        payment_status: BulkPaymentStatus,
    },
    SaveForecastInputs(Vec<YearlyForecastInput>),
    ReplaceBuildings(Vec<BuildingData>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateUnit { .. } => "update_unit",
            Self::UpdateUnitStatus { .. } => "update_unit_status",
            Self::UpdatePaymentPlan { .. } => "update_payment_plan",
            Self::ArchiveCompletedPlan { .. } => "archive_completed_plan",
            Self::CompleteMaintenance { .. } => "complete_maintenance",
            Self::CancelMaintenance { .. } => "cancel_maintenance",
            Self::AddBuilding(_) => "add_building",
            Self::DeleteBuilding { .. } => "delete_building",
            Self::AddUnit { .. } => "add_unit",
            Self::DeleteUnit { .. } => "delete_unit",
            Self::LogClaimAction { .. } => "log_claim_action",
            Self::UpdateAllBaseRents { .. } => "update_all_base_rents",
            Self::UpdateAllPaymentStatuses { .. } => "update_all_payment_statuses",
            Self::SaveForecastInputs(_) => "save_forecast_inputs",
            Self::ReplaceBuildings(_) => "replace_buildings",
        }
    }
}

/// Shallow field merge for one unit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPatch {
    pub base_rent: Option<f64>,
    pub actual_rent: Option<f64>,
    pub rent_date: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
    pub maintenance: Option<MaintenancePatch>,
}

/// Edits to an open maintenance episode; ignored when the unit is not under
/// maintenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePatch {
    pub vacancy_reason: Option<VacancyReason>,
    pub maintenance_cost: Option<f64>,
    pub maintenance_start_date: Option<NaiveDate>,
    pub maintenance_end_date: Option<NaiveDate>,
}

impl UnitPatch {
    pub fn is_empty(&self) -> bool {
        self == &UnitPatch::default()
    }

    pub fn apply_to(&self, unit: &mut Unit) {
        if let Some(base_rent) = self.base_rent {
            unit.base_rent = base_rent;
        }
        if let Some(actual_rent) = self.actual_rent {
            unit.actual_rent = Some(actual_rent);
        }
        if let Some(rent_date) = self.rent_date {
            unit.rent_date = Some(rent_date);
        }
        if let Some(payment_status) = self.payment_status {
            unit.payment_status = Some(payment_status);
        }
        if let (Some(maintenance), Occupancy::UnderMaintenance(active)) =
            (&self.maintenance, &mut unit.occupancy)
        {
            if let Some(reason) = maintenance.vacancy_reason {
                active.vacancy_reason = reason;
            }
            if let Some(cost) = maintenance.maintenance_cost {
                active.maintenance_cost = Some(cost);
            }
            if let Some(start) = maintenance.maintenance_start_date {
                active.maintenance_start_date = start;
            }
            if let Some(end) = maintenance.maintenance_end_date {
                active.maintenance_end_date = Some(end);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorLayout {
    pub apartments: u32,
    pub suites: u32,
}

/// Layout of a building to create. Floors are numbered from 1 in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBuilding {
    pub name: String,
    pub floors: Vec<FloorLayout>,
    pub apartment_rent: f64,
    pub suite_rent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentedScope {
    AllRented,
    RentedApartments,
    RentedSuites,
}

impl RentedScope {
    pub fn covers(self, unit_type: UnitType) -> bool {
        match self {
            Self::AllRented => true,
            Self::RentedApartments => unit_type == UnitType::Apartment,
            Self::RentedSuites => unit_type == UnitType::Suite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkPaymentStatus {
    Paid,
    Deferred,
}
