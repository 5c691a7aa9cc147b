use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::plan::PaymentPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[serde(alias = "apartments")]
    Apartment,
    #[serde(alias = "suites")]
    Suite,
}

impl UnitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::Suite => "suite",
        }
    }

    /// Letter used in generated unit ids (`B1-F2-A014`).
    pub fn id_letter(self) -> char {
        match self {
            Self::Apartment => 'A',
            Self::Suite => 'S',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Apartment => "شقة",
            Self::Suite => "جناح",
        }
    }
}

/// Flat occupancy status, as used in requests and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    Rented,
    UnderMaintenance,
    Office,
}

impl UnitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::UnderMaintenance => "under_maintenance",
            Self::Office => "office",
        }
    }
}

/// Status a unit returns to once maintenance ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorStatus {
    #[default]
    Available,
    Rented,
    Office,
}

impl From<PriorStatus> for Occupancy {
    fn from(status: PriorStatus) -> Self {
        match status {
            PriorStatus::Available => Occupancy::Available,
            PriorStatus::Rented => Occupancy::Rented,
            PriorStatus::Office => Occupancy::Office,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyReason {
    Maintenance,
    Furniture,
    Electrical,
    Painting,
    #[default]
    None,
}

impl VacancyReason {
    pub const ALL: [VacancyReason; 5] = [
        Self::Maintenance,
        Self::Furniture,
        Self::Electrical,
        Self::Painting,
        Self::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Furniture => "furniture",
            Self::Electrical => "electrical",
            Self::Painting => "painting",
            Self::None => "none",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Maintenance => "صيانة عامة",
            Self::Furniture => "أثاث",
            Self::Electrical => "كهرباء",
            Self::Painting => "دهان",
            Self::None => "غير محدد",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Deferred,
    Exempt,
    PaymentPlan,
    Scholarship,
    PaidInFull,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Deferred => "deferred",
            Self::Exempt => "exempt",
            Self::PaymentPlan => "payment_plan",
            Self::Scholarship => "scholarship",
            Self::PaidInFull => "paid_in_full",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Paid => "مسدد",
            Self::Deferred => "مؤجل",
            Self::Exempt => "إعفاء",
            Self::PaymentPlan => "خطة سداد",
            Self::Scholarship => "ابتعاث",
            Self::PaidInFull => "مسدد بالكامل",
        }
    }

    /// Statuses that still carry an outstanding balance.
    pub fn has_open_dues(self) -> bool {
        matches!(self, Self::Deferred | Self::PaymentPlan)
    }
}

/// Fields of a maintenance episode that is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMaintenance {
    #[serde(default)]
    pub status_before_maintenance: PriorStatus,
    #[serde(default)]
    pub vacancy_reason: VacancyReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_cost: Option<f64>,
    pub maintenance_start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Occupancy {
    Available,
    Rented,
    Office,
    UnderMaintenance(ActiveMaintenance),
}

impl Occupancy {
    pub fn status(&self) -> UnitStatus {
        match self {
            Self::Available => UnitStatus::Available,
            Self::Rented => UnitStatus::Rented,
            Self::Office => UnitStatus::Office,
            Self::UnderMaintenance(_) => UnitStatus::UnderMaintenance,
        }
    }

    /// Snapshot taken when entering maintenance. An open episode keeps its
    /// original snapshot.
    pub fn prior_status(&self) -> PriorStatus {
        match self {
            Self::Available => PriorStatus::Available,
            Self::Rented => PriorStatus::Rented,
            Self::Office => PriorStatus::Office,
            Self::UnderMaintenance(active) => active.status_before_maintenance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_end_date: Option<NaiveDate>,
    pub cost: f64,
    #[serde(rename = "type")]
    pub kind: VacancyReason,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub building_id: u32,
    pub floor: u32,
    pub unit_type: UnitType,
    pub unit_number: u32,
    #[serde(flatten)]
    pub occupancy: Occupancy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    pub base_rent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_date: Option<NaiveDate>,
    #[serde(default)]
    pub maintenance_history: Vec<MaintenanceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_plan: Option<PaymentPlan>,
    #[serde(default)]
    pub claim_history: Vec<ClaimRecord>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub plan_archived: bool,
}

impl Unit {
    pub fn new(
        id: String,
        building_id: u32,
        floor: u32,
        unit_type: UnitType,
        unit_number: u32,
        base_rent: f64,
    ) -> Self {
        Self {
            id,
            building_id,
            floor,
            unit_type,
            unit_number,
            occupancy: Occupancy::Available,
            payment_status: None,
            base_rent,
            actual_rent: None,
            rent_date: None,
            maintenance_history: Vec::new(),
            payment_plan: None,
            claim_history: Vec::new(),
            plan_archived: false,
        }
    }

    pub fn status(&self) -> UnitStatus {
        self.occupancy.status()
    }

    pub fn is_rented(&self) -> bool {
        matches!(self.occupancy, Occupancy::Rented)
    }

    pub fn active_maintenance(&self) -> Option<&ActiveMaintenance> {
        match &self.occupancy {
            Occupancy::UnderMaintenance(active) => Some(active),
            _ => None,
        }
    }

    /// `actualRent` with the dashboard's fallback to the base rent.
    pub fn collected_rent(&self) -> f64 {
        self.actual_rent.unwrap_or(self.base_rent)
    }

    pub fn last_claim(&self) -> Option<&ClaimRecord> {
        self.claim_history.iter().max_by_key(|claim| claim.date)
    }

    /// Human label `building / unit` used across tables and letters.
    pub fn display_label(&self) -> String {
        format!("{} / {}", self.building_id, self.unit_number)
    }
}

#[cfg(test)]
mod tests {
    use super::{Occupancy, PriorStatus, Unit, UnitStatus, UnitType, VacancyReason};
    use serde_json::json;

    #[test]
    fn maintenance_fields_live_inside_the_status_variant() {
        let raw = json!({
            "id": "B1-F1-A001",
            "buildingId": 1,
            "floor": 1,
            "unitType": "apartment",
            "unitNumber": 1,
            "status": "under_maintenance",
            "statusBeforeMaintenance": "rented",
            "vacancyReason": "painting",
            "maintenanceCost": 250,
            "maintenanceStartDate": "2026-03-01",
            "baseRent": 1700,
            "maintenanceHistory": [],
            "claimHistory": []
        });
        let unit: Unit = serde_json::from_value(raw).expect("valid unit");
        let active = unit.active_maintenance().expect("under maintenance");
        assert_eq!(active.status_before_maintenance, PriorStatus::Rented);
        assert_eq!(active.vacancy_reason, VacancyReason::Painting);
        assert_eq!(active.maintenance_cost, Some(250.0));
        assert_eq!(unit.status(), UnitStatus::UnderMaintenance);
    }

    #[test]
    fn plain_statuses_serialize_without_maintenance_fields() {
        let unit = Unit::new("B1-F1-S001".to_string(), 1, 1, UnitType::Suite, 1, 3000.0);
        let value = serde_json::to_value(&unit).expect("serializable");
        assert_eq!(value["status"], "available");
        assert!(value.get("vacancyReason").is_none());
        assert!(value.get("planArchived").is_none());
        assert_eq!(value["unitType"], "suite");
    }

    #[test]
    fn group_names_are_accepted_as_unit_types() {
        let parsed: UnitType = serde_json::from_value(json!("apartments")).expect("alias");
        assert_eq!(parsed, UnitType::Apartment);
        let parsed: UnitType = serde_json::from_value(json!("suite")).expect("name");
        assert_eq!(parsed, UnitType::Suite);
    }

    #[test]
    fn prior_status_of_open_episode_is_preserved() {
        let occupancy = Occupancy::UnderMaintenance(super::ActiveMaintenance {
            status_before_maintenance: PriorStatus::Office,
            vacancy_reason: VacancyReason::None,
            maintenance_cost: None,
            maintenance_start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
            maintenance_end_date: None,
        });
        assert_eq!(occupancy.prior_status(), PriorStatus::Office);
        assert_eq!(Occupancy::Rented.prior_status(), PriorStatus::Rented);
    }
}
