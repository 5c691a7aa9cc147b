pub mod building;
pub mod forecast;
pub mod plan;
pub mod unit;

use serde::{Deserialize, Serialize};

pub use building::{BuildingData, RoomData};
pub use forecast::{BulkRentValues, SemesterData, YearlyForecastInput};
pub use plan::{Installment, PaymentPlan, PlanKind, PlanType};
pub use unit::{
    ActiveMaintenance, ClaimRecord, MaintenanceRecord, Occupancy, PaymentStatus, PriorStatus,
    Unit, UnitStatus, UnitType, VacancyReason,
};

/// Schema version written into every persisted document.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// The whole persisted document: every mutation rewrites it in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub version: u32,
    pub buildings: Vec<BuildingData>,
    #[serde(default)]
    pub forecast_inputs: Vec<YearlyForecastInput>,
    #[serde(default)]
    pub bulk_rent_values: BulkRentValues,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            buildings: Vec::new(),
            forecast_inputs: Vec::new(),
            bulk_rent_values: BulkRentValues::default(),
        }
    }
}

impl AppData {
    pub fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.buildings.iter().flat_map(BuildingData::units)
    }

    pub fn building(&self, building_id: u32) -> Option<&BuildingData> {
        self.buildings
            .iter()
            .find(|building| building.id == building_id)
    }

    pub fn find_unit(&self, building_id: u32, unit_id: &str) -> Option<&Unit> {
        self.building(building_id)
            .and_then(|building| building.find_unit(unit_id))
    }
}
