use serde::{Deserialize, Serialize};

use super::unit::{Unit, UnitType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    pub total: u32,
    pub rented: u32,
    /// Default rent for the group; individual units carry their own base rent.
    pub rent: f64,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl RoomData {
    pub fn new(rent: f64, units: Vec<Unit>) -> Self {
        let mut group = Self {
            total: 0,
            rented: 0,
            rent,
            units,
        };
        group.refresh_counts();
        group
    }

    pub fn refresh_counts(&mut self) {
        self.total = self.units.len() as u32;
        self.rented = self.units.iter().filter(|unit| unit.is_rented()).count() as u32;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    pub id: u32,
    pub name: String,
    pub apartments: RoomData,
    pub suites: RoomData,
}

impl BuildingData {
    pub fn group(&self, unit_type: UnitType) -> &RoomData {
        match unit_type {
            UnitType::Apartment => &self.apartments,
            UnitType::Suite => &self.suites,
        }
    }

    pub fn group_mut(&mut self, unit_type: UnitType) -> &mut RoomData {
        match unit_type {
            UnitType::Apartment => &mut self.apartments,
            UnitType::Suite => &mut self.suites,
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.apartments.units.iter().chain(self.suites.units.iter())
    }

    pub fn unit_count(&self) -> usize {
        self.apartments.units.len() + self.suites.units.len()
    }

    pub fn find_unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units().find(|unit| unit.id == unit_id)
    }

    pub fn find_unit_mut(&mut self, unit_id: &str) -> Option<&mut Unit> {
        self.apartments
            .units
            .iter_mut()
            .chain(self.suites.units.iter_mut())
            .find(|unit| unit.id == unit_id)
    }

    pub fn contains_unit_id(&self, unit_id: &str) -> bool {
        self.find_unit(unit_id).is_some()
    }

    pub fn refresh_counts(&mut self) {
        self.apartments.refresh_counts();
        self.suites.refresh_counts();
    }
}
