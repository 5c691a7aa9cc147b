use chrono::NaiveDate;

use super::actions::{FloorLayout, NewBuilding};
use super::reducer::build_from_layout;
use crate::domain::{AppData, BulkRentValues, Occupancy, PaymentStatus};

const SEED_BUILDING_COUNT: u32 = 8;

fn seed_floors() -> Vec<FloorLayout> {
    vec![
        FloorLayout {
            apartments: 16,
            suites: 4,
        },
        FloorLayout {
            apartments: 36,
            suites: 2,
        },
        FloorLayout {
            apartments: 36,
            suites: 2,
        },
        FloorLayout {
            apartments: 36,
            suites: 2,
        },
    ]
}

/// Starting dataset: eight identical buildings, every unit rented and paid
/// as of `today`.
pub fn default_data(apartment_rent: f64, suite_rent: f64, today: NaiveDate) -> AppData {
    let buildings = (1..=SEED_BUILDING_COUNT)
        .map(|building_id| {
            let mut building = build_from_layout(
                building_id,
                NewBuilding {
                    name: format!("مبنى {building_id}"),
                    floors: seed_floors(),
                    apartment_rent,
                    suite_rent,
                },
            );
            for unit in building
                .apartments
                .units
                .iter_mut()
                .chain(building.suites.units.iter_mut())
            {
                unit.occupancy = Occupancy::Rented;
                unit.payment_status = Some(PaymentStatus::Paid);
                unit.actual_rent = Some(unit.base_rent);
                unit.rent_date = Some(today);
            }
            building.refresh_counts();
            building
        })
        .collect();

    AppData {
        buildings,
        bulk_rent_values: BulkRentValues {
            apartment_rent,
            suite_rent,
        },
        ..AppData::default()
    }
}

#[cfg(test)]
mod tests {
    use super::default_data;
    use chrono::NaiveDate;

    #[test]
    fn seeds_eight_fully_rented_buildings() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).expect("date");
        let data = default_data(1700.0, 3000.0, today);
        assert_eq!(data.buildings.len(), 8);

        let building = &data.buildings[7];
        assert_eq!(building.id, 8);
        assert_eq!(building.name, "مبنى 8");
        assert_eq!(building.apartments.total, 124);
        assert_eq!(building.apartments.rented, 124);
        assert_eq!(building.suites.total, 10);
        assert_eq!(building.suites.units[4].id, "B8-F2-S005");
        assert!(data
            .all_units()
            .all(|unit| unit.actual_rent == Some(unit.base_rent) && unit.rent_date == Some(today)));
    }
}
