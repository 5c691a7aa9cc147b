use uuid::Uuid;

use super::actions::{Action, BulkPaymentStatus, NewBuilding, RentedScope};
use crate::clock::Moment;
use crate::domain::{
    ActiveMaintenance, AppData, BuildingData, ClaimRecord, MaintenanceRecord, Occupancy,
    PaymentPlan, PaymentStatus, RoomData, Unit, UnitStatus, UnitType, VacancyReason,
};
use crate::services::resolver::derive_payment_state;

/// Result of reducing one action. `matched` is false when the action's keys
/// pointed at nothing; the state is then an unchanged copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced {
    pub state: AppData,
    pub matched: bool,
}

pub fn reduce(state: &AppData, action: Action, moment: Moment) -> Reduced {
    let mut next = state.clone();
    let matched = apply(&mut next, action, moment);
    for building in &mut next.buildings {
        building.refresh_counts();
    }
    Reduced {
        state: next,
        matched,
    }
}

fn apply(data: &mut AppData, action: Action, moment: Moment) -> bool {
    match action {
        Action::UpdateUnit {
            building_id,
            unit_id,
            patch,
        } => with_unit(data, building_id, &unit_id, |unit| {
            patch.apply_to(unit);
            true
        }),
        Action::UpdateUnitStatus {
            building_id,
            unit_type,
            unit_id,
            status,
            reason,
        } => {
            let Some(unit) = building_mut(data, building_id).and_then(|building| {
                building
                    .group_mut(unit_type)
                    .units
                    .iter_mut()
                    .find(|unit| unit.id == unit_id)
            }) else {
                return false;
            };
            set_status(unit, status, reason, moment);
            true
        }
        Action::UpdatePaymentPlan {
            building_id,
            unit_id,
            plan,
        } => with_unit(data, building_id, &unit_id, |unit| {
            set_payment_plan(unit, plan, moment);
            true
        }),
        Action::ArchiveCompletedPlan {
            building_id,
            unit_id,
        } => with_unit(data, building_id, &unit_id, |unit| {
            unit.payment_status = Some(PaymentStatus::Paid);
            unit.actual_rent = Some(unit.base_rent);
            unit.plan_archived = true;
            true
        }),
        Action::CompleteMaintenance {
            building_id,
            unit_id,
            patch,
        } => with_unit(data, building_id, &unit_id, |unit| {
            if unit.active_maintenance().is_none() {
                return false;
            }
            if let Some(patch) = &patch {
                patch.apply_to(unit);
            }
            complete_maintenance(unit, moment)
        }),
        Action::CancelMaintenance {
            building_id,
            unit_id,
        } => with_unit(data, building_id, &unit_id, |unit| {
            let Some(active) = unit.active_maintenance() else {
                return false;
            };
            unit.occupancy = active.status_before_maintenance.into();
            true
        }),
        Action::AddBuilding(layout) => {
            let next_id = data
                .buildings
                .iter()
                .map(|building| building.id)
                .max()
                .map_or(1, |max| max + 1);
            data.buildings.push(build_from_layout(next_id, layout));
            true
        }
        Action::DeleteBuilding { building_id } => {
            let before = data.buildings.len();
            data.buildings.retain(|building| building.id != building_id);
            data.buildings.len() != before
        }
        Action::AddUnit {
            building_id,
            unit_type,
            floor,
            unit_number,
            base_rent,
        } => {
            let Some(building) = building_mut(data, building_id) else {
                return false;
            };
            let id = unique_unit_id(building, floor, unit_type, unit_number);
            let group = building.group_mut(unit_type);
            group.units.push(Unit::new(
                id,
                building_id,
                floor,
                unit_type,
                unit_number,
                base_rent,
            ));
            group.units.sort_by_key(|unit| unit.unit_number);
            true
        }
        Action::DeleteUnit {
            building_id,
            unit_id,
        } => {
            let Some(building) = building_mut(data, building_id) else {
                return false;
            };
            for group in [&mut building.apartments, &mut building.suites] {
                if let Some(position) = group.units.iter().position(|unit| unit.id == unit_id) {
                    group.units.remove(position);
                    return true;
                }
            }
            false
        }
        Action::LogClaimAction {
            building_id,
            unit_id,
            action,
        } => with_unit(data, building_id, &unit_id, |unit| {
            unit.claim_history.push(ClaimRecord {
                id: format!("claim-{}", Uuid::new_v4()),
                date: moment.now,
                action,
            });
            true
        }),
        Action::UpdateAllBaseRents {
            apartment_rent,
            suite_rent,
        } => {
            for building in &mut data.buildings {
                for unit in &mut building.apartments.units {
                    unit.base_rent = apartment_rent;
                }
                for unit in &mut building.suites.units {
                    unit.base_rent = suite_rent;
                }
            }
            data.bulk_rent_values.apartment_rent = apartment_rent;
            data.bulk_rent_values.suite_rent = suite_rent;
            true
        }
        Action::UpdateAllPaymentStatuses {
            scope,
            payment_status,
        } => {
            set_bulk_payment_status(data, scope, payment_status);
            true
        }
        Action::SaveForecastInputs(inputs) => {
            data.forecast_inputs = inputs;
            true
        }
        Action::ReplaceBuildings(buildings) => {
            data.buildings = buildings;
            true
        }
    }
}

fn building_mut(data: &mut AppData, building_id: u32) -> Option<&mut BuildingData> {
    data.buildings
        .iter_mut()
        .find(|building| building.id == building_id)
}

fn with_unit(
    data: &mut AppData,
    building_id: u32,
    unit_id: &str,
    update: impl FnOnce(&mut Unit) -> bool,
) -> bool {
    building_mut(data, building_id)
        .and_then(|building| building.find_unit_mut(unit_id))
        .map(update)
        .unwrap_or(false)
}

fn set_status(unit: &mut Unit, status: UnitStatus, reason: Option<VacancyReason>, moment: Moment) {
    unit.occupancy = match status {
        UnitStatus::Available => Occupancy::Available,
        UnitStatus::Rented => Occupancy::Rented,
        UnitStatus::Office => Occupancy::Office,
        UnitStatus::UnderMaintenance => match &unit.occupancy {
            Occupancy::UnderMaintenance(active) => {
                let mut active = active.clone();
                if let Some(reason) = reason {
                    active.vacancy_reason = reason;
                }
                Occupancy::UnderMaintenance(active)
            }
            current => Occupancy::UnderMaintenance(ActiveMaintenance {
                status_before_maintenance: current.prior_status(),
                vacancy_reason: reason.unwrap_or_default(),
                maintenance_cost: None,
                maintenance_start_date: moment.today,
                maintenance_end_date: None,
            }),
        },
    };
}

fn set_payment_plan(unit: &mut Unit, plan: Option<PaymentPlan>, moment: Moment) {
    match plan {
        Some(mut plan) => {
            plan.completed_date = None;
            let derived = derive_payment_state(Some(&plan), unit.base_rent, moment.now);
            plan.completed_date = derived.completed_date;
            unit.payment_status = Some(derived.payment_status);
            unit.actual_rent = Some(derived.actual_rent);
            unit.payment_plan = Some(plan);
            unit.plan_archived = false;
        }
        None => {
            let derived = derive_payment_state(None, unit.base_rent, moment.now);
            unit.payment_status = Some(derived.payment_status);
            unit.actual_rent = Some(derived.actual_rent);
            unit.payment_plan = None;
        }
    }
}

fn complete_maintenance(unit: &mut Unit, moment: Moment) -> bool {
    let Some(active) = unit.active_maintenance().cloned() else {
        return false;
    };
    unit.maintenance_history.push(MaintenanceRecord {
        id: format!("maint-{}-{}", unit.id, Uuid::new_v4().simple()),
        start_date: active.maintenance_start_date,
        end_date: moment.today,
        expected_end_date: active.maintenance_end_date,
        cost: active.maintenance_cost.unwrap_or(0.0),
        kind: active.vacancy_reason,
        description: format!("Completed maintenance for unit {}", unit.unit_number),
    });
    unit.occupancy = active.status_before_maintenance.into();
    true
}

fn set_bulk_payment_status(data: &mut AppData, scope: RentedScope, status: BulkPaymentStatus) {
    for building in &mut data.buildings {
        for unit_type in [UnitType::Apartment, UnitType::Suite] {
            if !scope.covers(unit_type) {
                continue;
            }
            for unit in building
                .group_mut(unit_type)
                .units
                .iter_mut()
                .filter(|unit| unit.is_rented())
            {
                let (payment_status, actual_rent) = match status {
                    BulkPaymentStatus::Paid => (PaymentStatus::Paid, unit.base_rent),
                    BulkPaymentStatus::Deferred => (PaymentStatus::Deferred, 0.0),
                };
                unit.payment_status = Some(payment_status);
                unit.actual_rent = Some(actual_rent);
                unit.payment_plan = None;
            }
        }
    }
}

pub fn unit_id(building_id: u32, floor: u32, unit_type: UnitType, unit_number: u32) -> String {
    format!(
        "B{building_id}-F{floor}-{}{unit_number:03}",
        unit_type.id_letter()
    )
}

fn unique_unit_id(
    building: &BuildingData,
    floor: u32,
    unit_type: UnitType,
    unit_number: u32,
) -> String {
    let base = unit_id(building.id, floor, unit_type, unit_number);
    if !building.contains_unit_id(&base) {
        return base;
    }
    (2..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !building.contains_unit_id(candidate))
        .unwrap_or(base)
}

pub(crate) fn build_from_layout(building_id: u32, layout: NewBuilding) -> BuildingData {
    let mut apartments = Vec::new();
    let mut suites = Vec::new();
    let mut next_apartment: u32 = 1;
    let mut next_suite: u32 = 1;

    for (index, floor_layout) in layout.floors.iter().enumerate() {
        let floor = index as u32 + 1;
        for offset in 0..floor_layout.apartments {
            let number = next_apartment.saturating_add(offset);
            apartments.push(Unit::new(
                unit_id(building_id, floor, UnitType::Apartment, number),
                building_id,
                floor,
                UnitType::Apartment,
                number,
                layout.apartment_rent,
            ));
        }
        next_apartment = next_apartment.saturating_add(floor_layout.apartments);

        for offset in 0..floor_layout.suites {
            let number = next_suite.saturating_add(offset);
            suites.push(Unit::new(
                unit_id(building_id, floor, UnitType::Suite, number),
                building_id,
                floor,
                UnitType::Suite,
                number,
                layout.suite_rent,
            ));
        }
        next_suite = next_suite.saturating_add(floor_layout.suites);
    }

    BuildingData {
        id: building_id,
        name: layout.name,
        apartments: RoomData::new(layout.apartment_rent, apartments),
        suites: RoomData::new(layout.suite_rent, suites),
    }
}
