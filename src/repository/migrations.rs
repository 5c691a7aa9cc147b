use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use super::RepositoryError;
use crate::domain::CURRENT_SCHEMA_VERSION;

const MAINTENANCE_FIELDS: [&str; 5] = [
    "statusBeforeMaintenance",
    "vacancyReason",
    "maintenanceCost",
    "maintenanceStartDate",
    "maintenanceEndDate",
];

/// Brings a stored document up to the current schema. Documents without a
/// `version` tag were written by the browser dashboard and count as v1.
pub fn migrate(mut document: Value, today: NaiveDate) -> Result<Value, RepositoryError> {
    if !document.is_object() {
        return Err(RepositoryError::Malformed(
            "top-level value must be an object".to_string(),
        ));
    }
    let version = document.get("version").and_then(Value::as_u64).unwrap_or(1);
    if version > u64::from(CURRENT_SCHEMA_VERSION) {
        return Err(RepositoryError::UnsupportedVersion {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    if version < 2 {
        migrate_v1_to_v2(&mut document, today);
        tracing::info!(from = version, to = 2, "Migrated stored document");
    }
    Ok(document)
}

/// v1 documents carry optional fields that disagree with the unit's status or
/// plan type, full ISO timestamps where only a day is meant, and `null`s
/// written by the browser.
pub fn migrate_v1_to_v2(document: &mut Value, today: NaiveDate) {
    strip_nulls(document);
    let Some(root) = document.as_object_mut() else {
        return;
    };
    let today = today.format("%Y-%m-%d").to_string();

    if let Some(buildings) = root.get_mut("buildings").and_then(Value::as_array_mut) {
        for building in buildings.iter_mut().filter_map(Value::as_object_mut) {
            for group_key in ["apartments", "suites"] {
                let group = building
                    .entry(group_key)
                    .or_insert_with(|| json!({}));
                if let Some(group) = group.as_object_mut() {
                    migrate_group(group, &today);
                }
            }
        }
    }
    root.insert("version".to_string(), json!(2));
}

fn migrate_group(group: &mut Map<String, Value>, today: &str) {
    group.entry("total").or_insert(json!(0));
    group.entry("rented").or_insert(json!(0));
    group.entry("rent").or_insert(json!(0));
    let rent = group.get("rent").cloned().unwrap_or(json!(0));
    let units = group.entry("units").or_insert_with(|| json!([]));
    if let Some(units) = units.as_array_mut() {
        for unit in units.iter_mut().filter_map(Value::as_object_mut) {
            unit.entry("baseRent").or_insert_with(|| rent.clone());
            migrate_unit(unit, today);
        }
    }
}

fn migrate_unit(unit: &mut Map<String, Value>, today: &str) {
    for key in ["rentDate", "maintenanceStartDate", "maintenanceEndDate"] {
        truncate_to_day(unit, key);
    }

    let status = unit
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("available")
        .to_string();
    unit.insert("status".to_string(), json!(status));
    if status == "under_maintenance" {
        unit.entry("maintenanceStartDate").or_insert(json!(today));
        if unit.get("statusBeforeMaintenance").and_then(Value::as_str)
            == Some("under_maintenance")
        {
            unit.insert("statusBeforeMaintenance".to_string(), json!("available"));
        }
    } else {
        for key in MAINTENANCE_FIELDS {
            unit.remove(key);
        }
    }

    let unit_id = unit
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if let Some(history) = unit
        .entry("maintenanceHistory")
        .or_insert_with(|| json!([]))
        .as_array_mut()
    {
        for (index, record) in history.iter_mut().filter_map(Value::as_object_mut).enumerate() {
            migrate_maintenance_record(record, &unit_id, index, today);
        }
    }
    unit.entry("claimHistory").or_insert_with(|| json!([]));

    let keep_plan = match unit.get_mut("paymentPlan").and_then(Value::as_object_mut) {
        Some(plan) => migrate_plan(plan),
        None => true,
    };
    if !keep_plan {
        unit.remove("paymentPlan");
    }
}

fn migrate_maintenance_record(
    record: &mut Map<String, Value>,
    unit_id: &str,
    index: usize,
    today: &str,
) {
    for key in ["startDate", "endDate", "expectedEndDate"] {
        truncate_to_day(record, key);
    }
    record
        .entry("id")
        .or_insert_with(|| json!(format!("maint-{unit_id}-{}", index + 1)));
    record.entry("startDate").or_insert(json!(today));
    if !record.contains_key("endDate") {
        let start = record.get("startDate").cloned().unwrap_or(json!(today));
        record.insert("endDate".to_string(), start);
    }
    record.entry("cost").or_insert(json!(0));
    record.entry("type").or_insert(json!("none"));
    record.entry("description").or_insert(json!(""));
}

/// Returns false when the plan cannot be represented and must be dropped.
fn migrate_plan(plan: &mut Map<String, Value>) -> bool {
    let plan_type = plan
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let keep = match plan_type.as_str() {
        "installment" => keep_schedule(plan, "installments", "stipendDeductions"),
        "stipend" => keep_schedule(plan, "stipendDeductions", "installments"),
        "deferred" => {
            plan.remove("installments");
            plan.remove("stipendDeductions");
            truncate_to_day(plan, "deferredUntil");
            plan.contains_key("deferredUntil")
        }
        "exempt" | "scholarship" => {
            plan.remove("installments");
            plan.remove("stipendDeductions");
            plan.remove("deferredUntil");
            true
        }
        _ => false,
    };

    if let Some(completed) = plan.get("completedDate").and_then(Value::as_str) {
        if completed.len() == 10 {
            let completed = format!("{completed}T00:00:00Z");
            plan.insert("completedDate".to_string(), json!(completed));
        }
    }
    keep
}

fn keep_schedule(plan: &mut Map<String, Value>, keep: &str, drop: &str) -> bool {
    plan.remove(drop);
    plan.remove("deferredUntil");
    let entries = plan.entry(keep).or_insert_with(|| json!([]));
    if let Some(entries) = entries.as_array_mut() {
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            truncate_to_day(entry, "dueDate");
        }
        entries.retain(|entry| entry.get("dueDate").is_some_and(Value::is_string));
    }
    true
}

/// `2026-01-10T00:00:00.000Z` becomes `2026-01-10`.
fn truncate_to_day(map: &mut Map<String, Value>, key: &str) {
    let Some(raw) = map.get(key).and_then(Value::as_str) else {
        return;
    };
    if raw.len() > 10 {
        if let Some(day) = raw.get(..10) {
            let day = day.to_string();
            map.insert(key.to_string(), json!(day));
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, entry| !entry.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
