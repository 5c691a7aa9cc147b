use chrono::NaiveDate;

use super::money::format_currency;
use super::reports::{
    BuildingRevenueReport, ClaimRow, DuesReport, DuesView, LossCause, LostRevenueReport,
    MaintenanceReport, Punctuality, UnitRef,
};
use super::spreadsheet::{Cell, Sheet, Workbook};
use crate::domain::UnitType;

const NOT_AVAILABLE: &str = "-";

/// A workbook plus the title its download is named after.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub title: String,
    pub workbook: Workbook,
}

impl Export {
    fn single(title: &str, sheet: Sheet) -> Self {
        Self {
            title: title.to_string(),
            workbook: Workbook::new().with_sheet(sheet),
        }
    }

    /// First sheet, used for print output.
    pub fn primary_sheet(&self) -> Option<&Sheet> {
        self.workbook.sheets.first()
    }
}

fn day(date: Option<NaiveDate>) -> Cell {
    match date {
        Some(date) => Cell::from(date.format("%Y-%m-%d").to_string()),
        None => Cell::from(NOT_AVAILABLE),
    }
}

fn count_or_dash(count: usize) -> Cell {
    if count > 0 {
        Cell::from(count)
    } else {
        Cell::from(NOT_AVAILABLE)
    }
}

fn unit_cells(unit: &UnitRef) -> [Cell; 2] {
    [
        Cell::from(unit.label.clone()),
        Cell::from(unit.unit_type.label()),
    ]
}

pub fn dues_export(report: &DuesReport, currency: &str) -> Export {
    let time_column = match report.view {
        DuesView::Overdue => "مدة التأخير",
        DuesView::Upcoming => "الأيام المتبقية",
    };
    let mut columns = vec![
        "المبنى/الغرفة",
        "نوع الوحدة",
        "مبلغ الإيجار",
        "نوع الخطة",
        "عدد الأقساط",
        "المسدد منها",
        "موعد الاستحقاق",
        time_column,
        "قيمة الدفعة",
        "المبلغ المتبقي",
    ];
    if report.view == DuesView::Overdue {
        columns.push("عدد المطالبات");
    }

    let mut sheet = Sheet::new(report.title.clone(), &columns);
    for row in &report.rows {
        let days = match report.view {
            DuesView::Overdue => row.delay_days,
            DuesView::Upcoming => row.days_remaining,
        };
        let mut cells = unit_cells(&row.unit).to_vec();
        cells.extend([
            Cell::from(format_currency(row.rent, currency)),
            Cell::from(row.plan_type.map(|plan| plan.label()).unwrap_or("لا يوجد خطة")),
            count_or_dash(row.installments_count),
            count_or_dash(row.paid_count),
            day(row.due_date),
            Cell::from(
                days.map(|days| format!("{days} يوم"))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            Cell::from(
                row.installment_amount
                    .map(|amount| format_currency(amount, currency))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            Cell::from(format_currency(row.remaining, currency)),
        ]);
        if report.view == DuesView::Overdue {
            cells.push(Cell::from(format!("{} مطالبة", row.claim_count)));
        }
        sheet.push_row(cells);
    }

    let mut footer = vec![Cell::from("الإجمالي")];
    footer.extend(std::iter::repeat(Cell::Empty).take(8));
    footer.push(Cell::from(format_currency(report.total_remaining, currency)));
    Export::single(&report.title, sheet.with_footer(footer))
}

pub fn claims_export(rows: &[ClaimRow], currency: &str) -> Export {
    let mut sheet = Sheet::new(
        "تقرير المطالبات المالية",
        &[
            "المبنى/الغرفة",
            "نوع الوحدة",
            "حالة السداد",
            "تاريخ الاستحقاق القادم",
            "المبلغ المتبقي",
            "آخر إجراء مطالبة",
            "تاريخ آخر إجراء",
        ],
    );
    for row in rows {
        let mut cells = unit_cells(&row.unit).to_vec();
        cells.extend([
            Cell::from(
                row.payment_status
                    .map(|status| status.label())
                    .unwrap_or("غير محدد"),
            ),
            day(row.due_date),
            Cell::from(format_currency(row.remaining, currency)),
            Cell::from(
                row.last_claim
                    .as_ref()
                    .map(|claim| claim.action.clone())
                    .unwrap_or_else(|| "لا يوجد".to_string()),
            ),
            day(row.last_claim.as_ref().map(|claim| claim.date.date_naive())),
        ]);
        sheet.push_row(cells);
    }
    Export::single("المطالبات المالية", sheet)
}

pub fn lost_revenue_export(report: &LostRevenueReport) -> Export {
    let mut sheet = Sheet::new(
        "تفاصيل فقد الإيرادات",
        &["سبب فقدان الإيراد", "عدد الوحدات", "قيمة الفقد (الفصل الحالي)"],
    );
    for section in &report.sections {
        let count = if section.cause == LossCause::MaintenanceCost {
            Cell::from(format!("{} عملية", section.unit_count))
        } else {
            Cell::from(section.unit_count)
        };
        sheet.push_row(vec![
            Cell::from(section.title.clone()),
            count,
            Cell::from(section.total_lost),
        ]);
    }
    let sheet = sheet.with_footer(vec![
        Cell::from("إجمالي الإيرادات المفقودة"),
        Cell::Empty,
        Cell::from(report.total_lost_revenue),
    ]);
    Export::single("تفاصيل الإيرادات المفقودة", sheet)
}

pub fn building_revenue_export(report: &BuildingRevenueReport, currency: &str) -> Export {
    let mut summary = Sheet::new("ملخص الإيرادات", &["البند", "المبلغ"]);
    let mut lines = vec![
        (
            "إجمالي الإيرادات المتوقعة".to_string(),
            format_currency(report.total_expected_revenue, currency),
        ),
        (
            "إجمالي الإيرادات الفعلية (المحققة)".to_string(),
            format_currency(report.total_actual_revenue, currency),
        ),
        (
            "اجمالي قيمة المبالغ الغير محققة".to_string(),
            format_currency(report.total_deficit, currency),
        ),
        ("نسبة العجز".to_string(), format!("{:.1}%", report.deficit_percentage)),
        (
            "نسبة تحقيق الإيرادات".to_string(),
            format!("{:.1}%", report.achievement_percentage),
        ),
        ("نسبة الإشغال".to_string(), format!("{:.1}%", report.occupancy_percentage)),
    ];
    for source in &report.revenue_by_type {
        let kind = match source.unit_type {
            UnitType::Apartment => "الشقق",
            UnitType::Suite => "الأجنحة",
        };
        lines.push((
            format!("إيرادات {kind}"),
            format!(
                "{} ({:.1}%)",
                format_currency(source.actual_revenue, currency),
                source.share_percentage
            ),
        ));
    }
    for (label, value) in lines {
        summary.push_row(vec![Cell::from(label), Cell::from(value)]);
    }

    let mut table = Sheet::new(
        "تقرير إيرادات المباني",
        &[
            "المبنى",
            "اجمالي غرف المبنى",
            "شقق مؤجرة",
            "أجنحة مؤجرة",
            "قيمة الإيجار الكلي",
            "قيمة العجز",
            "قيمة الايرادات المحققة",
        ],
    );
    for row in &report.rows {
        table.push_row(vec![
            Cell::from(row.name.clone()),
            Cell::from(row.total_units),
            Cell::from(row.rented_apartments),
            Cell::from(row.rented_suites),
            Cell::from(row.expected_revenue),
            Cell::from(row.deficit),
            Cell::from(row.actual_revenue),
        ]);
    }
    let table = table.with_footer(vec![
        Cell::from("الإجمالي"),
        Cell::from(report.rows.iter().map(|row| row.total_units).sum::<usize>()),
        Cell::from(report.rows.iter().map(|row| row.rented_apartments).sum::<usize>()),
        Cell::from(report.rows.iter().map(|row| row.rented_suites).sum::<usize>()),
        Cell::from(report.total_expected_revenue),
        Cell::from(report.total_deficit),
        Cell::from(report.total_actual_revenue),
    ]);

    Export {
        title: "تقرير إيرادات المباني".to_string(),
        workbook: Workbook::new().with_sheet(table).with_sheet(summary),
    }
}

pub fn maintenance_export(report: &MaintenanceReport, currency: &str) -> Export {
    let mut archived = Sheet::new(
        "سجل الصيانة المكتملة",
        &[
            "المبنى/الغرفة",
            "نوع الوحدة",
            "نوع الصيانة",
            "تاريخ البدء",
            "تاريخ الانتهاء",
            "التاريخ المتوقع",
            "التكلفة",
            "الأداء",
        ],
    );
    for row in &report.archived {
        let punctuality = match Punctuality::of(&row.record) {
            Punctuality::Early => "مبكر",
            Punctuality::OnTime => "في الموعد",
            Punctuality::Delayed => "متأخر",
        };
        let mut cells = unit_cells(&row.unit).to_vec();
        cells.extend([
            Cell::from(row.record.kind.label()),
            day(Some(row.record.start_date)),
            day(Some(row.record.end_date)),
            day(row.record.expected_end_date),
            Cell::from(row.record.cost),
            Cell::from(punctuality),
        ]);
        archived.push_row(cells);
    }
    let mut footer = vec![Cell::from("الإجمالي")];
    footer.extend(std::iter::repeat(Cell::Empty).take(5));
    footer.push(Cell::from(format_currency(report.total_cost, currency)));
    let archived = archived.with_footer(footer);

    let mut active = Sheet::new(
        "الوحدات تحت الصيانة",
        &[
            "المبنى/الغرفة",
            "نوع الوحدة",
            "سبب الشغور",
            "تاريخ البدء",
            "التاريخ المتوقع",
            "عدد الأيام",
            "التكلفة",
        ],
    );
    for row in &report.active {
        let mut cells = unit_cells(&row.unit).to_vec();
        cells.extend([
            Cell::from(row.vacancy_reason.label()),
            day(Some(row.start_date)),
            day(row.expected_end_date),
            Cell::from(row.days_open as f64),
            Cell::from(row.maintenance_cost),
        ]);
        active.push_row(cells);
    }

    Export {
        title: "تقرير الصيانة".to_string(),
        workbook: Workbook::new().with_sheet(archived).with_sheet(active),
    }
}

#[cfg(test)]
mod tests {
    use super::{building_revenue_export, dues_export, lost_revenue_export};
    use crate::domain::{BuildingData, Occupancy, PaymentStatus, RoomData, Unit, UnitType};
    use crate::services::reports::{
        building_revenue_report, dues_report, lost_revenue_report, DuesView,
    };
    use crate::services::spreadsheet::Cell;
    use chrono::NaiveDate;

    fn buildings() -> Vec<BuildingData> {
        let mut deferred = Unit::new("B1-F1-A001".to_string(), 1, 1, UnitType::Apartment, 1, 1700.0);
        deferred.occupancy = Occupancy::Rented;
        deferred.payment_status = Some(PaymentStatus::Deferred);
        let vacant = Unit::new("B1-F1-A002".to_string(), 1, 1, UnitType::Apartment, 2, 1700.0);
        vec![BuildingData {
            id: 1,
            name: "مبنى 1".to_string(),
            apartments: RoomData::new(1700.0, vec![deferred, vacant]),
            suites: RoomData::new(3000.0, Vec::new()),
        }]
    }

    #[test]
    fn dues_export_has_claim_column_and_total_footer() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).expect("date");
        let report = dues_report(&buildings(), DuesView::Overdue, today);
        let export = dues_export(&report, "SAR");
        let sheet = export.primary_sheet().expect("sheet");

        assert_eq!(sheet.columns.len(), 11);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0][0], Cell::from("1 / 1"));
        assert_eq!(sheet.rows[0][3], Cell::from("لا يوجد خطة"));
        assert_eq!(sheet.rows[0][10], Cell::from("0 مطالبة"));
        let footer = sheet.footer.as_ref().expect("footer");
        assert_eq!(footer[9], Cell::from("1,700 SAR"));
    }

    #[test]
    fn lost_revenue_export_counts_maintenance_jobs() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).expect("date");
        let export = lost_revenue_export(&lost_revenue_report(&buildings(), today));
        let sheet = export.primary_sheet().expect("sheet");
        assert_eq!(sheet.rows.len(), 7);
        assert!(sheet
            .rows
            .iter()
            .any(|row| row[1] == Cell::from("0 عملية".to_string())));
    }

    #[test]
    fn building_revenue_summary_lists_kpis() {
        let mut campus = buildings();
        campus[0].apartments.units[0].payment_status = Some(PaymentStatus::Paid);
        let export = building_revenue_export(&building_revenue_report(&campus), "SAR");
        let summary = &export.workbook.sheets[1];
        let row = |label: &str| {
            summary
                .rows
                .iter()
                .find(|row| row[0] == Cell::from(label))
                .map(|row| row[1].clone())
        };
        assert_eq!(row("نسبة تحقيق الإيرادات"), Some(Cell::from("50.0%")));
        assert_eq!(row("نسبة الإشغال"), Some(Cell::from("50.0%")));
        assert_eq!(
            row("إيرادات الشقق"),
            Some(Cell::from("1,700 SAR (100.0%)"))
        );
        assert_eq!(row("إيرادات الأجنحة"), Some(Cell::from("0 SAR (0.0%)")));
    }
}
