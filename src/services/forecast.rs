use serde::Serialize;

use super::money::round2;
use crate::domain::{BuildingData, SemesterData, YearlyForecastInput};

pub const MAX_FORECAST_YEARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterResult {
    pub revenue: f64,
    pub expenses: f64,
    pub net_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub year: i32,
    pub semesters: Vec<SemesterResult>,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_net_profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastTotals {
    pub revenue: f64,
    pub expenses: f64,
    pub net_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub inputs: Vec<YearlyForecastInput>,
    pub years: Vec<YearResult>,
    pub grand_totals: ForecastTotals,
    pub capacity: Capacity,
}

/// Unit counts and average group rents across all buildings; the ceiling
/// for rented counts and the seed for default inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub apartments: u32,
    pub suites: u32,
    pub apartment_rent: f64,
    pub suite_rent: f64,
}

impl Capacity {
    pub fn of(buildings: &[BuildingData], fallback_apartment_rent: f64, fallback_suite_rent: f64) -> Self {
        if buildings.is_empty() {
            return Self {
                apartments: 0,
                suites: 0,
                apartment_rent: fallback_apartment_rent,
                suite_rent: fallback_suite_rent,
            };
        }
        let count = buildings.len() as f64;
        Self {
            apartments: buildings.iter().map(|building| building.apartments.total).sum(),
            suites: buildings.iter().map(|building| building.suites.total).sum(),
            apartment_rent: (buildings.iter().map(|b| b.apartments.rent).sum::<f64>() / count)
                .round(),
            suite_rent: (buildings.iter().map(|b| b.suites.rent).sum::<f64>() / count).round(),
        }
    }

    fn semester(&self) -> SemesterData {
        SemesterData {
            apartment_rent: self.apartment_rent,
            rented_apartments: self.apartments,
            suite_rent: self.suite_rent,
            rented_suites: self.suites,
            expenses: 0.0,
        }
    }

    /// Rented counts above the available units are capped.
    pub fn clamp(&self, semester: &SemesterData) -> SemesterData {
        SemesterData {
            rented_apartments: semester.rented_apartments.min(self.apartments),
            rented_suites: semester.rented_suites.min(self.suites),
            ..semester.clone()
        }
    }
}

pub fn default_inputs(capacity: &Capacity, base_year: i32, years: usize) -> Vec<YearlyForecastInput> {
    (0..years.clamp(1, MAX_FORECAST_YEARS))
        .map(|offset| YearlyForecastInput {
            year: base_year + offset as i32,
            semesters: [capacity.semester(), capacity.semester()],
        })
        .collect()
}

/// Saved inputs when they cover exactly `years`, otherwise fresh defaults.
pub fn inputs_for(
    saved: &[YearlyForecastInput],
    capacity: &Capacity,
    base_year: i32,
    years: usize,
) -> Vec<YearlyForecastInput> {
    if !saved.is_empty() && saved.len() == years {
        saved.to_vec()
    } else {
        default_inputs(capacity, base_year, years)
    }
}

pub fn compute(inputs: Vec<YearlyForecastInput>, capacity: Capacity) -> Forecast {
    let years = inputs
        .iter()
        .map(|input| {
            let semesters = input
                .semesters
                .iter()
                .map(|semester| {
                    let revenue = semester.revenue();
                    SemesterResult {
                        revenue: round2(revenue),
                        expenses: round2(semester.expenses),
                        net_profit: round2(revenue - semester.expenses),
                    }
                })
                .collect::<Vec<_>>();
            let total_revenue: f64 = semesters.iter().map(|s| s.revenue).sum();
            let total_expenses: f64 = semesters.iter().map(|s| s.expenses).sum();
            YearResult {
                year: input.year,
                total_revenue: round2(total_revenue),
                total_expenses: round2(total_expenses),
                total_net_profit: round2(total_revenue - total_expenses),
                semesters,
            }
        })
        .collect::<Vec<_>>();

    let grand_totals = years.iter().fold(ForecastTotals::default(), |acc, year| ForecastTotals {
        revenue: round2(acc.revenue + year.total_revenue),
        expenses: round2(acc.expenses + year.total_expenses),
        net_profit: round2(acc.net_profit + year.total_net_profit),
    });

    Forecast {
        inputs,
        years,
        grand_totals,
        capacity,
    }
}
