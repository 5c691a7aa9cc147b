use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterData {
    pub apartment_rent: f64,
    pub rented_apartments: u32,
    pub suite_rent: f64,
    pub rented_suites: u32,
    pub expenses: f64,
}

impl SemesterData {
    pub fn revenue(&self) -> f64 {
        f64::from(self.rented_apartments) * self.apartment_rent
            + f64::from(self.rented_suites) * self.suite_rent
    }

    pub fn has_negative_amounts(&self) -> bool {
        self.apartment_rent < 0.0 || self.suite_rent < 0.0 || self.expenses < 0.0
    }
}

/// Planning inputs for one academic year, split into its two semesters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyForecastInput {
    pub year: i32,
    pub semesters: [SemesterData; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRentValues {
    pub apartment_rent: f64,
    pub suite_rent: f64,
}

impl Default for BulkRentValues {
    fn default() -> Self {
        Self {
            apartment_rent: 1700.0,
            suite_rent: 3000.0,
        }
    }
}
