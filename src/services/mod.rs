pub mod claims;
pub mod exports;
pub mod forecast;
pub mod money;
pub mod print;
pub mod reports;
pub mod resolver;
pub mod spreadsheet;
