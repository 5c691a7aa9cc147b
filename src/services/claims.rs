use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use super::money::format_currency;
use crate::domain::Unit;
use crate::error::{AppError, AppResult};

const WHATSAPP_BASE_URL: &str = "https://wa.me/";
const UNSPECIFIED_DATE: &str = "غير محدد";

/// Outreach channels; each one is logged on the unit with its Arabic label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimChannel {
    Email,
    Whatsapp,
    Paper,
}

impl ClaimChannel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "مطالبة عبر البريد الإلكتروني",
            Self::Whatsapp => "مطالبة عبر واتساب",
            Self::Paper => "مطالبة ورقية للطباعة",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LetterContext<'a> {
    pub term_label: &'a str,
    pub currency_code: &'a str,
}

pub fn claim_letter(
    unit: &Unit,
    remaining: f64,
    due_date: Option<NaiveDate>,
    context: &LetterContext<'_>,
) -> String {
    let due = due_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNSPECIFIED_DATE.to_string());
    format!(
        "عزيزي الطالب/ـة\n\
         مبنى رقم ({building}) غرفة رقم({unit_number})\n\
         المبلغ: ({amount}) عن {term}.\n\
         \n\
         السلام عليكم ورحمة الله وبركاته،\n\
         نود أن نشعركم بضرورة تسديد المستحقات المالية التي حل موعد سدادها بتاريخ ({due}).\n\
         وفي حال عدم السداد، نرجو منكم التواصل مع الإدارة المالية للمجمع السكني.\n\
         \n\
         ادارة المتابعة المالية",
        building = unit.building_id,
        unit_number = unit.unit_number,
        amount = format_currency(remaining, context.currency_code),
        term = context.term_label,
    )
}

/// Accepts a local mobile number (`5` followed by eight digits) and returns
/// it with the country code prepended.
pub fn international_number(local: &str, country_code: &str) -> AppResult<String> {
    let trimmed = local.trim();
    let valid = trimmed.len() == 9
        && trimmed.starts_with('5')
        && trimmed.chars().all(|ch| ch.is_ascii_digit());
    if !valid {
        return Err(AppError::UnprocessableEntity(
            "رقم الجوال غير صالح. يجب أن يبدأ بـ 5 ويتكون من 9 أرقام".to_string(),
        ));
    }
    Ok(format!("{country_code}{trimmed}"))
}

pub fn whatsapp_link(international_number: &str, message: &str) -> AppResult<Url> {
    let base = format!("{WHATSAPP_BASE_URL}{international_number}");
    Url::parse_with_params(&base, &[("text", message)])
        .map_err(|error| AppError::Internal(format!("Could not build WhatsApp link: {error}")))
}
