use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::de;

/// A business expense, optionally tied to the quotation it was incurred for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de::lenient_decimal")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<String>,
}

impl Expense {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            category: category.into(),
            description: description.into(),
            amount,
            quotation_id: None,
        }
    }
}
