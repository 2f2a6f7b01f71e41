use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::ItemId;

/// The meme chosen as item of the day for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySelection {
    pub date: NaiveDate,
    pub item_id: ItemId,
}
