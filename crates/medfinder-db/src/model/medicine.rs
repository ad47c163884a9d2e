use chrono::NaiveDate;
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use medfinder_core::error::CoreError;

use crate::{db::schema, model};

/// One inventory line as exchanged over the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineEntry {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(with = "expiry_date_format")]
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::medicine)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::pharmacy::Pharmacy, foreign_key = pharmacy_id))]
pub struct MedicineRow {
    pub id: uuid::Uuid,
    pub pharmacy_id: uuid::Uuid,
    pub ordinal: i32,
    pub name: String,
    pub name_folded: String,
    pub price: f64,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::medicine)]
pub struct NewMedicineRow<'a> {
    pub id: uuid::Uuid,
    pub pharmacy_id: uuid::Uuid,
    pub ordinal: i32,
    pub name: &'a str,
    pub name_folded: String,
    pub price: f64,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
}

impl TryFrom<MedicineRow> for MedicineEntry {
    type Error = CoreError;

    /// A negative stored quantity means the `quantity >= 0` column check was
    /// bypassed; it is reported instead of being read as zero.
    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_err| {
            CoreError::InvariantViolation("stored medicine quantity is negative")
        })?;
        Ok(Self {
            name: row.name,
            price: row.price,
            quantity,
            expiry_date: row.expiry_date,
        })
    }
}

/// Accepts plain dates (`2026-03-01`) as well as RFC 3339 timestamps
/// (`2026-03-01T00:00:00.000Z`); always writes plain dates.
pub mod expiry_date_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d";

    /// ## Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    /// ## Errors
    /// Fails when the value is neither an ISO date nor an RFC 3339 timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
            .map_err(|e| D::Error::custom(format!("invalid expiryDate {raw}: {e}")))
    }
}
