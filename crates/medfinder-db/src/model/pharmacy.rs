use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use medfinder_core::geo::GeoPoint;

use crate::db::schema;
use crate::model::medicine::MedicineEntry;

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::pharmacy)]
#[diesel(check_for_backend(Pg))]
pub struct Pharmacy {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pharmacy_name: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::pharmacy)]
pub struct NewPharmacy<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub pharmacy_name: Option<&'a str>,
    pub longitude: f64,
    pub latitude: f64,
}

/// Both coordinates travel in one `UPDATE`, so a location is replaced atomically.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::pharmacy)]
pub struct LocationChangeset {
    pub longitude: f64,
    pub latitude: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl LocationChangeset {
    #[must_use]
    pub fn new(location: GeoPoint) -> Self {
        Self {
            longitude: location.longitude(),
            latitude: location.latitude(),
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Validated input for creating a pharmacy record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPharmacyRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pharmacy_name: Option<String>,
    pub location: GeoPoint,
    pub medicines: Vec<MedicineEntry>,
}

/// Allow-listed view of a pharmacy record.
///
/// Only the fields named here ever leave the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyProfile {
    #[serde(rename = "_id")]
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pharmacy_name: Option<String>,
    pub location: GeoPoint,
    pub medicines: Vec<MedicineEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PharmacyProfile {
    /// ## Summary
    /// Assembles a profile from a stored row and its inventory.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the stored coordinates are out of range.
    pub fn from_row(
        row: Pharmacy,
        medicines: Vec<MedicineEntry>,
    ) -> medfinder_core::error::CoreResult<Self> {
        Ok(Self {
            location: GeoPoint::new(row.longitude, row.latitude)?,
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            pharmacy_name: row.pharmacy_name,
            medicines,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serializes_allow_listed_fields_only() {
        let now = chrono::Utc::now();
        let row = Pharmacy {
            id: uuid::Uuid::now_v7(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+91-9000000000".to_string(),
            pharmacy_name: Some("Asha Medicals".to_string()),
            longitude: 81.6296,
            latitude: 21.2514,
            created_at: now,
            updated_at: now,
        };
        let profile = PharmacyProfile::from_row(row, Vec::new()).unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "_id",
                "createdAt",
                "email",
                "location",
                "medicines",
                "name",
                "pharmacyName",
                "phone",
                "updatedAt"
            ]
        );
        assert_eq!(json["location"]["coordinates"][0], 81.6296);
    }
}
