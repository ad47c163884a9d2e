//! Query functions for pharmacy records and their inventory.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use medfinder_core::error::CoreError;
use medfinder_core::geo::GeoPoint;
use medfinder_core::util::fold::fold_medicine_name;

use crate::db::schema::{medicine, pharmacy};
use crate::error::{DbError, DbResult};
use crate::model::medicine::{MedicineEntry, MedicineRow, NewMedicineRow};
use crate::model::pharmacy::{
    LocationChangeset, NewPharmacy, NewPharmacyRecord, Pharmacy, PharmacyProfile,
};

/// ## Summary
/// Returns a query to select all pharmacies.
#[must_use]
pub fn all() -> pharmacy::BoxedQuery<'static, diesel::pg::Pg> {
    pharmacy::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a pharmacy by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> pharmacy::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(pharmacy::id.eq(id))
}

/// ## Summary
/// Returns a query for the inventory of the given pharmacies, in entry order.
#[must_use]
pub fn inventory_for(ids: Vec<uuid::Uuid>) -> medicine::BoxedQuery<'static, diesel::pg::Pg> {
    medicine::table
        .filter(medicine::pharmacy_id.eq_any(ids))
        .order((medicine::pharmacy_id.asc(), medicine::ordinal.asc()))
        .into_boxed()
}

/// ## Summary
/// Inserts a pharmacy row and its initial inventory.
///
/// Call inside a transaction so a rejected inventory leaves no orphan row.
///
/// ## Errors
/// Returns `Conflict` if the email or phone is taken, or any database error.
#[tracing::instrument(skip(conn, record), fields(email = %record.email))]
pub async fn insert(
    conn: &mut AsyncPgConnection,
    record: &NewPharmacyRecord,
) -> DbResult<PharmacyProfile> {
    let new_pharmacy = NewPharmacy {
        id: uuid::Uuid::now_v7(),
        name: &record.name,
        email: &record.email,
        phone: &record.phone,
        pharmacy_name: record.pharmacy_name.as_deref(),
        longitude: record.location.longitude(),
        latitude: record.location.latitude(),
    };

    let row = diesel::insert_into(pharmacy::table)
        .values(&new_pharmacy)
        .returning(Pharmacy::as_returning())
        .get_result(conn)
        .await
        .map_err(DbError::from_write)?;

    insert_inventory(conn, row.id, &record.medicines).await?;

    Ok(PharmacyProfile::from_row(row, record.medicines.clone())?)
}

/// ## Summary
/// Inserts inventory entries for a pharmacy, preserving their order.
///
/// ## Errors
/// Returns `InvalidInput` if an entry does not fit the column types, or any
/// database error.
pub async fn insert_inventory(
    conn: &mut AsyncPgConnection,
    pharmacy_id: uuid::Uuid,
    entries: &[MedicineEntry],
) -> DbResult<usize> {
    if entries.is_empty() {
        return Ok(0);
    }

    let rows = entries
        .iter()
        .enumerate()
        .map(|(ordinal, entry)| {
            Ok(NewMedicineRow {
                id: uuid::Uuid::now_v7(),
                pharmacy_id,
                ordinal: i32::try_from(ordinal)
                    .map_err(|e| CoreError::InvalidInput(format!("too many medicines: {e}")))?,
                name: &entry.name,
                name_folded: fold_medicine_name(&entry.name),
                price: entry.price,
                quantity: i32::try_from(entry.quantity).map_err(|e| {
                    CoreError::InvalidInput(format!("quantity out of range for {}: {e}", entry.name))
                })?,
                expiry_date: entry.expiry_date,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(diesel::insert_into(medicine::table)
        .values(&rows)
        .execute(conn)
        .await?)
}

/// ## Summary
/// Deletes every inventory entry of a pharmacy.
///
/// ## Errors
/// Returns database errors if the delete fails.
pub async fn delete_inventory(
    conn: &mut AsyncPgConnection,
    pharmacy_id: uuid::Uuid,
) -> DbResult<usize> {
    Ok(
        diesel::delete(medicine::table.filter(medicine::pharmacy_id.eq(pharmacy_id)))
            .execute(conn)
            .await?,
    )
}

/// ## Summary
/// Bumps `updated_at`, taking the row lock for the rest of the transaction.
///
/// Returns `false` when no such pharmacy exists.
///
/// ## Errors
/// Returns database errors if the update fails.
pub async fn touch(conn: &mut AsyncPgConnection, pharmacy_id: uuid::Uuid) -> DbResult<bool> {
    let updated = diesel::update(pharmacy::table.find(pharmacy_id))
        .set(pharmacy::updated_at.eq(chrono::Utc::now()))
        .execute(conn)
        .await?;
    Ok(updated > 0)
}

/// ## Summary
/// Replaces the whole location of a pharmacy in a single statement.
///
/// ## Errors
/// Returns database errors if the update fails.
pub async fn update_location(
    conn: &mut AsyncPgConnection,
    pharmacy_id: uuid::Uuid,
    location: GeoPoint,
) -> DbResult<Option<Pharmacy>> {
    Ok(diesel::update(pharmacy::table.find(pharmacy_id))
        .set(LocationChangeset::new(location))
        .returning(Pharmacy::as_returning())
        .get_result(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Loads the inventory rows of the given pharmacies, grouped by pharmacy.
///
/// ## Errors
/// Returns database errors if the query fails.
pub async fn load_inventory(
    conn: &mut AsyncPgConnection,
    ids: &[uuid::Uuid],
) -> DbResult<HashMap<uuid::Uuid, Vec<MedicineRow>>> {
    let mut grouped: HashMap<uuid::Uuid, Vec<MedicineRow>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let rows: Vec<MedicineRow> = inventory_for(ids.to_vec())
        .select(MedicineRow::as_select())
        .load(conn)
        .await?;

    for row in rows {
        grouped.entry(row.pharmacy_id).or_default().push(row);
    }
    Ok(grouped)
}

/// ## Summary
/// Loads one pharmacy profile with its inventory.
///
/// ## Errors
/// Returns database errors if a query fails.
pub async fn find_profile(
    conn: &mut AsyncPgConnection,
    pharmacy_id: uuid::Uuid,
) -> DbResult<Option<PharmacyProfile>> {
    let Some(row) = by_id(pharmacy_id)
        .select(Pharmacy::as_select())
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };

    let mut inventory = load_inventory(conn, &[row.id]).await?;
    let medicines = into_entries(inventory.remove(&row.id))?;
    Ok(Some(PharmacyProfile::from_row(row, medicines)?))
}

/// ## Summary
/// Loads every pharmacy profile, oldest first.
///
/// ## Errors
/// Returns database errors if a query fails.
pub async fn list_profiles(conn: &mut AsyncPgConnection) -> DbResult<Vec<PharmacyProfile>> {
    let rows: Vec<Pharmacy> = all()
        .order(pharmacy::created_at.asc())
        .select(Pharmacy::as_select())
        .load(conn)
        .await?;

    let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();
    let mut inventory = load_inventory(conn, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let medicines = into_entries(inventory.remove(&row.id))?;
            Ok(PharmacyProfile::from_row(row, medicines)?)
        })
        .collect()
}

fn into_entries(rows: Option<Vec<MedicineRow>>) -> Result<Vec<MedicineEntry>, CoreError> {
    rows.unwrap_or_default()
        .into_iter()
        .map(MedicineEntry::try_from)
        .collect()
}
