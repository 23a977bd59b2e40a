use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::RuleGender;
use crate::models::{ReferenceRange, TestConsumption, TestDefinition};

const TEST_COLUMNS: &str =
    "id, test_name, short_code, price, unit, department, min_range, max_range";

pub fn insert_test_definition(conn: &Connection, test: &TestDefinition) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO test_definitions (id, test_name, short_code, price, unit, department, min_range, max_range)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            test.id.to_string(),
            test.test_name,
            test.short_code,
            test.price,
            test.unit,
            test.department,
            test.min_range,
            test.max_range,
        ],
    )?;
    Ok(())
}

pub fn get_test_definition(conn: &Connection, id: &Uuid) -> Result<Option<TestDefinition>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEST_COLUMNS} FROM test_definitions WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], test_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(test_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_test_definitions(conn: &Connection) -> Result<Vec<TestDefinition>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEST_COLUMNS} FROM test_definitions ORDER BY test_name"
    ))?;

    let rows = stmt.query_map([], |row| Ok(test_row_from_rusqlite(row)))?;

    let mut tests = Vec::new();
    for row in rows {
        tests.push(test_from_row(row??)?);
    }
    Ok(tests)
}

// ═══════════════════════════════════════════
// Reference ranges
// ═══════════════════════════════════════════

/// Rules for a test in declaration order. The ordering is load-bearing:
/// classification takes the first matching rule.
pub fn get_ranges_for_test(conn: &Connection, test_id: &Uuid) -> Result<Vec<ReferenceRange>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, test_id, gender, min_age, max_age, min_val, max_val, position
         FROM reference_ranges WHERE test_id = ?1 ORDER BY position, id",
    )?;

    let rows = stmt.query_map(params![test_id.to_string()], |row| Ok(range_row_from_rusqlite(row)))?;

    let mut ranges = Vec::new();
    for row in rows {
        ranges.push(range_from_row(row??)?);
    }
    Ok(ranges)
}

/// Append a rule after the test's existing rules.
pub fn append_range(conn: &Connection, range: &ReferenceRange) -> Result<(), DatabaseError> {
    let next_position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM reference_ranges WHERE test_id = ?1",
        params![range.test_id.to_string()],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT INTO reference_ranges (id, test_id, gender, min_age, max_age, min_val, max_val, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            range.id.to_string(),
            range.test_id.to_string(),
            range.gender.as_str(),
            range.min_age,
            range.max_age,
            range.min_val,
            range.max_val,
            next_position,
        ],
    )?;
    Ok(())
}

pub fn delete_range(conn: &Connection, range_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM reference_ranges WHERE id = ?1",
        params![range_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ReferenceRange".into(),
            id: range_id.to_string(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Recipe (test consumptions)
// ═══════════════════════════════════════════

pub fn insert_consumption(conn: &Connection, consumption: &TestConsumption) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO test_consumptions (id, test_id, item_id, quantity)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            consumption.id.to_string(),
            consumption.test_id.to_string(),
            consumption.item_id.to_string(),
            consumption.quantity,
        ],
    )?;
    Ok(())
}

pub fn get_recipe_for_test(conn: &Connection, test_id: &Uuid) -> Result<Vec<TestConsumption>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, test_id, item_id, quantity FROM test_consumptions WHERE test_id = ?1",
    )?;

    let rows = stmt.query_map(params![test_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
        ))
    })?;

    let mut recipe = Vec::new();
    for row in rows {
        let (id, test_id, item_id, quantity) = row?;
        recipe.push(TestConsumption {
            id: parse_uuid(&id)?,
            test_id: parse_uuid(&test_id)?,
            item_id: parse_uuid(&item_id)?,
            quantity,
        });
    }
    Ok(recipe)
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

// Internal row types

struct TestRow {
    id: String,
    test_name: String,
    short_code: Option<String>,
    price: f64,
    unit: Option<String>,
    department: Option<String>,
    min_range: Option<f64>,
    max_range: Option<f64>,
}

fn test_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<TestRow, rusqlite::Error> {
    Ok(TestRow {
        id: row.get(0)?,
        test_name: row.get(1)?,
        short_code: row.get(2)?,
        price: row.get(3)?,
        unit: row.get(4)?,
        department: row.get(5)?,
        min_range: row.get(6)?,
        max_range: row.get(7)?,
    })
}

fn test_from_row(row: TestRow) -> Result<TestDefinition, DatabaseError> {
    Ok(TestDefinition {
        id: parse_uuid(&row.id)?,
        test_name: row.test_name,
        short_code: row.short_code,
        price: row.price,
        unit: row.unit,
        department: row.department,
        min_range: row.min_range,
        max_range: row.max_range,
    })
}

struct RangeRow {
    id: String,
    test_id: String,
    gender: String,
    min_age: i64,
    max_age: i64,
    min_val: f64,
    max_val: f64,
    position: i64,
}

fn range_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RangeRow, rusqlite::Error> {
    Ok(RangeRow {
        id: row.get(0)?,
        test_id: row.get(1)?,
        gender: row.get(2)?,
        min_age: row.get(3)?,
        max_age: row.get(4)?,
        min_val: row.get(5)?,
        max_val: row.get(6)?,
        position: row.get(7)?,
    })
}

fn range_from_row(row: RangeRow) -> Result<ReferenceRange, DatabaseError> {
    Ok(ReferenceRange {
        id: parse_uuid(&row.id)?,
        test_id: parse_uuid(&row.test_id)?,
        gender: RuleGender::from_str(&row.gender)?,
        min_age: row.min_age,
        max_age: row.max_age,
        min_val: row.min_val,
        max_val: row.max_val,
        position: row.position,
    })
}
