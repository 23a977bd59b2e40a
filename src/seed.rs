//! Demo catalog seeding for a fresh database: a few common tests with
//! reference ranges and recipes, their consumables, and two referring
//! doctors. Runs only when the test catalog is empty.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{doctor as doctor_repo, inventory as inventory_repo,
    test_definition as test_repo};
use crate::db::DatabaseError;
use crate::models::enums::RuleGender;
use crate::models::{Doctor, InventoryItem, ReferenceRange, TestConsumption, TestDefinition};

pub fn seed_if_empty(conn: &Connection) -> Result<(), DatabaseError> {
    let tests: i64 = conn.query_row("SELECT COUNT(*) FROM test_definitions", [], |r| r.get(0))?;
    if tests > 0 {
        return Ok(());
    }

    tracing::info!("Empty catalog — seeding demo data");

    let purple_tube = item(conn, "Purple Top Tube (EDTA)", 200.0, Some(50.0), "pcs")?;
    let yellow_tube = item(conn, "Yellow Top Tube (Gel)", 200.0, Some(50.0), "pcs")?;
    let cbc_reagent = item(conn, "CBC Reagent Pack", 500.0, Some(100.0), "ml")?;
    let glucose_strip = item(conn, "Glucose Strip", 300.0, Some(50.0), "strips")?;

    // CBC: gender-split adult ranges on top of a broad catch-all.
    let cbc = test(conn, "Complete Blood Count", "CBC", 500.0, "g/dL", "Hematology", None, None)?;
    range(conn, cbc, RuleGender::Male, 18, 200, 13.0, 17.0)?;
    range(conn, cbc, RuleGender::Female, 18, 200, 12.0, 15.5)?;
    range(conn, cbc, RuleGender::Both, 0, 17, 11.0, 16.0)?;
    consume(conn, cbc, purple_tube, 1.0)?;
    consume(conn, cbc, cbc_reagent, 2.5)?;

    // Glucose: single flat range via the legacy fields.
    let glucose = test(conn, "Blood Glucose (Fasting)", "BSF", 300.0, "mg/dL", "Chemistry", Some(70.0), Some(100.0))?;
    consume(conn, glucose, yellow_tube, 1.0)?;
    consume(conn, glucose, glucose_strip, 1.0)?;

    // Culture: qualitative, no ranges, no recipe beyond the tube.
    let culture = test(conn, "Blood Culture", "BC", 1200.0, "", "Microbiology", None, None)?;
    consume(conn, culture, yellow_tube, 1.0)?;

    doctor_repo::insert_doctor(
        conn,
        &Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Bilal Ahmed".to_string(),
            clinic: Some("City Care Clinic".to_string()),
            mobile: Some("0300-1112223".to_string()),
            commission_percentage: 10.0,
        },
    )?;
    doctor_repo::insert_doctor(
        conn,
        &Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Sana Tariq".to_string(),
            clinic: Some("Family Health Center".to_string()),
            mobile: None,
            commission_percentage: 0.0,
        },
    )?;

    Ok(())
}

fn item(
    conn: &Connection,
    name: &str,
    stock: f64,
    threshold: Option<f64>,
    unit: &str,
) -> Result<Uuid, DatabaseError> {
    let item = InventoryItem {
        id: Uuid::new_v4(),
        item_name: name.to_string(),
        current_stock: stock,
        min_threshold: threshold,
        unit: Some(unit.to_string()),
    };
    inventory_repo::insert_item(conn, &item)?;
    Ok(item.id)
}

#[allow(clippy::too_many_arguments)]
fn test(
    conn: &Connection,
    name: &str,
    code: &str,
    price: f64,
    unit: &str,
    department: &str,
    min_range: Option<f64>,
    max_range: Option<f64>,
) -> Result<Uuid, DatabaseError> {
    let test = TestDefinition {
        id: Uuid::new_v4(),
        test_name: name.to_string(),
        short_code: Some(code.to_string()),
        price,
        unit: if unit.is_empty() { None } else { Some(unit.to_string()) },
        department: Some(department.to_string()),
        min_range,
        max_range,
    };
    test_repo::insert_test_definition(conn, &test)?;
    Ok(test.id)
}

fn range(
    conn: &Connection,
    test_id: Uuid,
    gender: RuleGender,
    min_age: i64,
    max_age: i64,
    min_val: f64,
    max_val: f64,
) -> Result<(), DatabaseError> {
    test_repo::append_range(
        conn,
        &ReferenceRange {
            id: Uuid::new_v4(),
            test_id,
            gender,
            min_age,
            max_age,
            min_val,
            max_val,
            position: 0, // assigned on append
        },
    )
}

fn consume(conn: &Connection, test_id: Uuid, item_id: Uuid, quantity: f64) -> Result<(), DatabaseError> {
    test_repo::insert_consumption(
        conn,
        &TestConsumption { id: Uuid::new_v4(), test_id, item_id, quantity },
    )
}
