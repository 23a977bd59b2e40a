//! Order booking: one atomic unit of work that creates the order with
//! its empty result slots, deducts every recipe ingredient, computes the
//! bill, and posts the doctor's commission entry.
//!
//! Everything runs inside a single SQLite transaction. A failure at any
//! step — missing patient, unknown test, insufficient stock — rolls back
//! all inventory deductions and staged rows; no partial order is ever
//! visible.

use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{commission as commission_repo, doctor as doctor_repo,
    order as order_repo, patient as patient_repo, test_definition as test_repo};
use crate::db::DatabaseError;
use crate::inventory::{self, StockError};
use crate::models::enums::{CommissionStatus, OrderStatus};
use crate::models::{CommissionEntry, LabOrder, LabResult};

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub patient_id: Uuid,
    /// Walk-in patients have no referring doctor. An id pointing at a
    /// deleted doctor row is tolerated and treated the same as None.
    pub doctor_id: Option<Uuid>,
    /// Duplicates are preserved: each entry books its own result slot
    /// and its own price line.
    pub test_ids: Vec<Uuid>,
    pub discount: Option<f64>,
    pub cash_paid: Option<f64>,
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),

    #[error("Test not found: {0}")]
    TestNotFound(Uuid),

    #[error("Out of stock: test '{test}' requires {needed} {unit} of '{item}', but only {available} is available")]
    OutOfStock {
        test: String,
        item: String,
        needed: f64,
        available: f64,
        unit: String,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for OrderError {
    fn from(err: rusqlite::Error) -> Self {
        OrderError::Database(DatabaseError::Sqlite(err))
    }
}

/// Book an order. All side effects — stock decrements, the order row,
/// its result slots, the commission entry — commit together or not at
/// all.
pub fn create_order(conn: &mut Connection, request: &OrderRequest) -> Result<LabOrder, OrderError> {
    let tx = conn.transaction()?;

    let patient = patient_repo::get_patient(&tx, &request.patient_id)?
        .ok_or(OrderError::PatientNotFound(request.patient_id))?;

    // A dangling doctor id is not an error: the order simply proceeds
    // without a referrer (self/walk-in booking).
    let doctor = match request.doctor_id {
        Some(id) => doctor_repo::get_doctor(&tx, &id)?,
        None => None,
    };

    let order_id = Uuid::new_v4();
    let mut total_amount = 0.0;
    let mut results = Vec::with_capacity(request.test_ids.len());

    for test_id in &request.test_ids {
        let test = test_repo::get_test_definition(&tx, test_id)?
            .ok_or(OrderError::TestNotFound(*test_id))?;

        // Empty slot, waiting for the lab technician.
        results.push(LabResult {
            id: Uuid::new_v4(),
            order_id,
            test_id: test.id,
            result_value: String::new(),
            is_abnormal: false,
            remarks: String::new(),
            performed_by: None,
            performed_at: None,
        });

        total_amount += test.price;

        // Deduct the recipe. Insufficiency aborts the whole booking; the
        // transaction unwinds any deductions already made for earlier
        // tests in this order.
        for ingredient in test_repo::get_recipe_for_test(&tx, test_id)? {
            inventory::deduct(&tx, &ingredient.item_id, ingredient.quantity).map_err(
                |err| match err {
                    StockError::Insufficient { item, needed, available, unit } => {
                        OrderError::OutOfStock {
                            test: test.test_name.clone(),
                            item,
                            needed,
                            available,
                            unit,
                        }
                    }
                    StockError::ItemNotFound(id) => {
                        OrderError::Database(DatabaseError::NotFound {
                            entity_type: "InventoryItem".into(),
                            id: id.to_string(),
                        })
                    }
                    StockError::Database(e) => OrderError::Database(e),
                },
            )?;
        }
    }

    let mut order = LabOrder {
        id: order_id,
        patient_id: patient.id,
        doctor_id: doctor.as_ref().map(|d| d.id),
        order_date: chrono::Utc::now().naive_utc(),
        status: OrderStatus::Pending,
        total_amount,
        discount_amount: request.discount.unwrap_or(0.0),
        paid_amount: request.cash_paid.unwrap_or(0.0),
        balance_due: 0.0,
        report_delivered: false,
        delivery_date: None,
        results,
    };
    order.recompute_balance();

    order_repo::insert_order(&tx, &order)?;

    // Commission is posted once, from the final bill and the doctor's
    // current rate — a snapshot immune to later rate changes.
    if let Some(doctor) = &doctor {
        if doctor.commission_percentage > 0.0 {
            let calculated = order.total_amount * doctor.commission_percentage / 100.0;
            commission_repo::insert_entry(
                &tx,
                &CommissionEntry {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    doctor_id: doctor.id,
                    total_bill_amount: order.total_amount,
                    commission_percentage: doctor.commission_percentage,
                    calculated_amount: calculated,
                    transaction_date: chrono::Utc::now().date_naive(),
                    status: CommissionStatus::Unpaid,
                },
            )?;
        }
    }

    tx.commit()?;

    tracing::info!(
        order_id = %order.id,
        patient_mrn = %patient.mrn,
        tests = order.results.len(),
        total = order.total_amount,
        balance = order.balance_due,
        "Order booked"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::inventory as inventory_repo;
    use crate::models::{Doctor, InventoryItem, Patient, TestConsumption, TestDefinition};

    struct Fixture {
        conn: Connection,
        patient_id: Uuid,
        doctor_id: Uuid,
        test_x: Uuid, // price 500, consumes 2 units of item_a
        test_y: Uuid, // price 300, no recipe
        item_a: Uuid, // stock 5
    }

    fn fixture() -> Fixture {
        let conn = open_memory_database().unwrap();

        let patient = Patient {
            id: Uuid::new_v4(),
            mrn: "555-666".to_string(),
            name: "Imran".to_string(),
            age: 30,
            gender: "Male".to_string(),
            cnic: None,
            mobile: None,
            city: None,
            registered_at: chrono::Utc::now().naive_utc(),
        };
        patient_repo::insert_patient(&conn, &patient).unwrap();

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Bilal".to_string(),
            clinic: None,
            mobile: None,
            commission_percentage: 10.0,
        };
        doctor_repo::insert_doctor(&conn, &doctor).unwrap();

        let item_a = InventoryItem {
            id: Uuid::new_v4(),
            item_name: "Item A".to_string(),
            current_stock: 5.0,
            min_threshold: None,
            unit: Some("units".to_string()),
        };
        inventory_repo::insert_item(&conn, &item_a).unwrap();

        let test_x = TestDefinition {
            id: Uuid::new_v4(),
            test_name: "Test X".to_string(),
            short_code: None,
            price: 500.0,
            unit: None,
            department: None,
            min_range: None,
            max_range: None,
        };
        test_repo::insert_test_definition(&conn, &test_x).unwrap();
        test_repo::insert_consumption(
            &conn,
            &TestConsumption {
                id: Uuid::new_v4(),
                test_id: test_x.id,
                item_id: item_a.id,
                quantity: 2.0,
            },
        )
        .unwrap();

        let test_y = TestDefinition {
            id: Uuid::new_v4(),
            test_name: "Test Y".to_string(),
            short_code: None,
            price: 300.0,
            unit: None,
            department: None,
            min_range: None,
            max_range: None,
        };
        test_repo::insert_test_definition(&conn, &test_y).unwrap();

        Fixture {
            conn,
            patient_id: patient.id,
            doctor_id: doctor.id,
            test_x: test_x.id,
            test_y: test_y.id,
            item_a: item_a.id,
        }
    }

    fn stock_of(conn: &Connection, id: &Uuid) -> f64 {
        inventory_repo::get_item(conn, id).unwrap().unwrap().current_stock
    }

    #[test]
    fn end_to_end_booking_example() {
        // Patient orders X (500, 2 units of A from 5) and Y (300, no
        // recipe), discount 50, cash 200.
        let mut fx = fixture();
        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: None,
                test_ids: vec![fx.test_x, fx.test_y],
                discount: Some(50.0),
                cash_paid: Some(200.0),
            },
        )
        .unwrap();

        assert_eq!(order.total_amount, 800.0);
        assert_eq!(order.discount_amount, 50.0);
        assert_eq!(order.paid_amount, 200.0);
        assert_eq!(order.balance_due, 550.0);
        assert_eq!(order.results.len(), 2);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(stock_of(&fx.conn, &fx.item_a), 3.0);

        // Persisted aggregate matches the returned one.
        let loaded = order_repo::get_order(&fx.conn, &order.id).unwrap().unwrap();
        assert_eq!(loaded.balance_due, 550.0);
        assert_eq!(loaded.results.len(), 2);
        assert!(loaded.results.iter().all(|r| r.result_value.is_empty()));
    }

    #[test]
    fn out_of_stock_rolls_back_everything() {
        let mut fx = fixture();
        // Three bookings of X need 6 units; stock is 5. The third X in a
        // single order must abort the whole order.
        let err = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: Some(fx.doctor_id),
                test_ids: vec![fx.test_x, fx.test_x, fx.test_x],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap_err();

        match err {
            OrderError::OutOfStock { test, item, needed, available, .. } => {
                assert_eq!(test, "Test X");
                assert_eq!(item, "Item A");
                assert_eq!(needed, 2.0);
                assert_eq!(available, 1.0);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Deductions for the first two X's were unwound.
        assert_eq!(stock_of(&fx.conn, &fx.item_a), 5.0);

        // No rows of any kind were left behind.
        for table in ["lab_orders", "lab_results", "commission_ledger"] {
            let count: i64 = fx
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} not empty after rollback");
        }
    }

    #[test]
    fn duplicate_tests_each_get_slot_price_and_deduction() {
        let mut fx = fixture();
        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: None,
                test_ids: vec![fx.test_x, fx.test_x],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap();

        assert_eq!(order.total_amount, 1000.0);
        assert_eq!(order.results.len(), 2);
        assert_eq!(stock_of(&fx.conn, &fx.item_a), 1.0);
    }

    #[test]
    fn commission_posted_with_snapshot_amounts() {
        let mut fx = fixture();
        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: Some(fx.doctor_id),
                test_ids: vec![fx.test_x, fx.test_y],
                discount: Some(100.0),
                cash_paid: None,
            },
        )
        .unwrap();

        let entry = commission_repo::get_entry_for_order(&fx.conn, &order.id)
            .unwrap()
            .unwrap();
        // 10% of the undiscounted total.
        assert_eq!(entry.total_bill_amount, 800.0);
        assert_eq!(entry.commission_percentage, 10.0);
        assert_eq!(entry.calculated_amount, 80.0);
        assert_eq!(entry.status, CommissionStatus::Unpaid);
    }

    #[test]
    fn no_commission_without_doctor() {
        let mut fx = fixture();
        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: None,
                test_ids: vec![fx.test_y],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap();

        assert!(commission_repo::get_entry_for_order(&fx.conn, &order.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn no_commission_for_zero_rate_doctor() {
        let mut fx = fixture();
        let free_doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Zero".to_string(),
            clinic: None,
            mobile: None,
            commission_percentage: 0.0,
        };
        doctor_repo::insert_doctor(&fx.conn, &free_doctor).unwrap();

        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: Some(free_doctor.id),
                test_ids: vec![fx.test_y],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap();

        assert_eq!(order.doctor_id, Some(free_doctor.id));
        assert!(commission_repo::get_entry_for_order(&fx.conn, &order.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn dangling_doctor_id_is_tolerated() {
        let mut fx = fixture();
        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: Some(Uuid::new_v4()),
                test_ids: vec![fx.test_y],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap();

        assert_eq!(order.doctor_id, None);
        assert!(commission_repo::get_entry_for_order(&fx.conn, &order.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_patient_rejects_order() {
        let mut fx = fixture();
        let err = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: Uuid::new_v4(),
                doctor_id: None,
                test_ids: vec![fx.test_y],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::PatientNotFound(_)));
    }

    #[test]
    fn unknown_test_rejects_order_and_rolls_back() {
        let mut fx = fixture();
        let err = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: None,
                test_ids: vec![fx.test_x, Uuid::new_v4()],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap_err();

        assert!(matches!(err, OrderError::TestNotFound(_)));
        // The first test's deduction was rolled back too.
        assert_eq!(stock_of(&fx.conn, &fx.item_a), 5.0);
    }

    #[test]
    fn draining_stock_to_zero_is_a_valid_booking() {
        let mut fx = fixture();
        inventory_repo::set_stock(&fx.conn, &fx.item_a, 4.0).unwrap();

        let order = create_order(
            &mut fx.conn,
            &OrderRequest {
                patient_id: fx.patient_id,
                doctor_id: None,
                test_ids: vec![fx.test_x, fx.test_x],
                discount: None,
                cash_paid: None,
            },
        )
        .unwrap();

        assert_eq!(order.results.len(), 2);
        assert_eq!(stock_of(&fx.conn, &fx.item_a), 0.0);
    }
}
