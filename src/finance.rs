//! Finance views: the doctor-commission dashboard, bulk payout, and the
//! daily closing summary.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{commission as commission_repo, doctor as doctor_repo,
    order as order_repo};
use crate::db::DatabaseError;
use crate::models::LabOrder;

/// One row of the commission dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorBalance {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub unpaid_amount: f64,
}

/// Unpaid commission per doctor, every doctor listed (zero when clear).
pub fn unpaid_balances(conn: &Connection) -> Result<Vec<DoctorBalance>, DatabaseError> {
    let totals = commission_repo::unpaid_totals_by_doctor(conn)?;
    let doctors = doctor_repo::list_doctors(conn)?;

    Ok(doctors
        .into_iter()
        .map(|doc| {
            let unpaid = totals
                .iter()
                .find(|(id, _)| *id == doc.id)
                .map(|(_, total)| *total)
                .unwrap_or(0.0);
            DoctorBalance {
                doctor_id: doc.id,
                doctor_name: doc.name,
                unpaid_amount: unpaid,
            }
        })
        .collect())
}

/// Clear all of a doctor's unpaid dues in one stroke. No partial
/// payments, no payment-date stamp; settling an already-clear doctor is
/// a no-op. Returns the number of entries settled.
pub fn mark_doctor_paid(conn: &Connection, doctor_id: &Uuid) -> Result<usize, DatabaseError> {
    let settled = commission_repo::settle_doctor(conn, doctor_id)?;
    if settled > 0 {
        tracing::info!(doctor_id = %doctor_id, entries = settled, "Commission settled");
    }
    Ok(settled)
}

/// Collect a payment against an order's outstanding balance, after
/// booking. The amount is added to the cash already taken and the
/// balance recomputed in the store. Overpayment is allowed and shows up
/// as a negative balance, matching the walk-in cash drawer reality.
pub fn collect_payment(
    conn: &Connection,
    order_id: &Uuid,
    amount: f64,
) -> Result<LabOrder, DatabaseError> {
    let order = order_repo::get_order(conn, order_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "LabOrder".into(),
        id: order_id.to_string(),
    })?;

    order_repo::update_billing(
        conn,
        order_id,
        order.discount_amount,
        order.paid_amount + amount,
    )?;

    let updated = order_repo::get_order(conn, order_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "LabOrder".into(),
        id: order_id.to_string(),
    })?;
    tracing::info!(
        order_id = %order_id,
        amount,
        balance = updated.balance_due,
        "Payment collected"
    );
    Ok(updated)
}

/// End-of-day totals over the orders booked on one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyClosing {
    pub date: NaiveDate,
    pub order_count: usize,
    pub total_billed: f64,
    pub total_discount: f64,
    pub cash_collected: f64,
    pub pending_receivables: f64,
}

pub fn daily_closing(conn: &Connection, date: NaiveDate) -> Result<DailyClosing, DatabaseError> {
    let orders = order_repo::list_orders_on_date(conn, date)?;

    let mut closing = DailyClosing {
        date,
        order_count: orders.len(),
        total_billed: 0.0,
        total_discount: 0.0,
        cash_collected: 0.0,
        pending_receivables: 0.0,
    };
    for order in &orders {
        closing.total_billed += order.total_amount;
        closing.total_discount += order.discount_amount;
        closing.cash_collected += order.paid_amount;
        closing.pending_receivables += order.balance_due;
    }
    Ok(closing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{create_order, OrderRequest};
    use crate::db::open_memory_database;
    use crate::db::repository::{patient as patient_repo, test_definition as test_repo};
    use crate::models::{Doctor, Patient, TestDefinition};

    fn seed(conn: &mut Connection, rate: f64) -> (Uuid, Uuid) {
        let patient = Patient {
            id: Uuid::new_v4(),
            mrn: "909-808".to_string(),
            name: "P".to_string(),
            age: 25,
            gender: "Female".to_string(),
            cnic: None,
            mobile: None,
            city: None,
            registered_at: chrono::Utc::now().naive_utc(),
        };
        patient_repo::insert_patient(conn, &patient).unwrap();

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Sana".to_string(),
            clinic: None,
            mobile: None,
            commission_percentage: rate,
        };
        doctor_repo::insert_doctor(conn, &doctor).unwrap();

        let test = TestDefinition {
            id: Uuid::new_v4(),
            test_name: "LFT".to_string(),
            short_code: None,
            price: 1000.0,
            unit: None,
            department: None,
            min_range: None,
            max_range: None,
        };
        test_repo::insert_test_definition(conn, &test).unwrap();
        (patient.id, doctor.id)
    }

    fn book(conn: &mut Connection, patient_id: Uuid, doctor_id: Uuid) -> Uuid {
        let test_id = conn
            .query_row("SELECT id FROM test_definitions LIMIT 1", [], |r| {
                r.get::<_, String>(0)
            })
            .map(|s| Uuid::parse_str(&s).unwrap())
            .unwrap();
        create_order(
            conn,
            &OrderRequest {
                patient_id,
                doctor_id: Some(doctor_id),
                test_ids: vec![test_id],
                discount: Some(100.0),
                cash_paid: Some(400.0),
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn dashboard_lists_all_doctors_with_balances() {
        let mut conn = open_memory_database().unwrap();
        let (patient_id, doctor_id) = seed(&mut conn, 10.0);
        book(&mut conn, patient_id, doctor_id);
        book(&mut conn, patient_id, doctor_id);

        let balances = unpaid_balances(&conn).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].unpaid_amount, 200.0); // 2 x 10% of 1000
    }

    #[test]
    fn payout_clears_all_dues_and_is_idempotent() {
        let mut conn = open_memory_database().unwrap();
        let (patient_id, doctor_id) = seed(&mut conn, 10.0);
        book(&mut conn, patient_id, doctor_id);
        book(&mut conn, patient_id, doctor_id);

        assert_eq!(mark_doctor_paid(&conn, &doctor_id).unwrap(), 2);
        assert_eq!(mark_doctor_paid(&conn, &doctor_id).unwrap(), 0);

        let balances = unpaid_balances(&conn).unwrap();
        assert_eq!(balances[0].unpaid_amount, 0.0);
    }

    #[test]
    fn doctor_with_no_dues_shows_zero() {
        let mut conn = open_memory_database().unwrap();
        seed(&mut conn, 10.0);
        let balances = unpaid_balances(&conn).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].unpaid_amount, 0.0);
    }

    #[test]
    fn balance_payment_adds_up_and_recomputes() {
        let mut conn = open_memory_database().unwrap();
        let (patient_id, doctor_id) = seed(&mut conn, 10.0);
        // 1000 billed, 100 discount, 400 taken at the counter: 500 due.
        let order_id = book(&mut conn, patient_id, doctor_id);

        let order = collect_payment(&conn, &order_id, 300.0).unwrap();
        assert_eq!(order.paid_amount, 700.0);
        assert_eq!(order.balance_due, 200.0);

        let order = collect_payment(&conn, &order_id, 200.0).unwrap();
        assert_eq!(order.balance_due, 0.0);

        assert!(matches!(
            collect_payment(&conn, &Uuid::new_v4(), 10.0),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn daily_closing_sums_todays_orders() {
        let mut conn = open_memory_database().unwrap();
        let (patient_id, doctor_id) = seed(&mut conn, 10.0);
        book(&mut conn, patient_id, doctor_id);
        book(&mut conn, patient_id, doctor_id);

        let today = chrono::Utc::now().date_naive();
        let closing = daily_closing(&conn, today).unwrap();
        assert_eq!(closing.order_count, 2);
        assert_eq!(closing.total_billed, 2000.0);
        assert_eq!(closing.total_discount, 200.0);
        assert_eq!(closing.cash_collected, 800.0);
        assert_eq!(closing.pending_receivables, 1000.0);

        let yesterday = today.pred_opt().unwrap();
        assert_eq!(daily_closing(&conn, yesterday).unwrap().order_count, 0);
    }
}
