//! Test catalog endpoints: definitions, reference ranges, recipes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{
    inventory as inventory_repo, test_definition as test_repo,
};
use crate::models::{ReferenceRange, RuleGender, TestConsumption, TestDefinition};

#[derive(Deserialize)]
pub struct NewTestDefinition {
    pub test_name: String,
    pub short_code: Option<String>,
    pub price: f64,
    pub unit: Option<String>,
    pub department: Option<String>,
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
}

#[derive(Deserialize)]
pub struct NewReferenceRange {
    pub gender: RuleGender,
    pub min_age: i64,
    pub max_age: i64,
    pub min_val: f64,
    pub max_val: f64,
}

#[derive(Deserialize)]
pub struct NewConsumption {
    pub item_id: Uuid,
    pub quantity: f64,
}

/// `POST /api/tests` — add a catalog entry.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<NewTestDefinition>,
) -> Result<(StatusCode, Json<TestDefinition>), ApiError> {
    if request.test_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Test name is required".into()));
    }
    if request.price < 0.0 {
        return Err(ApiError::BadRequest("Price cannot be negative".into()));
    }

    let test = TestDefinition {
        id: Uuid::new_v4(),
        test_name: request.test_name,
        short_code: request.short_code,
        price: request.price,
        unit: request.unit,
        department: request.department,
        min_range: request.min_range,
        max_range: request.max_range,
    };

    let conn = ctx.core.open_db()?;
    test_repo::insert_test_definition(&conn, &test)?;
    Ok((StatusCode::CREATED, Json(test)))
}

/// `GET /api/tests`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<TestDefinition>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let tests = test_repo::list_test_definitions(&conn)?;
    Ok(Json(tests))
}

/// `GET /api/tests/:id/ranges` — rules in declaration order.
pub async fn ranges(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReferenceRange>>, ApiError> {
    let conn = ctx.core.open_db()?;
    require_test(&conn, &id)?;
    let ranges = test_repo::get_ranges_for_test(&conn, &id)?;
    Ok(Json(ranges))
}

/// `POST /api/tests/:id/ranges` — append a rule at the end of the list.
///
/// Rules are evaluated first-match-wins in the order they were added,
/// so append order is significant.
pub async fn add_range(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<NewReferenceRange>,
) -> Result<(StatusCode, Json<ReferenceRange>), ApiError> {
    if request.min_age > request.max_age {
        return Err(ApiError::BadRequest("min_age cannot exceed max_age".into()));
    }
    if request.min_val > request.max_val {
        return Err(ApiError::BadRequest("min_val cannot exceed max_val".into()));
    }

    let conn = ctx.core.open_db()?;
    require_test(&conn, &id)?;

    let mut range = ReferenceRange {
        id: Uuid::new_v4(),
        test_id: id,
        gender: request.gender,
        min_age: request.min_age,
        max_age: request.max_age,
        min_val: request.min_val,
        max_val: request.max_val,
        position: 0,
    };
    test_repo::append_range(&conn, &range)?;
    // Re-read so the response carries the assigned position.
    if let Some(saved) = test_repo::get_ranges_for_test(&conn, &id)?
        .into_iter()
        .find(|r| r.id == range.id)
    {
        range = saved;
    }
    Ok((StatusCode::CREATED, Json(range)))
}

/// `DELETE /api/tests/:id/ranges/:rid`
pub async fn delete_range(
    State(ctx): State<ApiContext>,
    Path((id, rid)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    require_test(&conn, &id)?;
    test_repo::delete_range(&conn, &rid)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/tests/:id/recipe` — consumables deducted per booking.
pub async fn recipe(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TestConsumption>>, ApiError> {
    let conn = ctx.core.open_db()?;
    require_test(&conn, &id)?;
    let recipe = test_repo::get_recipe_for_test(&conn, &id)?;
    Ok(Json(recipe))
}

/// `POST /api/tests/:id/recipe` — link a consumable to the test.
pub async fn add_consumption(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<NewConsumption>,
) -> Result<(StatusCode, Json<TestConsumption>), ApiError> {
    if request.quantity <= 0.0 {
        return Err(ApiError::BadRequest("Quantity must be positive".into()));
    }

    let conn = ctx.core.open_db()?;
    require_test(&conn, &id)?;
    if inventory_repo::get_item(&conn, &request.item_id)?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Inventory item {} not found",
            request.item_id
        )));
    }

    let consumption = TestConsumption {
        id: Uuid::new_v4(),
        test_id: id,
        item_id: request.item_id,
        quantity: request.quantity,
    };
    test_repo::insert_consumption(&conn, &consumption)?;
    Ok((StatusCode::CREATED, Json(consumption)))
}

fn require_test(conn: &rusqlite::Connection, id: &Uuid) -> Result<(), ApiError> {
    match test_repo::get_test_definition(conn, id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("Test {id} not found"))),
    }
}
