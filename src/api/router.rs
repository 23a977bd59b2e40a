//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum
//! server. Routes are nested under `/api/`. The API is LAN-facing and
//! unauthenticated; the lab's front desk and bench share one operator
//! station.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with all routes under `/api/`.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            post(endpoints::patients::register).get(endpoints::patients::search),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route("/patients/:id/orders", get(endpoints::patients::orders))
        .route(
            "/doctors",
            post(endpoints::doctors::create).get(endpoints::doctors::list),
        )
        .route(
            "/tests",
            post(endpoints::tests::create).get(endpoints::tests::list),
        )
        .route(
            "/tests/:id/ranges",
            get(endpoints::tests::ranges).post(endpoints::tests::add_range),
        )
        .route(
            "/tests/:id/ranges/:rid",
            delete(endpoints::tests::delete_range),
        )
        .route(
            "/tests/:id/recipe",
            get(endpoints::tests::recipe).post(endpoints::tests::add_consumption),
        )
        .route(
            "/inventory",
            post(endpoints::inventory::create).get(endpoints::inventory::list),
        )
        .route("/inventory/low", get(endpoints::inventory::low))
        .route("/inventory/:id/stock", put(endpoints::inventory::set_stock))
        .route(
            "/orders",
            post(endpoints::orders::create).get(endpoints::orders::list),
        )
        .route("/orders/:id", get(endpoints::orders::detail))
        .route("/orders/:id/results", post(endpoints::orders::save_results))
        .route("/orders/:id/pay", post(endpoints::orders::pay))
        .route("/orders/:id/deliver", post(endpoints::orders::deliver))
        .route("/results/enter", post(endpoints::results::enter))
        .route("/finance/commissions", get(endpoints::finance::commissions))
        .route(
            "/finance/commissions/:doctor_id",
            get(endpoints::finance::ledger),
        )
        .route(
            "/finance/commissions/:doctor_id/pay",
            post(endpoints::finance::pay),
        )
        .route("/finance/daily", get(endpoints::finance::daily))
        .with_state(ctx);

    Router::new().nest("/api", routes)
}
