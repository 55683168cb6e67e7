pub mod contracts;
pub mod health;
pub mod jobs;
pub mod profiles;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::{auth, cors, rate_limit};
use crate::AppState;

const BODY_LIMIT: usize = 1024 * 1024;

pub fn router(state: AppState, config: &Config) -> Router {
    let job_routes = Router::new()
        .route("/jobs/browse", get(jobs::browse_jobs))
        .route("/jobs/create", post(jobs::create_job))
        .route("/jobs/user/recommendations", get(jobs::recommendations))
        .route("/jobs/user/applications", get(jobs::my_applications))
        .route("/jobs/user/posted", get(jobs::my_postings))
        .route("/jobs/:id", get(jobs::get_job).put(jobs::update_job))
        .route("/jobs/:id/status", post(jobs::change_job_status))
        .route("/jobs/:id/apply", post(jobs::apply_to_job))
        .route("/jobs/:id/applications", get(jobs::list_applications))
        .route(
            "/jobs/:id/applications/:application_id",
            patch(jobs::review_application),
        )
        .route(
            "/jobs/:id/applications/:application_id/withdraw",
            post(jobs::withdraw_application),
        )
        .route("/jobs/:id/bid", post(jobs::submit_bid))
        .route("/jobs/:id/bids/:bid_id/withdraw", post(jobs::withdraw_bid))
        .route("/jobs/:id/accept-bid/:bid_id", post(jobs::accept_bid));

    let contract_routes = Router::new()
        .route(
            "/contracts",
            post(contracts::create_contract).get(contracts::list_contracts),
        )
        .route("/contracts/:id", get(contracts::get_contract))
        .route("/contracts/:id/sign", post(contracts::sign_contract))
        .route("/contracts/:id/milestones", post(contracts::add_milestone))
        .route(
            "/contracts/:id/milestones/:milestone_id",
            patch(contracts::update_milestone),
        )
        .route("/contracts/:id/escrow/fund", post(contracts::fund_escrow))
        .route("/contracts/:id/disputes", post(contracts::raise_dispute))
        .route(
            "/contracts/:id/disputes/:dispute_id",
            patch(contracts::update_dispute),
        )
        .route(
            "/contracts/:id/communications",
            post(contracts::post_message),
        )
        .route(
            "/contracts/:id/status",
            post(contracts::change_contract_status),
        );

    let profile_routes = Router::new()
        .route(
            "/profiles/me",
            get(profiles::get_my_profile).put(profiles::upsert_my_profile),
        )
        .route("/profiles/:user_id", get(profiles::get_profile));

    // Layers run bottom-up: authentication first, so the limiter can key on the caller.
    let api = job_routes
        .merge(contract_routes)
        .merge(profile_routes)
        .layer(from_fn_with_state(
            state.limiter.clone(),
            rate_limit::rps_middleware,
        ))
        .layer(from_fn_with_state(state.auth.clone(), auth::authenticate));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
        .layer(cors::cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
