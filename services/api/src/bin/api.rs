//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, generator_from_config},
    config::Config,
    error::ApiError,
    web::{
        archives, auth, catalog, journal, middleware::require_auth, reports, state::AppState,
        ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use healing_companion_core::report::ReportService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Report Pipeline ---
    let generator = generator_from_config(&config.ai)?;
    let report_service = ReportService::new(db.clone(), db.clone(), generator);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        users: db.clone(),
        archives: db.clone(),
        journal: db.clone(),
        catalog: db,
        reports: report_service,
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().map_err(
            |e| ApiError::Internal(format!("Invalid CORS origin: {}", e)),
        )?)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/child-archives",
            post(archives::create_archive_handler).get(archives::list_archives_handler),
        )
        .route(
            "/child-archives/{id}",
            get(archives::get_archive_handler)
                .put(archives::update_archive_handler)
                .delete(archives::delete_archive_handler),
        )
        .route("/healing-logs", post(journal::create_entry_handler))
        .route(
            "/healing-logs/child/{child_id}",
            get(journal::list_entries_handler),
        )
        .route(
            "/healing-logs/{id}",
            get(journal::get_entry_handler).delete(journal::delete_entry_handler),
        )
        .route("/ai-reports/generate", post(reports::generate_report_handler))
        .route("/ai-reports", get(reports::get_report_handler))
        .route("/ai-reports/{id}", put(reports::update_report_handler))
        .route("/courses", get(catalog::list_courses_handler))
        .route("/courses/{id}", get(catalog::get_course_handler))
        .route("/games", get(catalog::list_games_handler))
        .route("/games/{id}", get(catalog::get_game_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
