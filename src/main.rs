use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod blockchain;
mod config;

use config::Settings;

// Initialize the ledger with its genesis block and the configured role check
fn initialize_ledger(settings: &Settings) -> anyhow::Result<blockchain::RecordLedger> {
    let ledger = blockchain::Blockchain::with_shared_authorization(settings.authorization())
        .context("failed to create genesis block")?;

    if settings.allowed_roles.is_empty() {
        info!("Accepting blocks from every role");
    } else {
        info!("Accepting blocks from roles: {}", settings.allowed_roles.join(", "));
    }

    // Dump the initial state of the ledger
    for block in ledger.snapshot() {
        debug!("Prev. hash: {}", block.prev_hash);
        debug!("Payload: {}", serde_json::to_string_pretty(&block.payload)?);
        debug!("Hash: {}", block.hash);
    }

    Ok(ledger)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::write_block,
        api::handlers::validate_chain,
        api::handlers::new_medical_record
    ),
    components(
        schemas(
            blockchain::Transaction,
            blockchain::MedicalRecord,
            api::handlers::ChainResponse,
            api::handlers::BlockResponse,
            api::handlers::ErrorResponse
        )
    ),
    tags(
        (name = "ledger", description = "EMR ledger API endpoints")
    ),
    info(
        title = "EMR Ledger API",
        version = "1.0.0",
        description = "An append-only ledger of medical record changes",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(settings.log_level.as_str()));

    let ledger = web::Data::new(initialize_ledger(&settings)?);

    info!("Starting HTTP server at http://{}:{}", settings.host, settings.port);

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(ledger.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind((settings.host.as_str(), settings.port))
    .with_context(|| format!("failed to bind {}:{}", settings.host, settings.port))?
    .run()
    .await
    .context("HTTP server failed")
}
