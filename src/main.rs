use actix_cors::Cors;
use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use scritique_backend::{
    background_task::start_prune_task,
    graceful_shutdown::shutdown_signal,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_cors(config: &AppConfig) -> Cors {
    let origins = config.cors_origins();
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let is_production = std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);
    init_tracing(is_production);

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match AppState::new(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            tracing::error!("Failed to initialise mail service: {}", e);
            std::process::exit(1);
        }
    };

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "Starting {} v{} on {} (transport: {})",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        config.transport
    );

    let prune_state = app_state.clone();
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(build_cors(&server_config))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::spawn(start_prune_task(prune_state));

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
