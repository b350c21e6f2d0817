use actix_web::{web, App, HttpServer};
use anyhow::Context;
use complaint_service::{config::Config, handlers, startup};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Starting complaint service...");

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = config.http_port,
        failure_policy = %config.failure_policy,
        "Configuration loaded"
    );

    let service = startup::build_service(&config)
        .await
        .context("failed to initialize complaint service")?;
    let service = web::Data::new(service);

    let addr = ("0.0.0.0", config.http_port);
    tracing::info!("HTTP server listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(service.clone())
            .configure(handlers::configure)
    })
    .bind(addr)
    .with_context(|| format!("failed to bind {}:{}", addr.0, addr.1))?
    .run()
    .await?;

    tracing::info!("Complaint service stopped");
    Ok(())
}
