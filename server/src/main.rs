//! FarmLink marketplace HTTP server.
//!
//! `farmlink-server serve` (the default) runs the API and the background
//! confirmation dispatcher; `farmlink-server seed` loads sample experts and
//! slots into the configured database.

mod config;
mod seed;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use farmlink_core::environment::{MeetingLinkProvider, Notifier};
use farmlink_postgres::PostgresMarketplaceStore;
use farmlink_providers::{
    ConsoleNotifier, GoogleMeetProvider, OpenWeatherClient, RazorpayCredentials, RazorpayGateway,
    SmtpNotifier, SmtpSettings, ZoomCredentials, ZoomMeetingProvider, build_client,
};
use farmlink_runtime::metrics::install_recorder;
use farmlink_runtime::{
    ConfirmationDispatcher, ConfirmationPipeline, PaymentSettings, RetryPolicy, ServiceContext,
    Services,
};
use farmlink_web::{AppState, router};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "farmlink-server", version, about = "FarmLink expert booking marketplace")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Insert sample experts with open slots
    Seed {
        /// Number of days of slots to create, starting tomorrow
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,farmlink=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    info!(?config, "Configuration loaded");

    let store = connect_store(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, store).await,
        Command::Seed { days } => {
            seed::seed(&store, days).await?;
            info!(days, "Seed data inserted");
            Ok(())
        }
    }
}

async fn connect_store(config: &Config) -> Result<PostgresMarketplaceStore> {
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is not set")?;

    info!("Connecting to database...");
    let store = PostgresMarketplaceStore::connect(
        url,
        config.database.max_connections,
        Duration::from_secs(config.database.connect_timeout),
    )
    .await
    .context("failed to connect to database")?;
    store.migrate().await.context("failed to run migrations")?;
    info!("Database ready");
    Ok(store)
}

async fn serve(config: Config, store: PostgresMarketplaceStore) -> Result<()> {
    let metrics = install_recorder().context("failed to install metrics recorder")?;

    let context = build_context(&config, store)?;

    let retry = RetryPolicy::builder()
        .max_retries(config.confirmation.max_retries)
        .build();
    let dispatcher = ConfirmationDispatcher::spawn(
        ConfirmationPipeline::new(Arc::clone(&context), retry),
        Duration::from_secs(config.confirmation.sweep_interval),
    );

    let services = Services::new(context, dispatcher.handle());
    let app = router(AppState::new(services).with_metrics(metrics));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped, draining confirmations");
    let grace = Duration::from_secs(config.server.shutdown_timeout);
    if tokio::time::timeout(grace, dispatcher.shutdown()).await.is_err() {
        warn!(
            timeout_secs = grace.as_secs(),
            "Confirmation dispatcher did not stop in time; paid bookings will be swept on next start"
        );
    }

    info!("Server stopped");
    Ok(())
}

/// Build the service context: store, gateway, notifier, meeting and weather
/// providers, all sharing one HTTP client.
fn build_context(config: &Config, store: PostgresMarketplaceStore) -> Result<Arc<ServiceContext>> {
    let http = build_client(config.http_timeout()).context("failed to build HTTP client")?;

    let credentials = match (&config.payment.key_id, &config.payment.key_secret) {
        (Some(key_id), Some(key_secret)) => Some(RazorpayCredentials {
            key_id: key_id.clone(),
            key_secret: key_secret.clone(),
        }),
        _ => {
            warn!("RAZORPAY_KEY_ID not set; booking creation will fail");
            None
        }
    };
    if config.payment.webhook_secret.is_none() {
        warn!("RAZORPAY_WEBHOOK_SECRET not set; every payment webhook will be rejected");
    }
    let gateway = RazorpayGateway::new(http.clone(), &config.payment.api_url, credentials);

    let weather = OpenWeatherClient::new(
        http.clone(),
        &config.weather.api_url,
        config.weather.api_key.clone(),
    );

    let zoom_credentials = match (
        &config.zoom.account_id,
        &config.zoom.client_id,
        &config.zoom.client_secret,
    ) {
        (Some(account_id), Some(client_id), Some(client_secret)) => Some(ZoomCredentials {
            account_id: account_id.clone(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        }),
        _ => None,
    };
    let zoom: Arc<dyn MeetingLinkProvider> = Arc::new(ZoomMeetingProvider::new(http.clone(), zoom_credentials));
    let google: Arc<dyn MeetingLinkProvider> = Arc::new(GoogleMeetProvider::new(
        http,
        farmlink_providers::google_meet::DEFAULT_API_URL,
        &config.google.calendar_id,
        config.google.access_token.clone(),
    ));

    let notifier = build_notifier(config)?;

    Ok(ServiceContext::builder(
        Arc::new(store),
        Arc::new(gateway),
        notifier,
        Arc::new(weather),
    )
    .meeting_provider(zoom)
    .meeting_provider(google)
    .payment(PaymentSettings {
        currency: config.payment.currency.clone(),
        webhook_secret: config.payment.webhook_secret.clone(),
    })
    .build())
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let email = &config.email;
    let Some(server) = &email.smtp_server else {
        info!("SMTP_SERVER not set; emails will be logged instead of sent");
        return Ok(Arc::new(ConsoleNotifier));
    };

    let settings = SmtpSettings {
        server: server.clone(),
        port: email.smtp_port,
        username: email.smtp_username.clone(),
        password: email.smtp_password.clone(),
        from_email: email.from_email.clone().unwrap_or_default(),
        from_name: email.from_name.clone(),
    };
    let notifier = SmtpNotifier::new(&settings).context("failed to configure SMTP")?;
    info!(server = %settings.server, port = settings.port, "SMTP notifier configured");
    Ok(Arc::new(notifier))
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
