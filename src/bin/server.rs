use std::{env, fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use dompetku::{
    AppConfig, AppState, LogMailer, build_router, graceful_shutdown, log_session_events,
    logging_middleware,
};

/// The web server for DompetKu.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The IP address to listen on.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: std::net::IpAddr,

    /// The canonical name of the timezone used to decide the current month,
    /// e.g. "Asia/Jakarta".
    #[arg(long, default_value = "Etc/UTC", value_parser = parse_timezone)]
    timezone: String,

    /// The base URL users reach the server at, used for links in emails.
    #[arg(long, default_value = "http://localhost:3000")]
    public_url: String,
}

fn parse_timezone(name: &str) -> Result<String, String> {
    time_tz::timezones::get_by_name(name)
        .map(|_| name.to_owned())
        .ok_or_else(|| format!("\"{name}\" is not a canonical timezone name"))
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from((args.address, args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    let conn = Connection::open(&args.db_path).expect("Could not open the database");
    let config = AppConfig {
        cookie_secret: secret,
        local_timezone: args.timezone,
        public_url: args.public_url,
        password_hash_cost: bcrypt::DEFAULT_COST,
    };
    let state =
        AppState::new(conn, &config, Arc::new(LogMailer)).expect("Could not initialize the app");

    tokio::spawn(log_session_events(state.session_events.subscribe()));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(env_filter)
                .and_then(debug_log.with_filter(filter::LevelFilter::DEBUG)),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
