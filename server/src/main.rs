use dotenvy::dotenv;
use tokio::net::TcpListener;

use raffle_server::config::{create_cors_layer, create_security_headers_layer, Config};
use raffle_server::routes::create_routes;
use raffle_server::sweeper::spawn_sweeper;
use raffle_server::{build_state, connect};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = connect(&config)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let state = build_state(pool, &config);

    if let Some(every) = config.sweep_interval {
        spawn_sweeper(state.lucky_draw.clone(), every);
    }

    let app = create_routes(
        state,
        create_security_headers_layer(config.production),
        create_cors_layer(config.cors_allowed_origins.as_deref()),
    );

    tracing::info!("Raffle server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
