use std::sync::Arc;

use anyhow::Context;
use lightkeeper::auth::BackendFactory;
use lightkeeper::backend::{Backend, SupabaseBackend};
use lightkeeper::config::{BackendConfig, ServerConfig};
use lightkeeper::http::{AppState, app_routes, cors_layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let backend_config = BackendConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export SUPABASE_URL=https://<project>.supabase.co");
        eprintln!("  export SUPABASE_ANON_KEY=...");
        std::process::exit(1);
    });
    let server_config = ServerConfig::from_env();
    let addr = server_config.socket_addr()?;

    eprintln!("Lightkeeper v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", backend_config.url);
    eprintln!("   API: http://{}/api", addr);

    // The root backend never signs in; operators get forks of it.
    let anonymous = Arc::new(SupabaseBackend::new(backend_config)?);
    let connect: BackendFactory = {
        let root = Arc::clone(&anonymous);
        Arc::new(move || Arc::new(root.fork()) as Arc<dyn Backend>)
    };

    let state = AppState::new(anonymous, connect);
    let sessions = Arc::clone(&state.sessions);
    let app = app_routes(state).layer(cors_layer(server_config.cors_origin.as_deref())?);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    sessions.close_all().await;
    Ok(())
}
