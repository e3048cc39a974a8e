use axum::http::StatusCode;
use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fairbet_core::verify;
use fairbet_shared::{ApiError, ApiResult, ErrorBody, VerifyRequest, VerifyResponse};

fn run_verify(req: &VerifyRequest) -> ApiResult<VerifyResponse> {
    let outcome = verify(&req.seed, &req.game)?;
    let matches = req.reported.as_ref().map(|r| outcome.agrees_with(r));
    Ok(VerifyResponse {
        server_seed_hash: req.seed.server_seed_hash(),
        outcome,
        matches,
    })
}

fn reject(err: ApiError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

async fn route_health() -> &'static str {
    "ok"
}

async fn route_verify(
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<ErrorBody>)> {
    match run_verify(&req) {
        Ok(res) => {
            info!(
                game = %req.game.kind(),
                nonce = req.seed.nonce,
                matches = ?res.matches,
                "verified round"
            );
            Ok(Json(res))
        }
        Err(err) => {
            warn!(game = %req.game.kind(), error = %err, "verification rejected");
            Err(reject(err))
        }
    }
}

fn app() -> Router {
    Router::new()
        .route("/health", get(route_health))
        .route("/verify", post(route_verify))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr = std::env::var("BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app()).await?;
    Ok(())
}
