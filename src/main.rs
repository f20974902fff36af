//! Querygate - a guarded, read-only SQL execution gateway.

mod cli;
mod logging;

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use cli::Cli;
use querygate::config::Config;
use querygate::engine::{HttpEngine, HttpEngineConfig, MockEngine, NativeResult, QueryEngine};
use querygate::error::GatewayError;
use querygate::gateway::{ErrorResponse, Gateway, QueryRequest};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        // Callers get the structured envelope on stdout, operators the log
        let envelope = error_envelope(&e);
        match serde_json::to_string_pretty(&envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => println!(
                r#"{{"errorKind":"{}","message":"{}"}}"#,
                envelope.error_kind, envelope.message
            ),
        }
        error!("{e:#}");
        std::process::exit(1);
    }
}

/// Builds the caller-facing error envelope. Gateway errors keep their kind;
/// anything else (malformed stdin, missing arguments) becomes a generic
/// `InvalidRequest` so the envelope always carries both fields.
fn error_envelope(e: &anyhow::Error) -> ErrorResponse {
    match e.downcast_ref::<GatewayError>() {
        Some(gateway_err) => ErrorResponse::from(gateway_err),
        None => ErrorResponse {
            error_kind: "InvalidRequest".to_string(),
            message: format!("{e:#}"),
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_defaults();

    if let Some(endpoint) = &cli.endpoint {
        config.engine.endpoint = Some(endpoint.clone());
    }

    let request = build_request(&cli)?;
    let engine = build_engine(&cli, &config)?;
    let gateway = Gateway::new(engine, config);

    let response = gateway.handle(request).await?;

    let json = serde_json::to_string_pretty(&response).context("serializing response")?;
    println!("{json}");
    Ok(())
}

/// Builds the request from inline arguments or a JSON object on stdin.
fn build_request(cli: &Cli) -> anyhow::Result<QueryRequest> {
    if cli.json {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading request from stdin")?;
        let request: QueryRequest =
            serde_json::from_str(&input).context("parsing JSON request")?;
        return Ok(request);
    }

    let sql = cli
        .sql
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no SQL given; pass a statement or use --json"))?;

    Ok(QueryRequest {
        sql,
        database: cli.database.clone(),
        workgroup: cli.workgroup.clone(),
        max_wait_seconds: cli.max_wait_seconds,
    })
}

/// Selects the engine binding: mock for testing, HTTP otherwise.
fn build_engine(cli: &Cli, config: &Config) -> anyhow::Result<Arc<dyn QueryEngine>> {
    if cli.mock_engine {
        return Ok(Arc::new(MockEngine::succeeding(NativeResult::default())));
    }

    let endpoint = config
        .engine
        .endpoint
        .clone()
        .ok_or_else(|| {
            GatewayError::config(
                "no engine endpoint configured; set engine.endpoint or QUERYGATE_ENDPOINT",
            )
        })?;

    let mut engine_config = HttpEngineConfig::new(endpoint);
    if let Some(token) = &config.engine.api_token {
        engine_config = engine_config.with_api_token(token.clone());
    }

    Ok(Arc::new(HttpEngine::new(engine_config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_envelope_keeps_kind() {
        let e = anyhow::Error::new(GatewayError::submission_rejected("no capacity"));
        let envelope = error_envelope(&e);
        assert_eq!(envelope.error_kind, "SubmissionRejected");
        assert_eq!(envelope.message, "Submission rejected: no capacity");
    }

    #[test]
    fn test_other_errors_get_a_generic_envelope() {
        let e = serde_json::from_str::<QueryRequest>("not json")
            .context("parsing JSON request")
            .unwrap_err();
        let envelope = error_envelope(&e);
        assert_eq!(envelope.error_kind, "InvalidRequest");
        assert!(envelope.message.contains("parsing JSON request"));
    }
}
