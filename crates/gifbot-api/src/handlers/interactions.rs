//! Interaction endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{info, warn, Instrument};

use gifbot_models::ConversionJob;
use gifbot_worker::orchestrator::validate_range;

use crate::discord::interaction::kind;
use crate::discord::{parse_gif_command, DiscordResponder, Interaction, InteractionResponse};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Handle one interaction.
///
/// Requests without a valid signature get 401. Commands that pass input
/// checks are acknowledged with a deferred reply while the conversion runs
/// in the background; the rest get an ephemeral explanation.
pub async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<InteractionResponse>> {
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);
    let verified = match (signature, timestamp) {
        (Some(signature), Some(timestamp)) => state.verifier.verify(timestamp, &body, signature),
        _ => Err(ApiError::unauthorized("missing request signature")),
    };
    if let Err(e) = verified {
        metrics::record_interaction("unauthorized");
        return Err(e);
    }

    let interaction: Interaction = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid interaction payload: {}", e)))?;

    match interaction.kind {
        kind::PING => {
            metrics::record_interaction("pong");
            Ok(Json(InteractionResponse::pong()))
        }
        kind::APPLICATION_COMMAND => match accept_command(&state, &interaction) {
            Ok(job) => {
                metrics::record_interaction("deferred");
                spawn_conversion(&state, job, interaction.token);
                Ok(Json(InteractionResponse::deferred()))
            }
            Err(ApiError::Validation(message)) => {
                metrics::record_interaction("rejected");
                info!(interaction_id = %interaction.id, reason = %message, "Rejected command");
                Ok(Json(InteractionResponse::ephemeral(message)))
            }
            Err(e) => Err(e),
        },
        other => {
            warn!(interaction_type = other, "Unsupported interaction type");
            Err(ApiError::bad_request(format!(
                "unsupported interaction type {}",
                other
            )))
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse the command and check the attachment size and time range before
/// acknowledging, so bad input never costs a download.
fn accept_command(state: &AppState, interaction: &Interaction) -> ApiResult<ConversionJob> {
    let config = state.orchestrator.config();
    let job = parse_gif_command(interaction, config.max_download_bytes)?;
    validate_range(&job.start, &job.end, config.max_gif_secs)
        .map_err(|e| ApiError::validation(e.user_message()))?;
    Ok(job)
}

fn spawn_conversion(state: &AppState, job: ConversionJob, token: String) {
    let orchestrator = state.orchestrator.clone();
    let responder = DiscordResponder::new(state.discord.clone(), token);
    let span = tracing::info_span!("interaction", request_id = %job.id);

    tokio::spawn(
        async move {
            let report = orchestrator.run(job, &responder).await;
            info!(
                stage = %report.final_stage(),
                outcome = report.outcome_class(),
                "Interaction finished"
            );
        }
        .instrument(span),
    );
}
