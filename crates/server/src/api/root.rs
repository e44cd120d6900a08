use std::time::Duration;

use axum::Json;
use axum::extract::State;

use super::AppState;
use super::schemas::RootResponse;

/// `GET /` -- liveness and version info.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    summary = "Server info",
    description = "Reports that the server is up, how long it has been running, and its version.",
    responses(
        (status = 200, description = "Server is running", body = RootResponse)
    )
)]
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Server is running.".into(),
        ok: true,
        uptime: format_uptime(state.started_at.elapsed()),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Render a duration as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formats() {
        assert_eq!(format_uptime(Duration::from_secs(5)), "5s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_uptime(Duration::from_secs(3_723)), "1h 2m 3s");
        assert_eq!(format_uptime(Duration::from_secs(3_600)), "1h 0m 0s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }
}
