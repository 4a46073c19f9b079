//! Ad hoc single-stop lookup, outside any subscription

use crate::adapters::{StopAdapter, LOOKUP_ARRIVAL_LIMIT};
use crate::config::stop_url;
use crate::services::fetcher::HttpFetcher;
use crate::types::NavajaError;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Status and JSON body, shaped like an HTTP response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResponse {
    pub status: u16,
    pub body: Value,
}

impl LookupResponse {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Fetch and normalize one stop's arrivals.
///
/// 200 with `{displayName, arrivals}`; 400 for a missing identifier; the
/// upstream status when upstream answers non-2xx; 500 for anything else.
pub async fn lookup_stop(
    fetcher: &HttpFetcher,
    template: &str,
    stop_id: &str,
    now: &DateTime<Tz>,
) -> LookupResponse {
    let stop_id = stop_id.trim().to_uppercase();
    if stop_id.is_empty() {
        return LookupResponse::error(400, "stop_id required");
    }

    let url = stop_url(template, &stop_id);
    let doc = match fetcher.fetch_json(&url).await {
        Ok(doc) => doc,
        Err(NavajaError::Status { status, .. }) => {
            warn!(stop = %stop_id, status, "stop lookup rejected upstream");
            return LookupResponse::error(status, format!("HTTP {}", status));
        }
        Err(e) => {
            warn!(stop = %stop_id, error = %e, "stop lookup failed");
            return LookupResponse::error(500, e.to_string());
        }
    };

    let adapter = StopAdapter::new(&stop_id, &url).with_limit(LOOKUP_ARRIVAL_LIMIT);
    let Some(arrivals) = adapter.parse(&doc, now) else {
        return LookupResponse::error(500, "unexpected stop document");
    };

    match serde_json::to_value(&arrivals) {
        Ok(body) => LookupResponse { status: 200, body },
        Err(e) => LookupResponse::error(500, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Tz> {
        Utc::now().with_timezone(&chrono_tz::America::Santiago)
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(2)).unwrap()
    }

    fn template(server: &MockServer) -> String {
        format!("{}/red/bus-stop/{{stop_id}}", server.uri())
    }

    #[tokio::test]
    async fn test_lookup_success_normalizes_id() {
        let server = MockServer::start().await;
        let services: Vec<Value> = (0..12)
            .map(|i| {
                json!({
                    "id": format!("{}", 500 + i),
                    "min_arrival_time": i,
                    "max_arrival_time": i + 2
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/red/bus-stop/PA433"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "Parada 1", "services": services})),
            )
            .mount(&server)
            .await;

        let response = lookup_stop(&fetcher(), &template(&server), " pa433 ", &now()).await;

        assert!(response.is_success());
        assert_eq!(response.body["displayName"], "Parada 1");
        let arrivals = response.body["arrivals"].as_array().unwrap();
        assert_eq!(arrivals.len(), LOOKUP_ARRIVAL_LIMIT);
        assert_eq!(arrivals[0]["route"], "500");
        assert_eq!(arrivals[0]["eta"], "Entre 00 Y 02 min.");
    }

    #[tokio::test]
    async fn test_lookup_missing_id() {
        let response = lookup_stop(&fetcher(), "http://127.0.0.1:9/{stop_id}", "  ", &now()).await;
        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({"error": "stop_id required"}));
    }

    #[tokio::test]
    async fn test_lookup_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = lookup_stop(&fetcher(), &template(&server), "PZ999", &now()).await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body, json!({"error": "HTTP 404"}));
    }

    #[tokio::test]
    async fn test_lookup_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let response = lookup_stop(&fetcher(), &template(&server), "PA433", &now()).await;
        assert_eq!(response.status, 500);
        assert!(response.body["error"].is_string());
    }
}
