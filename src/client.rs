use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::report::FaultReport;

const REPORTS_PATH: &str = "/api/fault-reports/";

/// What the backend answered for an accepted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub status: u16,
}

/// HTTP client for the fault-report endpoint.
#[derive(Debug, Clone)]
pub struct ReportClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ReportClient {
    pub fn new(server: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint_url(&server.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one report. Any non-2xx status is an error.
    pub async fn submit(&self, report: &FaultReport) -> Result<SubmitReceipt> {
        debug!(endpoint = %self.endpoint, region = %report.region, ward = %report.ward, "posting fault report");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                bail!("Server returned HTTP {}", status);
            }
            bail!("Server returned HTTP {}: {}", status, truncate(body, 200));
        }

        info!(status = status.as_u16(), "fault report accepted");
        Ok(SubmitReceipt {
            status: status.as_u16(),
        })
    }
}

/// Join the configured base URL with the reports path.
pub fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), REPORTS_PATH)
}

fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    input
        .chars()
        .take(max.saturating_sub(3))
        .collect::<String>()
        + "..."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Coordinate;
    use crate::report::{FaultType, FormState};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn report() -> FaultReport {
        FormState {
            description: "No power since morning".to_string(),
            fault_type: Some(FaultType::PowerOutage),
            region: "Dar es Salaam".to_string(),
            ward: "Ilala".to_string(),
            location: Some(Coordinate { lat: -6.8, lng: 39.28 }),
        }
        .to_report()
    }

    /// Accept one connection, capture the raw request, answer with `response`.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        body.len() >= length
    }

    fn server(base_url: String) -> ServerConfig {
        ServerConfig {
            base_url,
            timeout_secs: 5,
        }
    }

    #[test]
    fn endpoint_url_joins_without_double_slash() {
        assert_eq!(
            endpoint_url("http://localhost:8000"),
            "http://localhost:8000/api/fault-reports/"
        );
        assert_eq!(
            endpoint_url("https://faults.example.org/"),
            "https://faults.example.org/api/fault-reports/"
        );
    }

    #[tokio::test]
    async fn submit_posts_json_body() {
        let (base, handle) =
            serve_once("HTTP/1.1 201 Created\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await;
        let client = ReportClient::new(&server(base)).expect("client");

        let receipt = client.submit(&report()).await.expect("submit");
        assert_eq!(receipt, SubmitReceipt { status: 201 });

        let raw = handle.await.expect("server task");
        assert!(raw.starts_with("POST /api/fault-reports/ HTTP/1.1"));
        let body = raw.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(body).expect("json body");
        assert_eq!(
            value,
            serde_json::json!({
                "description": "No power since morning",
                "faultType": "Power Outage",
                "region": "Dar es Salaam",
                "ward": "Ilala",
                "location": { "lng": 39.28, "lat": -6.8 }
            })
        );
    }

    #[tokio::test]
    async fn submit_surfaces_server_errors() {
        let (base, handle) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 7\r\nconnection: close\r\n\r\nbad day",
        )
        .await;
        let client = ReportClient::new(&server(base)).expect("client");

        let err = client.submit(&report()).await.expect_err("must fail");
        assert!(err.to_string().contains("HTTP 500"));
        assert!(err.to_string().contains("bad day"));
        handle.await.expect("server task");
    }

    #[tokio::test]
    async fn submit_fails_when_server_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let client = ReportClient::new(&server(format!("http://{}", addr))).expect("client");
        let err = client.submit(&report()).await.expect_err("must fail");
        assert!(err.to_string().contains("failed"));
    }
}
