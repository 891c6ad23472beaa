//! Upload of a validated file to the inspection endpoint.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::{config::Config, pending::PendingFile};

/// Status the inspection service uses when it cannot parse the media.
pub const UNREADABLE_STATUS: StatusCode = StatusCode::NOT_ACCEPTABLE;

/// Classified outcome of one upload attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum TransmissionResult {
    /// Probe document returned by the service.
    Report(Value),
    /// The service received the file but could not inspect it.
    Unreadable,
    /// Anything else: network error, timeout, bad status, bad body.
    TransportFailure,
}

/// Success body of the upload route. `Response` is itself JSON text.
#[derive(Debug, Deserialize)]
struct UploadResp {
    #[serde(rename = "Response")]
    response: String,
}

/// POST the file as multipart and classify what comes back. Never retries.
pub async fn transmit(http: &Client, cfg: &Config, file: &PendingFile) -> TransmissionResult {
    match send(http, cfg, file).await {
        Ok((status, body)) => classify_response(status, &body),
        Err(e) => {
            tracing::warn!("upload of {} failed: {e:#}", file.name);
            TransmissionResult::TransportFailure
        }
    }
}

async fn send(http: &Client, cfg: &Config, file: &PendingFile) -> Result<(StatusCode, Vec<u8>)> {
    // Read the bytes only now; the selection holds a path.
    let data = tokio::fs::read(&file.path)
        .await
        .with_context(|| format!("read {}", file.path.display()))?;

    let form = reqwest::multipart::Form::new().part(
        cfg.server.field_name.clone(),
        reqwest::multipart::Part::bytes(data)
            .file_name(file.name.clone())
            .mime_str("application/octet-stream")?,
    );

    let url = cfg.upload_url();
    tracing::info!("POST {} ({} bytes) -> {}", file.name, file.size, url);
    let resp = http.post(url).multipart(form).send().await?;
    let status = resp.status();
    let body = resp.bytes().await?;
    Ok((status, body.to_vec()))
}

/// Map a status and body to a result, without any I/O.
pub fn classify_response(status: StatusCode, body: &[u8]) -> TransmissionResult {
    if status == UNREADABLE_STATUS {
        tracing::info!("service could not inspect the file");
        return TransmissionResult::Unreadable;
    }
    if !status.is_success() {
        tracing::warn!("unexpected upload status {status}");
        return TransmissionResult::TransportFailure;
    }
    match parse_report(body) {
        Ok(doc) => TransmissionResult::Report(doc),
        Err(e) => {
            tracing::warn!("bad upload response: {e:#}");
            TransmissionResult::TransportFailure
        }
    }
}

/// Decode `{"Response": "<json>"}` and then the nested JSON text.
fn parse_report(body: &[u8]) -> Result<Value> {
    let outer: UploadResp = serde_json::from_slice(body).context("response body")?;
    let doc = serde_json::from_str(&outer.response).context("nested Response document")?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    const OK_BODY: &str = r#"{"Response":"{\"format\":{\"duration\":\"12.3\"}}"}"#;

    fn fixture(dir: &tempfile::TempDir, size: usize) -> PendingFile {
        let path = dir.path().join("sample.mp3");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![b'a'; size]).unwrap();
        PendingFile::from_path(&path).unwrap()
    }

    fn cfg_for(url: String) -> Config {
        let mut cfg = Config::default();
        cfg.server.endpoint = url;
        cfg.server.timeout_secs = 5;
        cfg
    }

    #[test]
    fn test_classify_unreadable() {
        assert_eq!(
            classify_response(StatusCode::NOT_ACCEPTABLE, b"whatever"),
            TransmissionResult::Unreadable
        );
    }

    #[test]
    fn test_classify_nested_report() {
        assert_eq!(
            classify_response(StatusCode::OK, OK_BODY.as_bytes()),
            TransmissionResult::Report(json!({"format": {"duration": "12.3"}}))
        );
    }

    #[test]
    fn test_classify_failures() {
        // Server error even with a well-formed body.
        assert_eq!(
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, OK_BODY.as_bytes()),
            TransmissionResult::TransportFailure
        );
        // Not JSON.
        assert_eq!(
            classify_response(StatusCode::OK, b"<html>"),
            TransmissionResult::TransportFailure
        );
        // Response is not a string.
        assert_eq!(
            classify_response(StatusCode::OK, br#"{"Response":{"format":{}}}"#),
            TransmissionResult::TransportFailure
        );
        // Nested text is not JSON.
        assert_eq!(
            classify_response(StatusCode::OK, br#"{"Response":"not json"}"#),
            TransmissionResult::TransportFailure
        );
    }

    #[tokio::test]
    async fn test_transmit_posts_multipart_and_parses_report() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".into()),
            )
            .match_body(Matcher::Regex(
                r#"name="audioFile"; filename="sample.mp3""#.into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, 1000);
        let cfg = cfg_for(server.url());

        let result = transmit(&Client::new(), &cfg, &file).await;
        assert_eq!(
            result,
            TransmissionResult::Report(json!({"format": {"duration": "12.3"}}))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transmit_maps_406_to_unreadable() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .with_status(406)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, 1000);
        let result = transmit(&Client::new(), &cfg_for(server.url()), &file).await;
        assert_eq!(result, TransmissionResult::Unreadable);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transmit_unreachable_endpoint_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = fixture(&dir, 10);
        let cfg = cfg_for("http://127.0.0.1:1".into());
        let result = transmit(&Client::new(), &cfg, &file).await;
        assert_eq!(result, TransmissionResult::TransportFailure);
    }

    #[tokio::test]
    async fn test_transmit_missing_file_is_transport_failure() {
        let file = PendingFile::new("/nonexistent/x.wav".into(), 10, "x.wav".into());
        let result = transmit(&Client::new(), &Config::default(), &file).await;
        assert_eq!(result, TransmissionResult::TransportFailure);
    }
}
