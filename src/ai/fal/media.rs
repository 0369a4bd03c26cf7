use super::client::FalHttpClient;
use crate::ai::MediaGenerationService;
use crate::Result;
use async_trait::async_trait;

/// Image and video generation on fal.ai.
pub struct FalMediaClient {
    http: FalHttpClient,
}

impl FalMediaClient {
    pub fn new(http: FalHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MediaGenerationService for FalMediaClient {
    async fn submit(&self, model: &str, input: serde_json::Value) -> Result<serde_json::Value> {
        let started = std::time::Instant::now();
        let output = self.http.run(model, &input).await?;
        tracing::info!(
            "fal.ai {} finished in {:.1}s",
            model,
            started.elapsed().as_secs_f32()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_submit_returns_raw_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/pixverse/v5/text-to-video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "video": { "url": "https://fal.media/v.mp4" }
            })))
            .mount(&server)
            .await;

        let client = FalMediaClient::new(
            FalHttpClient::new("k".to_string(), Duration::from_secs(5)).with_base_url(server.uri()),
        );

        let output = client
            .submit(
                "fal-ai/pixverse/v5/text-to-video",
                serde_json::json!({ "prompt": "p" }),
            )
            .await
            .unwrap();

        assert_eq!(output["video"]["url"], "https://fal.media/v.mp4");
    }

    #[tokio::test]
    async fn test_submit_propagates_upstream_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/flux/dev"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = FalMediaClient::new(
            FalHttpClient::new("k".to_string(), Duration::from_secs(5)).with_base_url(server.uri()),
        );

        let err = client
            .submit("fal-ai/flux/dev", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
