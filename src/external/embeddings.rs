//! OpenAI-compatible embeddings client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{upstream_error, Error},
    external::EmbeddingProvider,
};

const MAX_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()?;
        let endpoint = format!(
            "{}/embeddings",
            config.embeddings_api_base.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            key: config.embeddings_api_key.clone(),
            model: config.embeddings_model.clone(),
            batch_size: config.embeddings_batch_size.max(1),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            let res = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.key)
                .json(&request)
                .send()
                .await?;

            let status = res.status();
            if status.is_success() {
                let mut parsed: EmbeddingResponse = res.json().await?;
                return into_vectors(&mut parsed, inputs.len());
            }

            if should_retry(status) && attempt < MAX_ATTEMPTS {
                tracing::warn!("embeddings request failed with {}, retrying", status);
                tokio::time::sleep(retry_backoff(attempt)).await;
                continue;
            }

            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".into());

            return Err(upstream_error(format!(
                "embeddings request failed ({}): {}",
                status, body
            )));
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    Duration::from_millis(250 * (1 << attempt.min(4)))
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    #[tracing::instrument(skip(self, inputs), fields(count = inputs.len()))]
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        let mut vectors = Vec::with_capacity(inputs.len());

        for chunk in inputs.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(chunk).await?);
        }

        Ok(vectors)
    }
}

fn into_vectors(parsed: &mut EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>, Error> {
    parsed.data.sort_by_key(|entry| entry.index);

    if parsed.data.len() != expected {
        return Err(upstream_error(format!(
            "embeddings provider returned {} vectors for {} inputs",
            parsed.data.len(),
            expected
        )));
    }

    Ok(parsed
        .data
        .drain(..)
        .map(|entry| entry.embedding)
        .collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[test]
fn orders_vectors_by_index() {
    let mut parsed: EmbeddingResponse = serde_json::from_str(
        r#"{"data": [
            {"index": 1, "embedding": [0.0, 1.0]},
            {"index": 0, "embedding": [1.0, 0.0]}
        ]}"#,
    )
    .unwrap();

    let vectors = into_vectors(&mut parsed, 2).unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[test]
fn count_mismatch_is_upstream_error() {
    let mut parsed: EmbeddingResponse =
        serde_json::from_str(r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#).unwrap();

    assert!(into_vectors(&mut parsed, 3).unwrap_err().is_upstream());
}

#[test]
fn retries_throttling_and_server_errors() {
    assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
    assert!(should_retry(StatusCode::BAD_GATEWAY));
    assert!(!should_retry(StatusCode::UNAUTHORIZED));
    assert!(retry_backoff(1) < retry_backoff(2));
}

#[test]
fn sends_inputs_in_batches() {
    use std::sync::{Arc, Mutex};

    use axum::{routing::post, Extension, Json, Router};
    use serde_json::{json, Value};

    async fn embeddings(
        Extension(seen): Extension<Arc<Mutex<Vec<usize>>>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let inputs = body["input"].as_array().cloned().unwrap_or_default();
        seen.lock().unwrap().push(inputs.len());

        // reversed, the client must reorder by index
        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(i, text)| {
                let n: f32 = text.as_str().unwrap()[5..].parse().unwrap();
                json!({"index": i, "embedding": [n]})
            })
            .collect();

        Json(json!({ "data": data }))
    }

    let seen = Arc::new(Mutex::new(Vec::<usize>::new()));
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let config = Config {
        google_maps_api_base: "maps.example.com".into(),
        google_maps_api_key: "maps-key".into(),
        embeddings_api_base: format!("http://{}/v1/", addr),
        embeddings_api_key: "key".into(),
        embeddings_model: "test-model".into(),
        embeddings_batch_size: 2,
        index_dir: ".".into(),
        provider_timeout: Duration::from_secs(5),
        addr,
    };
    let embedder = OpenAiEmbedder::new(&config).unwrap();
    let inputs: Vec<String> = (0..5).map(|i| format!("text {}", i)).collect();

    let vectors = tokio_test::block_on(async {
        let app = Router::new()
            .route("/v1/embeddings", post(embeddings))
            .layer(Extension(seen.clone()));
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service());
        tokio::spawn(server);

        embedder.embed(&inputs).await.unwrap()
    });

    assert_eq!(*seen.lock().unwrap(), vec![2, 2, 1]);
    assert_eq!(
        vectors,
        vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0], vec![4.0]]
    );

    let unbatched = OpenAiEmbedder::new(&Config {
        embeddings_batch_size: 0,
        ..config
    })
    .unwrap();
    assert_eq!(unbatched.batch_size(), 1);
}
