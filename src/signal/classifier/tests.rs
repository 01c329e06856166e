use super::remote::{parse_gptzero, parse_hugging_face, parse_model_server, parse_zerogpt};
use super::*;
use serde_json::json;
use std::path::PathBuf;

const TEXT: &str = "This sentence has more than enough words to be classified by the chain.";

fn chain(links: Vec<MockClassifierBackend>) -> ClassifierChain {
    ClassifierChain::new(
        links
            .into_iter()
            .map(|l| Arc::new(l) as Arc<dyn ClassifierBackend>)
            .collect(),
    )
}

#[tokio::test]
async fn test_first_success_wins() {
    let first = MockClassifierBackend::returning("first", 0.9);
    let second = MockClassifierBackend::returning("second", 0.1);
    let chain = chain(vec![first.clone(), second.clone()]);

    let result = chain.produce(TEXT).await;

    assert!(result.available);
    assert!((result.score - 0.9).abs() < 1e-9);
    assert_eq!(result.detail["source"], "first");
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn test_falls_through_failures_in_order() {
    let broken = MockClassifierBackend::failing("paid", "quota exceeded");
    let working = MockClassifierBackend::returning("model_server", 0.3);
    let chain = chain(vec![broken.clone(), working.clone()]);

    let result = chain.produce(TEXT).await;

    assert!(result.available);
    assert_eq!(result.detail["source"], "model_server");
    let failures = result.detail["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["source"], "paid");
    assert_eq!(broken.calls(), 1);
}

#[tokio::test]
async fn test_all_failures_are_unavailable() {
    let chain = chain(vec![
        MockClassifierBackend::failing("a", "down"),
        MockClassifierBackend::failing("b", "down"),
    ]);

    let result = chain.produce(TEXT).await;

    assert!(!result.available);
    assert_eq!(result.score, 0.5);
    assert_eq!(result.detail["failures"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_chain_is_unavailable() {
    let result = ClassifierChain::new(Vec::new()).produce(TEXT).await;
    assert!(!result.available);
    assert_eq!(result.reason(), Some("no classifier backends configured"));
}

#[tokio::test]
async fn test_short_input_skips_backends() {
    let backend = MockClassifierBackend::returning("a", 0.9);
    let chain = chain(vec![backend.clone()]);

    let result = chain.produce("too short").await;

    assert!(!result.available);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_slow_link_times_out_and_next_runs() {
    let slow = MockClassifierBackend::returning("slow", 0.9).with_delay(Duration::from_secs(5));
    let fast = MockClassifierBackend::returning("fast", 0.2);
    let chain = chain(vec![slow, fast]).with_link_timeout(Duration::from_millis(20));

    let result = chain.produce(TEXT).await;

    assert!(result.available);
    assert_eq!(result.detail["source"], "fast");
    let failure = result.detail["failures"][0]["error"].as_str().unwrap();
    assert!(failure.contains("timed out"));
}

#[test]
fn test_parse_zerogpt() {
    let body = json!({"success": true, "data": {"fakePercentage": 85.5, "isHuman": 14.5}});
    assert!((parse_zerogpt(&body).unwrap() - 0.855).abs() < 1e-9);

    let body = json!({"success": false, "message": "bad key"});
    assert!(parse_zerogpt(&body).is_err());
}

#[test]
fn test_parse_gptzero() {
    let body = json!({"documents": [{"completely_generated_prob": 0.92, "average_generated_prob": 0.8}]});
    assert!((parse_gptzero(&body).unwrap() - 0.92).abs() < 1e-9);
    assert!(parse_gptzero(&json!({"documents": []})).is_err());
}

#[test]
fn test_parse_model_server() {
    assert_eq!(parse_model_server(&json!({"ai_probability": 0.4})).unwrap(), 0.4);
    assert!(parse_model_server(&json!({"prediction": "ai"})).is_err());
}

#[test]
fn test_parse_hugging_face_labels() {
    let fake = json!([[{"label": "Fake", "score": 0.97}, {"label": "Real", "score": 0.03}]]);
    assert!((parse_hugging_face(&fake, "m").unwrap() - 0.97).abs() < 1e-9);

    let real_first = json!([[{"label": "LABEL_0", "score": 0.8}, {"label": "LABEL_1", "score": 0.2}]]);
    assert!((parse_hugging_face(&real_first, "m").unwrap() - 0.2).abs() < 1e-9);

    let flat = json!([{"label": "Human", "score": 0.6}]);
    assert!((parse_hugging_face(&flat, "m").unwrap() - 0.4).abs() < 1e-9);

    let unknown = json!([[{"label": "POSITIVE", "score": 0.99}]]);
    assert!(parse_hugging_face(&unknown, "m").is_err());
}

#[test]
fn test_parse_hugging_face_loading() {
    let body = json!({"error": "Model roberta is currently loading", "estimated_time": 20.0});
    assert!(matches!(
        parse_hugging_face(&body, "roberta"),
        Err(ClassifierError::ModelLoading { .. })
    ));
}

#[test]
fn test_remote_sources() {
    assert_eq!(RemoteKind::zerogpt("k").source(), "zerogpt");
    assert_eq!(RemoteKind::gptzero("k").source(), "gptzero");
    assert_eq!(
        RemoteKind::model_server("http://localhost:8000/").source(),
        "model_server"
    );
    assert_eq!(
        RemoteKind::hugging_face("org/model").source(),
        "huggingface:org/model"
    );
    assert_eq!(
        RemoteKind::model_server("http://localhost:8000/"),
        RemoteKind::ModelServer {
            base_url: "http://localhost:8000".to_string()
        }
    );
}

#[test]
fn test_config_chain_order() {
    let config = ClassifierConfig {
        zerogpt_api_key: Some("z".to_string()),
        gptzero_api_key: Some("g".to_string()),
        model_server_url: Some("http://127.0.0.1:9".to_string()),
        hf_inference: true,
        ..ClassifierConfig::default()
    };

    let chain = config.build_chain();
    assert_eq!(
        chain.sources(),
        vec![
            "zerogpt".to_string(),
            "gptzero".to_string(),
            "model_server".to_string(),
            "huggingface:roberta-large-openai-detector".to_string(),
            "huggingface:andreas122001/roberta-large-finetuned-ai-detection".to_string(),
        ]
    );
}

#[test]
fn test_config_skips_unloadable_local_model() {
    let config = ClassifierConfig {
        model_path: Some(PathBuf::from("/nonexistent/detector")),
        ..ClassifierConfig::default()
    };

    assert!(config.has_backends());
    assert!(config.build_chain().is_empty());
    assert!(!ClassifierConfig::default().has_backends());
}

#[test]
fn test_unbuildable_link_is_skipped() {
    let skipped = config::usable_link::<MockClassifierBackend, _>(
        "zerogpt",
        Err(ClassifierError::TaskFailed {
            reason: "client builder failed".to_string(),
        }),
    );
    assert!(skipped.is_none());

    let kept = config::usable_link::<_, ClassifierError>(
        "mock",
        Ok(MockClassifierBackend::returning("mock", 0.4)),
    )
    .expect("built link is kept");
    assert_eq!(kept.source(), "mock");
}

#[test]
fn test_remote_classifier_builds_with_timeout() {
    let backend = RemoteClassifier::new(
        RemoteKind::model_server("http://127.0.0.1:9"),
        Duration::from_millis(250),
    )
    .expect("client builds");
    assert_eq!(backend.kind().source(), "model_server");
}

#[tokio::test]
async fn test_model_server_round_trip() {
    use axum::{Json, Router, routing::post};

    async fn detect(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        let words = body["text"].as_str().unwrap_or_default().split_whitespace().count();
        Json(json!({"ai_probability": 0.75, "words": words}))
    }

    let app = Router::new().route("/detect", post(detect));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let backend = RemoteClassifier::new(
        RemoteKind::model_server(format!("http://{addr}")),
        Duration::from_secs(5),
    )
    .unwrap();
    let chain = ClassifierChain::new(vec![Arc::new(backend)]);

    let result = chain.produce(TEXT).await;

    assert!(result.available);
    assert!((result.score - 0.75).abs() < 1e-9);
    assert_eq!(result.detail["source"], "model_server");
}

#[tokio::test]
async fn test_model_server_error_status() {
    use axum::{Router, http::StatusCode, routing::post};

    let app = Router::new().route(
        "/detect",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let backend = RemoteClassifier::new(
        RemoteKind::model_server(format!("http://{addr}")),
        Duration::from_secs(5),
    )
    .unwrap();

    let err = backend.classify(TEXT).await.unwrap_err();
    assert!(matches!(err, ClassifierError::Status { status: 500, .. }));
}
