//! End-to-end races against fake HTTP lookup services.

#![allow(clippy::unwrap_used, clippy::panic)]

use cep_race::application::error::RaceError;
use cep_race::application::services::normalizer::DecodeError;
use cep_race::application::services::{RaceConfig, RaceExecutor};
use cep_race::domain::PostalQuery;
use cep_race::infrastructure::sources::{
    Deadline, FetchOutcome, FieldMapping, HttpFetcher, OutboundRequest, SourceDescriptor,
    SourceError, SourceFetcher, SourceRegistry,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CEP: &str = "01001000";

async fn english_source(name: &str, response: ResponseTemplate) -> (MockServer, SourceDescriptor) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/cep/v1/{CEP}")))
        .respond_with(response)
        .mount(&server)
        .await;
    let source = SourceDescriptor::new(
        name,
        format!("{}/api/cep/v1/{{cep}}", server.uri()),
        FieldMapping::english(),
    );
    (server, source)
}

fn brasil_api_body() -> serde_json::Value {
    json!({
        "cep": CEP,
        "state": "SP",
        "city": "São Paulo",
        "neighborhood": "Sé",
        "street": "Praça da Sé",
        "service": "correios"
    })
}

fn executor(sources: Vec<SourceDescriptor>, timeout_ms: u64) -> RaceExecutor {
    RaceExecutor::new(
        Arc::new(SourceRegistry::new(sources).unwrap()),
        Arc::new(HttpFetcher::new(10_000).unwrap()),
        RaceConfig::with_timeout(timeout_ms),
    )
}

#[tokio::test]
async fn fast_source_wins_over_source_beyond_deadline() {
    let (_fast_server, fast) = english_source(
        "Fast",
        ResponseTemplate::new(200)
            .set_body_json(json!({"cep": CEP, "city": "São Paulo"}))
            .set_delay(Duration::from_millis(50)),
    )
    .await;
    let (_slow_server, slow) = english_source(
        "Slow",
        ResponseTemplate::new(200)
            .set_body_json(brasil_api_body())
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let start = Instant::now();
    let record = executor(vec![slow, fast], 1000).lookup(CEP).await.unwrap();

    assert_eq!(record.source, "Fast");
    assert_eq!(record.city.as_deref(), Some("São Paulo"));
    assert!(record.street.is_none());
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn all_non_success_statuses_fail_before_deadline() {
    let (_a, a) = english_source("A", ResponseTemplate::new(500)).await;
    let (_b, b) = english_source("B", ResponseTemplate::new(404)).await;
    let (_c, c) = english_source("C", ResponseTemplate::new(503)).await;

    let start = Instant::now();
    let error = executor(vec![a, b, c], 1000).lookup(CEP).await.unwrap_err();

    let race = match error {
        cep_race::application::LookupError::Race(race) => race,
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(race.kind(), "all_sources_failed");
    assert!(!race.deadline_expired());
    let statuses: Vec<Option<u16>> = race.causes().iter().map(|c| c.error.status_code()).collect();
    assert_eq!(statuses, [Some(500), Some(404), Some(503)]);
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn all_sources_beyond_deadline_expire_together() {
    let slow = || {
        ResponseTemplate::new(200)
            .set_body_json(brasil_api_body())
            .set_delay(Duration::from_millis(1500))
    };
    let (_a, a) = english_source("A", slow()).await;
    let (_b, b) = english_source("B", slow()).await;
    let (_c, c) = english_source("C", slow()).await;

    let start = Instant::now();
    let query = PostalQuery::new(CEP).unwrap();
    let error = executor(vec![a, b, c], 1000).race(&query).await.unwrap_err();
    let elapsed = start.elapsed();

    match &error {
        RaceError::AggregateFailure {
            deadline_expired,
            causes,
        } => {
            assert!(*deadline_expired);
            assert_eq!(causes.len(), 3);
            assert!(causes.iter().all(|c| c.error.is_timeout()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(1400), "took {elapsed:?}");
}

#[tokio::test]
async fn malformed_winner_payload_fails_the_race() {
    let (_fast_server, fast) = english_source(
        "Fast",
        ResponseTemplate::new(200).set_body_string("{\"cep\": \"0100"),
    )
    .await;
    let (_slow_server, slow) = english_source(
        "Slow",
        ResponseTemplate::new(200)
            .set_body_json(brasil_api_body())
            .set_delay(Duration::from_millis(300)),
    )
    .await;

    let query = PostalQuery::new(CEP).unwrap();
    let error = executor(vec![fast, slow], 1000).race(&query).await.unwrap_err();

    match error {
        RaceError::Decode { source_name, error } => {
            assert_eq!(source_name, "Fast");
            assert!(matches!(error, DecodeError::Malformed(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn via_cep_not_found_flag_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ws/{CEP}/json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"erro": true})))
        .mount(&server)
        .await;
    let via_cep = SourceDescriptor::new(
        "Via CEP API",
        format!("{}/ws/{{cep}}/json", server.uri()),
        FieldMapping::correios().with_error_flag("erro"),
    );

    let query = PostalQuery::new(CEP).unwrap();
    let error = executor(vec![via_cep], 1000).race(&query).await.unwrap_err();
    assert_eq!(error.kind(), "decode_failed");
}

#[tokio::test]
async fn heterogeneous_schemas_normalize_to_the_same_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ws/{CEP}/json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP",
            "ibge": "3550308",
            "ddd": "11"
        })))
        .mount(&server)
        .await;
    let via_cep = SourceDescriptor::new(
        "Via CEP API",
        format!("{}/ws/{{cep}}/json", server.uri()),
        FieldMapping::correios().with_error_flag("erro"),
    );

    let record = executor(vec![via_cep], 1000).lookup(CEP).await.unwrap();
    assert_eq!(record.source, "Via CEP API");
    assert_eq!(record.state.as_deref(), Some("SP"));
    assert_eq!(record.city.as_deref(), Some("São Paulo"));
    assert_eq!(record.neighborhood.as_deref(), Some("Sé"));
    assert_eq!(record.street.as_deref(), Some("Praça da Sé"));
}

fn request_for(source: SourceDescriptor, timeout: Duration) -> OutboundRequest {
    let query = PostalQuery::new(CEP).unwrap();
    OutboundRequest::build(&query, Arc::new(source), Deadline::start(timeout)).unwrap()
}

#[tokio::test]
async fn fetcher_returns_raw_payload_on_success() {
    let (_server, source) =
        english_source("A", ResponseTemplate::new(200).set_body_json(brasil_api_body())).await;
    let fetcher = HttpFetcher::new(1000).unwrap();

    match fetcher.fetch(&request_for(source, Duration::from_secs(1))).await {
        FetchOutcome::Success { payload, .. } => {
            let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
            assert_eq!(value, brasil_api_body());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn fetcher_classifies_non_success_status() {
    let (_server, source) =
        english_source("A", ResponseTemplate::new(429).set_body_string("slow down")).await;
    let fetcher = HttpFetcher::new(1000).unwrap();

    match fetcher.fetch(&request_for(source, Duration::from_secs(1))).await {
        FetchOutcome::Failure(error) => {
            assert_eq!(error.status_code(), Some(429));
            assert!(error.to_string().contains("slow down"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn fetcher_reports_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let source = SourceDescriptor::new(
        "Closed",
        format!("http://127.0.0.1:{port}/{{cep}}"),
        FieldMapping::english(),
    );
    let fetcher = HttpFetcher::new(1000).unwrap();

    match fetcher.fetch(&request_for(source, Duration::from_secs(1))).await {
        FetchOutcome::Failure(SourceError::Connection { .. }) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn fetcher_backstop_timeout_reports_timed_out() {
    let (_server, source) = english_source(
        "A",
        ResponseTemplate::new(200)
            .set_body_json(brasil_api_body())
            .set_delay(Duration::from_secs(2)),
    )
    .await;
    let fetcher = HttpFetcher::new(100).unwrap();

    let outcome = fetcher.fetch(&request_for(source, Duration::from_secs(5))).await;
    assert!(matches!(outcome, FetchOutcome::TimedOut { .. }), "{outcome:?}");
}
