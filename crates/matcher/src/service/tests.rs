use super::*;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use index::EmbeddingSnapshot;
use semantic::StubEncoder;

use crate::build::build_snapshot;
use crate::expand::SynonymEntry;
use crate::metrics::{set_search_metrics, SearchMetrics};

const DIM: usize = 4096;

async fn stub_service(occupations: &[&str], config: SearchConfig) -> SearchService {
    let encoder = Arc::new(StubEncoder::with_dimension(DIM));
    let texts = occupations.iter().map(|s| s.to_string()).collect();
    let snapshot = build_snapshot(encoder.as_ref(), texts, 16).await.unwrap();
    let store = Arc::new(EmbeddingStore::from_snapshot(snapshot).unwrap());
    SearchService::new(store, encoder, config).unwrap()
}

/// Encoder whose output can be made inconsistent with its input.
struct FaultyEncoder {
    dimension: Option<usize>,
    produced_dimension: usize,
    drop_one: bool,
}

#[async_trait]
impl Encoder for FaultyEncoder {
    fn model_name(&self) -> &str {
        "faulty"
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let keep = if self.drop_one {
            texts.len().saturating_sub(1)
        } else {
            texts.len()
        };
        Ok(vec![vec![1.0; self.produced_dimension]; keep])
    }
}

struct FailingEncoder;

#[async_trait]
impl Encoder for FailingEncoder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> Option<usize> {
        Some(2)
    }

    async fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Err(SemanticError::Api("HTTP 503 Service Unavailable".into()))
    }
}

fn two_dim_store() -> Arc<EmbeddingStore> {
    Arc::new(
        EmbeddingStore::from_snapshot(EmbeddingSnapshot {
            occupations: vec!["Chef".into(), "Nurse".into()],
            embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            model_name: None,
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn software_engineer_finds_software_developer() {
    let service = stub_service(&["Software Developer", "Gardener"], SearchConfig::default()).await;

    let results = service.search("software engineer", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].occupation.full_text, "Software Developer");
    assert!(results[0].confidence_percent > 50.0);
}

#[tokio::test]
async fn search_default_uses_configured_top_k() {
    let occupations = [
        "Software Developer",
        "Gardener",
        "Registered Nurse",
        "Head Chef",
        "Electrician",
        "Auto Mechanic",
        "Primary School Teacher",
    ];
    let service = stub_service(&occupations, SearchConfig::default()).await;
    assert_eq!(service.search_default("nurse").await.unwrap().len(), 5);

    let service = stub_service(
        &occupations,
        SearchConfig {
            default_top_k: 2,
            ..SearchConfig::default()
        },
    )
    .await;
    assert_eq!(service.search_default("nurse").await.unwrap().len(), 2);
}

#[tokio::test]
async fn results_are_bounded_and_sorted() {
    let service = stub_service(
        &["Software Developer", "Gardener", "Chef"],
        SearchConfig::default(),
    )
    .await;

    let results = service.search("chef", 10).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].occupation.full_text, "Chef");
    assert!(results
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.confidence)));

    assert!(service.search("chef", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_query_is_a_valid_search() {
    let service = stub_service(&["Software Developer", "Gardener"], SearchConfig::default()).await;
    let results = service.search("", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.confidence == 0.0));
    assert_eq!(results[0].occupation.id, 0);
}

#[tokio::test]
async fn expansion_can_be_disabled() {
    let service = stub_service(
        &["Software Developer", "Gardener"],
        SearchConfig {
            expand_queries: false,
            ..SearchConfig::default()
        },
    )
    .await;
    assert_eq!(service.expander().expand("software engineer").len(), 1);

    let results = service.search("software engineer", 1).await.unwrap();
    assert_eq!(results[0].occupation.full_text, "Software Developer");
    assert!(results[0].confidence < 1.0);
}

#[tokio::test]
async fn custom_synonyms_drive_expansion() {
    let service = stub_service(
        &["Seamstress, sews garments to order", "Gardener"],
        SearchConfig {
            synonyms: Some(vec![SynonymEntry::new("tailor", &["seamstress"])]),
            ..SearchConfig::default()
        },
    )
    .await;
    let results = service.search("Tailor", 1).await.unwrap();
    assert_eq!(results[0].occupation.id, 0);
    assert!(results[0].confidence > 0.0);
}

#[test]
fn dimension_mismatch_rejected_at_construction() {
    let err = SearchService::new(
        two_dim_store(),
        Arc::new(StubEncoder::with_dimension(8)),
        SearchConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Load(LoadError::DimensionMismatch {
            expected: 8,
            found: 2,
            ..
        })
    ));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let err = SearchService::new(
        two_dim_store(),
        Arc::new(StubEncoder::with_dimension(2)),
        SearchConfig {
            boost_factor: 0.0,
            ..SearchConfig::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::InvalidConfig(_)));
}

#[tokio::test]
async fn wrong_vector_count_is_encoding_failure() {
    let service = SearchService::new(
        two_dim_store(),
        Arc::new(FaultyEncoder {
            dimension: Some(2),
            produced_dimension: 2,
            drop_one: true,
        }),
        SearchConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        service.search("chef", 1).await,
        Err(SearchError::Encoding(_))
    ));
}

#[tokio::test]
async fn wrong_vector_dimension_is_encoding_failure() {
    let service = SearchService::new(
        two_dim_store(),
        Arc::new(FaultyEncoder {
            dimension: None,
            produced_dimension: 3,
            drop_one: false,
        }),
        SearchConfig::default(),
    )
    .unwrap();
    match service.search("chef", 1).await {
        Err(SearchError::Encoding(err)) => assert!(err.to_string().contains("store expects 2")),
        other => panic!("expected encoding failure, got {other:?}"),
    }
}

#[tokio::test]
async fn encoder_errors_propagate() {
    let service =
        SearchService::new(two_dim_store(), Arc::new(FailingEncoder), SearchConfig::default())
            .unwrap();
    match service.search("chef", 1).await {
        Err(SearchError::Encoding(SemanticError::Api(msg))) => assert!(msg.contains("503")),
        other => panic!("expected api failure, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_searches_agree() {
    let service = Arc::new(
        stub_service(
            &["Software Developer", "Gardener", "Head Chef", "Registered Nurse"],
            SearchConfig::default(),
        )
        .await,
    );

    let baseline: Vec<(usize, f32)> = service
        .search("software engineer", 4)
        .await
        .unwrap()
        .iter()
        .map(|r| (r.occupation.id, r.confidence))
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .search("software engineer", 4)
                    .await
                    .map(|hits| {
                        hits.iter()
                            .map(|r| (r.occupation.id, r.confidence))
                            .collect::<Vec<_>>()
                    })
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), baseline);
    }
}

#[derive(Default)]
struct RecordingMetrics {
    searches: RwLock<Vec<(usize, usize)>>,
    failures: RwLock<Vec<String>>,
}

impl SearchMetrics for RecordingMetrics {
    fn record_search(&self, variant_count: usize, _latency: Duration, hit_count: usize) {
        self.searches
            .write()
            .unwrap()
            .push((variant_count, hit_count));
    }

    fn record_failure(&self, kind: &str) {
        self.failures.write().unwrap().push(kind.to_string());
    }
}

#[tokio::test]
async fn metrics_recorder_observes_searches() {
    let service = stub_service(&["Software Developer", "Gardener"], SearchConfig::default()).await;
    let failing =
        SearchService::new(two_dim_store(), Arc::new(FailingEncoder), SearchConfig::default())
            .unwrap();

    let metrics = Arc::new(RecordingMetrics::default());
    set_search_metrics(Some(metrics.clone()));

    service.search("software engineer", 1).await.unwrap();
    let _ = failing.search("chef", 1).await;

    // Other tests may search concurrently while the recorder is installed.
    assert!(metrics
        .searches
        .read()
        .unwrap()
        .iter()
        .any(|&(variants, hits)| variants == 8 && hits == 1));
    assert!(metrics
        .failures
        .read()
        .unwrap()
        .iter()
        .any(|kind| kind == "encoding"));

    set_search_metrics(None);
}
