use std::sync::Arc;

use async_trait::async_trait;
use ncosearch::{
    EmbeddingSnapshot, EmbeddingStore, Encoder, LoadError, SearchConfig, SearchError,
    SearchService, SemanticConfig, SemanticError, ServiceConfig, StubEncoder,
};

fn snapshot(occupations: usize, embeddings: usize) -> EmbeddingSnapshot {
    EmbeddingSnapshot {
        occupations: (0..occupations).map(|i| format!("Occupation {i}")).collect(),
        embeddings: (0..embeddings).map(|i| vec![i as f32 + 1.0, 1.0]).collect(),
        model_name: None,
    }
}

#[test]
fn three_occupations_three_embeddings_loads() {
    let store = EmbeddingStore::from_snapshot(snapshot(3, 3)).unwrap();
    assert_eq!(store.len(), 3);
}

#[test]
fn three_occupations_two_embeddings_is_rejected() {
    assert!(matches!(
        EmbeddingStore::from_snapshot(snapshot(3, 2)),
        Err(LoadError::LengthMismatch {
            occupations: 3,
            embeddings: 2
        })
    ));
}

#[test]
fn corrupt_snapshot_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.snap");
    std::fs::write(&path, b"not a snapshot").unwrap();
    assert!(matches!(
        EmbeddingStore::load(&path),
        Err(LoadError::Decode(_))
    ));

    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{\"occupations\": [").unwrap();
    assert!(matches!(
        EmbeddingStore::load(&path),
        Err(LoadError::Decode(_))
    ));
}

#[tokio::test]
async fn missing_snapshot_fails_service_construction() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServiceConfig {
        snapshot_path: dir.path().join("absent.snap"),
        semantic: SemanticConfig::stub("fast"),
        search: SearchConfig::default(),
    };
    assert!(matches!(
        SearchService::from_config(&cfg).await,
        Err(SearchError::Load(LoadError::Io { .. }))
    ));
}

#[tokio::test]
async fn encoder_and_snapshot_dimensions_must_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nco.json");
    EmbeddingStore::from_snapshot(snapshot(3, 3))
        .unwrap()
        .save(&path)
        .unwrap();

    let cfg = ServiceConfig {
        snapshot_path: path,
        semantic: SemanticConfig::stub("fast"),
        search: SearchConfig::default(),
    };
    match SearchService::from_config(&cfg).await {
        Err(SearchError::Load(LoadError::DimensionMismatch {
            expected, found, ..
        })) => {
            assert_eq!(expected, 384);
            assert_eq!(found, 2);
        }
        other => panic!("expected dimension mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_onnx_model_is_encoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nco.json");
    EmbeddingStore::from_snapshot(snapshot(3, 3))
        .unwrap()
        .save(&path)
        .unwrap();

    let cfg = ServiceConfig {
        snapshot_path: path,
        semantic: SemanticConfig {
            mode: "onnx".into(),
            model_path: dir.path().join("missing.onnx"),
            ..SemanticConfig::default()
        },
        search: SearchConfig::default(),
    };
    assert!(matches!(
        SearchService::from_config(&cfg).await,
        Err(SearchError::Encoding(SemanticError::ModelNotFound(_)))
    ));
}

struct UnavailableEncoder;

#[async_trait]
impl Encoder for UnavailableEncoder {
    fn model_name(&self) -> &str {
        "unavailable"
    }

    fn dimension(&self) -> Option<usize> {
        Some(2)
    }

    async fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Err(SemanticError::WorkerUnavailable)
    }
}

#[tokio::test]
async fn encoder_failure_yields_no_partial_results() {
    let store = Arc::new(EmbeddingStore::from_snapshot(snapshot(3, 3)).unwrap());
    let service =
        SearchService::new(store, Arc::new(UnavailableEncoder), SearchConfig::default()).unwrap();

    let err = service.search("anything", 3).await.unwrap_err();
    assert!(matches!(
        err,
        SearchError::Encoding(SemanticError::WorkerUnavailable)
    ));
    assert_eq!(err.kind(), "encoding");
}

#[test]
fn top_k_validation_for_callers() {
    let cfg = SearchConfig::default();
    assert_eq!(cfg.validate_top_k(None).unwrap(), 5);
    assert_eq!(cfg.validate_top_k(Some(100)).unwrap(), 100);
    assert!(matches!(
        cfg.validate_top_k(Some(0)),
        Err(SearchError::InvalidTopK { requested: 0, .. })
    ));
    assert!(matches!(
        cfg.validate_top_k(Some(101)),
        Err(SearchError::InvalidTopK {
            requested: 101,
            max: 100
        })
    ));
}

#[test]
fn stub_dimension_mismatch_is_caught_without_io() {
    let store = Arc::new(EmbeddingStore::from_snapshot(snapshot(2, 2)).unwrap());
    let result = SearchService::new(
        store,
        Arc::new(StubEncoder::with_dimension(3)),
        SearchConfig::default(),
    );
    assert!(matches!(
        result,
        Err(SearchError::Load(LoadError::DimensionMismatch { .. }))
    ));
}
