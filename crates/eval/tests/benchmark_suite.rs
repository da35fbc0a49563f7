use eval::{BenchmarkConfig, BenchmarkRunner, BenchmarkSuite, CaseResult, ScoreMetric};
use std::path::PathBuf;

fn suite_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/smoke_suite.json")
}

#[tokio::test]
async fn test_smoke_suite_end_to_end() {
    let suite = BenchmarkSuite::load(&suite_path()).await.unwrap();
    let report = BenchmarkRunner::new(BenchmarkConfig::default()).run_suite(&suite);

    assert_eq!(report.total_cases, 2);

    let entities = &report.cases[0];
    assert!(entities.passed);
    assert_eq!(entities.score, 1.0);
    match &entities.result {
        CaseResult::Entities(batch) => {
            assert_eq!(batch.document_count, 2);
            assert_eq!(batch.aggregate.true_positives, 3);
            assert_eq!(batch.aggregate.macro_average.types, 3);
        }
        CaseResult::Relationships(_) => panic!("expected entity case"),
    }

    let relationships = &report.cases[1];
    assert_eq!(relationships.metric, ScoreMetric::DirectionAccuracy);
    assert_eq!(relationships.score, 0.5);
    assert!(!relationships.passed);
    assert_eq!(relationships.result.scores().f1, 1.0);

    assert_eq!(report.passed, 1);
    assert!(!report.all_passed());
}

#[tokio::test]
async fn test_parallel_config_matches_sequential() {
    let suite = BenchmarkSuite::load(&suite_path()).await.unwrap();

    let sequential = BenchmarkRunner::new(BenchmarkConfig::default()).run_suite(&suite);
    let mut config = BenchmarkConfig::fast();
    config.options = BenchmarkConfig::default().options;
    config.pass_threshold = BenchmarkConfig::default().pass_threshold;
    config.max_items_per_document = BenchmarkConfig::default().max_items_per_document;
    let parallel = BenchmarkRunner::new(config).run_suite(&suite);

    for (s, p) in sequential.cases.iter().zip(&parallel.cases) {
        assert_eq!(s.score, p.score);
        assert_eq!(s.passed, p.passed);
    }
}

#[tokio::test]
async fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(
        &path,
        r#"{"options": {"mode": "Partial", "similarityThreshold": 0.75}, "pass_threshold": 0.5, "concurrency": {"parallel": true}}"#,
    )
    .await
    .unwrap();

    let config = BenchmarkConfig::from_file(&path).unwrap();
    assert_eq!(config.options.mode, eval::MatchMode::Partial);
    assert_eq!(config.options.similarity_threshold, 0.75);
    assert_eq!(config.pass_threshold, 0.5);
    assert!(config.concurrency.parallel);
    assert_eq!(config.max_items_per_document, 500);
}
