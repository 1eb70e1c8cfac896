use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::*;
use crate::dispatch::Progress;
use crate::embedding::MockEmbedder;
use crate::provider::{Reply, ScriptedProvider};
use crate::retry::RetryPolicy;
use crate::taxonomy::CategoryPair;

fn tier(max_concurrent: usize, batch_size: usize) -> TierConfig {
    TierConfig {
        requests_per_minute: 10_000,
        max_concurrent,
        batch_size,
        batch_pause: Duration::ZERO,
    }
}

fn titles(raw: &[&str]) -> Vec<Option<String>> {
    raw.iter().map(|t| Some(t.to_string())).collect()
}

fn builder(provider: &Arc<ScriptedProvider>) -> PipelineBuilder {
    Pipeline::builder()
        .provider(provider.clone())
        .retry_policy(RetryPolicy::default().without_pauses())
}

/// No embedder: the similarity tier and the cluster pass are off.
fn quick_pipeline(provider: &Arc<ScriptedProvider>) -> Pipeline {
    builder(provider)
        .without_confidence()
        .build()
        .expect("pipeline")
}

#[test]
fn test_builder_requires_provider() {
    let err = Pipeline::builder().build().unwrap_err();
    assert!(matches!(err, PipelineError::MissingProvider));
}

#[tokio::test]
async fn test_rule_tier_resolves_before_any_call() {
    let provider = Arc::new(ScriptedProvider::new());
    let pipeline = quick_pipeline(&provider);

    let results = pipeline
        .categorize(&titles(&["Nike Air Max Running Shoes"]), tier(5, 10), None)
        .await;

    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.title, "nike air max running shoes");
    assert_eq!(r.method, Method::RuleBased);
    assert_eq!(r.pair(), CategoryPair::new("Footwear", "Casual Shoes"));
    assert_eq!(r.confidence, 0.6);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_dash_response_is_corrected_and_marked_invalid() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.script(
        "trail runner x9",
        std::iter::repeat_n(Reply::text("Footwear - Running Shoes"), 3),
    );
    provider.script("trail runner x10", [Reply::text("Footwear - Athletic Shoes")]);
    let pipeline = quick_pipeline(&provider);

    let results = pipeline
        .categorize(
            &titles(&["Trail Runner X9", "Trail Runner X10"]),
            tier(5, 10),
            None,
        )
        .await;

    let corrected = &results[0];
    assert_eq!(corrected.method, Method::LlmApi);
    assert_eq!(corrected.pair(), CategoryPair::new("Footwear", "Athletic Shoes"));
    assert!(!corrected.is_valid);
    assert_eq!(corrected.attempts_used, 3);
    assert_eq!(corrected.confidence, 0.6);

    let valid = &results[1];
    assert!(valid.is_valid);
    assert_eq!(valid.attempts_used, 1);
    assert_eq!(valid.confidence, 0.9);
}

#[tokio::test]
async fn test_run_summarizes_validity_attempts_and_low_confidence() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.script(
        "trail runner x9",
        std::iter::repeat_n(Reply::text("Footwear - Running Shoes"), 3),
    );
    provider.script(
        "trail runner x10",
        [Reply::error("overloaded"), Reply::text("Footwear|Athletic Shoes")],
    );
    let pipeline = quick_pipeline(&provider);

    let run = pipeline
        .run(
            &titles(&[
                "Trail Runner X9",
                "Trail Runner X10",
                "Leather Jacket",
                "zzqx widget",
            ]),
            tier(5, 10),
            None,
        )
        .await;

    assert_eq!(run.valid_count(), 2);
    assert_eq!(run.low_confidence_count(), 1);
    let attempts = run.attempt_counts();
    assert_eq!(attempts.get(&1), Some(&1));
    assert_eq!(attempts.get(&2), Some(&1));
    assert_eq!(attempts.get(&3), Some(&2));
    assert_eq!(attempts.values().sum::<usize>(), run.results.len());
}

#[tokio::test]
async fn test_corrected_answer_stays_invalid_from_exact_cache() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.script(
        "trail runner x9",
        std::iter::repeat_n(Reply::text("Footwear - Running Shoes"), 3),
    );
    let pipeline = quick_pipeline(&provider);
    let batch = titles(&["Trail Runner X9"]);

    let first = pipeline.categorize(&batch, tier(5, 10), None).await;
    assert!(!first[0].is_valid);

    let replay = pipeline.categorize(&batch, tier(5, 10), None).await;
    assert_eq!(replay[0].method, Method::ExactCache);
    assert_eq!(replay[0].pair(), first[0].pair());
    assert!(!replay[0].is_valid);
    assert_eq!(replay[0].confidence, 0.6);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_cap_holds_across_a_batch() {
    let provider = Arc::new(
        ScriptedProvider::with_default(Reply::text("Electronics|Accessories"))
            .with_delay(Duration::from_millis(50)),
    );
    let pipeline = quick_pipeline(&provider);
    let inputs: Vec<Option<String>> = (0..50).map(|i| Some(format!("gizmo item {i}"))).collect();

    let tier = tier(5, 50);
    let results = pipeline.categorize(&inputs, tier, None).await;

    assert_eq!(results.len(), 50);
    assert_eq!(provider.call_count(), 50);
    assert!(provider.peak_concurrency() <= 5);
    assert!(provider.peak_concurrency() > 1);
    assert!(pipeline.dispatcher(&tier).gate().peak() <= 5);
}

#[tokio::test]
async fn test_absent_title_becomes_unknown_product() {
    let provider = Arc::new(ScriptedProvider::new());
    let pipeline = quick_pipeline(&provider);

    let results = pipeline
        .categorize(&[None, Some("   ".to_string())], tier(2, 10), None)
        .await;

    for r in &results {
        assert_eq!(r.title, "unknown product");
        assert_eq!(r.method, Method::Fallback);
        assert_eq!(r.pair(), CategoryPair::new("Clothing", "Accessories"));
        assert_eq!(r.attempts_used, 3);
        assert_eq!(r.confidence, 0.3);
    }
}

#[tokio::test]
async fn test_warm_cache_skips_the_service() {
    let provider = Arc::new(ScriptedProvider::with_default(Reply::text(
        "Electronics|Accessories",
    )));
    let pipeline = quick_pipeline(&provider);
    let inputs = titles(&["Gizmo Item 1"]);

    let first = pipeline.categorize(&inputs, tier(2, 10), None).await;
    let second = pipeline.categorize(&inputs, tier(2, 10), None).await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(first[0].method, Method::LlmApi);
    assert_eq!(second[0].method, Method::ExactCache);
    assert_eq!(first[0].pair(), second[0].pair());
    assert_eq!(first[0].confidence, second[0].confidence);
}

#[tokio::test]
async fn test_fallback_results_are_not_cached() {
    let provider = Arc::new(ScriptedProvider::new());
    let pipeline = quick_pipeline(&provider);

    let results = pipeline
        .categorize(&titles(&["Mystery Gadget"]), tier(2, 10), None)
        .await;
    assert_eq!(results[0].method, Method::Fallback);

    assert!(pipeline.cache().exact().lookup("mystery gadget").is_none());
    assert!(pipeline.cache().similarity().is_empty());

    pipeline
        .categorize(&titles(&["Mystery Gadget"]), tier(2, 10), None)
        .await;
    assert_eq!(provider.call_count(), 6);
}

#[tokio::test]
async fn test_service_result_feeds_similarity_tier() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.script("acme widget pro", [Reply::text("Electronics|Accessories")]);
    let embedder = Arc::new(MockEmbedder::new(4));
    embedder.pin("acme widget pro", &[1.0, 0.0, 0.0, 0.0]);
    embedder.pin("acme widget pro max", &[0.99, 0.1, 0.0, 0.0]);
    let pipeline = builder(&provider)
        .embedder(embedder)
        .without_confidence()
        .build()
        .expect("pipeline");

    pipeline
        .categorize(&titles(&["Acme Widget Pro"]), tier(2, 10), None)
        .await;
    let results = pipeline
        .categorize(&titles(&["Acme Widget Pro Max"]), tier(2, 10), None)
        .await;

    assert_eq!(results[0].method, Method::SimilarityCache);
    assert_eq!(results[0].pair(), CategoryPair::new("Electronics", "Accessories"));
    assert_eq!(results[0].confidence, 0.8);
    assert_eq!(provider.call_count(), 1);
    assert!(pipeline.cache().exact().lookup("acme widget pro max").is_some());
}

#[tokio::test]
async fn test_results_stay_index_aligned() {
    let provider = Arc::new(
        ScriptedProvider::with_default(Reply::text("Home & Garden|Decor"))
            .with_delay(Duration::from_millis(5)),
    );
    let pipeline = quick_pipeline(&provider);
    let raw = [
        "Velvet Throw Pillow",
        "Leather Boots",
        "Ceramic Vase",
        "Levi's Jeans",
        "Brass Candle Holder",
        "Canon Camera",
        "Woven Basket",
    ];

    let results = pipeline.categorize(&titles(&raw), tier(3, 3), None).await;

    assert_eq!(results.len(), raw.len());
    for (r, input) in results.iter().zip(raw) {
        assert_eq!(r.title, input.to_lowercase());
    }
    assert_eq!(results[1].pair(), CategoryPair::new("Footwear", "Boots"));
    assert_eq!(results[3].pair(), CategoryPair::new("Clothing", "Bottoms"));
    assert_eq!(results[5].pair(), CategoryPair::new("Electronics", "Cameras"));
    assert_eq!(results[0].pair(), CategoryPair::new("Home & Garden", "Decor"));
}

#[tokio::test]
async fn test_progress_reported_after_each_batch() {
    let provider = Arc::new(ScriptedProvider::new());
    let pipeline = quick_pipeline(&provider);
    let seen: Arc<Mutex<Vec<Progress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressCallback = Arc::new(move |p| sink.lock().push(p));

    let inputs: Vec<Option<String>> = (0..25).map(|i| Some(format!("shoe {i}"))).collect();
    pipeline.categorize(&inputs, tier(4, 10), Some(callback)).await;

    let seen = seen.lock();
    let processed: Vec<usize> = seen.iter().map(|p| p.processed).collect();
    assert_eq!(processed, vec![10, 20, 25]);
    assert!(seen.iter().all(|p| p.total == 25));
    assert_eq!(seen[2].percent, 100.0);
}

#[tokio::test]
async fn test_empty_input_reports_completion() {
    let provider = Arc::new(ScriptedProvider::new());
    let pipeline = quick_pipeline(&provider);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let run = pipeline
        .run(&[], tier(1, 10), Some(Arc::new(move |p| sink.lock().push(p))))
        .await;

    assert!(run.results.is_empty());
    assert!(run.analysis.is_none());
    assert_eq!(*seen.lock(), vec![Progress::new(0, 0)]);
}

#[tokio::test]
async fn test_every_pair_is_in_taxonomy_and_attempts_in_range() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .script("odd thing 1", [Reply::text("Gadgets|Widgets")])
        .script("odd thing 2", [Reply::text("nonsense")])
        .script("odd thing 3", [Reply::error("timeout"), Reply::text("Beauty")])
        .script("odd thing 4", [Reply::text(r#"{"category":"toys","subcategory":"lego"}"#)]);
    let pipeline = quick_pipeline(&provider);
    let inputs = titles(&[
        "odd thing 1",
        "odd thing 2",
        "odd thing 3",
        "odd thing 4",
        "silk dress",
        "iphone case",
    ]);

    let results = pipeline.categorize(&inputs, tier(3, 10), None).await;
    let taxonomy = pipeline.cache().taxonomy();
    for r in &results {
        assert!(taxonomy.contains(&r.pair()), "{r:?}");
        assert!((1..=3).contains(&r.attempts_used));
        assert!((0.0..=1.0).contains(&r.confidence));
    }
}

#[tokio::test]
async fn test_confidence_pass_labels_every_result() {
    let provider = Arc::new(ScriptedProvider::with_default(Reply::text(
        "Electronics|Accessories",
    )));
    let pipeline = builder(&provider)
        .embedder(Arc::new(MockEmbedder::new(4)))
        .build()
        .expect("pipeline");
    assert!(pipeline.scores_confidence());

    let inputs: Vec<Option<String>> = (0..15).map(|i| Some(format!("gizmo item {i}"))).collect();
    let run = pipeline.run(&inputs, tier(4, 8), None).await;

    assert!(run.analysis.is_some());
    for r in &run.results {
        assert!(r.cluster_label.is_some());
        assert!((0.0..=1.0).contains(&r.confidence));
    }
    let counts = run.method_counts();
    assert_eq!(counts.values().sum::<usize>(), 15);
    assert!(!counts.contains_key(&Method::Fallback));
}

#[tokio::test]
async fn test_warm_runs_are_identical() {
    let provider = Arc::new(ScriptedProvider::with_default(Reply::text(
        "Electronics|Accessories",
    )));
    let pipeline = builder(&provider)
        .embedder(Arc::new(MockEmbedder::new(4)))
        .build()
        .expect("pipeline");
    let mut inputs: Vec<Option<String>> =
        (0..12).map(|i| Some(format!("gizmo item {i}"))).collect();
    inputs.push(Some("leather boots".to_string()));

    pipeline.run(&inputs, tier(4, 8), None).await;
    let calls = provider.call_count();
    let second = pipeline.run(&inputs, tier(4, 8), None).await;
    let third = pipeline.run(&inputs, tier(4, 8), None).await;

    assert_eq!(second, third);
    assert!(second.results.iter().all(|r| r.method == Method::ExactCache));
    assert_eq!(provider.call_count(), calls);
}

#[tokio::test]
async fn test_failed_confidence_pass_keeps_initial_confidences() {
    let provider = Arc::new(ScriptedProvider::new());
    let embedder = Arc::new(MockEmbedder::new(4));
    embedder.set_failing(true);
    let pipeline = builder(&provider)
        .embedder(embedder)
        .build()
        .expect("pipeline");

    let run = pipeline
        .run(&titles(&["leather boots", "canon camera"]), tier(2, 10), None)
        .await;

    assert!(run.analysis.is_none());
    for r in &run.results {
        assert_eq!(r.method, Method::RuleBased);
        assert_eq!(r.confidence, 0.6);
        assert!(r.cluster_label.is_none());
    }
}

#[tokio::test]
async fn test_runs_with_same_tier_share_a_dispatcher() {
    let provider = Arc::new(ScriptedProvider::new());
    let pipeline = quick_pipeline(&provider);

    let a = pipeline.dispatcher(&tier(2, 10));
    let b = pipeline.dispatcher(&tier(2, 10));
    let c = pipeline.dispatcher(&tier(3, 10));
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

#[tokio::test]
async fn test_similarity_snapshot_round_trip() {
    let provider = Arc::new(ScriptedProvider::with_default(Reply::text(
        "Electronics|Accessories",
    )));
    let embedder = Arc::new(MockEmbedder::new(8));
    embedder.pin("gizmo item 1", &[1.0, 0.0]);
    embedder.pin("gizmo item 2", &[0.0, 1.0]);
    let pipeline = builder(&provider)
        .embedder(embedder)
        .without_confidence()
        .build()
        .expect("pipeline");
    pipeline
        .categorize(&titles(&["gizmo item 1", "gizmo item 2"]), tier(2, 10), None)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("similarity.rkyv");
    pipeline.save_similarity(&path).expect("save");

    let loaded = SimilarityIndex::load(&path, 8, pipeline.cache().taxonomy()).expect("load");
    assert_eq!(loaded.len(), 2);
}
