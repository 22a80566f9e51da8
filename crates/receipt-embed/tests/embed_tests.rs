use receipt_core::config::EmbeddingSettings;
use receipt_core::Embedder;
use receipt_embed::{get_default_embedder, resolve_model_dir, HashEmbedder};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.model_id(), "hash:xxh64:d384");

    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows settings");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_ignores_case_and_order_but_not_words() {
    let embedder = HashEmbedder::new(64);
    let a = embedder.embed("Refund Policy").expect("embed");
    let b = embedder.embed("policy refund").expect("embed");
    let c = embedder.embed("travel policy").expect("embed");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn blank_text_embeds_to_zero_vector() {
    let embedder = HashEmbedder::new(8);
    assert_eq!(embedder.embed("   ").expect("embed"), vec![0.0; 8]);
}

#[test]
fn missing_configured_model_dir_is_an_error() {
    if std::env::var("APP_MODEL_DIR").is_ok() || std::env::var("MODEL_DIR").is_ok() { return; }
    let err = resolve_model_dir(Some("/definitely/not/here/minilm")).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}
