use figment::providers::{Format, Toml};
use figment::Figment;

use receipt_core::config::{expand_path, resolve_with_base, Config, Settings};
use receipt_core::Error;

#[test]
fn defaults_apply_without_any_source() {
    let settings = Config::from_figment(Figment::new()).settings().expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.retrieval.top_k, 3);
    assert_eq!(settings.retrieval.snippet_chars, 600);
    assert_eq!(settings.embedding.dimension, 384);
}

#[test]
fn toml_overrides_only_named_keys() {
    let toml = r#"
        [retrieval]
        top_k = 5

        [embedding]
        use_fake = true
    "#;
    let config = Config::from_figment(Figment::from(Toml::string(toml)));
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.retrieval.snippet_chars, 600);
    assert!(settings.embedding.use_fake);
    assert_eq!(config.get::<usize>("embedding.max_len").expect("key"), 256);
}

#[test]
fn zero_top_k_is_invalid() {
    let config = Config::from_figment(Figment::from(Toml::string("[retrieval]\ntop_k = 0\n")));
    assert!(matches!(config.settings(), Err(Error::InvalidConfig(_))));
}

#[test]
fn paths_expand_and_resolve() {
    std::env::set_var("RECEIPT_TEST_MODEL_ROOT", "/opt/models");
    assert_eq!(expand_path("${RECEIPT_TEST_MODEL_ROOT}/minilm"), std::path::PathBuf::from("/opt/models/minilm"));
    let base = std::path::Path::new("/srv/app");
    assert_eq!(resolve_with_base(base, "models/minilm"), base.join("models/minilm"));
    assert_eq!(resolve_with_base(base, "/abs/minilm"), std::path::PathBuf::from("/abs/minilm"));
}

#[test]
fn env_overrides_accept_numeric_booleans() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[retrieval]\nsnippet_chars = 200\n")?;
        jail.set_env("APP_EMBEDDING__USE_FAKE", "1");
        jail.set_env("APP_EMBEDDING__CACHE", "0");
        jail.set_env("APP_RETRIEVAL__TOP_K", "7");

        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert!(settings.embedding.use_fake);
        assert!(!settings.embedding.cache);
        assert_eq!(settings.retrieval.top_k, 7);
        assert_eq!(settings.retrieval.snippet_chars, 200);
        Ok(())
    });
}

#[test]
fn boolean_words_still_parse() {
    let config = Config::from_figment(Figment::from(Toml::string("[embedding]\nuse_fake = \"true\"\ncache = false\n")));
    let settings = config.settings().expect("settings");
    assert!(settings.embedding.use_fake);
    assert!(!settings.embedding.cache);
}

#[test]
fn enabled_cache_needs_room() {
    let config = Config::from_figment(Figment::from(Toml::string("[embedding]\ncache_entries = 0\n")));
    assert!(matches!(config.settings(), Err(Error::InvalidConfig(_))));

    let config = Config::from_figment(Figment::from(Toml::string("[embedding]\ncache = false\ncache_entries = 0\n")));
    assert_eq!(config.settings().expect("settings").embedding.cache_entries, 0);
}
