use sb_domain::config::{Config, ConfigSeverity};

#[test]
fn default_state_path_is_local_data_dir() {
    let config = Config::default();
    assert!(config.storage.enabled);
    assert_eq!(config.storage.state_path, std::path::PathBuf::from("./data"));
}

#[test]
fn shop_defaults_target_wc_v3() {
    let config = Config::default();
    assert_eq!(config.shop.api_version, "wc/v3");
    assert_eq!(config.shop.max_retries, 2);
    assert!(config.shop.base_url.is_empty());
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[cache]
enabled = false
expiry_secs = 120
quick_answer_capacity = 0

[memory]
enabled = false
max_messages = 20
context_limit = 4

[storage]
state_path = "/var/lib/shopbot"

[cleanup]
interval_secs = 600
conversation_retention_days = 14
cache_retention_days = 3

[shop]
base_url = "https://shop.example.com"
consumer_key_env = "SHOP_KEY"
consumer_secret_env = "SHOP_SECRET"

[llm]
model = "gpt-4o"
temperature = 0.5

[bot]
debug = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.quick_answer_capacity, 0);
    assert!(!config.memory.enabled);
    assert_eq!(config.memory.context_limit, 4);
    assert_eq!(config.storage.state_path.to_str(), Some("/var/lib/shopbot"));
    assert_eq!(config.cleanup.cache_retention_days, 3);
    assert_eq!(config.cleanup.stop_timeout_secs, 5);
    assert_eq!(config.shop.consumer_key_env, "SHOP_KEY");
    assert_eq!(config.llm.model, "gpt-4o");
    assert!(config.bot.debug);
}

#[test]
fn secrets_are_named_not_stored() {
    let config = Config::default();
    assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    let dumped = toml::to_string(&config).unwrap();
    assert!(dumped.contains("api_key_env"));
    assert!(!dumped.contains("sk-"));
}

#[test]
fn zero_interval_fails_validation() {
    let mut config = Config::default();
    config.cleanup.interval_secs = 0;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.field == "cleanup.interval_secs" && e.severity == ConfigSeverity::Error));
}

#[test]
fn out_of_range_temperature_fails_validation() {
    let mut config = Config::default();
    config.llm.temperature = 3.5;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.field == "llm.temperature" && e.severity == ConfigSeverity::Error));
}
