//! Config loading from TOML files.

use std::io::Write;

use bazaarlord::config::Config;

#[test]
fn loads_a_partial_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [network]
        api_url = "https://example.test"
        snapshot_ttl_secs = 30

        [logging]
        level = "debug"

        [flipping]
        market_share_fraction = 0.1
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.network.api_url, "https://example.test");
    assert_eq!(config.network.snapshot_ttl_secs, 30);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.flipping.market_share_fraction, 0.1);
    // Untouched sections keep their defaults.
    assert_eq!(config.manipulation.tax_rate, 0.01125);
    assert_eq!(config.npc.cache_ttl_secs, 300);
}

#[test]
fn invalid_share_fraction_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[flipping]\nmarket_share_fraction = 1.5\n").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = Config::load_or_default("definitely/not/a/file.toml").unwrap();
    assert_eq!(config.flipping.market_share_fraction, 0.20);
}
