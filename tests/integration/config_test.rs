//! Integration tests for configuration loading

use commodity_ticker::config::Config;
use commodity_ticker::instrument::PriceFormat;
use std::io::Write;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [ticker]
        interval_ms = 2000
        seed = 7

        [[instruments]]
        symbol = "HG=F"
        name = "Copper"
        base = 4.35
        min = 3.8
        max = 5.0
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.ticker.interval_ms, 2000);
    assert_eq!(config.ticker.max_fluctuation, 0.02);
    assert_eq!(config.instruments.len(), 1);
    assert_eq!(config.instruments[0].format, PriceFormat::Plain);
}

#[test]
fn test_load_rejects_invalid_bounds() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [[instruments]]
        symbol = "HG=F"
        name = "Copper"
        base = 9.0
        min = 3.8
        max = 5.0
        "#
    )
    .unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("outside"));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[ticker\ninterval_ms = ").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_example_config_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example")).unwrap();
    assert_eq!(config.instruments.len(), 3);
    assert_eq!(config.instruments[1].format, PriceFormat::Grouped);
}
