use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use tempfile::TempDir;

use asset_alerts::{ConfigError, Settings};
use engine::ConditionKind;

const NTFY: &str = r#"
[ntfy]
server = "https://ntfy.example.com"
topic = "prices"
"#;

fn parse(alerts: &str) -> Result<Settings, ConfigError> {
    Settings::from_toml_str(&format!("{NTFY}\n{alerts}"))
}

fn invalid_message(result: Result<Settings, ConfigError>) -> String {
    match result {
        Err(ConfigError::Invalid(msg)) => msg,
        other => panic!("expected invalid config, got {other:?}"),
    }
}

#[test]
fn parses_full_config() -> anyhow::Result<()> {
    let settings = Settings::from_toml_str(
        r#"
        check_interval = "15m"

        [ntfy]
        server = "https://ntfy.sh"
        topic = "my-alerts"
        token = "tk_123"
        priority = 4

        [state]
        path = "data/state.json"
        retention = "30d"

        [[alerts]]
        ticker = "BTC-USD"
        name = "Bitcoin"

        [[alerts.conditions]]
        type = "above"
        value = 100000
        message = "Bitcoin broke six figures"

        [[alerts.conditions]]
        type = "percent_change"
        value = 5.5
        period = "24h"

        [[alerts]]
        ticker = "GC=F"

        [[alerts.conditions]]
        type = "absolute_change"
        value = 50
        period = "1h30m"
        "#,
    )?;

    assert_eq!(settings.ntfy.topic, "my-alerts");
    assert_eq!(settings.ntfy.priority, 4);
    assert_eq!(settings.ntfy.token.as_deref(), Some("tk_123"));
    assert_eq!(settings.check_interval.as_deref(), Some("15m"));
    assert_eq!(settings.state_path, Some(PathBuf::from("data/state.json")));
    assert_eq!(settings.retention, Duration::days(30));

    assert_eq!(settings.alerts.len(), 2);
    let btc = &settings.alerts[0];
    assert_eq!(btc.display_name(), "Bitcoin");
    assert_eq!(btc.conditions[0].kind, ConditionKind::Above);
    assert_eq!(btc.conditions[0].threshold, 100_000.0);
    assert_eq!(
        btc.conditions[0].message.as_deref(),
        Some("Bitcoin broke six figures")
    );
    assert_eq!(btc.conditions[1].kind.name(), "percent_change");
    assert_eq!(btc.conditions[1].threshold, 5.5);

    let gold = &settings.alerts[1];
    assert_eq!(gold.display_name(), "GC=F");
    let period = gold.conditions[0].kind.period().expect("change condition has a period");
    assert_eq!(period.duration(), Duration::minutes(90));
    Ok(())
}

#[test]
fn defaults_apply() -> anyhow::Result<()> {
    let settings = parse(
        r#"
        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "below"
        value = 150
        "#,
    )?;

    assert_eq!(settings.ntfy.priority, 3);
    assert_eq!(settings.retention, Duration::days(7));
    assert!(settings.state_path.is_none());
    assert!(settings.alerts[0].name.is_none());
    Ok(())
}

#[test]
fn tickers_are_upper_cased_and_deduplicated() -> anyhow::Result<()> {
    let settings = parse(
        r#"
        [[alerts]]
        ticker = " btc-usd "
        [[alerts.conditions]]
        type = "above"
        value = 1

        [[alerts]]
        ticker = "eth-usd"
        [[alerts.conditions]]
        type = "above"
        value = 1

        [[alerts]]
        ticker = "BTC-USD"
        [[alerts.conditions]]
        type = "below"
        value = 1
        "#,
    )?;

    assert_eq!(settings.alerts[0].ticker, "BTC-USD");
    assert_eq!(settings.unique_tickers(), vec!["BTC-USD", "ETH-USD"]);
    Ok(())
}

#[test]
fn rejects_missing_ntfy_fields() {
    let result = Settings::from_toml_str(
        r#"
        [ntfy]
        server = "https://ntfy.sh"

        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "above"
        value = 1
        "#,
    );
    assert_eq!(invalid_message(result), "ntfy.topic is required");
}

#[test]
fn rejects_out_of_range_priority() {
    let result = Settings::from_toml_str(
        r#"
        [ntfy]
        server = "https://ntfy.sh"
        topic = "t"
        priority = 9

        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "above"
        value = 1
        "#,
    );
    assert!(invalid_message(result).contains("priority"));
}

#[test]
fn rejects_config_without_alerts() {
    assert_eq!(invalid_message(parse("")), "at least one alert is required");
}

#[test]
fn rejects_bad_conditions() {
    let cases = [
        (
            r#"type = "above"
               value = 0"#,
            "alerts[0].conditions[0]: value must be positive",
        ),
        (
            r#"type = "sideways"
               value = 1"#,
            "alerts[0].conditions[0]: invalid type",
        ),
        (
            r#"type = "percent_change"
               value = 5"#,
            "alerts[0].conditions[0]: period is required for percent_change conditions",
        ),
        (
            r#"type = "absolute_change"
               value = 5
               period = "0h""#,
            "alerts[0].conditions[0]:",
        ),
    ];

    for (condition, expected) in cases {
        let toml = format!(
            "[[alerts]]\nticker = \"AAPL\"\n[[alerts.conditions]]\n{condition}\n"
        );
        let msg = invalid_message(parse(&toml));
        assert!(msg.starts_with(expected), "{msg:?} should start with {expected:?}");
    }
}

#[test]
fn rejects_periods_too_long_to_look_back() {
    let msg = invalid_message(parse(
        r#"
        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "percent_change"
        value = 5
        period = "100000000d"
        "#,
    ));
    assert!(msg.starts_with("alerts[0].conditions[0]:"), "{msg:?}");
    assert!(msg.contains("exceeds"), "{msg:?}");

    let msg = invalid_message(parse(
        r#"
        [state]
        retention = "100000000d"

        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "above"
        value = 1
        "#,
    ));
    assert!(msg.starts_with("state.retention:"), "{msg:?}");
}

#[test]
fn rejects_empty_ticker() {
    let msg = invalid_message(parse(
        r#"
        [[alerts]]
        ticker = "  "
        [[alerts.conditions]]
        type = "above"
        value = 1
        "#,
    ));
    assert_eq!(msg, "alerts[0].ticker is required");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let result = Settings::from_toml_str("[ntfy\nserver = ");
    assert!(matches!(result, Err(ConfigError::Parse(_))), "got {result:?}");
}

#[test]
fn expands_environment_variables() -> anyhow::Result<()> {
    // SAFETY: the variable name is unique to this test.
    unsafe {
        std::env::set_var("ASSET_ALERTS_TEST_TOPIC", "from-env");
    }

    let settings = Settings::from_toml_str(
        r#"
        [ntfy]
        server = "https://ntfy.sh"
        topic = "${ASSET_ALERTS_TEST_TOPIC}"
        password = "${ASSET_ALERTS_TEST_UNSET_PASSWORD}"

        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "above"
        value = 1
        "#,
    )?;

    assert_eq!(settings.ntfy.topic, "from-env");
    assert_eq!(
        settings.ntfy.password.as_deref(),
        Some("${ASSET_ALERTS_TEST_UNSET_PASSWORD}")
    );
    Ok(())
}

#[test]
fn loads_from_disk() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!("{NTFY}\n[[alerts]]\nticker = \"AAPL\"\n[[alerts.conditions]]\ntype = \"above\"\nvalue = 200\n"),
    )?;

    let settings = Settings::load(&path)?;
    assert_eq!(settings.alerts[0].ticker, "AAPL");
    Ok(())
}

#[test]
fn missing_file_is_a_read_error() {
    let result = Settings::load(Path::new("/definitely/not/here/config.toml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })), "got {result:?}");
}

#[test]
fn state_path_resolution() -> anyhow::Result<()> {
    let mut settings = parse(
        r#"
        [[alerts]]
        ticker = "AAPL"
        [[alerts.conditions]]
        type = "above"
        value = 1
        "#,
    )?;
    let config = Path::new("/etc/asset-alerts/config.toml");

    assert_eq!(
        settings.resolve_state_path(None, config),
        PathBuf::from("/etc/asset-alerts/state.json")
    );

    settings.state_path = Some(PathBuf::from("data/state.json"));
    assert_eq!(
        settings.resolve_state_path(None, config),
        PathBuf::from("/etc/asset-alerts/data/state.json")
    );

    settings.state_path = Some(PathBuf::from("/var/lib/alerts.json"));
    assert_eq!(
        settings.resolve_state_path(None, config),
        PathBuf::from("/var/lib/alerts.json")
    );

    let cli_override = Path::new("/tmp/override.json");
    assert_eq!(
        settings.resolve_state_path(Some(cli_override), config),
        PathBuf::from("/tmp/override.json")
    );
    Ok(())
}
