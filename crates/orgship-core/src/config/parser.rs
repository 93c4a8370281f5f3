//! TOML parser with helpful error messages

use super::schema::OrgshipConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse orgship.toml with detailed error messages
pub fn parse_orgship_toml(path: &Path) -> Result<OrgshipConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_orgship_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse orgship.toml content from string
pub fn parse_orgship_toml_str(content: &str) -> Result<OrgshipConfig> {
    let config: OrgshipConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Point at the offending line when the error carries a span
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();

    let line_num = error
        .span()
        .map(|span| content[..span.start.min(content.len())].matches('\n').count() + 1);

    match line_num {
        Some(line_num) => anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            message
        ),
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());
    if start >= end {
        return String::new();
    }

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &OrgshipConfig) -> Result<String> {
    toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration to TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsBackend;
    use crate::deploy::TestLevel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[org]
login_url = "https://test.salesforce.com"
username = "ci@acme.com"
client_id = "abc"

[deploy]
source_root = "force-app/main/default"
test_level = "RunSpecifiedTests"
poll_wait_ms = 5000
max_poll = 50

[tests]
regex = "Test.*"
manifest = "tests.xml"

[settings]
backend = "org"
"#;

        let config = parse_orgship_toml_str(toml).unwrap();
        assert_eq!(config.org.login_url, "https://test.salesforce.com");
        assert_eq!(config.org.username.as_deref(), Some("ci@acme.com"));
        assert_eq!(config.deploy.test_level, TestLevel::RunSpecifiedTests);
        assert_eq!(config.deploy.poll_wait_ms, 5000);
        assert_eq!(config.tests.manifest.as_deref(), Some(Path::new("tests.xml")));
        assert_eq!(config.settings.backend, SettingsBackend::Org);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_orgship_toml_str("").unwrap();
        assert_eq!(config, OrgshipConfig::new());
    }

    #[test]
    fn test_short_test_level_names() {
        let config = parse_orgship_toml_str("[deploy]\ntest_level = \"local\"\n").unwrap();
        assert_eq!(config.deploy.test_level, TestLevel::RunLocalTests);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let toml = r#"
[org
username = "ci@acme.com"
"#;
        assert!(parse_orgship_toml_str(toml).is_err());
    }

    #[test]
    fn test_parse_error_points_at_line() {
        let toml = "[deploy]\nsource_root = \"src/\"\nmax_poll = \"many\"\n";
        let err = parse_orgship_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("line 3"), "{err}");
        assert!(err.contains(">>>"), "{err}");
    }

    #[test]
    fn test_malformed_regex_is_rejected() {
        let err = parse_orgship_toml_str("[tests]\nregex = \"([\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("tests.regex"));
    }

    #[test]
    fn test_zero_poll_wait_is_rejected() {
        assert!(parse_orgship_toml_str("[deploy]\npoll_wait_ms = 0\n").is_err());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let mut original = OrgshipConfig::new();
        original.org.username = Some("ci@acme.com".to_string());
        original.deploy.validate_only = true;
        original.settings.backend = SettingsBackend::File;

        let toml_str = to_toml(&original).unwrap();
        let parsed = parse_orgship_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[deploy]\nvalidate_only = true").unwrap();

        let config = parse_orgship_toml(temp_file.path()).unwrap();
        assert!(config.deploy.validate_only);
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = parse_orgship_toml(Path::new("/nonexistent/path/orgship.toml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
