use super::*;
use std::path::Path;

const SAMPLE: &str = r#"
[device]
drive_serial = "12345"
library = "/dev/sg3"

[general]
tape_max_size = 17000000000
source_folders = ["/data/projects", "/data/archive-staging"]
exclude_folders = [".git", "node_modules"]

[smtp]
host = "mail.example.com"
from = "ltoarc@example.com"
default_recipients = ["ops@example.com"]

[nfs]
export_options = "rw,sync,no_subtree_check"
export_target = "10.0.0.0/24"
"#;

#[test]
fn typed_accessors_read_back_values() {
    let cfg = Config::parse(SAMPLE, Path::new("test.toml")).unwrap();
    assert_eq!(cfg.drive_serial().unwrap(), "12345");
    assert_eq!(cfg.library_path().unwrap(), "/dev/sg3");
    assert_eq!(cfg.tape_max_size_kb().unwrap(), 17_000_000_000);
    assert_eq!(
        cfg.source_folders(),
        vec!["/data/projects".to_string(), "/data/archive-staging".to_string()]
    );
    assert_eq!(cfg.exclude_folders(), vec![".git".to_string(), "node_modules".to_string()]);
}

#[test]
fn missing_mandatory_key_is_an_error() {
    let cfg = Config::parse("[general]\ntape_max_size = 1\n", Path::new("test.toml")).unwrap();
    assert!(matches!(cfg.drive_serial(), Err(ConfigError::MissingKey("device.drive_serial"))));
}

#[test]
fn missing_optional_lists_default_to_empty() {
    let cfg = Config::parse("", Path::new("test.toml")).unwrap();
    assert!(cfg.source_folders().is_empty());
    assert!(cfg.exclude_folders().is_empty());
}

#[test]
fn nfs_export_options_falls_back_to_provided_default() {
    let cfg = Config::parse("", Path::new("test.toml")).unwrap();
    assert_eq!(cfg.nfs_export_options("ro"), "ro");
    let cfg = Config::parse(SAMPLE, Path::new("test.toml")).unwrap();
    assert_eq!(cfg.nfs_export_options("ro"), "rw,sync,no_subtree_check");
}

#[test]
fn nfs_export_target_falls_back_to_provided_default() {
    let cfg = Config::parse("", Path::new("test.toml")).unwrap();
    assert_eq!(cfg.nfs_export_target("*"), "*");
    let cfg = Config::parse(SAMPLE, Path::new("test.toml")).unwrap();
    assert_eq!(cfg.nfs_export_target("*"), "10.0.0.0/24");
}

#[test]
fn smtp_port_defaults_when_absent() {
    let cfg = Config::parse(SAMPLE, Path::new("test.toml")).unwrap();
    let smtp = cfg.smtp().unwrap();
    assert_eq!(smtp.port, 25);
    assert!(!smtp.starttls);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = Config::parse("not valid [[[ toml", Path::new("test.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
