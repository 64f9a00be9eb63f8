//! Integration tests for the basenet configuration system
//!
//! These tests verify:
//! - Loading configuration from YAML, TOML and JSON files
//! - Environment variable overrides
//! - Hand-off of the `config` map to the settings resolver

mod common;

use basenet::config::Config;
use basenet::settings::{NetworkSettings, ShapePolicy};
use common::*;
use serial_test::serial;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const ENV_VARS: [&str; 6] = [
    "BASENET_PROJECT",
    "BASENET_STACK",
    "BASENET_REGION",
    "AWS_REGION",
    "BASENET_STRICT_CONFIG",
    "BASENET_LOG_LEVEL",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// File Formats
// ============================================================================

#[test]
#[serial]
fn test_load_yaml_config() {
    clear_env();
    let file = write_config(
        ".yaml",
        r#"
project: network
stack: prod
region: eu-central-1
config:
  vpcCidr: 10.20.0.0/16
  createProtectedSubnets: true
  publicSubnetTags:
    - Team: edge
    - Team: edge
"#,
    );

    let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
    assert_eq!(config.project, "network");
    assert_eq!(config.stack, "prod");
    assert_eq!(config.region(), "eu-central-1");
    assert_eq!(config.config["vpcCidr"], "10.20.0.0/16");
    assert_eq!(config.config["createProtectedSubnets"], true);
}

#[test]
#[serial]
fn test_load_toml_config() {
    clear_env();
    let file = write_config(
        ".toml",
        r#"
project = "edge"
strict_config = true

[logging]
log_level = "debug"
log_format = "json"

[config]
numberOfAvailabilityZones = 3
availabilityZones = ["us-west-2a", "us-west-2b", "us-west-2d"]
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.project, "edge");
    assert_eq!(config.shape_policy(), ShapePolicy::Strict);
    assert_eq!(config.logging.log_level, "debug");
    assert_eq!(config.logging.log_format, "json");
    assert_eq!(config.config["numberOfAvailabilityZones"], 3);
}

#[test]
#[serial]
fn test_load_json_config() {
    clear_env();
    let file = write_config(
        ".json",
        r#"{ "stack": "staging", "config": { "createPrivateSubnets": false } }"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.project, "basenet");
    assert_eq!(config.stack, "staging");
    assert_eq!(config.config["createPrivateSubnets"], false);
}

#[test]
#[serial]
fn test_invalid_config_file_is_an_error() {
    clear_env();
    let file = write_config(".yaml", "project: [unterminated");

    let err = Config::load(Some(&file.path().to_path_buf())).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
#[serial]
fn test_missing_explicit_file_uses_defaults() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.project, "basenet");
    assert!(config.config.is_empty());
}

// ============================================================================
// Environment Overrides
// ============================================================================

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    let file = write_config(".yaml", "project: network\nregion: us-east-2\n");

    std::env::set_var("BASENET_STACK", "qa");
    std::env::set_var("BASENET_REGION", "ap-northeast-1");
    std::env::set_var("BASENET_STRICT_CONFIG", "yes");
    std::env::set_var("BASENET_LOG_LEVEL", "info");

    let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
    clear_env();

    assert_eq!(config.project, "network");
    assert_eq!(config.stack, "qa");
    assert_eq!(config.region(), "ap-northeast-1");
    assert_eq!(config.shape_policy(), ShapePolicy::Strict);
    assert_eq!(config.logging.log_level, "info");
}

#[test]
#[serial]
fn test_aws_region_fallback() {
    clear_env();
    let dir = tempdir().unwrap();
    std::env::set_var("AWS_REGION", "ca-central-1");

    let config = Config::load(Some(&dir.path().join("none.yaml"))).unwrap();
    clear_env();

    assert_eq!(config.region(), "ca-central-1");
    assert_eq!(config.stack_context().region, "ca-central-1");
}

// ============================================================================
// Resolver Hand-off
// ============================================================================

#[tokio::test]
#[serial]
async fn test_config_values_drive_settings() {
    clear_env();
    let file = write_config(
        ".yaml",
        r#"
project: network
config:
  network:vpcCidr: 10.30.0.0/16
  numberOfAvailabilityZones: 3
  createPrivateSubnets: "false"
"#,
    );

    let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
    let values = config.stack_values();
    let settings = NetworkSettings::resolve(&values, &us_east_1_zones(), config.region())
        .await
        .unwrap();

    assert_eq!(settings.vpc_cidr(), "10.30.0.0/16");
    assert_eq!(settings.zone_count(), 3);
    assert!(!settings.create_private_subnets());
    assert_eq!(settings.region(), "us-east-1");
}
