//! CLI tests for basenet
//!
//! Runs the binary end to end against stack files in a temporary directory:
//! - Settings, preview and graph output in human and JSON form
//! - Exit codes for configuration, range and discovery errors
//! - Strict and lenient handling of malformed values

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

// Helper to get a command with a clean environment
fn basenet_cmd() -> Command {
    let mut cmd = Command::cargo_bin("basenet").unwrap();
    for var in [
        "BASENET_CONFIG",
        "BASENET_PROJECT",
        "BASENET_STACK",
        "BASENET_REGION",
        "BASENET_STRICT_CONFIG",
        "BASENET_LOG_LEVEL",
        "AWS_REGION",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--no-color");
    cmd
}

// Helper to write a stack file with the given `config:` body
fn stack_file(config: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("basenet.yaml");
    let content = format!(
        "project: network\nstack: test\nregion: us-east-1\nconfig:\n{}",
        config
    );
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

fn two_zone_stack() -> (TempDir, PathBuf) {
    stack_file("  availabilityZones: [us-east-1a, us-east-1b]\n")
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Basic Invocation
// ============================================================================

#[test]
fn test_version() {
    basenet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    basenet_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("settings"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("graph"));
}

#[test]
fn test_unknown_subcommand_fails() {
    basenet_cmd().arg("deploy").assert().failure();
}

// ============================================================================
// Settings Command
// ============================================================================

#[test]
fn test_settings_json() {
    let (_dir, path) = two_zone_stack();

    let doc = json_stdout(
        basenet_cmd()
            .arg("-c")
            .arg(&path)
            .args(["--output", "json", "settings"]),
    );

    assert_eq!(doc["region"], "us-east-1");
    assert_eq!(
        doc["availabilityZones"],
        serde_json::json!(["us-east-1a", "us-east-1b"])
    );
    assert_eq!(doc["vpcCidr"], "10.0.0.0/16");
    assert_eq!(doc["createPrivateSubnets"], true);
    assert_eq!(
        doc["privateSubnetCidrs"],
        serde_json::json!(["10.0.0.0/19", "10.0.32.0/19"])
    );
}

#[test]
fn test_settings_human() {
    let (_dir, path) = two_zone_stack();

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .args(["settings", "--tags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NETWORK SETTINGS"))
        .stdout(predicate::str::contains("network-test"))
        .stdout(predicate::str::contains("PrivateSubnet1A"))
        .stdout(predicate::str::contains("Name=Public subnet 0"));
}

#[test]
fn test_region_flag_overrides_stack_file() {
    let (_dir, path) = stack_file("  availabilityZones: [eu-west-1a]\n");

    let doc = json_stdout(
        basenet_cmd()
            .arg("-c")
            .arg(&path)
            .args(["--output", "json", "--region", "eu-west-1", "settings"]),
    );

    assert_eq!(doc["region"], "eu-west-1");
    assert_eq!(doc["availabilityZones"], serde_json::json!(["eu-west-1a"]));
}

// ============================================================================
// Preview Command
// ============================================================================

#[test]
fn test_preview_json_outputs_in_order() {
    let (_dir, path) = two_zone_stack();

    let doc = json_stdout(
        basenet_cmd()
            .arg("-c")
            .arg(&path)
            .args(["--output", "json", "preview"]),
    );

    assert_eq!(doc["stack"], "network-test");
    assert_eq!(doc["resources"]["aws:ec2/subnet:Subnet"], 4);
    assert_eq!(doc["resources"]["aws:ec2/natGateway:NatGateway"], 2);

    let outputs = doc["outputs"].as_object().unwrap();
    let names: Vec<&str> = outputs.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "vpcId",
            "vpcCidr",
            "natEips",
            "publicSubnetIds",
            "publicSubnetCidrs",
            "publicSubnetRouteTableId",
            "privateSubnetIds",
            "privateSubnetCidrs",
            "protectedSubnetIds",
            "protectedSubnetCidrs",
            "privateSubnetRouteTableIds",
            "s3VpcEndpointId",
        ]
    );
    assert_eq!(outputs["vpcId"], "vpc-vpc");
    assert_eq!(
        outputs["publicSubnetIds"],
        serde_json::json!(["subnet-publicsubnet0", "subnet-publicsubnet1"])
    );
}

#[test]
fn test_preview_without_private_subnets_warns() {
    let (_dir, path) = stack_file(
        "  availabilityZones: [us-east-1a, us-east-1b]\n  createPrivateSubnets: false\n",
    );

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .args(["preview", "--resources"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Private subnets are disabled"))
        .stdout(predicate::str::contains("PREVIEW"))
        .stdout(predicate::str::contains("subnet-publicsubnet1"))
        .stdout(predicate::str::contains("NATGateway").not());
}

// ============================================================================
// Graph Command
// ============================================================================

#[test]
fn test_graph_dot() {
    let (_dir, path) = two_zone_stack();

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph"))
        .stdout(predicate::str::contains("NATGateway0"));
}

#[test]
fn test_graph_order_json() {
    let (_dir, path) = two_zone_stack();

    let doc = json_stdout(
        basenet_cmd()
            .arg("-c")
            .arg(&path)
            .args(["--output", "json", "graph", "--order"]),
    );

    let order: Vec<&str> = doc["order"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(order.len(), 23);

    let position = |name: &str| order.iter().position(|u| u.ends_with(name)).unwrap();
    assert!(position("::VPC") < position("::PublicSubnet0"));
    assert!(position("::NAT0EIP") < position("::NATGateway0"));
    assert!(position("::PrivateSubnet1ARouteTable") < position("::S3VPCEndpoint"));
}

// ============================================================================
// Exit Codes
// ============================================================================

#[test]
fn test_range_error_exits_4() {
    let (_dir, path) = stack_file(
        "  availabilityZones: [us-east-1a, us-east-1b, us-east-1c, us-east-1d, us-east-1e]\n",
    );

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .arg("preview")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("publicSubnetCidrs"));
}

#[test]
fn test_strict_shape_error_exits_4() {
    let (_dir, path) = stack_file(
        "  availabilityZones: [us-east-1a, us-east-1b]\n  vpcCidr: [10.0.0.0/16]\n",
    );

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .args(["--strict", "settings"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("vpcCidr"));
}

#[test]
fn test_lenient_shape_error_uses_default() {
    let (_dir, path) = stack_file(
        "  availabilityZones: [us-east-1a, us-east-1b]\n  vpcCidr: [10.0.0.0/16]\n",
    );

    let doc = json_stdout(
        basenet_cmd()
            .arg("-c")
            .arg(&path)
            .args(["--output", "json", "settings"]),
    );
    assert_eq!(doc["vpcCidr"], "10.0.0.0/16");
}

#[test]
fn test_missing_zone_list_exits_3() {
    let (_dir, path) = stack_file("  numberOfAvailabilityZones: 3\n");

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .arg("preview")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("availabilityZones"))
        .stdout(predicate::str::contains("us-east-1b").not());
}

#[test]
fn test_invalid_stack_file_exits_4() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("basenet.yaml");
    std::fs::write(&path, "project: [unterminated\n").unwrap();

    basenet_cmd()
        .arg("-c")
        .arg(&path)
        .arg("settings")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Failed to load config"));
}
