// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn relflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("relflow").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RELFLOW_REGISTRY")
        .env_remove("RELFLOW_PARALLEL")
        .env_remove("RELFLOW_CONFIG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join(".relflow.yaml"), yaml).unwrap();
}

#[test]
fn test_tags_prints_tags_and_manifests() {
    let dir = TempDir::new().unwrap();

    relflow(&dir)
        .args(["tags", "grafana-9.5.0-amd64.tar.gz", "--registry", "example/repo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("example/repo/grafana-image-tags:9.5.0-amd64"))
        .stdout(predicate::str::contains("example/repo/grafana-oss-image-tags:9.5.0-amd64"))
        .stdout(predicate::str::contains("example/repo/grafana:9.5.0"));
}

#[test]
fn test_tags_json_groups_architectures() {
    let dir = TempDir::new().unwrap();

    let output = relflow(&dir)
        .args([
            "tags",
            "grafana-enterprise_10.0.0_1_linux_amd64.tar.gz",
            "grafana-enterprise_10.0.0_1_linux_arm64.tar.gz",
            "--registry",
            "example/repo",
            "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let manifests = json["manifests"].as_array().unwrap();
    assert_eq!(manifests.len(), 1);
    assert_eq!(manifests[0]["manifest"], "example/repo/grafana-enterprise:10.0.0");
    assert_eq!(manifests[0]["tags"].as_array().unwrap().len(), 2);
}

#[test]
fn test_tags_uses_registry_from_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "registry: configured/registry\n");

    relflow(&dir)
        .args(["tags", "grafana-9.5.0-arm64.tar.gz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configured/registry/grafana-image-tags:9.5.0-arm64"));
}

#[test]
fn test_malformed_artifact_name_fails() {
    let dir = TempDir::new().unwrap();

    relflow(&dir)
        .args(["tags", "grafana.tar.gz", "--registry", "example/repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed"));
}

#[test]
fn test_zero_parallel_is_rejected() {
    let dir = TempDir::new().unwrap();

    relflow(&dir)
        .args(["--parallel", "0", "validate", "--package", "a.deb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}

#[test]
fn test_validate_runs_command_per_package() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grafana_9.5.0_1_linux_amd64.deb"), b"deb").unwrap();
    std::fs::write(dir.path().join("grafana_9.5.0_1_linux_arm64.deb"), b"deb").unwrap();
    write_config(
        &dir,
        "shell: sh\nparallel: 2\ncommands:\n  validate: 'test -s \"$RELFLOW_ARTIFACT\" && echo ok'\n",
    );

    relflow(&dir)
        .args(["validate", "--package", "*.deb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grafana_9.5.0_1_linux_amd64.deb"))
        .stdout(predicate::str::contains("grafana_9.5.0_1_linux_arm64.deb"));
}

#[test]
fn test_validate_failure_names_the_package() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("good.deb"), b"deb").unwrap();
    std::fs::write(dir.path().join("empty.deb"), b"").unwrap();
    write_config(
        &dir,
        "shell: sh\ncommands:\n  validate: 'test -s \"$RELFLOW_ARTIFACT\" || { echo empty package >&2; exit 1; }'\n",
    );

    relflow(&dir)
        .args(["validate", "--package", "*.deb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[empty.deb] error"));
}

#[test]
fn test_validate_without_command_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.deb"), b"deb").unwrap();

    relflow(&dir)
        .args(["validate", "--package", "a.deb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no validate command"));
}

#[test]
fn test_publish_copies_to_local_destination() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("dist")).unwrap();
    std::fs::write(dir.path().join("dist/grafana-9.5.0-amd64.tar.gz"), b"tgz").unwrap();

    relflow(&dir)
        .args([
            "--artifacts-dir",
            "dist",
            "publish",
            "--package",
            "*.tar.gz",
            "--destination",
            "release/9.5.0",
        ])
        .assert()
        .success();

    let copied = dir.path().join("release/9.5.0/grafana-9.5.0-amd64.tar.gz");
    assert_eq!(std::fs::read(copied).unwrap(), b"tgz");
}

#[test]
fn test_publish_requires_destination() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.deb"), b"deb").unwrap();

    relflow(&dir)
        .env_remove("RELFLOW_DESTINATION")
        .args(["publish", "--package", "a.deb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no destination"));
}

#[test]
fn test_missing_package_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "shell: sh\ncommands:\n  validate: 'true'\n");

    relflow(&dir)
        .args(["validate", "--package", "missing.deb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_docker_publish_pushes_images_then_manifests() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grafana-9.5.0-amd64.tar.gz"), b"tgz").unwrap();
    std::fs::write(dir.path().join("grafana-9.5.0-arm64.tar.gz"), b"tgz").unwrap();
    write_config(
        &dir,
        concat!(
            "shell: sh\n",
            "parallel: 2\n",
            "commands:\n",
            "  publish_image: 'echo \"$RELFLOW_TAG\"'\n",
            "  publish_manifest: 'echo \"$RELFLOW_MANIFEST\"'\n",
        ),
    );

    relflow(&dir)
        .args(["docker-publish", "--package", "*.tar.gz", "--registry", "example/repo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("example/repo/grafana-image-tags:9.5.0-amd64"))
        .stdout(predicate::str::contains("example/repo/grafana-image-tags:9.5.0-arm64"))
        .stdout(predicate::str::contains("example/repo/grafana-oss-image-tags:9.5.0-arm64"))
        .stdout(predicate::str::contains("example/repo/grafana:9.5.0 (2 tags)"))
        .stdout(predicate::str::contains("example/repo/grafana-oss:9.5.0 (2 tags)"));
}

#[test]
fn test_docker_publish_failure_names_the_tag() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("grafana-9.5.0-amd64.tar.gz"), b"tgz").unwrap();
    write_config(
        &dir,
        concat!(
            "shell: sh\n",
            "commands:\n",
            "  publish_image: 'case \"$RELFLOW_TAG\" in *oss*) echo denied >&2; exit 1;; *) echo \"$RELFLOW_TAG\";; esac'\n",
            "  publish_manifest: 'echo \"$RELFLOW_MANIFEST\"'\n",
        ),
    );

    relflow(&dir)
        .args(["docker-publish", "--package", "grafana-9.5.0-amd64.tar.gz", "--registry", "example/repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("example/repo/grafana-oss-image-tags:9.5.0-amd64"))
        .stdout(predicate::str::contains("Manifests").not());
}
