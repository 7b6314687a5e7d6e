//! CLI surface tests

use assert_cmd::Command;
use predicates::str::contains;

fn keyturn() -> Command {
    let mut cmd = Command::cargo_bin("keyturn").expect("binary builds");
    // Tests must not inherit run inputs from the developer's shell.
    for var in [
        "KEYTURN_CONFIG",
        "KEYTURN_SEED",
        "KEYTURN_TIMESTAMP",
        "KEYTURN_ADMIN_PASSWORD",
        "KEYTURN_ARGOCD_TOKEN",
        "KEYTURN_SECRETS_ENDPOINT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    keyturn()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("update-all"))
        .stdout(contains("create-db-access"))
        .stdout(contains("update-secrets"))
        .stdout(contains("restart-deployments"));
}

#[test]
fn test_missing_seed_is_a_usage_error() {
    keyturn()
        .arg("update-secrets")
        .assert()
        .failure()
        .stderr(contains("--seed"));
}

#[test]
fn test_missing_config_file_fails() {
    keyturn()
        .args([
            "--seed",
            "test-seed",
            "--config",
            "/nonexistent/keyturn.yaml",
            "update-secrets",
        ])
        .assert()
        .failure();
}

#[test]
fn test_missing_admin_password_fails_resolution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keyturn.yaml");
    std::fs::write(
        &path,
        "client: acme\ncluster:\n  host: db.internal\n  port: 5432\n  admin_user: postgres\nservice_users: []\n",
    )
    .expect("write config");

    keyturn()
        .args(["--seed", "test-seed", "--config"])
        .arg(&path)
        .arg("create-db-access")
        .assert()
        .failure();
}
