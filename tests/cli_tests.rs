use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("allowance_cli").unwrap();
    cmd.env("ALLOWANCE_CORE_HOME", home.path())
        .env_remove("ALLOWANCE_CORE_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_line(output: &[u8]) -> String {
    String::from_utf8(output.to_vec()).unwrap().trim().to_string()
}

#[test]
fn weekly_schedule_runs_from_the_command_line() {
    let home = TempDir::new().unwrap();

    let created = cli(&home)
        .args(["account", "create", "--owner", "one", "--name", "Pocket"])
        .output()
        .unwrap();
    assert!(created.status.success());
    let account_id = stdout_line(&created.stdout);

    cli(&home)
        .args([
            "schedule",
            "add",
            "--account",
            &account_id,
            "--start",
            "2010-04-03",
            "--interval",
            "weekly",
            "--amount",
            "1",
            "--description",
            "Pocket Money",
        ])
        .assert()
        .success();

    cli(&home)
        .args(["run", "--as-of", "2010-04-05"])
        .assert()
        .success()
        .stdout(contains("1 payment(s) posted as of 2010-04-05"));

    cli(&home)
        .args(["status", "--account", &account_id])
        .assert()
        .success()
        .stdout(contains("balance 1"))
        .stdout(contains("next 2010-04-10"));

    cli(&home)
        .args(["run", "--as-of", "2010-04-05"])
        .assert()
        .success()
        .stdout(contains("0 payment(s) posted"));
}

#[test]
fn invalid_schedule_is_rejected() {
    let home = TempDir::new().unwrap();
    let created = cli(&home)
        .args(["account", "create", "--owner", "two", "--name", "Pocket"])
        .output()
        .unwrap();
    let account_id = stdout_line(&created.stdout);

    cli(&home)
        .args([
            "schedule",
            "add",
            "--account",
            &account_id,
            "--start",
            "2010-04-03",
            "--interval",
            "weekly",
            "--amount",
            "0",
            "--description",
            "Nothing",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid payment schedule"));
}

#[test]
fn withdrawal_beyond_balance_fails() {
    let home = TempDir::new().unwrap();
    let created = cli(&home)
        .args(["account", "create", "--owner", "three", "--name", "Pocket"])
        .output()
        .unwrap();
    let account_id = stdout_line(&created.stdout);

    cli(&home)
        .args(["deposit", "--account", &account_id, "--amount", "5", "--date", "2010-04-01"])
        .assert()
        .success()
        .stdout(contains("balance 5"));

    cli(&home)
        .args(["deposit", "--account", &account_id, "--amount", "-7"])
        .assert()
        .failure()
        .stderr(contains("Insufficient funds"));
}

#[test]
fn version_prints_build_metadata() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(contains("allowance_core"));
}

#[test]
fn data_dir_can_come_from_the_environment() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let created = cli(&home)
        .env("ALLOWANCE_CORE_DATA_DIR", data.path())
        .args(["account", "create", "--owner", "four", "--name", "Pocket"])
        .output()
        .unwrap();
    assert!(created.status.success());
    let account_id = stdout_line(&created.stdout);

    assert!(data
        .path()
        .join("accounts")
        .join(format!("{account_id}.json"))
        .exists());
}

#[test]
fn run_fails_when_an_account_cannot_be_read() {
    let home = TempDir::new().unwrap();
    let created = cli(&home)
        .args(["account", "create", "--owner", "five", "--name", "Pocket"])
        .output()
        .unwrap();
    let account_id = stdout_line(&created.stdout);
    std::fs::write(
        home.path().join("accounts").join(format!("{account_id}.json")),
        "{ broken",
    )
    .unwrap();

    cli(&home)
        .args(["run", "--as-of", "2010-04-05"])
        .assert()
        .failure()
        .stderr(contains(format!("failed {account_id}")))
        .stdout(contains("1 account(s) failed"));
}
