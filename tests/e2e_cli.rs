use assert_cmd::prelude::*;
use predicates::prelude::*;

mod cli_helpers;

use cli_helpers::Fixture;

#[test]
fn dry_run_prints_both_reports_without_color() {
    let fixture = Fixture::standard();

    let mut cmd = fixture.base_cmd();
    cmd.arg("--dry-run");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Subject: Portfolio -- 2024-01-04"))
        .stdout(predicate::str::contains("1 Day Change | -$50.00"))
        .stdout(predicate::str::contains("AAA  +4.76%"))
        .stdout(predicate::str::contains("BBB  -2.08%"))
        .stdout(predicate::str::contains("Change % since 2024-01-02"))
        .stdout(predicate::str::contains("AAA  +10.00%"))
        .stdout(predicate::str::contains("Subject: Universe -- 2024-01-04"))
        .stdout(predicate::str::contains("1 Day Change %"))
        .stdout(predicate::str::contains("█████"))
        .stdout(predicate::str::contains("AAA  +4.76%    BBB  -2.08%"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    assert!(
        !fixture.outbox_dir().exists(),
        "dry-run should not write to the outbox"
    );
}

#[test]
fn send_writes_messages_and_charts_to_outbox() {
    let fixture = Fixture::standard();
    fixture.run_cmd(&[]).expect("report run failed");

    let mut messages: Vec<String> = std::fs::read_dir(fixture.outbox_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".eml"))
        .collect();
    messages.sort();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().any(|m| m.ends_with("-portfolio-2024-01-04.eml")));
    assert!(messages.iter().any(|m| m.ends_with("-universe-2024-01-04.eml")));

    // Two bars per offset plus the cumulative line
    let charts = std::fs::read_dir(fixture.path().join("charts"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "svg"))
        .count();
    assert_eq!(charts, 3);

    let portfolio = messages
        .iter()
        .find(|m| m.contains("portfolio"))
        .unwrap();
    let text = std::fs::read_to_string(fixture.outbox_dir().join(portfolio)).unwrap();
    assert!(text.contains("From: reports@example.com\r\n"));
    assert!(text.contains("X-Attachment: "));
}

#[test]
fn missing_holding_fails_the_run() {
    let fixture = Fixture::standard();
    fixture.write_config("AAA = 10\n");

    let mut cmd = fixture.base_cmd();
    cmd.arg("--dry-run");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing holding: BBB"));
}

#[test]
fn no_price_data_fails_the_run() {
    let fixture = Fixture::new();
    fixture.write_symbols(&["ZZZ"]);
    fixture.write_config("ZZZ = 1\n");

    let mut cmd = fixture.base_cmd();
    cmd.arg("--dry-run");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No price data"));
}

#[test]
fn end_date_override_narrows_history() {
    let fixture = Fixture::standard();

    let mut cmd = fixture.base_cmd();
    cmd.args(["--dry-run", "--end-date", "20240103"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Subject: Portfolio -- 2024-01-03"))
        .stdout(predicate::str::contains("AAA  +5.00%"));
}

#[test]
fn invalid_config_is_reported() {
    let fixture = Fixture::standard();
    std::fs::write(fixture.config_path(), "[historical_data]\nbogus = 1\n").unwrap();

    fixture
        .base_cmd()
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}
