use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_version() {
    Command::cargo_bin("reel-tui")
        .expect("binary built")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    Command::cargo_bin("reel-tui")
        .expect("binary built")
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Reel-TUI")
                .and(predicate::str::contains("--start"))
                .and(predicate::str::contains("--version")),
        );
}
