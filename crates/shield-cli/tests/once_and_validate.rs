//! End-to-end CLI coverage for `once`/`validate` (spec §8 "scenario 1" run
//! through the real binary, and the boundary behavior "unreadable
//! configuration/recipe/landscape file"), grounded in
//! `assay-cli/tests/kill_switch_assert_cmd.rs`'s `assert_cmd`-over-
//! `CARGO_BIN_EXE_*` pattern.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const RECIPE_XML: &str = r#"<recipe-set><recipe>
    <name>drop-dos</name>
    <action>drop</action>
    <min-severity>3</min-severity>
    <max-severity>4</max-severity>
    <type>DoS</type>
    <traffic-constraints><type>TCP</type></traffic-constraints>
</recipe></recipe-set>"#;

const LANDSCAPE_XML: &str =
    r#"<landscape><it-resource id="n1"><capability>drop</capability></it-resource></landscape>"#;

const DOS_CSV: &str = "\
2026-01-01,00:00:05,2026,1,1,0,5,0,1.2.3.4,10.0.0.1,1111,80,TCP,10,2000,8,1500,0.9,extra\n\
2026-01-01,00:00:06,2026,1,1,0,6,0,1.2.3.5,10.0.0.1,2222,80,TCP,10,2000,8,1500,0.9,extra\n";

struct Fixture {
    _dir: tempfile::TempDir,
    config_path: std::path::PathBuf,
    attack_path: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let recipe_dir = dir.path().join("recipes");
    std::fs::create_dir(&recipe_dir).unwrap();
    std::fs::write(recipe_dir.join("dos.xml"), RECIPE_XML).unwrap();
    std::fs::write(dir.path().join("landscape.xml"), LANDSCAPE_XML).unwrap();

    let config_path = dir.path().join("shield.toml");
    std::fs::write(
        &config_path,
        format!(
            "[global]\nlandscapeFile = \"{}\"\nrecipeDirectory = \"{}\"\n",
            dir.path().join("landscape.xml").display(),
            recipe_dir.display(),
        ),
    )
    .unwrap();

    let attack_path = dir.path().join("very high-DoS-1.csv");
    std::fs::write(&attack_path, DOS_CSV).unwrap();

    Fixture {
        _dir: dir,
        config_path,
        attack_path,
    }
}

#[test]
fn once_mitigates_a_dos_attack_and_prints_hspl_and_mspl_xml() {
    let fx = fixture();
    Command::cargo_bin("shield")
        .unwrap()
        .args(["once", "--config"])
        .arg(&fx.config_path)
        .arg("--seed")
        .arg("1")
        .arg(&fx.attack_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hspl-set"))
        .stdout(predicate::str::contains("mspl-set"))
        .stdout(predicate::str::contains("drop"));
}

#[test]
fn once_reports_unmitigated_attack_when_no_recipe_matches() {
    let fx = fixture();
    let unmatched = fx.attack_path.parent().unwrap().join("very high-Cryptomining-1.csv");
    std::fs::write(&unmatched, DOS_CSV).unwrap();

    Command::cargo_bin("shield")
        .unwrap()
        .args(["once", "--config"])
        .arg(&fx.config_path)
        .arg(&unmatched)
        .assert()
        .success()
        .stdout(predicate::str::contains("could not be mitigated"));
}

#[test]
fn validate_reports_loaded_recipe_and_landscape_counts() {
    let fx = fixture();
    Command::cargo_bin("shield")
        .unwrap()
        .args(["validate", "--config"])
        .arg(&fx.config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 recipe(s)"))
        .stdout(predicate::str::contains("1 IT resource(s)"));
}

#[test]
fn validate_fails_on_a_missing_configuration_file() {
    Command::cargo_bin("shield")
        .unwrap()
        .args(["validate", "--config", "/nonexistent/shield.toml"])
        .assert()
        .failure();
}

#[test]
fn once_fails_on_an_unparsable_attack_file() {
    let fx = fixture();
    let bad = fx.attack_path.parent().unwrap().join("very high-DoS-2.csv");
    std::fs::write(&bad, "not,enough,fields\n").unwrap();

    Command::cargo_bin("shield")
        .unwrap()
        .args(["once", "--config"])
        .arg(&fx.config_path)
        .arg(&bad)
        .assert()
        .failure();
}
