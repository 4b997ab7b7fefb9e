// Integration tests for `gymdesk recon` and `gymdesk db`.
// Run with: cargo test -p gymdesk-cli --test recon_cli_tests -- --nocapture
//
// Each test seeds a throwaway database and drives the real binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{Duration, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

use gymdesk_io::{Package, Payment, SqliteStore};

fn gymdesk(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gymdesk"));
    // Keep the user's real settings file out of the picture.
    cmd.arg("--settings").arg(dir.path().join("settings.json"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn payment(id: &str, title: &str) -> Payment {
    Payment {
        id: id.into(),
        user_id: None,
        plan_title: title.into(),
        status: "completed".into(),
        amount_cents: Some(4900),
        expires_at: Utc::now() + Duration::days(3),
        product_id: None,
        total_passes: None,
    }
}

fn seed(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("gym.db");
    let store = SqliteStore::create(&path).unwrap();
    for (id, name) in [("p1", "Gold Monthly"), ("p2", "Silver Monthly")] {
        store
            .insert_package(&Package {
                id: id.into(),
                name: name.into(),
                price_cents: None,
                duration_days: Some(30),
            })
            .unwrap();
    }
    store.insert_payment(&payment("pay_1", "gold monthly plan")).unwrap();
    store.insert_payment(&payment("pay_2", "xyz completely unrelated")).unwrap();
    path
}

fn run_json(dir: &TempDir, extra: &[&str]) -> (Output, serde_json::Value) {
    let db = dir.path().join("gym.db");
    let out = gymdesk(dir)
        .args(["recon", "run", "--json", "--db"])
        .arg(&db)
        .args(extra)
        .output()
        .unwrap();
    let json = serde_json::from_slice(&out.stdout).unwrap_or(serde_json::Value::Null);
    (out, json)
}

// ===========================================================================
// db init
// ===========================================================================

#[test]
fn db_init_creates_schema() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/gym.db");

    let out = gymdesk(&dir).args(["db", "init"]).arg(&path).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("schema v1"));

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.schema_version().unwrap(), Some(1));

    // Re-running is harmless.
    let again = gymdesk(&dir).args(["db", "init"]).arg(&path).output().unwrap();
    assert!(again.status.success());
}

#[test]
fn db_init_uses_settings_path() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("from-settings.db");
    std::fs::write(
        dir.path().join("settings.json"),
        format!("// local\n{{ \"database.path\": {:?} }}", db.to_string_lossy()),
    )
    .unwrap();

    let out = gymdesk(&dir).args(["db", "init"]).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(db.exists());
}

// ===========================================================================
// recon run
// ===========================================================================

#[test]
fn run_updates_matching_payment() {
    let dir = TempDir::new().unwrap();
    let db = seed(&dir);

    let (out, json) = run_json(&dir, &[]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    assert_eq!(json["summary"]["processed"], 2);
    assert_eq!(json["summary"]["updated"], 1);
    assert_eq!(json["summary"]["skipped"], 1);
    assert_eq!(json["meta"]["scorer"], "cosine/word");
    assert_eq!(json["details"][0]["record_id"], "pay_1");
    assert_eq!(json["details"][0]["catalog_id"], "p1");
    assert_eq!(json["details"][0]["derived_count"], 3);
    assert_eq!(json["details"][1]["outcome"], "below_threshold");

    assert!(stderr(&out).contains("2 processed, 1 updated, 1 skipped (0 failed)"));

    let store = SqliteStore::open(&db).unwrap();
    let pay_1 = store.payment("pay_1").unwrap().unwrap();
    assert_eq!(pay_1.product_id.as_deref(), Some("p1"));
    assert_eq!(pay_1.total_passes, Some(3));
}

#[test]
fn summary_is_printed_once() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    let out = gymdesk(&dir)
        .args(["recon", "run", "--db"])
        .arg(dir.path().join("gym.db"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let err = stderr(&out);
    let summaries: Vec<&str> = err.lines().filter(|l| l.contains("processed,")).collect();
    assert_eq!(summaries.len(), 1, "stderr: {err}");
    assert!(summaries[0].starts_with("recon 'reconcile': 2 processed"));
}

#[test]
fn second_run_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    run_json(&dir, &[]);
    let (out, json) = run_json(&dir, &[]);
    assert!(out.status.success());
    assert_eq!(json["summary"]["processed"], 1);
    assert_eq!(json["summary"]["updated"], 0);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let db = seed(&dir);

    let (out, json) = run_json(&dir, &["--dry-run"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(json["meta"]["dry_run"], true);
    assert_eq!(json["details"][0]["outcome"], "would_update");
    assert!(stderr(&out).contains("(dry run)"));

    let store = SqliteStore::open(&db).unwrap();
    assert_eq!(store.payment("pay_1").unwrap().unwrap().product_id, None);
}

#[test]
fn run_with_fixture_config() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    // Fixture only treats "paid" as completed, so nothing is eligible.
    let config = fixture("backfill.recon.toml");
    let (out, json) = run_json(&dir, &["--config", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(json["meta"]["config_name"], "payments-backfill");
    assert_eq!(json["meta"]["scorer"], "cosine/char_2gram");
    assert_eq!(json["summary"]["processed"], 0);
}

#[test]
fn missing_database_is_runtime_error() {
    let dir = TempDir::new().unwrap();
    let out = gymdesk(&dir)
        .args(["recon", "run", "--db"])
        .arg(dir.path().join("absent.db"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(61));
    let err = stderr(&out);
    assert!(err.contains("error: "));
    assert!(err.contains("hint:  create it with: gymdesk db init"));
}

#[test]
fn invalid_config_exit_code() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    let config = dir.path().join("bad.recon.toml");
    std::fs::write(&config, "threshold = 1.5\n").unwrap();

    let (out, _) = run_json(&dir, &["--config", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(60));
    assert!(out.stdout.is_empty());
}

#[test]
fn report_and_output_files() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    let report = dir.path().join("decisions.csv");
    let output = dir.path().join("result.json");

    let out = gymdesk(&dir)
        .args(["recon", "run", "--db"])
        .arg(dir.path().join("gym.db"))
        .arg("--report")
        .arg(&report)
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    // Without --json nothing goes to stdout.
    assert!(out.stdout.is_empty());

    let csv = std::fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("record_id,free_text,"));
    assert!(lines[1].starts_with("pay_1,gold monthly plan,p1,Gold Monthly,"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["summary"]["updated"], 1);
}

#[test]
fn strict_fails_on_rejected_write() {
    let dir = TempDir::new().unwrap();
    let db = seed(&dir);
    Connection::open(&db)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER lock_pay_1 BEFORE UPDATE ON payments WHEN NEW.id = 'pay_1'
             BEGIN SELECT RAISE(ABORT, 'payment locked'); END;",
        )
        .unwrap();

    // Without --strict the run still succeeds.
    let (lenient, json) = run_json(&dir, &[]);
    assert!(lenient.status.success());
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["details"][0]["outcome"], "persist_failed");

    let (strict, _) = run_json(&dir, &["--strict"]);
    assert_eq!(strict.status.code(), Some(62));
    assert!(stderr(&strict).contains("1 record update(s) failed"));
}

// ===========================================================================
// recon validate
// ===========================================================================

#[test]
fn validate_fixture() {
    let dir = TempDir::new().unwrap();
    let out = gymdesk(&dir)
        .args(["recon", "validate"])
        .arg(fixture("backfill.recon.toml"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("valid: recon 'payments-backfill' using cosine/char_2gram"));
}

#[test]
fn validate_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("typo.recon.toml");
    std::fs::write(&config, "treshold = 0.5\n").unwrap();

    let out = gymdesk(&dir).args(["recon", "validate"]).arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(60));
}

#[test]
fn validate_missing_file() {
    let dir = TempDir::new().unwrap();
    let out = gymdesk(&dir)
        .args(["recon", "validate"])
        .arg(dir.path().join("nope.recon.toml"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(61));
}
