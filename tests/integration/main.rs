//! Integration tests for precache

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a config whose store lives inside `dir`; returns the config path
fn write_config(dir: &Path) -> PathBuf {
    let config_path = dir.join("config.toml");
    let store_path = dir.join("store.json");
    std::fs::write(
        &config_path,
        format!(
            "[store]\npath = {:?}\n\n[functions.legacy]\nenabled = false\n",
            store_path.display().to_string()
        ),
    )
    .unwrap();
    config_path
}

fn write_store(dir: &Path, content: &str) {
    std::fs::write(dir.join("store.json"), content).unwrap();
}

const SAMPLE_STORE: &str = r#"{
  "sales_report::{\"region\":\"APAC\",\"store\":101}": {"total": 202},
  "sales_report::{\"region\":\"EMEA\",\"store\":101}": {"total": 101},
  "legacy::{\"flag\":true}": 1,
  "not a key": "kept"
}"#;

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn precache(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("precache");
        cmd.arg("--config").arg(write_config(dir.path()));
        cmd.env("CI", "1");
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("precache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Precompute and serve results of functions over finite input domains",
            ))
            .stdout(predicate::str::contains("forget"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("precache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("precache"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        precache(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        precache(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[precompute]"))
            .stdout(predicate::str::contains("store.json"));
    }

    #[test]
    fn config_init_respects_existing() {
        let dir = TempDir::new().unwrap();
        precache(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[precompute\nconcurrency = ").unwrap();

        cargo_bin_cmd!("precache")
            .arg("--config")
            .arg(&path)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn status_without_store() {
        let dir = TempDir::new().unwrap();
        precache(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Not created"));
    }

    #[test]
    fn status_lists_functions() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        precache(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("sales_report"))
            .stdout(predicate::str::contains("legacy"))
            .stdout(predicate::str::contains("disabled"))
            .stdout(predicate::str::contains("2 function(s), 3 entries"));
    }

    #[test]
    fn show_json() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        let output = precache(&dir)
            .args(["show", "sales_report", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let entries = shown.as_object().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.keys().all(|k| k.starts_with("sales_report::")));
    }

    #[test]
    fn get_ignores_argument_order() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        precache(&dir)
            .args(["get", "sales_report", "store=101", "region=APAC"])
            .assert()
            .success()
            .stdout(predicate::str::contains("202"));
    }

    #[test]
    fn get_distinguishes_value_types() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        precache(&dir)
            .args(["get", "sales_report", "region=APAC", "store=\"101\""])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not precomputed"));
    }

    #[test]
    fn get_miss_fails() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        precache(&dir)
            .args(["get", "sales_report", "region=APAC", "store=999"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not precomputed"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn forget_one_entry() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        precache(&dir)
            .args(["forget", "sales_report", "region=EMEA", "store=101"])
            .assert()
            .success();

        let raw = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
        assert!(!raw.contains("EMEA"));
        assert!(raw.contains("APAC"));
        assert!(raw.contains("not a key"));
    }

    #[test]
    fn forget_all_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), SAMPLE_STORE);

        precache(&dir)
            .args(["forget", "sales_report"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing removed"));

        precache(&dir)
            .args(["forget", "sales_report", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Forgot 2 entries"));

        let raw = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
        assert!(!raw.contains("sales_report"));
        assert!(raw.contains("legacy"));
    }

    #[test]
    fn corrupt_store_is_left_alone() {
        let dir = TempDir::new().unwrap();
        write_store(dir.path(), "{ not json");

        precache(&dir)
            .args(["forget", "sales_report", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("corrupt"))
            .stderr(predicate::str::contains("by hand"));

        let raw = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
        assert_eq!(raw, "{ not json");
    }
}

mod engine_tests {
    use super::*;
    use assert_cmd::cargo::cargo_bin_cmd;
    use precache::{
        Arguments, Config, DomainValue, Enumerable, PersistentStore, Precomputer, RunOutcome,
        Signature,
    };
    use predicates::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    precache::finite_enum! {
        #[derive(Debug)]
        enum Channel {
            Web = "web",
            Retail = "retail",
            Partner = "partner",
        }
    }

    fn build(dir: &Path, calls: Arc<AtomicUsize>) -> (Precomputer, precache::CacheFront<String>) {
        let mut config: Config = toml::from_str(&std::fs::read_to_string(write_config(dir)).unwrap()).unwrap();
        config.precompute.concurrency = 3;
        config.precompute.flush_every = 2;

        let mut engine = Precomputer::from_config(config);
        let front = engine
            .wrap(
                Signature::new("forecast")
                    .enumeration::<Channel>("channel")
                    .literal("quarter", 1..=4)
                    .enumeration::<bool>("promo"),
                move |args: Arguments| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let channel = args.member::<Channel>("channel").ok_or("channel")?;
                        Ok::<_, &str>(format!(
                            "{:?}-Q{}-{}",
                            channel,
                            args.int("quarter").unwrap_or_default(),
                            args.bool("promo").unwrap_or_default()
                        ))
                    }
                },
            )
            .unwrap();
        (engine, front)
    }

    #[tokio::test]
    async fn run_then_serve_then_inspect() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let (engine, front) = build(dir.path(), Arc::clone(&calls));
        let report = engine.run().await.unwrap();
        assert_eq!(report.computed(), 24);
        assert_eq!(calls.load(Ordering::SeqCst), 24);

        let answer = front
            .call([
                ("promo", DomainValue::from(true)),
                ("channel", Channel::Retail.value()),
                ("quarter", 3.into()),
            ])
            .await
            .unwrap();
        assert_eq!(answer, "Retail-Q3-true");

        // A fresh process sees everything cached
        let (engine, _) = build(dir.path(), Arc::clone(&calls));
        let report = engine.run().await.unwrap();
        assert_eq!(
            report.function("forecast").unwrap().outcome,
            RunOutcome::FullyCached
        );
        assert_eq!(calls.load(Ordering::SeqCst), 24);

        let store = PersistentStore::new(dir.path().join("store.json"));
        assert_eq!(store.namespaces().await.unwrap().get("forecast"), Some(&24));

        cargo_bin_cmd!("precache")
            .arg("--config")
            .arg(dir.path().join("config.toml"))
            .args(["get", "forecast", "channel=web", "quarter=1", "promo=false"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Web-Q1-false"));
    }

    #[tokio::test]
    async fn forgotten_entry_is_recomputed() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let (engine, _) = build(dir.path(), Arc::clone(&calls));
        engine.run().await.unwrap();

        cargo_bin_cmd!("precache")
            .arg("--config")
            .arg(dir.path().join("config.toml"))
            .args(["forget", "forecast", "channel=partner", "quarter=4", "promo=true"])
            .assert()
            .success();

        let (engine, front) = build(dir.path(), Arc::clone(&calls));
        let report = engine.run().await.unwrap();
        let summary = report.function("forecast").unwrap();
        assert_eq!(summary.computed, 1);
        assert_eq!(summary.skipped, 23);
        assert!(front
            .lookup([
                ("channel", DomainValue::from("partner")),
                ("quarter", 4.into()),
                ("promo", true.into()),
            ])
            .is_ok());
    }
}
