use std::fs;

use pomdp_bench::config::HarnessConfig;
use pomdp_bench::runner::TrialRunner;
use tempfile::tempdir;

fn load_config(output_dir: &std::path::Path) -> HarnessConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
trials:
  seed: 4242
  count: 3
  particles: 8
  attempts_per_particle: 200
outputs:
  jsonl: "{jsonl}"
  summary: "{summary}"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("trials.jsonl").display(),
        summary = output_dir.join("summary.md").display()
    );

    let mut cfg: HarnessConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

#[test]
fn serial_run_writes_one_record_per_trial() {
    let dir = tempdir().expect("tempdir");
    let cfg = load_config(dir.path());
    let outputs = cfg.resolved_outputs();

    let summary = TrialRunner::new(cfg).run(&outputs).expect("run succeeds");

    assert_eq!(summary.trials, 3);
    assert_eq!(summary.filled, 3);
    assert_eq!(summary.degraded, 0);
    assert!(summary.mean_acceptance > 0.0);

    let jsonl = fs::read_to_string(&outputs.jsonl).expect("jsonl exists");
    assert_eq!(jsonl.lines().count(), 3);
    for line in jsonl.lines() {
        let record: serde_json::Value = serde_json::from_str(line).expect("valid json");
        assert_eq!(record["requested"], 8);
        assert_eq!(record["returned"], 8);
    }

    let summary_md = fs::read_to_string(&outputs.summary).expect("summary exists");
    assert!(summary_md.contains("test_smoke"));
}

#[test]
fn parallel_run_matches_the_request() {
    let dir = tempdir().expect("tempdir");
    let mut cfg = load_config(dir.path());
    cfg.trials.workers = 4;
    let outputs = cfg.resolved_outputs();

    let summary = TrialRunner::new(cfg).run(&outputs).expect("run succeeds");

    assert_eq!(summary.trials, 3);
    assert_eq!(summary.filled, 3);
    assert!(summary.mean_agreement > 0.5);
}
