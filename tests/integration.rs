use std::{env, fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[population]\n"
        + "kind = \"closed\"\n"
        + "size = 200\n"
        + "\n"
        + "[capture]\n"
        + "policy = \"equal\"\n"
        + "prob = 0.3\n"
        + "\n"
        + "[tagging]\n"
        + "tag_loss = true\n"
        + "tag_loss_prob = 0.05\n"
        + "\n"
        + "[spatial]\n"
        + "mode = \"bounded-sub-reach\"\n"
        + "fraction = 0.5\n"
        + "\n"
        + "[trials]\n"
        + "count = 50\n"
        + "seed = 42\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_markrecap"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "simulate"]);
    run_bin(&["--sim-dir", test_dir_str, "simulate"]);

    assert!(test_dir.join("results-0000.msgpack").is_file());
    assert!(test_dir.join("results-0001.msgpack").is_file());

    run_bin(&["--sim-dir", test_dir_str, "report"]);
    run_bin(&["--sim-dir", test_dir_str, "report", "--seq", "0"]);

    run_bin(&["--sim-dir", test_dir_str, "export", "--seq", "1"]);

    let trials_text =
        fs::read_to_string(test_dir.join("trials-0001.tsv")).expect("failed to read trials file");
    // Header plus one row per trial.
    assert_eq!(trials_text.lines().count(), 51);

    let individuals_text = fs::read_to_string(test_dir.join("individuals-0001.tsv"))
        .expect("failed to read individuals file");
    assert_eq!(individuals_text.lines().count(), 1 + 50 * 200);

    run_bin(&[
        "estimate",
        "--marked",
        "9",
        "--caught",
        "9",
        "--recaptured",
        "3",
    ]);

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("results-0000.msgpack").exists());
    assert!(!test_dir.join("trials-0001.tsv").exists());
    assert!(test_dir.join("config.toml").is_file());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_estimator_input_fails() {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_markrecap"));

    let output = Command::new(bin)
        .args([
            "estimate",
            "--marked",
            "3",
            "--caught",
            "10",
            "--recaptured",
            "5",
        ])
        .output()
        .expect("failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn report_without_saved_results_fails() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("empty_report");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_contents = String::new()
        + "[population]\n"
        + "kind = \"closed\"\n"
        + "size = 100\n"
        + "\n"
        + "[capture]\n"
        + "policy = \"equal\"\n"
        + "prob = 0.3\n"
        + "\n"
        + "[tagging]\n"
        + "tag_loss = false\n"
        + "\n"
        + "[spatial]\n"
        + "mode = \"not-a-factor\"\n"
        + "\n"
        + "[trials]\n"
        + "count = 10\n";

    fs::write(test_dir.join("config.toml"), config_contents)
        .expect("failed to write config file");

    let bin = PathBuf::from(env!("CARGO_BIN_EXE_markrecap"));
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let output = Command::new(bin)
        .args(["--sim-dir", test_dir_str, "report"])
        .output()
        .expect("failed to execute command");

    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_is_rejected_before_any_trial() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_contents = String::new()
        + "[population]\n"
        + "kind = \"closed\"\n"
        + "size = 100\n"
        + "\n"
        + "[capture]\n"
        + "policy = \"equal\"\n"
        + "prob = 1.5\n"
        + "\n"
        + "[tagging]\n"
        + "tag_loss = false\n"
        + "\n"
        + "[spatial]\n"
        + "mode = \"not-a-factor\"\n"
        + "\n"
        + "[trials]\n"
        + "count = 10\n";

    fs::write(test_dir.join("config.toml"), config_contents)
        .expect("failed to write config file");

    let bin = PathBuf::from(env!("CARGO_BIN_EXE_markrecap"));
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let output = Command::new(bin)
        .args(["--sim-dir", test_dir_str, "simulate"])
        .output()
        .expect("failed to execute command");

    assert!(!output.status.success());
    assert!(!test_dir.join("results-0000.msgpack").exists());

    fs::remove_dir_all(&test_dir).ok();
}
