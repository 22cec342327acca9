use clap::Parser;
use dedupe::cli::Cli;
use dedupe::error::ExitCode;
use dedupe::run_app;
use std::fs;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["dedupe", "-q", "--no-db"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

#[test]
fn test_json_report_written_to_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"same bytes").unwrap();
    fs::write(data.join("b.txt"), b"same bytes").unwrap();
    fs::write(data.join("c.txt"), b"different!").unwrap();
    let report = dir.path().join("report.json");

    let code = run_app(cli(&[
        "--format",
        "json",
        "-o",
        report.to_str().unwrap(),
        data.to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["total_potential_savings"], 10);
    assert_eq!(value["groups"][0]["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["summary"]["files_discovered"], 3);
}

#[test]
fn test_hardlink_script_written_alongside_report() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.bin"), [5u8; 64]).unwrap();
    fs::write(data.join("b.bin"), [5u8; 64]).unwrap();
    let report = dir.path().join("report.txt");
    let script = dir.path().join("link.sh");

    let code = run_app(cli(&[
        "-o",
        report.to_str().unwrap(),
        "--hardlink-script",
        script.to_str().unwrap(),
        "--script-type",
        "posix",
        data.to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let text = fs::read_to_string(&report).unwrap();
    assert!(text.contains("64\t"));
    let script_text = fs::read_to_string(&script).unwrap();
    assert!(script_text.starts_with("#!/bin/sh"));
    assert_eq!(script_text.matches("run ln -f -- ").count(), 1);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[test]
fn test_empty_directory_succeeds_with_zero_total() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("empty");
    fs::create_dir(&data).unwrap();
    let report = dir.path().join("report.txt");

    let code = run_app(cli(&["-o", report.to_str().unwrap(), data.to_str().unwrap()])).unwrap();

    assert_eq!(code, ExitCode::Success);
    let text = fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "=".repeat(80));
    assert!(lines[1].ends_with(" in total potential savings"));
}

#[test]
fn test_invalid_config_writes_nothing() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let report = dir.path().join("report.txt");
    let script = dir.path().join("rm.sh");

    let err = run_app(cli(&[
        "--prefix-bytes",
        "0",
        "-o",
        report.to_str().unwrap(),
        "--remove-script",
        script.to_str().unwrap(),
        data.to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
    assert!(!report.exists());
    assert!(!script.exists());
}

#[test]
fn test_missing_root_maps_to_config_exit_code() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.txt");

    let err = run_app(cli(&[
        "-o",
        report.to_str().unwrap(),
        dir.path().join("absent").to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
    assert!(!report.exists());
}
