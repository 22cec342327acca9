use dedupe::duplicates::{
    analyze, generate_hardlink_actions, generate_removal_actions, DuplicateFinder,
};
use dedupe::output::{JsonOutput, ScriptOutput, ScriptType, TextReport};
use std::fs;
use tempfile::tempdir;

fn scan_fixture() -> (tempfile::TempDir, dedupe::duplicates::SavingsReport, dedupe::duplicates::ScanSummary) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("big1.bin"), [1u8; 1000]).unwrap();
    fs::write(dir.path().join("big2.bin"), [1u8; 1000]).unwrap();
    fs::write(dir.path().join("small1.txt"), b"tiny").unwrap();
    fs::write(dir.path().join("small2.txt"), b"tiny").unwrap();
    fs::write(dir.path().join("small3.txt"), b"tiny").unwrap();
    fs::write(dir.path().join("unique.txt"), b"one of a kind").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    (dir, analyze(groups), summary)
}

#[test]
fn test_text_report_ranks_and_totals() {
    let (_dir, report, _) = scan_fixture();
    let mut buffer = Vec::new();
    TextReport::new(&report).write_to(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    // 1000 redundant bytes outrank 8
    assert!(lines[0].starts_with("# ") && lines[0].ends_with(" in potential savings"));
    assert!(lines[1].starts_with("1000\t"));
    assert!(lines[1].ends_with("big1.bin"));
    assert!(lines[3].starts_with("# "));
    assert!(lines[4].starts_with("4\t"));
    assert_eq!(lines[7], "=".repeat(80));
    assert!(lines[8].ends_with(" in total potential savings"));
    assert_eq!(lines.len(), 9);
    assert_eq!(report.total_potential_savings, 1008);
}

#[test]
fn test_json_report_matches_summary() {
    let (_dir, report, summary) = scan_fixture();
    let json = JsonOutput::new(&report, &summary).to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["total_potential_savings"], 1008);
    assert_eq!(value["groups"].as_array().unwrap().len(), 2);
    assert_eq!(value["groups"][0]["redundant_bytes"], 1000);
    assert_eq!(value["groups"][1]["duplicates"].as_array().unwrap().len(), 2);
    assert_eq!(value["summary"]["files_discovered"], 6);
    assert_eq!(value["summary"]["duplicate_files"], 3);
    assert_eq!(value["summary"]["unique_files"], 1);
}

#[test]
fn test_removal_script_from_scan() {
    let (_dir, report, _) = scan_fixture();
    let actions = generate_removal_actions(&report);
    let mut buffer = Vec::new();
    ScriptOutput::removal(&actions, ScriptType::Posix)
        .write_to(&mut buffer)
        .unwrap();
    let script = String::from_utf8(buffer).unwrap();

    assert_eq!(script.matches("run rm -f -- ").count(), 3);
    assert!(script.contains("big2.bin'"));
    assert!(script
        .lines()
        .filter(|line| line.starts_with("run rm"))
        .all(|line| !line.contains("big1.bin") && !line.contains("small1.txt")));
    assert!(script.find("# Group 1").unwrap() < script.find("# Group 2").unwrap());
    assert!(script.contains("(1008 bytes)"));
}

#[test]
fn test_hardlink_script_from_scan() {
    let (_dir, report, _) = scan_fixture();
    let actions = generate_hardlink_actions(&report);
    let mut buffer = Vec::new();
    ScriptOutput::hardlink(&actions, ScriptType::PowerShell)
        .write_to(&mut buffer)
        .unwrap();
    let script = String::from_utf8(buffer).unwrap();

    assert_eq!(script.matches("New-Item -ItemType HardLink").count(), 6);
    assert!(script.contains("$DryRun = -not $Confirm"));
}

#[cfg(unix)]
#[test]
fn test_posix_hardlink_script_runs() {
    use std::os::unix::fs::MetadataExt;
    use std::process::Command;

    let (dir, report, _) = scan_fixture();
    let actions = generate_hardlink_actions(&report);
    let mut buffer = Vec::new();
    ScriptOutput::hardlink(&actions, ScriptType::Posix)
        .write_to(&mut buffer)
        .unwrap();
    let script_path = dir.path().join("link.sh");
    fs::write(&script_path, buffer).unwrap();

    // Dry run changes nothing
    let status = Command::new("sh").arg(&script_path).status().unwrap();
    assert!(status.success());
    let ino = |name: &str| fs::metadata(dir.path().join(name)).unwrap().ino();
    assert_ne!(ino("big1.bin"), ino("big2.bin"));

    let status = Command::new("sh")
        .arg(&script_path)
        .arg("--confirm")
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(ino("big1.bin"), ino("big2.bin"));
    assert_eq!(ino("small1.txt"), ino("small3.txt"));
    assert_eq!(fs::read(dir.path().join("big2.bin")).unwrap(), vec![1u8; 1000]);
}
