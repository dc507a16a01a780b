use std::io::Write;

const PAGE: &str = concat!(
    "<html><body><article><p>Plenty of readable article text lives here, enough ",
    "to clear the main-content threshold for selection purposes.</p></article></body></html>",
);

fn page_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("create temp html file");
    f.write_all(PAGE.as_bytes()).expect("write temp html file");
    f
}

#[test]
fn rewrite_without_an_api_key_fails_cleanly_and_writes_nothing() {
    let f = page_file();
    let out_dir = tempfile::tempdir().expect("create temp dir");
    let out_path = out_dir.path().join("rewritten.html");

    let bin = assert_cmd::cargo::cargo_bin!("relevel");
    let out = std::process::Command::new(bin)
        .args(["rewrite", "--level", "B1", "--input"])
        .arg(f.path())
        .arg("--out")
        .arg(&out_path)
        // Ensure we don't accidentally inherit a key from the environment.
        .env_remove("RELEVEL_API_KEY")
        .output()
        .expect("run relevel rewrite");

    assert!(out.status.success(), "outcome failures still exit 0");
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("rewrite output must be json");
    assert_eq!(v["success"], false);
    assert!(
        v["error"].as_str().unwrap().contains("missing API key"),
        "error: {v}"
    );
    assert!(!out_path.exists(), "no document may be written on failure");
}

#[test]
fn rewrite_with_an_unknown_level_reports_invalid_input() {
    let f = page_file();
    let bin = assert_cmd::cargo::cargo_bin!("relevel");
    let out = std::process::Command::new(bin)
        .args(["rewrite", "--level", "Z9", "--api-key", "k-123", "--input"])
        .arg(f.path())
        .output()
        .expect("run relevel rewrite");

    assert!(out.status.success(), "outcome failures still exit 0");
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("rewrite output must be json");
    assert_eq!(v["success"], false);
    assert!(
        v["error"].as_str().unwrap().contains("unknown CEFR level"),
        "error: {v}"
    );
}

#[test]
fn rewrite_text_output_reports_the_failure_inline() {
    let f = page_file();
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("relevel"))
        .args(["rewrite", "--level", "B1", "--output", "text", "--input"])
        .arg(f.path())
        .env_remove("RELEVEL_API_KEY")
        .assert()
        .success()
        .stdout(predicates::str::contains("relevel rewrite: failed"))
        .stdout(predicates::str::contains("missing API key"));
}
