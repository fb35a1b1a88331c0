mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use common::{file_names, locations};
use tempfile::TempDir;

/// Run the binary from inside `work_dir` with a clean configuration environment
fn run_cli(work_dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sitemap-gen"));
    command
        .args(args)
        .current_dir(work_dir)
        .env("XDG_CONFIG_HOME", work_dir.join("xdg"))
        .env("HOME", work_dir)
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("SITEMAP_GEN_") {
            command.env_remove(key);
        }
    }
    command.output().expect("Failed to execute sitemap-gen")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_cli_help_output() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--base-url"));
    assert!(stdout.contains("--output-dir"));
    assert!(stdout.contains("--max-urls"));
    assert!(stdout.contains("--stylesheet"));
    assert!(stdout.contains("--no-validate"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--format"));
}

#[test]
fn test_cli_version_output() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("sitemap-gen {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_cli_generates_from_text_input() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.txt");
    fs::write(&input, "# site pages\n/\n\n/about\n").unwrap();
    let out = temp_dir.path().join("public");

    let output = run_cli(
        temp_dir.path(),
        &[
            "--base-url",
            "https://example.com",
            "--output-dir",
            path_str(&out),
            path_str(&input),
        ],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Sitemap Summary:"));
    assert!(stdout.contains("Validation: passed"));
    assert_eq!(
        locations(&out.join("sitemap.xml")),
        vec!["https://example.com/", "https://example.com/about"]
    );
}

#[test]
fn test_cli_json_report_for_sharded_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.json");
    let entries: Vec<String> = (0..5)
        .map(|i| format!(r#"{{"loc": "/p/{}", "changefreq": "weekly"}}"#, i))
        .collect();
    fs::write(&input, format!("[{}]", entries.join(","))).unwrap();
    let out = temp_dir.path().join("out");

    let output = run_cli(
        temp_dir.path(),
        &[
            "-b",
            "https://example.com",
            "--sitemap-base-url",
            "https://cdn.example.com/maps/",
            "-o",
            path_str(&out),
            "--max-urls",
            "2",
            "--engine",
            "structural",
            "--format",
            "json",
            path_str(&input),
        ],
    );

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["layout"], "indexed");
    assert_eq!(report["total_urls"], 5);
    assert_eq!(report["files"].as_array().unwrap().len(), 4);
    assert_eq!(
        file_names(&out),
        vec![
            "sitemap_1.xml",
            "sitemap_2.xml",
            "sitemap_3.xml",
            "sitemap_index.xml"
        ]
    );
    assert_eq!(
        locations(&out.join("sitemap_index.xml"))[2],
        "https://cdn.example.com/maps/sitemap_3.xml"
    );
}

#[test]
fn test_cli_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.txt");
    fs::write(&input, "/docs\n").unwrap();
    fs::write(
        temp_dir.path().join("sitemap-gen.toml"),
        r#"
[generation]
base_url = "https://docs.example.com"
output_dir = "site"
stylesheet_url = "https://docs.example.com/sitemap.xsl"

[output]
format = "summary"
"#,
    )
    .unwrap();

    let output = run_cli(temp_dir.path(), &[path_str(&input)]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("1 URLs in 1 file (single, passed)"));

    let written = fs::read_to_string(temp_dir.path().join("site/sitemap.xml")).unwrap();
    assert!(written.contains("https://docs.example.com/docs"));
    assert!(written.contains(r#"href="https://docs.example.com/sitemap.xsl""#));
}

#[test]
fn test_cli_schema_violation_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.json");
    fs::write(&input, r#"[{"loc": "/", "changefreq": "sometimes"}]"#).unwrap();
    let out = temp_dir.path().join("out");

    let output = run_cli(
        temp_dir.path(),
        &["-b", "https://example.com", "-o", path_str(&out), path_str(&input)],
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Schema violation"));
    assert!(out.join("sitemap.xml").exists());
}

#[test]
fn test_cli_no_validate_skips_schema_check() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.json");
    fs::write(&input, r#"[{"loc": "/", "changefreq": "sometimes"}]"#).unwrap();
    let out = temp_dir.path().join("out");

    let output = run_cli(
        temp_dir.path(),
        &[
            "-b",
            "https://example.com",
            "-o",
            path_str(&out),
            "--no-validate",
            path_str(&input),
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Validation: skipped"));
}

#[test]
fn test_cli_missing_base_url() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.txt");
    fs::write(&input, "/\n").unwrap();

    let output = run_cli(temp_dir.path(), &[path_str(&input)]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("base URL"));
}

#[test]
fn test_cli_malformed_url_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("urls.txt");
    fs::write(&input, "/ok\nhttp://[::1\n").unwrap();
    let out = temp_dir.path().join("out");

    let output = run_cli(
        temp_dir.path(),
        &["-b", "https://example.com", "-o", path_str(&out), path_str(&input)],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Malformed URL"));
    assert!(!out.exists());
}

#[test]
fn test_cli_missing_input_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(
        temp_dir.path(),
        &["-b", "https://example.com", "/nonexistent/urls.txt"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Input file does not exist"));
}

#[test]
fn test_cli_conflicting_options() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["--verbose", "--quiet", "urls.txt"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cannot be used with"));
}
