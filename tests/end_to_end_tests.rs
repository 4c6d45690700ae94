use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use utility_compiler::{build, BuildArgs};

fn default_args(dir: &TempDir) -> BuildArgs {
    BuildArgs {
        input: vec![format!("{}/*.html", dir.path().display())],
        output_css: dir.path().join("out/styles.css"),
        output_report: Some(dir.path().join("out/report.json")),
        config: None,
        minify: false,
        verbose: false,
        jobs: None,
        exclude: vec![],
        dry_run: false,
    }
}

#[test]
fn test_build_compiles_scanned_classes() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        r#"<div class="p-4 bg-red-500 unknown-thing">
  <span class="hover:(flex text-white)">hi</span>
</div>"#,
    )
    .unwrap();

    let args = default_args(&dir);
    let result = build(&args).unwrap();

    assert_eq!(result.total_files_processed, 1);
    // p-4, bg-red-500, hover:flex, hover:text-white compile.
    assert_eq!(result.total_classes, 4);

    let css = fs::read_to_string(&args.output_css).unwrap();
    assert!(css.contains(".p-4 {"));
    assert!(css.contains("padding: 1rem;"));
    assert!(css.contains(".bg-red-500 {"));
    assert!(css.contains("background-color: #ef4444;"));
    assert!(css.contains(".hover\\:flex {"));
    assert!(!css.contains("unknown-thing {"));
}

#[test]
fn test_build_report_contents() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.html"),
        r#"<div class="p-4 mystery-token"></div>"#,
    )
    .unwrap();
    fs::write(dir.path().join("b.html"), r#"<div class="p-4"></div>"#).unwrap();

    let args = default_args(&dir);
    build(&args).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(args.output_report.as_ref().unwrap()).unwrap())
            .unwrap();

    assert_eq!(report["metadata"]["files_processed"], 2);
    assert_eq!(report["metadata"]["classes_compiled"], 1);
    assert_eq!(report["metadata"]["unresolved_count"], 1);
    assert_eq!(report["unresolved"][0], "mystery-token");
    assert_eq!(report["classes"]["p-4"]["count"], 2);
    assert_eq!(report["classes"]["p-4"]["files"].as_array().unwrap().len(), 2);
    assert!(report["cache"]["size"].as_u64().is_some());
}

#[test]
fn test_build_minified_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.html"), r#"<div class="p-4 m-2"></div>"#).unwrap();

    let mut args = default_args(&dir);
    args.minify = true;
    build(&args).unwrap();

    let css = fs::read_to_string(&args.output_css).unwrap();
    // Header comment survives; the body is collapsed.
    assert!(css.starts_with("/* Generated by utility-compiler-cli"));
    assert!(css.contains(".p-4{padding:1rem;}"));
    assert!(css.contains(".m-2{margin:0.5rem;}"));
}

#[test]
fn test_build_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.html"), r#"<div class="p-4"></div>"#).unwrap();

    let mut args = default_args(&dir);
    args.dry_run = true;
    let result = build(&args).unwrap();

    assert_eq!(result.total_classes, 1);
    assert!(!args.output_css.exists());
    assert!(!args.output_report.as_ref().unwrap().exists());
}

#[test]
fn test_build_respects_excludes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("keep.html"), r#"<div class="p-4"></div>"#).unwrap();
    fs::write(dir.path().join("skip.html"), r#"<div class="m-2"></div>"#).unwrap();

    let mut args = default_args(&dir);
    args.exclude = vec![format!("{}/skip.html", dir.path().display())];
    let result = build(&args).unwrap();

    assert_eq!(result.total_files_processed, 1);
    let css = fs::read_to_string(&args.output_css).unwrap();
    assert!(css.contains(".p-4 {"));
    assert!(!css.contains(".m-2 {"));
}

#[test]
fn test_build_with_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.html"), r#"<div class="bg-brand"></div>"#).unwrap();

    let config_path: PathBuf = dir.path().join("compiler.yaml");
    fs::write(
        &config_path,
        r##"
theme:
  colors:
    brand: "#123456"
"##,
    )
    .unwrap();

    let mut args = default_args(&dir);
    args.config = Some(config_path);
    build(&args).unwrap();

    let css = fs::read_to_string(&args.output_css).unwrap();
    assert!(css.contains("background-color: #123456;"));
}
