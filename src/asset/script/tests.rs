//! Script pipeline tests.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;

use super::*;
use crate::config::test_config_at;
use crate::task::ErrorClass;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_transform_options_targets() {
    assert!(transform_options("es2015").is_ok());
    assert!(transform_options("es2020").is_ok());
    assert!(transform_options("esnext").is_ok());
    assert!(transform_options("netscape4").is_err());
    assert!(engine_targets("es2017").is_ok());
    assert!(engine_targets("netscape4").is_err());
}

#[test]
fn test_build_bundles_in_path_order() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "dev/js/main.js", "window.mainLoaded = 1;");
    write(root, "dev/js/a.js", "window.siblingLoaded = 1;");
    write(root, "dev/js/a/b.js", "window.nestedLoaded = 1;");
    let config = test_config_at(root);

    let written = build(&config.scripts).unwrap();
    assert_eq!(written.len(), 2);

    let js = fs::read_to_string(config.scripts.output_path()).unwrap();
    let nested = js.find("nestedLoaded").unwrap();
    let sibling = js.find("siblingLoaded").unwrap();
    let main = js.find("mainLoaded").unwrap();
    assert!(nested < sibling && sibling < main, "unexpected order in {js}");
    assert!(js.ends_with("//# sourceMappingURL=build.js.map"));

    let map: Value =
        serde_json::from_str(&fs::read_to_string(&written[1]).unwrap()).unwrap();
    let sections = map["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0]["map"]["sources"][0], "../../dev/js/a/b.js");
    assert_eq!(sections[2]["map"]["sources"][0], "../../dev/js/main.js");

    let offsets: Vec<_> = sections
        .iter()
        .map(|s| s["offset"]["line"].as_u64().unwrap())
        .collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_build_keeps_declarations_used_by_later_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "dev/js/a.js",
        "function helper() { return 42; }\nvar settings = { debug: true };",
    );
    write(
        root,
        "dev/js/b.js",
        "window.answer = helper() + (settings.debug ? 1 : 0);",
    );
    let mut config = test_config_at(root);
    config.scripts.source_map = false;

    build(&config.scripts).unwrap();
    let js = fs::read_to_string(config.scripts.output_path()).unwrap();

    let definition = js.find("function helper(").expect("helper definition kept");
    let use_site = js.rfind("helper()").expect("helper call kept");
    assert!(definition < use_site, "definition must precede use in {js}");
    assert_eq!(js.matches("helper()").count(), 2, "definition and call in {js}");
    assert!(js.contains("var settings"), "settings declaration kept in {js}");
    assert!(js.contains("settings.debug"), "settings use kept in {js}");
}

#[test]
fn test_build_failure_names_file_and_keeps_bundle() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "dev/js/ok.js", "window.ok = 1;");
    write(root, "dev/js/broken.js", "window.broken = ;");
    write(root, "build/js/build.js", "previous");
    let config = test_config_at(root);

    let err = build(&config.scripts).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Compile);
    assert!(err.to_string().contains("broken.js"));
    assert_eq!(
        fs::read_to_string(root.join("build/js/build.js")).unwrap(),
        "previous"
    );
}

#[test]
fn test_build_no_scripts_writes_empty_bundle() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config_at(dir.path());
    config.scripts.source_map = false;

    let written = build(&config.scripts).unwrap();
    assert_eq!(written, [config.scripts.output_path()]);
    assert_eq!(fs::read_to_string(&written[0]).unwrap(), "");
}
