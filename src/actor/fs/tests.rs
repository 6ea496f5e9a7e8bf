use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::classifier::{ChangeScope, ScopeClassifier};
use super::debouncer::{Debouncer, is_temp_file};
use super::suppress::SelfWrites;
use super::types::ChangeKind;
use super::watch_roots::WatchRoots;
use crate::config::{PipelineConfig, test_config_at};
use crate::task::TaskId;

/// Project at `<tmp>/public` so the default `../resources/views` lands in the tempdir.
fn make_project() -> (TempDir, PipelineConfig) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("public");
    for dir in ["dev/scss", "dev/js/lib", "build/css", "build/js"] {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }
    std::fs::create_dir_all(temp.path().join("resources/views")).unwrap();
    let config = test_config_at(&root);
    (temp, config)
}

fn touch(path: &Path) -> PathBuf {
    std::fs::write(path, "x").unwrap();
    path.to_path_buf()
}

fn batch(entries: &[(&Path, ChangeKind)]) -> FxHashMap<PathBuf, ChangeKind> {
    entries
        .iter()
        .map(|(p, k)| (p.to_path_buf(), *k))
        .collect()
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn write_time_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn chmod_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::Permissions,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

// ============================================================================
// debouncer
// ============================================================================

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/a.scss"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.scss"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.scss"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(debouncer.changes[Path::new("/tmp/a.scss")], ChangeKind::Created);
    assert_eq!(debouncer.changes[Path::new("/tmp/b.scss")], ChangeKind::Modified);
    assert_eq!(debouncer.changes[Path::new("/tmp/c.scss")], ChangeKind::Removed);
}

#[test]
fn test_poll_write_time_counts_as_modification() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/app.js"], write_time_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/other.js"], chmod_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[Path::new("/tmp/app.js")], ChangeKind::Modified);
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/real.scss"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();
    std::thread::sleep(Duration::from_millis(5));

    debouncer.add_event(&make_event(vec!["/tmp/.main.scss.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/main.scss~"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_is_temp_file() {
    assert!(is_temp_file(Path::new("/p/app.js.bak")));
    assert!(is_temp_file(Path::new("/p/.#main.scss")));
    assert!(!is_temp_file(Path::new("/p/_variables.scss")));
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[Path::new("/tmp/a.js")], ChangeKind::Created);
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[Path::new("/tmp/a.js")], ChangeKind::Created);
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));
    assert!(debouncer.changes.is_empty());

    // the empty batch still ends the quiet period
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new(Duration::ZERO);

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));

    assert_eq!(debouncer.changes[Path::new("/tmp/a.js")], ChangeKind::Removed);
}

#[test]
fn test_take_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new(Duration::from_secs(3600));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));

    assert!(debouncer.take_if_ready().is_none());
    assert_eq!(debouncer.changes.len(), 1);

    let dur = debouncer.sleep_duration();
    assert!(dur > Duration::from_secs(3590));
}

#[test]
fn test_take_after_quiet_period() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/tmp/a.js", "/tmp/b.js"], modify_kind()));

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 2);
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

// ============================================================================
// classifier
// ============================================================================

#[test]
fn test_script_change_affects_scripts_only() {
    let (_tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let script = touch(&config.root.join("dev/js/lib/util.js"));

    let scope = classifier
        .classify(batch(&[(&script, ChangeKind::Modified)]))
        .unwrap();

    assert!(scope.scripts);
    assert!(!scope.styles);
    assert!(!scope.templates);
    assert_eq!(scope.tasks(), [TaskId::Scripts, TaskId::CacheBust]);
}

#[test]
fn test_partial_change_affects_styles() {
    let (_tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let partial = touch(&config.root.join("dev/scss/_buttons.scss"));

    let scope = classifier
        .classify(batch(&[(&partial, ChangeKind::Created)]))
        .unwrap();

    assert!(scope.styles);
    assert!(!scope.scripts);
    assert_eq!(scope.tasks(), [TaskId::Styles, TaskId::CacheBust]);
}

#[test]
fn test_template_change_needs_no_build() {
    let (tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let view = touch(&crate::utils::path::normalize_path(
        &tmp.path().join("resources/views/home.blade.php"),
    ));

    let scope = classifier
        .classify(batch(&[(&view, ChangeKind::Modified)]))
        .unwrap();

    assert!(scope.templates);
    assert!(!scope.styles && !scope.scripts);
    assert!(scope.tasks().is_empty());
}

#[test]
fn test_unrelated_and_output_changes_ignored() {
    let (_tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let readme = touch(&config.root.join("README.md"));
    let bundle = touch(&config.root.join("build/js/build.js"));
    let css = touch(&config.root.join("build/css/build.css"));

    let scope = classifier.classify(batch(&[
        (&readme, ChangeKind::Modified),
        (&bundle, ChangeKind::Modified),
        (&css, ChangeKind::Created),
    ]));
    assert!(scope.is_none());
}

#[test]
fn test_removed_script_still_rebuilds() {
    let (_tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let gone = config.root.join("dev/js/old.js");

    let scope = classifier
        .classify(batch(&[(&gone, ChangeKind::Removed)]))
        .unwrap();
    assert!(scope.scripts);
}

#[test]
fn test_stale_events_corrected_by_existence() {
    let (_tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let vanished = config.root.join("dev/js/vanished.js");
    let directory = config.root.join("dev/js/lib");

    // created-then-gone and directory events carry no work
    let scope = classifier.classify(batch(&[
        (&vanished, ChangeKind::Created),
        (&directory, ChangeKind::Modified),
    ]));
    assert!(scope.is_none());
}

#[test]
fn test_classifier_roots() {
    let (tmp, config) = make_project();
    let classifier = ScopeClassifier::new(&config).unwrap();
    let roots = classifier.roots();
    let views = crate::utils::path::normalize_path(&tmp.path().join("resources/views"));

    assert!(roots.contains(&config.root.join("dev/scss")));
    assert!(roots.contains(&config.root.join("dev/js")));
    assert!(roots.contains(&views));
}

#[test]
fn test_watch_roots_drop_nested() {
    let roots = WatchRoots::new(vec![
        PathBuf::from("/app/dev/js"),
        PathBuf::from("/app/dev"),
        PathBuf::from("/app/resources"),
        PathBuf::from("/app/dev"),
    ]);
    assert_eq!(
        roots.desired(),
        [PathBuf::from("/app/dev"), PathBuf::from("/app/resources")]
    );
}

// ============================================================================
// scope
// ============================================================================

#[test]
fn test_scope_merge_is_union() {
    let mut scope = ChangeScope {
        styles: true,
        paths: vec![PathBuf::from("/a.scss")],
        ..Default::default()
    };
    scope.merge(ChangeScope {
        scripts: true,
        paths: vec![PathBuf::from("/a.scss"), PathBuf::from("/b.js")],
        ..Default::default()
    });

    assert!(scope.styles && scope.scripts && !scope.templates);
    assert_eq!(scope.paths.len(), 2);
    assert_eq!(
        scope.tasks(),
        [TaskId::Styles, TaskId::Scripts, TaskId::CacheBust]
    );
    assert_eq!(scope.describe(), "styles, scripts (2 files)");
}

#[test]
fn test_scope_describe_single_file() {
    let scope = ChangeScope {
        templates: true,
        paths: vec![PathBuf::from("/views/home.blade.php")],
        ..Default::default()
    };
    assert_eq!(scope.describe(), "templates (home.blade.php)");
    assert!(ChangeScope::default().is_empty());
}

// ============================================================================
// self-writes
// ============================================================================

#[test]
fn test_self_write_suppressed_once() {
    let dir = TempDir::new().unwrap();
    let template = touch(&crate::utils::path::normalize_path(dir.path()).join("home.php"));

    let mut writes = SelfWrites::default();
    writes.record(vec![template.clone()]);

    let mut changes = batch(&[(&template, ChangeKind::Modified)]);
    writes.filter(&mut changes);
    assert!(changes.is_empty());

    // the record is consumed
    let mut changes = batch(&[(&template, ChangeKind::Modified)]);
    writes.filter(&mut changes);
    assert_eq!(changes.len(), 1);
}

#[test]
fn test_edit_after_self_write_passes() {
    let dir = TempDir::new().unwrap();
    let template = touch(&crate::utils::path::normalize_path(dir.path()).join("home.php"));

    let mut writes = SelfWrites::default();
    writes.record(vec![template.clone()]);

    let later = SystemTime::now() + Duration::from_secs(60);
    std::fs::File::options()
        .write(true)
        .open(&template)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let other = touch(&dir.path().join("other.php"));
    let mut changes = batch(&[
        (&template, ChangeKind::Modified),
        (&other, ChangeKind::Modified),
    ]);
    writes.filter(&mut changes);
    assert_eq!(changes.len(), 2);
}
