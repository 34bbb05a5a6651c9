use std::fs::{create_dir_all, File};
use std::io::Write;

use tempfile::tempdir;

use fast_load::error::ConfigError;
use fast_load::walk::enumerate_tasks;

fn touch(path: &std::path::Path, content: &str) {
    let mut f = File::create(path).unwrap();
    writeln!(f, "{content}").unwrap();
}

#[test]
fn enumerates_every_regular_file_exactly_once() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("sub/deeper")).unwrap();

    touch(&root.join("a.txt"), "a");
    touch(&root.join("b.txt"), "b");
    touch(&root.join("sub/c.txt"), "c");
    touch(&root.join("sub/deeper/d.txt"), "d");

    let tasks = enumerate_tasks(root, "123").expect("enumeration should succeed");

    let mut paths: Vec<_> = tasks.iter().map(|t| t.local_path.clone()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            root.join("a.txt"),
            root.join("b.txt"),
            root.join("sub/c.txt"),
            root.join("sub/deeper/d.txt"),
        ]
    );
    assert!(tasks.iter().all(|t| t.destination_folder_id == "123"));
}

#[test]
fn enumeration_order_is_deterministic_across_runs() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("zz")).unwrap();
    create_dir_all(root.join("aa")).unwrap();
    touch(&root.join("middle.txt"), "m");
    touch(&root.join("zz/last.txt"), "l");
    touch(&root.join("aa/first.txt"), "f");

    let first = enumerate_tasks(root, "123").unwrap();
    let second = enumerate_tasks(root, "123").unwrap();
    assert_eq!(first, second);
}

#[test]
fn skips_ds_store_files() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("keep.txt"), "keep");
    touch(&root.join(".DS_Store"), "junk");

    let tasks = enumerate_tasks(root, "123").unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].local_path, root.join("keep.txt"));
}

#[test]
fn directories_themselves_are_not_tasks() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("only/dirs/here")).unwrap();

    let tasks = enumerate_tasks(root, "123").unwrap();
    assert!(tasks.is_empty());
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    use std::os::unix::fs::symlink;

    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("real")).unwrap();
    touch(&root.join("real/file.txt"), "real");
    symlink(root.join("real/file.txt"), root.join("link.txt")).unwrap();
    symlink(root.join("real"), root.join("linkdir")).unwrap();

    let tasks = enumerate_tasks(root, "123").unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].local_path, root.join("real/file.txt"));
}

#[test]
fn missing_root_is_a_configuration_error() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("does-not-exist");

    let err = enumerate_tasks(&missing, "123").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSourceRoot(_)));
}

#[test]
fn file_root_is_a_configuration_error() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("plain.txt");
    touch(&file, "not a directory");

    let err = enumerate_tasks(&file, "123").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSourceRoot(_)));
}
