//! End-to-end checks of the `sortkit` binary: exit codes and output.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn run_sortkit(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sortkit"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn sortkit")
}

fn write_text(path: &Path, txt: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    std::fs::write(path, txt).expect("write text");
}

#[test]
fn sorts_tree_and_prints_done() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("out");
    write_text(&src.join("a/report.TXT"), "r");
    write_text(&src.join("a/b/image.png"), "i");
    write_text(&src.join("LICENSE"), "l");

    let output = run_sortkit(&[&src, &dst]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Done."));
    assert!(dst.join("txt/report.TXT").is_file());
    assert!(dst.join("png/image.png").is_file());
    assert!(dst.join("no_extension/LICENSE").is_file());
}

#[test]
fn default_destination_is_dist_in_working_directory() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let work = tmp.path().join("work");
    write_text(&src.join("a.txt"), "a");
    std::fs::create_dir_all(&work).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sortkit"))
        .arg(&src)
        .current_dir(&work)
        .output()
        .expect("spawn sortkit");
    assert_eq!(output.status.code(), Some(0));
    assert!(work.join("dist/txt/a.txt").is_file());
}

#[test]
fn destination_equal_to_source_exits_2_without_writes() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    write_text(&src.join("a.txt"), "a");

    let output = run_sortkit(&[&src, &src]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("avoid recursion"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Done."));
    assert!(!src.join("txt").exists());
}

#[test]
fn missing_source_exits_2() {
    let tmp = tempdir().unwrap();
    let output = run_sortkit(&[&tmp.path().join("missing"), &tmp.path().join("out")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid source"));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn uncreatable_destination_exits_2() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    write_text(&src.join("a.txt"), "a");
    let blocker = tmp.path().join("blocker");
    write_text(&blocker, "x");

    let output = run_sortkit(&[&src, &blocker.join("out")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to create destination"));
}

#[test]
fn per_file_failures_still_exit_0() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("out");
    write_text(&src.join("a.txt"), "a");
    write_text(&src.join("b.png"), "b");
    // A file where the `txt` bucket should go.
    write_text(&dst.join("txt"), "blocker");

    let output = run_sortkit(&[&src, &dst]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Done."));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bucket path exists"));
    assert!(dst.join("png/b.png").is_file());
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_reports_error_and_exits_0() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("out");
    let locked = src.join("locked");
    write_text(&locked.join("hidden.txt"), "h");
    write_text(&src.join("open/visible.txt"), "v");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    if std::fs::read_dir(&locked).is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("skipped: directory permissions are not enforced for this user");
        return;
    }

    let output = run_sortkit(&[&src, &dst]);
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Done."));
    assert!(String::from_utf8_lossy(&output.stderr).contains("locked"));
    assert!(dst.join("txt/visible.txt").is_file());
}

#[test]
fn errors_are_printed_even_when_logging_is_silenced() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("out");
    write_text(&src.join("a.txt"), "a");
    write_text(&dst.join("txt"), "blocker");

    let output = Command::new(env!("CARGO_BIN_EXE_sortkit"))
        .arg(&src)
        .arg(&dst)
        .env("RUST_LOG", "off")
        .output()
        .expect("spawn sortkit");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[copy]"));
}

#[cfg(unix)]
#[test]
fn symlinked_destination_root_exits_2() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst_real = tmp.path().join("real_out");
    let dst_link = tmp.path().join("out");
    write_text(&src.join("a.txt"), "a");
    std::fs::create_dir_all(&dst_real).unwrap();
    std::os::unix::fs::symlink(&dst_real, &dst_link).unwrap();

    let output = run_sortkit(&[&src, &dst_link]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("symbolic link"));
    assert_eq!(std::fs::read_dir(&dst_real).unwrap().count(), 0);
}
