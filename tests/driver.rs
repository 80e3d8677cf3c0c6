use std::{fs, path::PathBuf, process::Command};

use cfe::{
    DriverError, LexError, LoadError, TokenKind, driver,
    options::{CompileOptions, Invocation, parse_arguments},
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn options(paths: &[PathBuf], dump_tokens: bool) -> CompileOptions {
    let mut options = CompileOptions {
        dump_tokens,
        ..CompileOptions::default()
    };
    for path in paths {
        options.input_paths.push(path.clone());
    }
    options
}

#[test]
fn lexes_c_files_and_skips_others() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(&dir, "main.c", "int main(void) { return 0; }\n");
    let object = write(&dir, "util.o", "\u{7f}ELF");

    let mut out = Vec::new();
    let summary = driver::run(&options(&[main, object], false), &mut out).unwrap();
    assert_eq!((summary.lexed, summary.skipped), (1, 1));
    assert!(summary.succeeded());
    assert!(out.is_empty());
}

#[test]
fn missing_file_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.c");
    let present = write(&dir, "present.c", "char c = 'x';");

    let mut out = Vec::new();
    let summary = driver::run(&options(&[missing.clone(), present], true), &mut out).unwrap();
    assert_eq!(summary.lexed, 1);
    assert!(!summary.succeeded());
    assert!(matches!(
        &summary.failures[..],
        [LoadError::NoSuchFile { path }] if *path == missing
    ));
    let dumped = String::from_utf8(out).unwrap();
    assert!(dumped.contains("CharLit\tx"));
}

#[test]
fn every_unloadable_input_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.c");
    let folder = dir.path().join("folder.c");
    fs::create_dir(&folder).unwrap();
    let present = write(&dir, "present.c", "int x;");

    let mut out = Vec::new();
    let inputs = [missing.clone(), folder.clone(), present];
    let summary = driver::run(&options(&inputs, false), &mut out).unwrap();
    assert_eq!(summary.lexed, 1);
    let failed: Vec<_> = summary
        .failures
        .iter()
        .map(|failure| match failure {
            LoadError::NoSuchFile { path } | LoadError::Io { path, .. } => path.clone(),
        })
        .collect();
    assert_eq!(failed, [missing, folder]);
}

#[test]
fn lex_failure_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(&dir, "broken.c", "char *s = \"abc;\n");
    let after = write(&dir, "after.c", "int x;");

    let mut out = Vec::new();
    let error = driver::run(&options(&[broken.clone(), after], true), &mut out).unwrap_err();
    match error {
        DriverError::Lex { path, error, .. } => {
            assert_eq!(path, broken);
            assert!(matches!(error, LexError::UnterminatedStringLiteral { .. }));
            assert_eq!(error.range().begin_col, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.is_empty());
}

#[test]
fn dumped_tokens_follow_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "a.c", "x == 1");
    let Ok(Invocation::Compile(options)) =
        parse_arguments(["cfe", "--dump-tokens", path.to_str().unwrap()])
    else {
        panic!("expected compile options");
    };

    let mut out = Vec::new();
    driver::run(&options, &mut out).unwrap();
    let dumped = String::from_utf8(out).unwrap();
    let kinds: Vec<&str> = dumped
        .lines()
        .skip(1)
        .map(|line| line.split('\t').nth(1).unwrap())
        .collect();
    assert_eq!(kinds, ["Ident", "EqEq", "IntLit", "Eof"]);
    assert_eq!(format!("{:?}", TokenKind::EqEq), "EqEq");
}

fn cfe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cfe"))
}

#[test]
fn binary_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let good = write(&dir, "good.c", "struct s { int a[2]; };");
    let bad = write(&dir, "bad.c", "int @;");

    let help = cfe().output().unwrap();
    assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("Usage"));

    let unknown = cfe().arg("-q").output().unwrap();
    assert_eq!(unknown.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("Usage"));

    assert_eq!(cfe().arg(&good).status().unwrap().code(), Some(0));
    assert_eq!(cfe().arg(&bad).output().unwrap().status.code(), Some(1));
    let missing = cfe().arg(dir.path().join("nope.c")).output().unwrap();
    assert_eq!(missing.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("no such file at path"));
}
