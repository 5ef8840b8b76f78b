//! CLI end-to-end tests.
//!
//! Each test writes a source file into a temp directory, runs the `emc`
//! binary against it, and checks exit code, stderr diagnostics, and the
//! produced artifacts. IR assertions go through `--emit-llvm` so no linker
//! is involved.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn emc() -> Command {
    Command::new(PathBuf::from(env!("CARGO_BIN_EXE_emc")))
}

/// Writes `source` as `<name>` inside `dir` and returns its path.
fn write_source(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).expect("failed to write source file");
    path
}

fn read_ir(path: &Path) -> String {
    std::fs::read_to_string(path).expect("failed to read emitted IR")
}

#[test]
fn test_help_exits_zero() {
    emc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_no_arguments_is_usage_error() {
    emc()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_option_is_usage_error() {
    emc()
        .arg("--frobnicate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown option"));
}

#[test]
fn test_missing_input_file() {
    emc()
        .arg("does_not_exist.em")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not open file"));
}

#[test]
fn test_emit_llvm_arithmetic() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "arith.em",
        "function main(): int32 { return 1 + 2 * 3; }\n",
    );
    let output = dir.path().join("arith.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let ir = read_ir(&output);
    assert!(ir.contains("define i32 @main"));
    assert!(ir.contains("ret i32 7") || (ir.contains("mul") && ir.contains("add")));
}

#[test]
fn test_default_output_path_replaces_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.em", "function main(): int32 { return 0; }\n");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .current_dir(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("prog.ll").exists());
}

#[test]
fn test_object_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.em", "function main(): int32 { return 0; }\n");
    let output = dir.path().join("prog.o");

    emc().arg(&input).arg("-o").arg(&output).assert().success();

    let bytes = std::fs::metadata(&output).expect("object file missing").len();
    assert!(bytes > 0, "object file is empty");
}

#[test]
fn test_shadowing_compiles() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "shadow.em",
        "let x: int32 = 1;\nfunction main(): int32 { let x: int32 = 2; return x; }\n",
    );
    let output = dir.path().join("shadow.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
}

#[test]
fn test_const_violation_reports_line() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "constviol.em",
        "const k: int32 = 1;\nfunction main(): int32 { k = 2; return 0; }\n",
    );

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot assign to const"))
        .stderr(predicate::str::contains("Error at 2:"))
        .stderr(predicate::str::contains("1 error"));
}

#[test]
fn test_undefined_identifier_no_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "undef.em",
        "function main(): int32 { return y; }\n",
    );
    let output = dir.path().join("undef.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("undefined identifier: y"));

    // No IR is emitted when the pipeline stopped
    assert!(!output.exists());
}

#[test]
fn test_return_type_mismatch() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "retmis.em",
        "function main(): int32 { return \"hi\"; }\n",
    );

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("return type mismatch"));
}

#[test]
fn test_syntax_error_reports_and_recovers() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "syntax.em",
        "let a = 1\nlet b = ;\nfunction main(): int32 { return 0; }\n",
    );

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("errors"));
}

#[test]
fn test_lexical_error_caret_snippet() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "lexerr.em",
        "function main(): int32 { let x@ = 1; return 0; }\n",
    );

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unexpected character '@'"))
        .stderr(predicate::str::contains("^"));
}

#[test]
fn test_missing_main_for_object_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "lib.em", "function helper(): int32 { return 1; }\n");

    emc()
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing main function"));
}

#[test]
fn test_missing_main_allowed_for_ir_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "lib.em", "function helper(): int32 { return 1; }\n");
    let output = dir.path().join("lib.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
}

#[test]
fn test_empty_source_emits_empty_module() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "empty.em", "");
    let output = dir.path().join("empty.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let ir = read_ir(&output);
    assert!(!ir.contains("define"));
}

#[test]
fn test_while_loop_blocks() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "loop.em",
        "function main(): int32 { let i: int32 = 0; while (i < 10) { i = i + 1; } return i; }\n",
    );
    let output = dir.path().join("loop.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let ir = read_ir(&output);
    assert!(ir.contains("while.cond"));
    assert!(ir.contains("while.body"));
    assert!(ir.contains("while.exit"));
}

#[test]
fn test_builtin_call_declares_extern() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "hello.em",
        "function main(): int32 { emlang_print_str(\"hello\"); emlang_println(); return 0; }\n",
    );
    let output = dir.path().join("hello.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let ir = read_ir(&output);
    assert!(ir.contains("declare void @emlang_print_str"));
    assert!(ir.contains("declare void @emlang_println"));
    assert!(ir.contains("hello"));
}

#[test]
fn test_optimization_levels_accepted() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "opt.em", "function main(): int32 { return 7; }\n");

    for flag in ["-O0", "-O1", "-O2", "-O3"] {
        let output = dir.path().join(format!("opt{}.ll", flag.trim_start_matches("-O")));
        emc()
            .arg(&input)
            .arg(flag)
            .arg("--emit-llvm")
            .arg("-o")
            .arg(&output)
            .assert()
            .success();
    }
}

#[test]
fn test_deterministic_ir_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "det.em",
        "function main(): int32 { let i: int32 = 0; for (; i < 4; i = i + 1) { } return i; }\n",
    );

    let out1 = dir.path().join("det1.ll");
    let out2 = dir.path().join("det2.ll");
    emc().arg(&input).arg("--emit-llvm").arg("-o").arg(&out1).assert().success();
    emc().arg(&input).arg("--emit-llvm").arg("-o").arg(&out2).assert().success();

    assert_eq!(read_ir(&out1), read_ir(&out2));
}

#[test]
fn test_debug_flag_prints_stages() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "dbg.em", "function main(): int32 { return 0; }\n");
    let output = dir.path().join("dbg.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("--debug")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("[emc] lexing"))
        .stderr(predicate::str::contains("[emc] generating code"));
}

#[test]
fn test_multiple_errors_accumulate() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "multi.em",
        "function main(): int32 { return a + b; }\n",
    );

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("undefined identifier: a"))
        .stderr(predicate::str::contains("undefined identifier: b"))
        .stderr(predicate::str::contains("2 errors"));
}

#[test]
fn test_extern_function_pipeline() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "ext.em",
        "extern function putchar(c: int32): int32;\nfunction main(): int32 { putchar(65); return 0; }\n",
    );
    let output = dir.path().join("ext.ll");

    emc()
        .arg(&input)
        .arg("--emit-llvm")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let ir = read_ir(&output);
    assert!(ir.contains("declare i32 @putchar"));
}
