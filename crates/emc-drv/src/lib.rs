//! emc-drv - Compiler driver.
//!
//! Entry point and orchestrator for the pipeline: argument parsing, file
//! I/O, stage sequencing, diagnostic printing, and exit codes.
//!
//! The driver owns the single diagnostic [`Handler`] and checks
//! `has_errors()` after each stage; on failure it prints every diagnostic
//! with a source snippet, a summary line, and exits with code 1 before the
//! next stage runs. IR is handed to the back-end only when zero errors have
//! been reported and the module has verified.
//!
//! Exit codes: 0 on success; 1 on any compilation error or CLI-usage error
//! (usage errors print the usage text to stderr first).

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use inkwell::context::Context;
use inkwell::OptimizationLevel;

use emc_gen::CodeGenerator;
use emc_par::{Parser, Program, Stmt};
use emc_sem::Analyzer;
use emc_util::diagnostic::{render_diagnostic, render_summary};
use emc_util::{Handler, Span};

/// Optimization level forwarded to the back-end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptLevel {
    /// -O0: no optimization
    #[default]
    None,
    /// -O1: basic optimization
    Less,
    /// -O2: standard optimization
    Standard,
    /// -O3: aggressive optimization
    Aggressive,
}

impl From<OptLevel> for OptimizationLevel {
    fn from(level: OptLevel) -> Self {
        match level {
            OptLevel::None => OptimizationLevel::None,
            OptLevel::Less => OptimizationLevel::Less,
            OptLevel::Standard => OptimizationLevel::Default,
            OptLevel::Aggressive => OptimizationLevel::Aggressive,
        }
    }
}

/// One compiler invocation's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Source file
    pub input: PathBuf,
    /// Output file (defaults to the input with its extension replaced)
    pub output: PathBuf,
    pub opt_level: OptLevel,
    /// Emit textual IR (`.ll`) instead of an object file (`.o`)
    pub emit_llvm: bool,
    /// Verbose stage-by-stage diagnostics on stderr
    pub debug: bool,
}

/// Parsed command line: either a help request or a compilation config.
#[derive(Debug)]
pub enum CliAction {
    Help,
    Compile(Config),
}

/// Usage text printed by `--help` and on usage errors.
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {} <source_file> [options]\n\
         Options:\n\
         \x20 -o, --output <file>     Output file path\n\
         \x20 -O0, -O1, -O2, -O3      Optimization level\n\
         \x20 --emit-llvm             Emit textual LLVM IR instead of an object file\n\
         \x20 --debug                 Enable verbose stage-by-stage output\n\
         \x20 -h, --help              Show this help message",
        program
    )
}

/// Parses command-line arguments (without the program name).
pub fn parse_args(args: &[String]) -> std::result::Result<CliAction, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut opt_level = OptLevel::default();
    let mut emit_llvm = false;
    let mut debug = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-o" | "--output" => match iter.next() {
                Some(path) => output = Some(PathBuf::from(path)),
                None => return Err(format!("option {} requires an argument", arg)),
            },
            "-O0" => opt_level = OptLevel::None,
            "-O1" => opt_level = OptLevel::Less,
            "-O2" => opt_level = OptLevel::Standard,
            "-O3" => opt_level = OptLevel::Aggressive,
            "--emit-llvm" => emit_llvm = true,
            "--debug" => debug = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            },
            other => {
                if input.is_some() {
                    return Err("multiple input files are not supported".to_string());
                }
                input = Some(PathBuf::from(other));
            },
        }
    }

    let input = input.ok_or_else(|| "no input file specified".to_string())?;
    let output = output.unwrap_or_else(|| {
        input.with_extension(if emit_llvm { "ll" } else { "o" })
    });

    Ok(CliAction::Compile(Config {
        input,
        output,
        opt_level,
        emit_llvm,
        debug,
    }))
}

/// Full CLI entry point; returns the process exit code.
pub fn run(argv: &[String]) -> i32 {
    let program = argv.first().map(String::as_str).unwrap_or("emc");

    match parse_args(argv.get(1..).unwrap_or(&[])) {
        Ok(CliAction::Help) => {
            println!("{}", usage(program));
            0
        },
        Ok(CliAction::Compile(config)) => match compile(&config) {
            Ok(true) => 0,
            Ok(false) => 1,
            Err(error) => {
                eprintln!("error: {:#}", error);
                1
            },
        },
        Err(message) => {
            eprintln!("error: {}", message);
            eprintln!("{}", usage(program));
            1
        },
    }
}

/// Runs the pipeline for one source file.
///
/// Returns `Ok(true)` on success, `Ok(false)` when diagnostics stopped the
/// compilation (they have been printed), and `Err` for fatal conditions
/// (unreadable input, unwritable output, verification failure).
pub fn compile(config: &Config) -> Result<bool> {
    let source = std::fs::read_to_string(&config.input)
        .with_context(|| format!("could not open file: {}", config.input.display()))?;

    let handler = Handler::new();

    // Stage 1: lexical analysis
    if config.debug {
        eprintln!("[emc] lexing {}", config.input.display());
    }
    let tokens = emc_lex::Lexer::new(&source, &handler).tokenize();
    if handler.has_errors() {
        report(&handler, &source);
        return Ok(false);
    }

    // Stage 2: parsing
    if config.debug {
        eprintln!("[emc] parsing ({} tokens)", tokens.len());
    }
    let program = Parser::new(tokens, &handler).parse();
    if handler.has_errors() {
        report(&handler, &source);
        return Ok(false);
    }

    // Stage 3: semantic analysis
    if config.debug {
        eprintln!("[emc] analyzing ({} statements)", program.statements.len());
    }
    let mut analyzer = Analyzer::new(&handler);
    let analysis_ok = analyzer.analyze(&program);
    if !analysis_ok || handler.has_errors() {
        report(&handler, &source);
        return Ok(false);
    }

    // Executable output needs an entry point
    if !config.emit_llvm && !has_main(&program) {
        handler.error("missing main function", Span::DUMMY);
        report(&handler, &source);
        return Ok(false);
    }

    // Stage 4: code generation
    if config.debug {
        eprintln!("[emc] generating code");
    }
    let module_name = config
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("module");
    let context = Context::create();
    let mut generator = CodeGenerator::new(&context, module_name, config.opt_level.into());

    if let Err(error) = generator.generate(&program) {
        // Verification failures indicate a compiler bug and abort
        if matches!(error, emc_gen::CodeGenError::VerificationFailed(_)) {
            return Err(anyhow::anyhow!(error.to_string()));
        }
        handler.error(error.to_string(), Span::DUMMY);
        report(&handler, &source);
        return Ok(false);
    }

    // Stage 5: emission
    if config.emit_llvm {
        if config.debug {
            eprintln!("[emc] writing IR to {}", config.output.display());
        }
        generator
            .write_ir_file(&config.output)
            .with_context(|| format!("could not write file: {}", config.output.display()))?;
    } else {
        if config.debug {
            eprintln!("[emc] writing object file to {}", config.output.display());
        }
        generator
            .write_object_file(&config.output)
            .with_context(|| format!("could not write file: {}", config.output.display()))?;
    }

    // Surface accumulated warnings even on success
    if handler.warning_count() > 0 {
        report(&handler, &source);
    }

    Ok(true)
}

/// Prints every diagnostic with its source snippet, then the summary line.
fn report(handler: &Handler, source: &str) {
    for diagnostic in handler.diagnostics() {
        eprintln!("{}", render_diagnostic(&diagnostic, source));
    }
    eprintln!("{}", render_summary(handler));
}

fn has_main(program: &Program) -> bool {
    program
        .statements
        .iter()
        .any(|stmt| matches!(stmt, Stmt::FnDecl(f) if f.name == "main"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_help() {
        assert!(matches!(
            parse_args(&args(&["--help"])),
            Ok(CliAction::Help)
        ));
        assert!(matches!(parse_args(&args(&["-h"])), Ok(CliAction::Help)));
    }

    #[test]
    fn test_parse_no_input() {
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn test_parse_unknown_option() {
        assert!(parse_args(&args(&["--wat", "x.em"])).is_err());
    }

    #[test]
    fn test_parse_missing_output_argument() {
        assert!(parse_args(&args(&["x.em", "-o"])).is_err());
    }

    #[test]
    fn test_parse_multiple_inputs_rejected() {
        assert!(parse_args(&args(&["a.em", "b.em"])).is_err());
    }

    #[test]
    fn test_default_output_object() {
        match parse_args(&args(&["dir/prog.em"])) {
            Ok(CliAction::Compile(config)) => {
                assert_eq!(config.output, PathBuf::from("dir/prog.o"));
                assert!(!config.emit_llvm);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_default_output_llvm() {
        match parse_args(&args(&["prog.em", "--emit-llvm"])) {
            Ok(CliAction::Compile(config)) => {
                assert_eq!(config.output, PathBuf::from("prog.ll"));
                assert!(config.emit_llvm);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_explicit_output() {
        match parse_args(&args(&["prog.em", "-o", "out/custom.o"])) {
            Ok(CliAction::Compile(config)) => {
                assert_eq!(config.output, PathBuf::from("out/custom.o"));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_opt_levels() {
        for (flag, expected) in [
            ("-O0", OptLevel::None),
            ("-O1", OptLevel::Less),
            ("-O2", OptLevel::Standard),
            ("-O3", OptLevel::Aggressive),
        ] {
            match parse_args(&args(&[flag, "x.em"])) {
                Ok(CliAction::Compile(config)) => assert_eq!(config.opt_level, expected),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_debug_flag() {
        match parse_args(&args(&["x.em", "--debug"])) {
            Ok(CliAction::Compile(config)) => assert!(config.debug),
            other => panic!("unexpected {:?}", other),
        }
    }
}
