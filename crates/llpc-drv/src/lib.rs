//! Compiler driver (§6): command-line parsing, pipeline orchestration, and
//! exit-code mapping for the `llpc` binary.
//!
//! The pipeline is a straight line with no branching back: lex, parse,
//! analyze, plan stack frames, emit LLVM IR, then either print an
//! intermediate artifact (`-i`/`-f`) or write `<stem>.imm`/`<stem>.asm` and
//! link an executable. Each phase owns the AST/handler it's given and hands
//! off to the next; there is no shared mutable session state beyond the
//! `Handler` that accumulates diagnostics across all of them.

use std::io::Read as _;
use std::path::{Path, PathBuf};

use clap::Parser as ClapParser;
use inkwell::context::Context;
use inkwell::targets::{InitializationConfig, Target, TargetMachine};
use inkwell::OptimizationLevel;

use llpc_util::diagnostic::Diagnostic;
use llpc_util::Handler;

/// Command-line configuration, parsed by `clap` from `std::env::args`.
#[derive(ClapParser, Debug)]
#[command(name = "llpc", about = "Compiler for the language described in the project's spec")]
pub struct Config {
    /// Source file to compile. Omitted when reading from standard input
    /// with `-f`/`-i`.
    pub source: Option<PathBuf>,

    /// Enable back-end optimization passes.
    #[arg(short = 'O', long = "optimize")]
    pub optimize: bool,

    /// Read source from standard input, emit assembly to standard output.
    #[arg(short = 'f', conflicts_with = "intermediate")]
    pub assembly_to_stdout: bool,

    /// Read source from standard input, emit LLVM IR text to standard output.
    #[arg(short = 'i', conflicts_with = "assembly_to_stdout")]
    pub intermediate: bool,

    /// Raise logging verbosity to `debug`.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Config {
    /// Parses `args` (the full `argv`, including `argv[0]`) into a `Config`,
    /// reporting `clap`'s own usage errors as [`DriverError::Usage`].
    pub fn parse_from<I, T>(args: I) -> Result<Config, DriverError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Config as ClapParser>::try_parse_from(args).map_err(|e| DriverError::Usage(e.to_string()))
    }

    fn reads_stdin(&self) -> bool {
        self.assembly_to_stdout || self.intermediate
    }

    fn validate(&self) -> Result<(), DriverError> {
        if self.reads_stdin() && self.source.is_some() {
            return Err(DriverError::Usage(
                "a source file path cannot be combined with -f or -i".to_string(),
            ));
        }
        if !self.reads_stdin() && self.source.is_none() {
            return Err(DriverError::Usage("missing source file path".to_string()));
        }
        Ok(())
    }

    fn opt_level(&self) -> OptimizationLevel {
        if self.optimize {
            OptimizationLevel::Default
        } else {
            OptimizationLevel::None
        }
    }
}

/// Errors the driver can report, each mapping to one of the three exit
/// codes in §6.
#[derive(Debug)]
pub enum DriverError {
    /// Bad flags or a missing input path. Exit code 2.
    Usage(String),
    /// A lexical, syntactic, semantic, or internal error was reported
    /// through the diagnostic handler. Exit code 1.
    Compilation,
    /// A file could not be read or written. Exit code 1.
    Io(PathBuf, std::io::Error),
    /// Code generation or linking failed for a reason that isn't a
    /// diagnostic (an internal compiler error). Exit code 1.
    Internal(String),
}

impl DriverError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Usage(_) => 2,
            DriverError::Compilation | DriverError::Io(..) | DriverError::Internal(_) => 1,
        }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Usage(msg) => write!(f, "{msg}"),
            DriverError::Compilation => write!(f, "compilation failed"),
            DriverError::Io(path, e) => write!(f, "{}: {e}", path.display()),
            DriverError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<llpc_gen::CodeGenError> for DriverError {
    fn from(e: llpc_gen::CodeGenError) -> Self {
        DriverError::Internal(e.to_string())
    }
}

/// Entry point called by `main.rs`: parses `argv`, runs the session, and
/// returns the error the binary should report and map to an exit code.
pub fn main() -> Result<(), DriverError> {
    let config = Config::parse_from(std::env::args())?;
    init_tracing(config.verbose);
    config.validate()?;
    Session::new(config).run()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

/// One compiler invocation: owns the config and drives lex → parse →
/// analyze → plan → emit → (print or link), matching §5's single-threaded,
/// phase-sequential execution model.
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<(), DriverError> {
        let source = self.read_source()?;
        let mut handler = Handler::new();

        let ast = self.parse_phase(&source, &mut handler)?;
        println!("Successful parsing");

        self.analyze_phase(&ast, &mut handler)?;
        println!("Semantically correct");

        let frames = llpc_frame::plan(&ast);

        Target::initialize_all(&InitializationConfig::default());
        let target_triple = TargetMachine::get_default_triple().as_str().to_string_lossy().into_owned();

        let context = Context::create();
        let codegen = llpc_gen::emit(&context, &ast, &frames, "main", target_triple.clone(), self.config.opt_level())?;

        if self.config.intermediate {
            print!("{}", codegen.emit_llvm_ir());
            return Ok(());
        }

        if self.config.assembly_to_stdout {
            let tmp = tempfile_path("asm");
            codegen.write_asm_file(&tmp)?;
            self.print_and_remove(&tmp)?;
            return Ok(());
        }

        self.write_artifacts_and_link(&codegen, &target_triple)
    }

    fn read_source(&self) -> Result<String, DriverError> {
        match &self.config.source {
            Some(path) => std::fs::read_to_string(path).map_err(|e| DriverError::Io(path.clone(), e)),
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| DriverError::Io(PathBuf::from("<stdin>"), e))?;
                Ok(buf)
            }
        }
    }

    fn parse_phase(&self, source: &str, handler: &mut Handler) -> Result<llpc_par::Ast, DriverError> {
        tracing::debug!("lexing");
        let mut lexer = llpc_lex::Lexer::new(source, handler);
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != llpc_lex::Token::Eof)
            .collect();

        tracing::debug!("parsing");
        let ast = llpc_par::parse(tokens, handler);

        report_diagnostics(handler);
        if handler.has_errors() || ast.is_none() {
            return Err(DriverError::Compilation);
        }

        Ok(ast.expect("checked above"))
    }

    fn analyze_phase(&self, ast: &llpc_par::Ast, handler: &mut Handler) -> Result<(), DriverError> {
        tracing::debug!("semantic analysis");
        llpc_sem::analyze(ast, handler);
        report_diagnostics(handler);
        if handler.has_errors() {
            return Err(DriverError::Compilation);
        }
        Ok(())
    }

    fn print_and_remove(&self, path: &Path) -> Result<(), DriverError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DriverError::Io(path.to_path_buf(), e))?;
        print!("{contents}");
        let _ = std::fs::remove_file(path);
        Ok(())
    }

    fn write_artifacts_and_link(&self, codegen: &llpc_gen::CodeGenerator<'_>, target_triple: &str) -> Result<(), DriverError> {
        let source_path = self.config.source.as_ref().expect("validated: present outside -f/-i");
        let stem = source_path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
        let dir = source_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));

        let imm_path = dir.join(format!("{stem}.imm"));
        let asm_path = dir.join(format!("{stem}.asm"));

        tracing::debug!(path = %imm_path.display(), "writing IR file");
        codegen.write_ir_to_file(&imm_path).map_err(|e| DriverError::Io(imm_path.clone(), e))?;

        tracing::debug!(path = %asm_path.display(), "writing assembly file");
        codegen.write_asm_file(&asm_path)?;

        let obj_path = tempfile_path("o");
        codegen.write_object_file(&obj_path)?;

        let runtime_lib_dir = runtime_library_dir();
        let linker = llpc_gen::Linker::new(target_triple.to_string());
        let output = Path::new("a.out");
        tracing::debug!(output = %output.display(), "linking");
        linker.link(&obj_path, output, &runtime_lib_dir)?;

        let _ = std::fs::remove_file(&obj_path);
        Ok(())
    }
}

/// The directory `cargo` places this workspace's build artifacts in,
/// assumed to be the same directory the running `llpc` binary lives in:
/// `llpc-runtime`'s staticlib is built as a sibling artifact of this binary.
fn runtime_library_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn tempfile_path(extension: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let unique = std::process::id();
    path.push(format!("llpc-{unique}.{extension}"));
    path
}

/// Prints every accumulated diagnostic to standard error, one per line,
/// with its notes and help text indented underneath.
fn report_diagnostics(handler: &Handler) {
    for diag in handler.diagnostics() {
        print_diagnostic(&diag);
    }
}

fn print_diagnostic(diag: &Diagnostic) {
    eprintln!("{}: {}", diag.level, diag.message);
    for note in &diag.notes {
        eprintln!("  note: {note}");
    }
    for help in &diag.helps {
        eprintln!("  help: {help}");
    }
    for snippet in &diag.snippets {
        eprintln!("{}", snippet.format());
    }
}
