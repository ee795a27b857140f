//! vync-drv - Compiler driver.
//!
//! Orchestrates one synchronous, single-threaded compilation:
//!
//! ```text
//! source text -> Lexer -> tokens -> Parser -> Module AST
//!             -> SemanticAnalyzer (diagnostics)
//!             -> CodeGenerator -> verify -> textual LLVM IR
//! ```
//!
//! Lexical and syntactic errors are fatal and abort the pipeline with the
//! first diagnostic. Semantic and code-generation diagnostics accumulate;
//! they are all printed to standard error, one per line, as
//!
//! ```text
//! Error at <file>:<line>:<column>: <message>
//! ```
//!
//! and the driver exits non-zero if any were errors.
//!
//! The command-line surface is the minimum contract: one optional file
//! path (standard input when absent), `-o <path>` for the IR output, and
//! `--test` to run the built-in smoke tests.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context as _};
use inkwell::context::Context;

use vync_gen::CodeGenerator;
use vync_lex::tokenize;
use vync_par::Parser;
use vync_sem::SemanticAnalyzer;
use vync_util::{FileId, Handler, SourceMap};

/// Compiler configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input source file; `None` reads standard input.
    pub input: Option<PathBuf>,

    /// Where the textual IR is written.
    pub output: PathBuf,

    /// `--test`: run the built-in smoke tests instead of compiling.
    pub run_tests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: None,
            output: PathBuf::from("out.ll"),
            run_tests: false,
        }
    }
}

impl Config {
    /// Parse command-line arguments (without the program name).
    pub fn from_args(args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = Config::default();
        let mut args = args;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--test" => config.run_tests = true,
                "-o" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("'-o' expects an output path"))?;
                    config.output = PathBuf::from(path);
                },
                other if other.starts_with('-') => {
                    bail!("unknown option '{}'", other);
                },
                positional => {
                    if config.input.is_some() {
                        bail!("only one input file is accepted");
                    }
                    config.input = Some(PathBuf::from(positional));
                },
            }
        }

        Ok(config)
    }
}

/// State for one compiler invocation.
pub struct Session {
    /// Configuration.
    pub config: Config,

    /// All loaded source files.
    pub sources: SourceMap,

    /// Accumulating diagnostic handler shared by the analysis and
    /// code-generation phases.
    pub handler: Handler,
}

impl Session {
    /// Create a session.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: SourceMap::new(),
            handler: Handler::new(),
        }
    }

    /// Run the session: compile, or run the smoke tests under `--test`.
    pub fn run(&mut self) -> anyhow::Result<()> {
        if self.config.run_tests {
            run_smoke_tests()
        } else {
            self.compile()
        }
    }

    /// Compile the configured input to textual IR.
    pub fn compile(&mut self) -> anyhow::Result<()> {
        let file = self.read_input()?;
        let source = self.sources.file(file).content.clone();
        let path = self.sources.path_of(file).display().to_string();

        // Phase 1: lexing. Fatal on the first error.
        let tokens = tokenize(&source, file).map_err(|e| anyhow!("{}", e))?;

        // Phase 2: parsing. Fatal, pinned to the offending token.
        let module = Parser::new(tokens).parse_module().map_err(|e| {
            anyhow!(
                "Error at {}:{}:{}: {}",
                path,
                e.loc.line,
                e.loc.column,
                e.message
            )
        })?;

        // Phase 3: semantic analysis. Best-effort, accumulating.
        SemanticAnalyzer::new(&self.handler).analyze(&module);

        // Phase 4: code generation, even when analysis reported errors;
        // the generator defends against ill-typed trees and surfaces its
        // own diagnostics.
        let context = Context::create();
        let module_name = self
            .config
            .input
            .as_ref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("main");
        let mut generator = CodeGenerator::new(&context, module_name, &self.handler);
        generator.compile_module(&module);

        self.print_diagnostics();
        if self.handler.has_errors() {
            bail!(
                "compilation failed with {} error(s)",
                self.handler.error_count()
            );
        }

        generator
            .verify()
            .context("module verification failed")?;
        generator
            .write_ir_to_file(&self.config.output)
            .with_context(|| format!("writing {}", self.config.output.display()))?;

        Ok(())
    }

    fn read_input(&mut self) -> anyhow::Result<FileId> {
        match &self.config.input {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Ok(self.sources.add_file(path.clone(), content))
            },
            None => {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("reading standard input")?;
                Ok(self.sources.add_file("<stdin>", content))
            },
        }
    }

    /// Render every accumulated diagnostic, one line each.
    fn print_diagnostics(&self) {
        for diagnostic in self.handler.diagnostics() {
            let path = self.sources.path_of(diagnostic.loc.file).display();
            eprintln!(
                "{} at {}:{}:{}: {}",
                diagnostic.level,
                path,
                diagnostic.loc.line,
                diagnostic.loc.column,
                diagnostic.message
            );
        }
    }
}

/// Entry point used by the `vync` binary.
pub fn main() -> anyhow::Result<()> {
    let config = Config::from_args(std::env::args().skip(1))?;
    Session::new(config).run()
}

/// Compile a source string all the way to verified textual IR.
///
/// This is the in-memory pipeline used by the smoke tests and the
/// integration tests; it is identical to [`Session::compile`] minus file
/// I/O.
pub fn compile_to_ir(source: &str, name: &str) -> anyhow::Result<String> {
    let mut sources = SourceMap::new();
    let file = sources.add_file(name, source.to_string());

    let tokens = tokenize(source, file).map_err(|e| anyhow!("{}", e))?;
    let module = Parser::new(tokens).parse_module().map_err(|e| {
        anyhow!(
            "Error at {}:{}:{}: {}",
            name,
            e.loc.line,
            e.loc.column,
            e.message
        )
    })?;

    let handler = Handler::new();
    SemanticAnalyzer::new(&handler).analyze(&module);

    let context = Context::create();
    let mut generator = CodeGenerator::new(&context, name, &handler);
    generator.compile_module(&module);

    if handler.has_errors() {
        let rendered: Vec<String> = handler
            .diagnostics()
            .into_iter()
            .map(|d| {
                format!(
                    "{} at {}:{}:{}: {}",
                    d.level, name, d.loc.line, d.loc.column, d.message
                )
            })
            .collect();
        bail!("{}", rendered.join("\n"));
    }

    generator.verify().map_err(|e| anyhow!("{}", e))?;
    Ok(generator.emit_ir())
}

/// The built-in smoke tests behind `--test`: a handful of end-to-end
/// programs compiled in memory, with pass/fail reporting.
pub fn run_smoke_tests() -> anyhow::Result<()> {
    struct Case {
        name: &'static str,
        source: &'static str,
        should_compile: bool,
    }

    let cases = [
        Case {
            name: "indented_function",
            source: "\nfn main()\n  const x = 1\n",
            should_compile: true,
        },
        Case {
            name: "braced_function",
            source: "fn main() {\n  const x = 1\n}\n",
            should_compile: true,
        },
        Case {
            name: "arithmetic",
            source: "fn calc(a: Int, b: Int) -> Int { return a + b * 2 }\n",
            should_compile: true,
        },
        Case {
            name: "if_else",
            source: "fn pick(x: Int) -> Int {\n  var r = 0\n  if x { r = 1 } else { r = 2 }\n  return r\n}\n",
            should_compile: true,
        },
        Case {
            name: "tab_rejected",
            source: "\nfn main()\n\tconst x = 1\n",
            should_compile: false,
        },
        Case {
            name: "undeclared_identifier",
            source: "fn f() -> Int { return missing }\n",
            should_compile: false,
        },
    ];

    let mut failures = 0usize;
    for case in &cases {
        let outcome = compile_to_ir(case.source, case.name);
        let passed = outcome.is_ok() == case.should_compile;
        if passed {
            eprintln!("test {} ... ok", case.name);
        } else {
            failures += 1;
            match outcome {
                Ok(_) => eprintln!("test {} ... FAILED (compiled unexpectedly)", case.name),
                Err(e) => eprintln!("test {} ... FAILED ({})", case.name, e),
            }
        }
    }

    if failures > 0 {
        bail!("{} smoke test(s) failed", failures);
    }
    eprintln!("all {} smoke tests passed", cases.len());
    Ok(())
}
