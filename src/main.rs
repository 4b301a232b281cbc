use anyhow::Context;
use clap::{Parser, Subcommand};
use joosc::analyzer::dump_parse_tree;
use joosc::{AnalyzeError, Analyzer, Settings};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "joosc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Semantic analyzer for the Joos 1W subset of Java")]
struct Cli {
    /// Override the standard-library directory
    #[arg(long, global = true, env = "JOOSC_STDLIB_PATH")]
    stdlib: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one compilation consisting of the given source files
    Check {
        /// Source files forming the compilation unit set
        files: Vec<PathBuf>,

        /// Report the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Run directories of test cases (files and subdirectories); cases named
    /// Je* are expected to be rejected
    Suite {
        /// Test directories
        dirs: Vec<PathBuf>,

        /// Only report failures
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the parse tree of each file
    Parse { files: Vec<PathBuf> },

    /// Show the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("warning: failed to load configuration: {e}");
        Settings::default()
    });
    if let Some(stdlib) = &cli.stdlib {
        settings.stdlib_path = stdlib.clone();
    }
    joosc::logging::init_with_config(&settings.logging);

    match run(cli.command, &settings) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands, settings: &Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Check { files, json } => check(settings, &files, json),
        Commands::Suite { dirs, quiet } => suite(settings, &dirs, quiet),
        Commands::Parse { files } => {
            for file in files {
                let dump = dump_parse_tree(&file)?;
                println!("{dump}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(settings).context("failed to render configuration")?;
            print!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn analyze(stdlib: &Analyzer, files: &[PathBuf]) -> Result<(), AnalyzeError> {
    let mut analyzer = stdlib.fork()?;
    for file in files {
        analyzer.add_file(file)?;
    }
    analyzer.check()
}

fn check(settings: &Settings, files: &[PathBuf], json: bool) -> anyhow::Result<ExitCode> {
    let stdlib = Analyzer::with_stdlib(&settings.stdlib_path)
        .with_context(|| format!("failed to load stdlib from {}", settings.stdlib_path.display()))?;

    match analyze(&stdlib, files) {
        Ok(()) => {
            if json {
                println!("{}", serde_json::json!({ "outcome": "accepted" }));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "outcome": "rejected", "error": err.to_string() })
                );
            } else {
                eprintln!("{err}");
            }
            Ok(ExitCode::from(err.exit_code() as u8))
        }
    }
}

/// One test case: a single file, or every file under a subdirectory.
struct TestCase {
    name: String,
    files: Vec<PathBuf>,
}

impl TestCase {
    fn expects_rejection(&self) -> bool {
        if self.name.starts_with("Je") {
            return true;
        }
        self.files
            .first()
            .and_then(|f| f.file_name())
            .is_some_and(|n| n.to_string_lossy().starts_with("Je"))
    }
}

fn collect_cases(dir: &Path) -> anyhow::Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read test directory {}", dir.display()))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    entries.sort();

    for entry in entries {
        let name = entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if entry.is_file() {
            if entry.extension().is_some_and(|ext| ext == "java") {
                cases.push(TestCase {
                    name,
                    files: vec![entry],
                });
            }
        } else if entry.is_dir() {
            let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&entry)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
                .map(|e| e.into_path())
                .collect();
            files.sort();
            if !files.is_empty() {
                cases.push(TestCase { name, files });
            }
        }
    }
    Ok(cases)
}

fn suite(settings: &Settings, dirs: &[PathBuf], quiet: bool) -> anyhow::Result<ExitCode> {
    let stdlib = Analyzer::with_stdlib(&settings.stdlib_path)
        .with_context(|| format!("failed to load stdlib from {}", settings.stdlib_path.display()))?;

    let mut cases = Vec::new();
    for dir in dirs {
        cases.extend(collect_cases(dir)?);
    }
    let total = cases.len();
    let mut passed = 0;
    let mut failures = Vec::new();

    for case in &cases {
        let result = analyze(&stdlib, &case.files);
        match (result, case.expects_rejection()) {
            (Err(_), true) | (Ok(()), false) => {
                passed += 1;
                if !quiet {
                    println!("passed {}", case.name);
                }
            }
            (Ok(()), true) => {
                println!("FAILED {} (should have been rejected)", case.name);
                failures.push(case.name.clone());
            }
            (Err(err), false) => {
                println!("FAILED {} (should have been accepted): {err}", case.name);
                failures.push(case.name.clone());
            }
        }
    }

    println!("passed {passed}/{total}");
    if failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        println!("failed: {}", failures.join(", "));
        Ok(ExitCode::FAILURE)
    }
}
