use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the stream ETL workspace",
    long_about = "Runs CI checks and packages the producer, consumer and stream ETL\n\
                  Lambda binaries as deployable bootstrap zips."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
    /// Build Lambda binaries and zip each one as `bootstrap`
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Package a single function instead of all of them
        #[arg(value_enum, long)]
        function: Option<LambdaFunction>,
        /// Directory receiving the zip artifacts
        #[arg(long, env = "LAMBDA_DIST_DIR", default_value = "dist/lambda")]
        dist_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Unit and integration tests
    Test,
    /// Lint + test
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LambdaFunction {
    Producer,
    Consumer,
    StreamEtl,
}

impl LambdaFunction {
    const ALL: [LambdaFunction; 3] = [Self::Producer, Self::Consumer, Self::StreamEtl];

    fn bin_name(self) -> &'static str {
        match self {
            Self::Producer => "producer_lambda",
            Self::Consumer => "consumer_lambda",
            Self::StreamEtl => "stream_etl_lambda",
        }
    }

    fn zip_name(self) -> &'static str {
        match self {
            Self::Producer => "producer.zip",
            Self::Consumer => "consumer.zip",
            Self::StreamEtl => "stream_etl.zip",
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    exit(1);
}

// ── packaging ──────────────────────────────────────────────────────

fn package_lambdas(
    target: &str,
    profile: BuildProfile,
    functions: &[LambdaFunction],
    dist_dir: &Path,
) {
    check_target_installed(target);

    step("Build lambda binaries");
    let mut cargo_args = vec!["build", "-p", "stream_etl_lambda", "--target", target];
    for function in functions {
        cargo_args.push("--bin");
        cargo_args.push(function.bin_name());
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    if let Err(error) = fs::create_dir_all(dist_dir) {
        fail(&format!(
            "failed to create dist directory '{}': {error}",
            dist_dir.display()
        ));
    }

    let mut written = Vec::with_capacity(functions.len());
    for function in functions {
        let zip_path = dist_dir.join(function.zip_name());
        write_bootstrap_zip(&target_dir.join(function.bin_name()), &zip_path);
        written.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in written {
        eprintln!("- {}", path.display());
    }
}

fn check_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(_) | Err(_) => {
            eprintln!("warning: could not list installed rust targets; skipping preflight");
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        fail(&format!(
            "rust target `{target}` is not installed; run `rustup target add {target}` first"
        ));
    }
}

fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) {
    let binary = fs::read(binary_path).unwrap_or_else(|error| {
        fail(&format!(
            "expected lambda binary at '{}': {error}",
            binary_path.display()
        ))
    });

    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);
}

fn ci_test() {
    step("Test stream_etl_core");
    run_cargo(&["test", "-p", "stream_etl_core"]);

    step("Test stream_etl_lambda");
    run_cargo(&["test", "-p", "stream_etl_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::All => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage {
            target,
            profile,
            function,
            dist_dir,
        } => {
            let functions = match function {
                Some(function) => vec![function],
                None => LambdaFunction::ALL.to_vec(),
            };
            package_lambdas(&target, profile, &functions, &dist_dir);
        }
    }
}
