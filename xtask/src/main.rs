use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "api_serverless_lambda";
const LAMBDA_BINARY: &str = "api_lambda";
const DIST_DIR: &str = "dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the serverless API workspace",
    long_about = "Builds, checks, and packages the serverless entrypoint\n\
                  that serves the API backend from a function platform."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the workspace test suite
    Test,
    /// Run CI checks (fmt, clippy, tests, packaging)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the Lambda entrypoint and package it as a `bootstrap` zip
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and package the Lambda artifact
    Package,
    /// Run check + package
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

fn package_serverless_entrypoint(target: &str, profile: BuildProfile) {
    preflight(target);

    step("Build serverless entrypoint binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BINARY,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let zip_path = dist_dir.join(format!("{LAMBDA_BINARY}.zip"));
    package_lambda_zip(&target_dir.join(LAMBDA_BINARY), &zip_path);

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

/// Fails early when `target` cannot be built on this machine: the rust
/// target must be installed, and a cross target needs a C linker for its
/// architecture.
fn preflight(target: &str) {
    match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => {
            let installed = String::from_utf8_lossy(&output.stdout);
            if !installed.lines().any(|line| line.trim() == target) {
                panic!("rust target `{target}` is not installed; run `rustup target add {target}`");
            }
        }
        Ok(_) | Err(_) => {
            eprintln!("warning: could not list installed rust targets; skipping target check");
        }
    }

    if cfg!(target_os = "linux") && target == native_linux_target() {
        return;
    }
    let Some(linker) = cross_linker(target) else {
        return;
    };
    let override_key = format!("CC_{}", target.replace('-', "_"));
    let configured = std::env::var(&override_key)
        .ok()
        .filter(|value| !value.trim().is_empty());
    let candidate = configured.as_deref().unwrap_or(&linker);
    if !linker_works(candidate) {
        panic!("missing C linker `{candidate}` for target `{target}`; install it or set {override_key}");
    }
}

/// GNU cross linker for a `<arch>-unknown-linux-gnu` target, e.g.
/// `aarch64-linux-gnu-gcc`.
fn cross_linker(target: &str) -> Option<String> {
    let arch = target.strip_suffix("-unknown-linux-gnu")?;
    Some(format!("{arch}-linux-gnu-gcc"))
}

fn linker_works(program: &str) -> bool {
    Command::new(program.trim())
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// The provided.al2023 runtime executes a file named `bootstrap` at the root
/// of the archive.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
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

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test workspace");
    run_cargo(&["test", "--workspace"]);
}

fn ci_package() {
    step("Package native lambda artifact");
    package_serverless_entrypoint(native_linux_target(), BuildProfile::Release);
}

fn native_linux_target() -> &'static str {
    if cfg!(target_arch = "aarch64") {
        "aarch64-unknown-linux-gnu"
    } else {
        "x86_64-unknown-linux-gnu"
    }
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test => {
            run_cargo(&["test", "--workspace"]);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Package => ci_package(),
                CiJob::All => {
                    ci_check();
                    ci_package();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_entrypoint(&target, profile);
        }
    }
}
