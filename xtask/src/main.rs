//! Build automation for charmctl
//!
//! Usage: cargo xtask <command>
//!
//! Available commands:
//! - build: Build the project
//! - test: Run tests
//! - smoke: Bootstrap a scratch environment and deploy a charm into it
//! - dist: Create distribution packages
//! - install: Install to system
//! - ci: Run CI checks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BIN: &str = "charmctl";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for charmctl")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Run only the integration tests under tests/
        #[arg(long)]
        integration: bool,
    },
    /// Run the debug binary against a scratch CHARMCTL_HOME
    Smoke,
    /// Create distribution packages
    Dist {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: Option<String>,
    },
    /// Install to system
    Install {
        #[arg(long, default_value = "/usr/local")]
        prefix: String,
    },
    /// Run CI checks (format, clippy, test, smoke)
    Ci,
    /// Format code
    Format {
        #[arg(long)]
        check: bool,
    },
    Clippy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    sh.change_dir(project_root()?);

    match cli.command {
        Commands::Build { release } => build(&sh, release),
        Commands::Test { integration } => test(&sh, integration),
        Commands::Smoke => smoke(&sh),
        Commands::Dist { target } => dist(&sh, target),
        Commands::Install { prefix } => install(&sh, &prefix),
        Commands::Ci => ci(&sh),
        Commands::Format { check } => format(&sh, check),
        Commands::Clippy => clippy(&sh),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building {}...", BIN);

    if release {
        cmd!(sh, "cargo build --release --bin {BIN}").run()?;
        println!("✅ Release build completed: target/release/{}", BIN);
    } else {
        cmd!(sh, "cargo build --bin {BIN}").run()?;
        println!("✅ Debug build completed: target/debug/{}", BIN);
    }

    Ok(())
}

fn test(sh: &Shell, integration: bool) -> Result<()> {
    println!("🧪 Running tests...");

    if integration {
        cmd!(sh, "cargo test -p {BIN} --test deploy_test --test bootstrap_test").run()?;
    } else {
        cmd!(sh, "cargo test -p {BIN}").run()?;
    }

    println!("✅ All tests passed");
    Ok(())
}

/// Writes a one-charm local repository and an environments file into a
/// scratch directory, then runs bootstrap followed by deploy.
fn smoke(sh: &Shell) -> Result<()> {
    println!("💨 Running smoke test...");
    build(sh, false)?;

    let root = project_root()?;
    let scratch = root.join("target/smoke");
    if scratch.exists() {
        sh.remove_path(&scratch)?;
    }
    let home = scratch.join("home");
    let repo = scratch.join("repo");
    let charm_dir = repo.join("precise/mysql");
    sh.create_dir(&charm_dir)?;
    sh.create_dir(&home)?;
    sh.write_file(
        charm_dir.join("metadata.yaml"),
        "name: mysql\nsummary: database\n",
    )?;
    sh.write_file(charm_dir.join("revision"), "1\n")?;
    sh.write_file(
        home.join("environments.toml"),
        "default = \"smoke\"\n\n[environments.smoke]\ntype = \"dummy\"\n",
    )?;

    let bin = root.join("target/debug").join(BIN);
    let _home = sh.push_env("CHARMCTL_HOME", &home);
    let _repo = sh.push_env("CHARM_REPOSITORY", &repo);
    cmd!(sh, "{bin} bootstrap --instance-id smoke-0 --env-type dummy")
        .run()
        .context("bootstrap failed")?;
    cmd!(sh, "{bin} deploy local:mysql -n 2")
        .run()
        .context("deploy failed")?;

    println!("✅ Smoke test passed");
    Ok(())
}

fn dist(sh: &Shell, target: Option<String>) -> Result<()> {
    println!("📦 Creating distribution package...");

    let release_dir = match target {
        Some(ref triple) => {
            cmd!(sh, "cargo build --release --bin {BIN} --target {triple}").run()?;
            format!("target/{}/release", triple)
        }
        None => {
            cmd!(sh, "cargo build --release --bin {BIN}").run()?;
            "target/release".to_string()
        }
    };

    let root = project_root()?;
    let dist_dir = root.join("dist");
    sh.create_dir(&dist_dir)?;
    sh.copy_file(root.join(release_dir).join(BIN), dist_dir.join(BIN))?;

    let archive_name = format!("{}-{}.tar.gz", BIN, env!("CARGO_PKG_VERSION"));
    cmd!(sh, "tar -czf {archive_name} -C dist {BIN}")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", archive_name);
    Ok(())
}

fn install(sh: &Shell, prefix: &str) -> Result<()> {
    println!("📥 Installing {} to {}...", BIN, prefix);

    let binary = project_root()?.join("target/release").join(BIN);
    if !binary.exists() {
        build(sh, true)?;
    }

    let bin_dir = Path::new(prefix).join("bin");
    sh.create_dir(&bin_dir)?;
    let install_path = bin_dir.join(BIN);
    sh.copy_file(&binary, &install_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&install_path, std::fs::Permissions::from_mode(0o755))?;
    }

    println!("✅ Installed to: {}", install_path.display());
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("🔍 Running CI checks...");

    format(sh, true)?;
    clippy(sh)?;
    test(sh, false)?;
    smoke(sh)?;

    println!("\n✅ All CI checks passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
        println!("✅ Code formatting is correct");
    } else {
        cmd!(sh, "cargo fmt --all").run()?;
        println!("✅ Code formatted");
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --all-targets --all-features -- -D warnings").run()?;
    println!("✅ Clippy checks passed");
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}
