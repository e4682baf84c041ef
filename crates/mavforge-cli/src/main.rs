mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "mavforge",
    version,
    about = "Reproducible firmware and protocol-binding builds for a vendor dialect"
)]
struct Cli {
    /// Project root holding the pinned-version file, patches, and dialect.
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Manifest filename, resolved relative to the project root.
    #[arg(long, default_value = "mavforge.toml", global = true)]
    manifest: PathBuf,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the requested artifact classes inside the build container.
    Build {
        /// Package the protocol language bindings.
        #[arg(long, default_value_t = false)]
        bindings: bool,
        /// Compile the firmware targets.
        #[arg(long, default_value_t = false)]
        firmware: bool,
        /// Generate the dissector plugin (requires --bindings).
        #[arg(long, default_value_t = false)]
        plugin: bool,
        /// Firmware target to build; repeatable. Defaults to the manifest's
        /// target list.
        #[arg(long = "target")]
        targets: Vec<String>,
        /// Identifier woven into firmware artifact names. Defaults to the
        /// short commit hash of the project repository.
        #[arg(long)]
        run_version: Option<String>,
        /// Run the pipeline directly instead of launching the container.
        #[arg(long, hide = true, default_value_t = false)]
        inner: bool,
    },
    /// Run diagnostic checks on the host toolchain.
    Doctor,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MAVFORGE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Build {
            bindings,
            firmware,
            plugin,
            targets,
            run_version,
            inner,
        } => commands::build::run(
            &cli.project,
            &cli.manifest,
            commands::build::BuildArgs {
                bindings,
                firmware,
                plugin,
                targets,
                run_version,
                inner,
            },
        ),
        Commands::Doctor => commands::doctor::run(&cli.project, &cli.manifest),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
