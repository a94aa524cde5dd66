//! pybridge CLI - run Python code through the embedded execution bridge.

mod install;
mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pybridge")]
#[command(about = "Embedded Python execution bridge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the managed Python runtime and its dependencies
    Install,

    /// Run a Python script file through the bridge
    Run {
        /// Path to the script file
        script: String,

        /// Arguments as JSON values, bound to $v1, $v2, ... in order
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Seconds to wait for the result after the interpreter exits
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Callback listener port (0 for an ephemeral port)
        #[arg(short, long, default_value_t = pybridge::DEFAULT_CALLBACK_PORT)]
        port: u16,
    },

    /// Evaluate inline Python code through the bridge
    Eval {
        /// Code to evaluate
        #[arg(short = 'e', long = "code")]
        code: String,

        /// Arguments as JSON values, bound to $v1, $v2, ... in order
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Seconds to wait for the result after the interpreter exits
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Callback listener port (0 for an ephemeral port)
        #[arg(short, long, default_value_t = pybridge::DEFAULT_CALLBACK_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Install => install::execute().await?,

        Commands::Run {
            script,
            args,
            timeout,
            port,
        } => run::execute_file(&script, &args, timeout, port).await?,

        Commands::Eval {
            code,
            args,
            timeout,
            port,
        } => run::execute_inline(&code, &args, timeout, port).await?,
    }

    Ok(())
}
