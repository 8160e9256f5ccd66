//! CLI module - command-line interface
//!
//! Argument definitions, logging setup and the one-shot run driver.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agent::Agent;
use crate::core::Config;

/// Usage line printed when no instruction is given
pub const USAGE: &str = "Usage: relay <instruction>";

/// Relay - a tool-using agent with sub-agent delegation
#[derive(Parser, Debug, Default)]
#[command(name = "relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The instruction to carry out
    pub instruction: Option<String>,

    /// Model name sent to the backend
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible backend
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum model calls per loop
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Delegation depth budget (0 disables the task tool)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Run the tool calls of one step one after another
    #[arg(long)]
    pub sequential: bool,

    /// Working directory for the tools
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref model) = self.model {
            config.model.name = model.clone();
        }
        if let Some(ref url) = self.base_url {
            config.model.base_url = url.clone();
        }
        if let Some(limit) = self.max_steps {
            config.agent.recursion_limit = limit;
        }
        if let Some(depth) = self.max_depth {
            config.agent.max_depth = depth;
        }
        if self.sequential {
            config.agent.parallel_tools = false;
        }
        if let Some(ref dir) = self.cwd {
            config.tools.working_dir = Some(dir.clone());
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `relay=debug` with `--debug`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "relay=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

/// Load configuration, apply overrides and run one instruction to its final answer
async fn execute(cli: &Cli, instruction: String) -> anyhow::Result<String> {
    let mut config = Config::load();
    cli.apply(&mut config);

    let agent = Agent::from_config(&config)?;
    let output = agent.run(instruction).await?;
    Ok(output.content)
}

/// Run one instruction end to end and map the outcome to an exit code
pub async fn run(cli: Cli) -> ExitCode {
    let Some(instruction) = cli.instruction.clone() else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    match execute(&cli, instruction).await {
        Ok(content) => {
            println!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "relay",
            "--max-steps",
            "7",
            "--max-depth",
            "2",
            "--sequential",
            "-m",
            "local-model",
            "list the files",
        ]);
        assert_eq!(cli.instruction.as_deref(), Some("list the files"));

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.agent.recursion_limit, 7);
        assert_eq!(config.agent.max_depth, 2);
        assert!(!config.agent.parallel_tools);
        assert_eq!(config.model.name, "local-model");
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let cli = Cli::parse_from(["relay"]);
        assert!(cli.instruction.is_none());

        let mut config = Config::default();
        let before = config.agent.recursion_limit;
        cli.apply(&mut config);
        assert_eq!(config.agent.recursion_limit, before);
        assert!(config.agent.parallel_tools);
    }

    #[tokio::test]
    async fn test_missing_instruction_fails() {
        let code = run(Cli::default()).await;
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::FAILURE));
    }
}
