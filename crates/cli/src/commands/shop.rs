use std::io::{self, BufRead, Write};

use martley_agent::client::OpenAiCompatClient;
use martley_agent::session::SessionRunner;
use martley_agent::terminal::Terminal;
use martley_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

/// Line-oriented terminal over stdin/stdout.
#[derive(Debug, Default)]
struct StdTerminal;

impl Terminal for StdTerminal {
    fn prompt(&mut self, text: &str) -> io::Result<String> {
        print!("{text}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        println!("{text}");
        Ok(())
    }
}

fn init_logging(config: &AppConfig) {
    use martley_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("shop", "config_validation", error.to_string(), 2);
        }
    };
    init_logging(&config);

    let client = match OpenAiCompatClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => return CommandResult::failure("shop", "llm_client", error.to_string(), 3),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("shop", "runtime", error.to_string(), 4),
    };

    let mut runner = SessionRunner::new(
        client,
        StdTerminal,
        config.cart.directory.clone(),
        config.session.max_selection_retries,
    );

    match runtime.block_on(runner.run()) {
        Ok(report) => CommandResult::success(
            "shop",
            format!(
                "session finished with {} order(s), end reason {:?}",
                report.order_ids.len(),
                report.end_reason
            ),
        ),
        Err(error) => CommandResult::failure("shop", "session", error.to_string(), 5),
    }
}
