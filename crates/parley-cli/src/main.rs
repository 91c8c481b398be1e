//! Parley CLI
//!
//! Operator tool for objection detection, response ladders, and outbound
//! compliance checks. Results are JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use parley_core::{
    BotMode, ComplianceMiddleware, MarketData, MarketValue, ObjectionDetector, ObjectionEngine,
    ParleyConfig,
};
use parley_runtime::{
    ComplianceGuard, ContactContext, ExtendedObjectionHandler, LlmProvider, NullProvider,
    RuntimeConfig,
};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version, about = "Objection handling and outbound compliance for seller conversations")]
struct Cli {
    /// YAML file carrying both core and runtime configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect an objection in one inbound message
    Detect {
        /// Use all eleven objection types instead of the five pricing types
        #[arg(long)]
        extended: bool,

        message: String,
    },

    /// Walk a contact up the response ladder, one response per message
    Respond {
        #[arg(long)]
        contact: String,

        #[arg(long)]
        extended: bool,

        /// Market figure for template placeholders, e.g. median_price=450000
        #[arg(long = "market", value_name = "KEY=VALUE")]
        market: Vec<String>,

        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Run the compliance middleware over outbound messages in order
    Enforce {
        #[arg(long, default_value = "")]
        contact: String,

        /// seller, buyer, lead, or general
        #[arg(long, default_value = "general")]
        mode: String,

        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Run the tiered compliance guard over one outbound message
    Audit {
        #[arg(long, default_value = "general")]
        mode: String,

        #[arg(long)]
        contact: Option<String>,

        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (core_config, runtime_config) = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect { extended, message } => {
            let detector = if extended {
                ObjectionDetector::extended()
            } else {
                ObjectionDetector::legacy()
            };
            print_json(&detector.detect(&message), cli.compact)?;
        }

        Commands::Respond {
            contact,
            extended,
            market,
            messages,
        } => {
            let market = parse_market(&market)?;
            let market = (!market.is_empty()).then_some(&market);

            let responses: Vec<_> = if extended {
                let mut handler = ExtendedObjectionHandler::new(core_config.objections.clone());
                messages
                    .iter()
                    .map(|m| handler.handle_message(m, &contact, market))
                    .collect()
            } else {
                let mut engine = ObjectionEngine::pricing();
                messages
                    .iter()
                    .map(|m| engine.handle(m, &contact, market, 0))
                    .collect()
            };
            print_json(&responses, cli.compact)?;
        }

        Commands::Enforce {
            contact,
            mode,
            messages,
        } => {
            let mode = BotMode::parse(&mode);
            let mut middleware = ComplianceMiddleware::with_config(core_config.compliance.clone());
            let results: Vec<_> = messages
                .iter()
                .map(|m| middleware.enforce(m, &contact, mode, None))
                .collect();
            print_json(&results, cli.compact)?;
        }

        Commands::Audit {
            mode,
            contact,
            message,
        } => {
            let mode = BotMode::parse(&mode);
            let guard = ComplianceGuard::new(provider(), runtime_config.guard.clone());
            let context = ContactContext {
                contact_id: contact,
                mode,
                recent_messages: Vec::new(),
            };
            let verdict = guard.audit_message(&message, Some(&context)).await;
            print_json(&verdict, cli.compact)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<(ParleyConfig, RuntimeConfig)> {
    let Some(path) = path else {
        return Ok((ParleyConfig::default(), RuntimeConfig::default()));
    };

    let core = ParleyConfig::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let runtime = RuntimeConfig::from_file(path)
        .with_context(|| format!("Failed to load runtime config from {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok((core, runtime))
}

fn parse_market(pairs: &[String]) -> Result<MarketData> {
    let mut market = MarketData::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid --market value '{}', expected KEY=VALUE", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid --market value '{}', key is empty", pair);
        }

        let value = match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => MarketValue::Number(n),
            _ => MarketValue::Text(value.to_string()),
        };
        market.insert(key, value);
    }
    Ok(market)
}

#[cfg(feature = "anthropic")]
fn provider() -> Arc<dyn LlmProvider> {
    match parley_runtime::providers::AnthropicProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            tracing::warn!(error = %e, "Anthropic provider unavailable, cognitive audit will flag for review");
            Arc::new(NullProvider)
        }
    }
}

#[cfg(not(feature = "anthropic"))]
fn provider() -> Arc<dyn LlmProvider> {
    Arc::new(NullProvider)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_numbers_and_text() {
        let market = parse_market(&[
            "median_price=450000".to_string(),
            "neighborhood=Oak Park".to_string(),
        ])
        .unwrap();

        assert_eq!(market.get("median_price"), Some(&MarketValue::Number(450000.0)));
        assert_eq!(
            market.get("neighborhood"),
            Some(&MarketValue::Text("Oak Park".to_string()))
        );
    }

    #[test]
    fn test_parse_market_rejects_missing_equals() {
        assert!(parse_market(&["median_price".to_string()]).is_err());
        assert!(parse_market(&["=5".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_respond() {
        let cli = Cli::try_parse_from([
            "parley",
            "respond",
            "--contact",
            "c1",
            "--market",
            "gap_percent=12",
            "I can't sell for less than I paid",
            "I still can't sell for less than I paid",
        ])
        .unwrap();

        match cli.command {
            Commands::Respond {
                contact, messages, market, extended,
            } => {
                assert_eq!(contact, "c1");
                assert_eq!(messages.len(), 2);
                assert_eq!(market, vec!["gap_percent=12"]);
                assert!(!extended);
            }
            _ => panic!("expected respond"),
        }
    }

    #[test]
    fn test_missing_config_means_defaults() {
        let (core, runtime) = load_config(None).unwrap();
        assert_eq!(core, ParleyConfig::default());
        assert_eq!(runtime, RuntimeConfig::default());
    }
}
