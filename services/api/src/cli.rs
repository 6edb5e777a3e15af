use crate::server;
use clap::{Args, Parser, Subcommand};
use loyalty_rules::config::AppConfig;
use loyalty_rules::error::AppError;
use loyalty_rules::rules::{CompilerPolicy, OperatorCatalog, RuleCompiler, RuleDraft, RuleServiceError};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loyalty Rule Builder",
    about = "Build, validate and submit loyalty rule engine rules",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Validate a rule draft and print the rule engine payload
    Compile(CompileArgs),
    /// List operator families and their operators
    Operators,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct CompileArgs {
    /// Path to a rule draft in JSON form
    pub(crate) path: PathBuf,
    /// Pretty-print the payload
    #[arg(long)]
    pub(crate) pretty: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Compile(args) => run_compile(args).await,
        Command::Operators => run_operators(),
    }
}

async fn run_compile(args: CompileArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let raw = tokio::fs::read(&args.path).await?;
    let draft: RuleDraft = serde_json::from_slice(&raw)?;

    let compiler = RuleCompiler::new(
        config.rule_engine.session(),
        CompilerPolicy::with_duplicate_policy(config.rule_engine.duplicate_policy),
    );
    let payload = compiler.compile(&draft).map_err(|report| {
        for message in report.messages() {
            eprintln!("- {message}");
        }
        RuleServiceError::Validation(report)
    })?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    println!("{rendered}");
    Ok(())
}

fn run_operators() -> Result<(), AppError> {
    for family in OperatorCatalog.families() {
        println!("{}", family.name);
        for option in family.options() {
            println!("  {:<24} {}", option.value, option.display_name);
        }
    }
    Ok(())
}
