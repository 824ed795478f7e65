// Entry point - CLI parsing and wiring

use std::path::PathBuf;

use clap::Parser;

mod app;
mod config;
mod envfile;
mod error;
mod prompt;
mod store;

use crate::app::App;
use crate::config::Config;
use crate::prompt::TerminalPrompter;
use crate::store::AwsCliStore;

#[derive(Parser)]
#[command(name = "envsync")]
#[command(about = "Reconcile local .env files with AWS Secrets Manager")]
struct Cli {
    /// Backend env file (default: <project root>/backend/.env.production.local)
    #[arg(long, short = 'b')]
    backend_env: Option<PathBuf>,
    /// Frontend env file (default: <project root>/frontend/app/.env.production.local)
    #[arg(long, short = 'f')]
    frontend_env: Option<PathBuf>,
    /// Secret name (prompted for when neither this nor --secret-id is given)
    #[arg(long, short = 'n')]
    secret_name: Option<String>,
    /// Full secret ARN; takes precedence over --secret-name
    #[arg(long)]
    secret_id: Option<String>,
    /// AWS region (default: AWS_REGION, then us-east-2)
    #[arg(long, short = 'r')]
    region: Option<String>,
}

fn main() -> Result<(), error::Error> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let prompter = TerminalPrompter;
    let config = Config::resolve(&cli, &prompter)?;
    let app = App::new(config, &prompter, &AwsCliStore);
    app.run()
}
