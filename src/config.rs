// Run configuration - flag resolution with git and exe-location fallbacks

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;
use crate::prompt::Prompter;
use crate::Cli;

pub const DEFAULT_REGION: &str = "us-east-2";

const BACKEND_ENV_SUBPATH: &str = "backend/.env.production.local";
const FRONTEND_ENV_SUBPATH: &str = "frontend/app/.env.production.local";

pub struct Config {
    pub backend_env: PathBuf,
    pub frontend_env: PathBuf,
    pub secret_id: String,
    pub region: String,
}

impl Config {
    /// Turn flags into a full run configuration.
    ///
    /// The backend file must exist before anything interactive happens; a
    /// missing file fails before any prompt is issued. The frontend file is
    /// allowed to be missing at this point; the pipeline warns and continues
    /// without it.
    pub fn resolve(cli: &Cli, prompter: &dyn Prompter) -> Result<Self, Error> {
        let root = project_root();

        let backend_env = cli
            .backend_env
            .clone()
            .unwrap_or_else(|| root.join(BACKEND_ENV_SUBPATH));
        if !backend_env.is_file() {
            return Err(Error::BackendEnvNotFound(backend_env.display().to_string()));
        }

        let frontend_env = cli
            .frontend_env
            .clone()
            .unwrap_or_else(|| root.join(FRONTEND_ENV_SUBPATH));

        // A full ARN beats a bare name; with neither, ask.
        let secret_id = match cli.secret_id.clone().or_else(|| cli.secret_name.clone()) {
            Some(id) if !id.trim().is_empty() => id,
            Some(_) => return Err(Error::MissingSecretId),
            None => prompter.secret_id()?,
        };

        let region = cli
            .region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            backend_env,
            frontend_env,
            secret_id,
            region,
        })
    }
}

/// Root for the conventional env file locations: the enclosing git work tree
/// when there is one, otherwise the directory holding this executable.
fn project_root() -> PathBuf {
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
    {
        if output.status.success() {
            let top = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !top.is_empty() {
                return PathBuf::from(top);
            }
        }
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
