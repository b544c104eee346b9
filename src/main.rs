//! CLI entry point for the wisedu tool.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use wisedu_core::{
    AppContext, AppManager, CaptchaAnswer, LoginApp, LoginRequest, PortalConfig, SessionCookieSet,
};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args.command, "CLI arguments parsed");

    let mut config = PortalConfig::load(args.config.as_deref())?;
    if let Command::Grades(grades) = &args.command
        && let Some(output) = &grades.output
    {
        config.output_file = Some(output.clone());
    }

    let mut apps = AppManager::with_default_modules();
    apps.startup(&AppContext::new(config));
    let login = apps
        .get::<LoginApp>()
        .context("login module is not registered")?;

    match args.command {
        Command::Captcha => {
            let captcha = login.get_captcha().await.map_err(anyhow::Error::msg)?;
            println!("{}", serde_json::to_string_pretty(&captcha)?);
        }
        Command::Login(login_args) => {
            let request = LoginRequest {
                username: login_args.username,
                password: login_args.password,
                first: CaptchaAnswer::new(login_args.captcha1, login_args.token1),
                second: CaptchaAnswer::new(login_args.captcha2, login_args.token2),
            };
            let cookies = login.login(&request).await.map_err(anyhow::Error::msg)?;
            let json = serde_json::to_string_pretty(&cookies)?;
            match login_args.cookies_out {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("cannot write cookies to {}", path.display()))?;
                    info!(path = %path.display(), cookies = cookies.len(), "Login complete");
                }
                None => println!("{json}"),
            }
        }
        Command::Grades(grades_args) => {
            let path = &grades_args.cookies;
            let raw = fs::read_to_string(path)
                .with_context(|| format!("cannot read cookie file {}", path.display()))?;
            let cookies: SessionCookieSet = serde_json::from_str(&raw)
                .with_context(|| format!("invalid cookie file {}", path.display()))?;

            let report = login
                .query_all_grade(&cookies)
                .await
                .map_err(anyhow::Error::msg)?;
            let written = login
                .save_grade_to_file(&report)
                .map_err(anyhow::Error::msg)?;
            println!("{}", written.display());
        }
    }

    Ok(())
}
