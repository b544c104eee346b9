//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sign in to the HEU academic portal and export grades.
///
/// Logging in takes two solved captchas: run `captcha` twice, read both
/// images, then pass both answers and tokens to `login`.
#[derive(Parser, Debug)]
#[command(name = "wisedu")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a captcha and print it as JSON ({"img", "token"})
    Captcha,

    /// Run the two-round SSO login and write the session cookies as JSON
    Login(LoginArgs),

    /// Query all grades with saved session cookies and write the report file
    Grades(GradesArgs),
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Campus account (student number)
    #[arg(short, long)]
    pub username: String,

    /// Account password
    #[arg(short, long, env = "WISEDU_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Answer to the first captcha
    #[arg(long)]
    pub captcha1: String,

    /// Token of the first captcha
    #[arg(long)]
    pub token1: String,

    /// Answer to the second captcha
    #[arg(long)]
    pub captcha2: String,

    /// Token of the second captcha
    #[arg(long)]
    pub token2: String,

    /// Write cookies here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub cookies_out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct GradesArgs {
    /// Cookie JSON written by `login`
    #[arg(long, value_name = "FILE")]
    pub cookies: PathBuf,

    /// Report file (defaults to grade_data.json next to the executable)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: [&str; 12] = [
        "wisedu",
        "login",
        "-u",
        "2021001",
        "--captcha1",
        "ab12",
        "--token1",
        "t1",
        "--captcha2",
        "cd34",
        "--token2",
        "t2",
    ];

    #[test]
    fn test_cli_captcha_subcommand_parses() {
        let args = Args::try_parse_from(["wisedu", "captcha"]).unwrap();
        assert!(matches!(args.command, Command::Captcha));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_verbose_flag_after_subcommand() {
        let args = Args::try_parse_from(["wisedu", "captcha", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_login_with_password_flag() {
        let mut argv = LOGIN.to_vec();
        argv.extend(["-p", "pw", "--cookies-out", "c.json"]);
        let args = Args::try_parse_from(argv).unwrap();

        let Command::Login(login) = args.command else {
            panic!("expected login");
        };
        assert_eq!(login.username, "2021001");
        assert_eq!(login.password, "pw");
        assert_eq!(login.captcha2, "cd34");
        assert_eq!(login.cookies_out, Some(PathBuf::from("c.json")));
    }

    #[test]
    fn test_cli_login_missing_token_is_error() {
        let result = Args::try_parse_from(["wisedu", "login", "-u", "x", "-p", "y"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_grades_requires_cookie_file() {
        let args =
            Args::try_parse_from(["wisedu", "grades", "--cookies", "c.json", "-o", "g.json"])
                .unwrap();
        let Command::Grades(grades) = args.command else {
            panic!("expected grades");
        };
        assert_eq!(grades.cookies, PathBuf::from("c.json"));
        assert_eq!(grades.output, Some(PathBuf::from("g.json")));

        let result = Args::try_parse_from(["wisedu", "grades"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_config_flag() {
        let args = Args::try_parse_from(["wisedu", "--config", "alt.json", "captcha"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("alt.json")));
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        assert!(Args::try_parse_from(["wisedu"]).is_err());
    }
}
