//! Configuration module for command line flags and environment variables.
//!
//! Every setting can come from a flag or an environment variable. A flag given
//! explicitly on the command line wins over the environment.

use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::error::ConfigError;
use crate::notify::telegram::DEFAULT_API_URL;
use crate::web::WRITE_TIMEOUT;

/// Build version, overridable at compile time through `STARGAZER_VERSION`.
pub const VERSION: &str = match option_env!("STARGAZER_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TELEGRAM_TIMEOUT_MS: u64 = 10_000;

/// Raw command line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stargazer",
    about = "Relays GitHub star webhooks to a Telegram chat",
    disable_version_flag = true
)]
pub struct Cli {
    /// Port to listen on for HTTP
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// IPv4 address to listen on
    #[arg(long, env = "LISTEN", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen: IpAddr,

    /// Secret configured on the GitHub webhook
    #[arg(
        long,
        env = "GITHUB_SECRET",
        default_value = "",
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    pub github_secret: String,

    /// Telegram bot token
    #[arg(
        long,
        env = "TELEGRAM_TOKEN",
        default_value = "",
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    pub telegram_token: String,

    /// Telegram chat id that receives notifications
    #[arg(long, env = "TELEGRAM_CHAT", default_value = "", allow_hyphen_values = true)]
    pub telegram_chat: String,

    /// Base URL of the Telegram Bot API
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_URL)]
    pub telegram_api_url: String,

    /// Timeout for a single Telegram API call, in milliseconds (below 15000)
    #[arg(long, env = "TELEGRAM_TIMEOUT_MS", default_value_t = DEFAULT_TELEGRAM_TIMEOUT_MS)]
    pub telegram_timeout_ms: u64,

    /// Print version
    #[arg(short = 'v', action = ArgAction::SetTrue)]
    pub print_version: bool,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags
    /// (`-port 9090`, `-help`) alongside the usual `--port 9090`.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Resolve the arguments into the immutable runtime configuration.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let config = Config {
            listen: self.listen,
            port: self.port,
            webhook_secret: self.github_secret,
            telegram_chat_id: parse_chat_id(&self.telegram_chat),
            telegram_chat: self.telegram_chat,
            telegram_token: self.telegram_token,
            telegram_api_url: self.telegram_api_url.trim_end_matches('/').to_string(),
            telegram_timeout: Duration::from_millis(self.telegram_timeout_ms),
            version: VERSION.to_string(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Apply `normalize_flag` to every token in flag position. The token after a
/// value-taking long flag is its value and passes through untouched, as does
/// everything after `--`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut next_is_value = false;
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough || next_is_value {
                next_is_value = false;
                return arg;
            }
            let arg = normalize_flag(arg);
            match arg.to_str() {
                Some("--") => passthrough = true,
                Some(flag) => next_is_value = takes_value(flag),
                None => {}
            }
            arg
        })
        .collect()
}

/// Whether `flag` is a long option whose value is the following token.
fn takes_value(flag: &str) -> bool {
    flag.len() > 2 && flag.starts_with("--") && !flag.contains('=') && flag != "--help"
}

/// Rewrite `-name` into `--name`; single-letter flags and negative numbers
/// are left alone.
fn normalize_flag(arg: OsString) -> OsString {
    match arg.to_str() {
        Some(s)
            if s.len() > 2
                && s.starts_with('-')
                && s[1..].starts_with(|c: char| c.is_ascii_alphabetic()) =>
        {
            format!("-{s}").into()
        }
        _ => arg,
    }
}

/// Parse a Telegram chat id; anything unparseable becomes 0.
fn parse_chat_id(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

/// Application configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub listen: IpAddr,

    /// Port to bind the HTTP server to
    pub port: u16,

    /// Shared secret for GitHub webhook signatures
    pub webhook_secret: String,

    /// Telegram bot token (empty when not configured)
    pub telegram_token: String,

    /// Raw `TELEGRAM_CHAT` value, kept for diagnostics
    pub telegram_chat: String,

    /// Destination chat for notifications
    pub telegram_chat_id: i64,

    /// Telegram Bot API base URL without trailing slash
    pub telegram_api_url: String,

    /// Upper bound for a single Telegram API call
    pub telegram_timeout: Duration,

    /// Version reported by `GET /version`
    pub version: String,
}

impl Config {
    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_secret.is_empty() {
            return Err(ConfigError::MissingWebhookSecret);
        }
        // A send must finish before the response timeout turns the webhook into a 408.
        if self.telegram_timeout >= WRITE_TIMEOUT {
            return Err(ConfigError::TelegramTimeoutTooLong {
                timeout_ms: self.telegram_timeout.as_millis(),
                limit_ms: WRITE_TIMEOUT.as_millis(),
            });
        }
        Ok(())
    }

    /// Names of Telegram settings that are missing or unusable.
    ///
    /// These degrade notifications but never stop the server.
    pub fn missing_telegram_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.telegram_token.is_empty() {
            missing.push("TELEGRAM_TOKEN");
        }
        if self.telegram_chat.is_empty() || self.telegram_chat_id == 0 {
            missing.push("TELEGRAM_CHAT");
        }
        missing
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["stargazer"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(normalize_args(argv.into_iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn test_flags_build_config() {
        let config = parse(&[
            "--port",
            "9090",
            "--listen",
            "127.0.0.1",
            "--github-secret",
            "s3cret",
            "--telegram-token",
            "123:abc",
            "--telegram-chat",
            "-100200300",
            "--telegram-api-url",
            "http://localhost:8081/",
            "--telegram-timeout-ms",
            "2500",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.webhook_secret, "s3cret");
        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.telegram_chat_id, -100200300);
        assert_eq!(config.telegram_api_url, "http://localhost:8081");
        assert_eq!(config.telegram_timeout, Duration::from_millis(2500));
        assert_eq!(config.version, VERSION);
        assert!(config.missing_telegram_settings().is_empty());
    }

    #[test]
    fn test_single_dash_long_flags() {
        let cli = parse(&["-port", "7070", "-github-secret", "x"]);
        assert_eq!(cli.port, 7070);
        assert_eq!(cli.github_secret, "x");
    }

    #[test]
    fn test_version_flag() {
        let cli = parse(&["-v"]);
        assert!(cli.print_version);
    }

    #[test]
    fn test_help_flag_single_dash() {
        let err = Cli::try_parse_from(normalize_args(
            ["stargazer", "-help"].into_iter().map(OsString::from),
        ))
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let result = parse(&["--github-secret", ""]).into_config();
        assert!(matches!(result, Err(ConfigError::MissingWebhookSecret)));
    }

    #[test]
    fn test_missing_telegram_settings_are_not_fatal() {
        let config = parse(&[
            "--github-secret",
            "s3cret",
            "--telegram-token",
            "",
            "--telegram-chat",
            "",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.telegram_chat_id, 0);
        assert_eq!(
            config.missing_telegram_settings(),
            vec!["TELEGRAM_TOKEN", "TELEGRAM_CHAT"]
        );
    }

    #[test]
    fn test_telegram_timeout_must_stay_below_response_timeout() {
        let result = parse(&[
            "--github-secret",
            "s3cret",
            "--telegram-timeout-ms",
            "20000",
        ])
        .into_config();
        assert!(matches!(
            result,
            Err(ConfigError::TelegramTimeoutTooLong {
                timeout_ms: 20000,
                limit_ms: 15000
            })
        ));

        let result = parse(&[
            "--github-secret",
            "s3cret",
            "--telegram-timeout-ms",
            "15000",
        ])
        .into_config();
        assert!(matches!(
            result,
            Err(ConfigError::TelegramTimeoutTooLong { .. })
        ));

        let config = parse(&[
            "--github-secret",
            "s3cret",
            "--telegram-timeout-ms",
            "14999",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.telegram_timeout, Duration::from_millis(14999));
    }

    #[test]
    fn test_flag_values_starting_with_dash_are_kept() {
        let cli = parse(&[
            "-github-secret",
            "-abc",
            "--telegram-token",
            "-token-value",
            "-port",
            "7070",
        ]);
        assert_eq!(cli.github_secret, "-abc");
        assert_eq!(cli.telegram_token, "-token-value");
        assert_eq!(cli.port, 7070);
    }

    #[test]
    fn test_normalize_args_respects_flag_position() {
        let args = normalize_args(
            ["stargazer", "-github-secret", "-abc", "-v", "-listen", "0.0.0.0"]
                .into_iter()
                .map(OsString::from),
        );
        assert_eq!(
            args,
            ["stargazer", "--github-secret", "-abc", "-v", "--listen", "0.0.0.0"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );

        let args = normalize_args(
            ["stargazer", "--github-secret=x", "-port", "1"]
                .into_iter()
                .map(OsString::from),
        );
        assert_eq!(args[2], OsString::from("--port"));
    }

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("42"), 42);
        assert_eq!(parse_chat_id(" -1001 "), -1001);
        assert_eq!(parse_chat_id("not-a-number"), 0);
        assert_eq!(parse_chat_id(""), 0);
    }

    #[test]
    fn test_normalize_flag() {
        assert_eq!(normalize_flag("-port".into()), OsString::from("--port"));
        assert_eq!(normalize_flag("--port".into()), OsString::from("--port"));
        assert_eq!(normalize_flag("-v".into()), OsString::from("-v"));
        assert_eq!(normalize_flag("8080".into()), OsString::from("8080"));
        assert_eq!(normalize_flag("-1001".into()), OsString::from("-1001"));
    }
}
