//! assess-chat: console front-end for the speech-assessment chat client.
//!
//! Connects to the assessment server, prints every chat line and assessment
//! with its origin tag, and forwards each line typed on stdin to the server.
//!
//! # Usage
//!
//! ```text
//! assess-chat [OPTIONS]
//!
//! Options:
//!   --config <PATH>            TOML config file
//!   --server-url <URL>         Assessment server [default: ws://localhost:8765]
//!   --heartbeat-secs <SECS>    Heartbeat ping interval [default: 30]
//!   --reconnect-secs <SECS>    Delay before reconnecting after a close [default: 5]
//!   --print-config             Print the effective config as TOML and exit
//! ```
//!
//! # Configuration precedence
//!
//! Built-in defaults, then the `--config` file, then flags and environment
//! variables (a flag beats its variable):
//!
//! | Variable                 | Flag               |
//! |--------------------------|--------------------|
//! | `ASSESS_CONFIG`          | `--config`         |
//! | `ASSESS_SERVER_URL`      | `--server-url`     |
//! | `ASSESS_HEARTBEAT_SECS`  | `--heartbeat-secs` |
//! | `ASSESS_RECONNECT_SECS`  | `--reconnect-secs` |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`), so
//! stdout carries only the chat transcript.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use assess_client::infrastructure::storage::{load_config, to_toml};
use assess_client::{ChatClient, ClientConfig, ConnectionState, LifecycleEvent};
use assess_core::MessageKind;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Console chat client for the speech-assessment server.
#[derive(Debug, Parser)]
#[command(
    name = "assess-chat",
    about = "Chat with the speech-assessment server from a terminal",
    version
)]
struct Cli {
    /// TOML file with `server_url`, `heartbeat_interval_secs` and
    /// `reconnect_delay_secs`.  Every key is optional.
    #[arg(long, env = "ASSESS_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket URL of the assessment server.
    #[arg(long, env = "ASSESS_SERVER_URL")]
    server_url: Option<String>,

    /// Seconds between heartbeat pings while connected.
    #[arg(long, env = "ASSESS_HEARTBEAT_SECS")]
    heartbeat_secs: Option<u64>,

    /// Seconds to wait before the single reconnect attempt after a close.
    #[arg(long, env = "ASSESS_RECONNECT_SECS")]
    reconnect_secs: Option<u64>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Layers the config file and the flags over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the merged
    /// configuration fails validation.
    fn to_client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if let Some(secs) = self.heartbeat_secs {
            config.heartbeat_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.reconnect_secs {
            config.reconnect_delay = Duration::from_secs(secs);
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Console output ────────────────────────────────────────────────────────────

/// One transcript line: origin tag, a space, then the display text.
fn tagged(kind: MessageKind, text: &str) -> String {
    format!("{} {}", kind.label(), text)
}

/// The system line shown for a connection notification, if any.
fn describe_lifecycle(event: &LifecycleEvent) -> Option<String> {
    let text = match event {
        LifecycleEvent::StateChanged(ConnectionState::Connected) => "已连接到服务器".to_string(),
        LifecycleEvent::StateChanged(_) => return None,
        LifecycleEvent::ConnectionError(reason) => format!("连接失败: {reason}"),
        LifecycleEvent::Closed {
            code,
            reason,
            was_clean,
        } => format!(
            "连接已关闭 (代码: {code}, 原因: {reason}, 正常关闭: {})",
            if *was_clean { "是" } else { "否" }
        ),
        LifecycleEvent::ReconnectScheduled { delay } => {
            format!("{} 秒后重新连接", delay.as_secs())
        }
    };
    Some(tagged(MessageKind::System, &text))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_client_config()?;

    if cli.print_config {
        print!("{}", to_toml(&config)?);
        return Ok(());
    }

    info!("assess-chat starting, server={}", config.server_url);

    let client = ChatClient::new(config).context("failed to start chat client")?;
    client.on_message(|msg| println!("{}", tagged(msg.kind, &msg.text)));
    client.on_assessment(|report| println!("{}", tagged(report.kind(), &report.text)));
    client.on_lifecycle(|event| {
        if let Some(line) = describe_lifecycle(event) {
            println!("{line}");
        }
    });
    client.connect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("received Ctrl+C, shutting down"),
                    Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
                }
                break;
            }
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => client.send(line),
                None => {
                    info!("stdin closed, shutting down");
                    break;
                }
            },
        }
    }

    client.shutdown().await;
    info!("assess-chat stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assess_client::domain::ConfigError;

    #[test]
    fn test_cli_defaults_leave_overrides_unset() {
        // Arrange / Act: parse with no arguments
        let cli = Cli::parse_from(["assess-chat"]);

        // Assert
        assert!(cli.server_url.is_none());
        assert!(cli.heartbeat_secs.is_none());
        assert!(!cli.print_config);
    }

    #[test]
    fn test_to_client_config_defaults() {
        let cli = Cli::parse_from(["assess-chat"]);
        let config = cli.to_client_config().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_cli_server_url_override() {
        let cli = Cli::parse_from(["assess-chat", "--server-url", "wss://assess.example.com"]);
        let config = cli.to_client_config().unwrap();
        assert_eq!(config.server_url, "wss://assess.example.com");
    }

    #[test]
    fn test_cli_timer_overrides() {
        let cli = Cli::parse_from([
            "assess-chat",
            "--heartbeat-secs",
            "10",
            "--reconnect-secs",
            "2",
        ]);
        let config = cli.to_client_config().unwrap();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let cli = Cli::parse_from(["assess-chat", "--server-url", "localhost:8765"]);
        assert!(cli.to_client_config().is_err());
    }

    #[test]
    fn test_zero_reconnect_is_rejected() {
        let cli = Cli::parse_from(["assess-chat", "--reconnect-secs", "0"]);
        assert!(cli.to_client_config().is_err());
    }

    #[test]
    fn test_huge_heartbeat_flag_is_rejected() {
        // Arrange
        let cli = Cli::parse_from(["assess-chat", "--heartbeat-secs", "18446744073709551615"]);

        // Act
        let result = cli.to_client_config();

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::DurationTooLong {
                field: "heartbeat_interval",
                ..
            })
        ));
    }

    #[test]
    fn test_flags_override_config_file() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("assess_cli_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("flags_override_config_file.toml");
        std::fs::write(
            &path,
            "server_url = \"ws://from-file:1\"\nheartbeat_interval_secs = 40\n",
        )
        .unwrap();
        let cli = Cli {
            config: Some(path.clone()),
            server_url: Some("ws://from-flag:2".into()),
            heartbeat_secs: None,
            reconnect_secs: None,
            print_config: false,
        };

        // Act
        let config = cli.to_client_config().unwrap();

        // Assert: the flag wins, the file fills in the rest
        assert_eq!(config.server_url, "ws://from-flag:2");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(40));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here/assess.toml")),
            server_url: None,
            heartbeat_secs: None,
            reconnect_secs: None,
            print_config: false,
        };
        assert!(cli.to_client_config().is_err());
    }

    #[test]
    fn test_tagged_lines_use_origin_labels() {
        assert_eq!(tagged(MessageKind::Ai, "AI: 你好"), "[AI] AI: 你好");
        assert_eq!(tagged(MessageKind::User, "用户: 你好"), "[用户] 用户: 你好");
    }

    #[test]
    fn test_describe_lifecycle() {
        assert_eq!(
            describe_lifecycle(&LifecycleEvent::StateChanged(ConnectionState::Connected)).as_deref(),
            Some("[系统] 已连接到服务器")
        );
        assert_eq!(
            describe_lifecycle(&LifecycleEvent::StateChanged(ConnectionState::Connecting)),
            None
        );
        assert_eq!(
            describe_lifecycle(&LifecycleEvent::ReconnectScheduled {
                delay: Duration::from_secs(5)
            })
            .as_deref(),
            Some("[系统] 5 秒后重新连接")
        );
        assert_eq!(
            describe_lifecycle(&LifecycleEvent::Closed {
                code: 1006,
                reason: "stream ended".into(),
                was_clean: false
            })
            .as_deref(),
            Some("[系统] 连接已关闭 (代码: 1006, 原因: stream ended, 正常关闭: 否)")
        );
    }
}
