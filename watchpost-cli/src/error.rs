//! Error type shared by every subcommand, plus its process exit code mapping.

use watchpost_core::error::WatchpostError;
use watchpost_eve_pipeline::EvePipelineError;

/// Failure raised by a CLI handler.
///
/// The message shown to the user comes from `Display`; the process exit
/// code comes from [`CliError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The config file could not be loaded, or validation rejected it.
    #[error("configuration error: {0}")]
    Config(String),

    /// A handler failed in a way specific to its subcommand.
    #[error("{0}")]
    Command(String),

    /// No running daemon was found behind the pid file.
    #[error("daemon not reachable: {0}")]
    DaemonUnavailable(String),

    /// A payload could not be serialized for `--output json`.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Reading an input file or writing to stdout failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Domain error bubbled up from watchpost-core.
    #[error("{0}")]
    Core(#[from] WatchpostError),

    /// An eve.json capture could not be parsed during `import`.
    #[error("import error: {0}")]
    Import(String),
}

impl CliError {
    /// Exit code reported to the shell.
    ///
    /// | Code | Meaning               |
    /// |------|-----------------------|
    /// | 0    | Success               |
    /// | 1    | Command failure       |
    /// | 2    | Invalid configuration |
    /// | 3    | Daemon not running    |
    /// | 10   | IO failure            |
    ///
    /// Code 3 follows the LSB init-script convention for "program is
    /// not running", so scripts can probe `status` cheaply.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(WatchpostError::Config(_)) => 2,
            Self::DaemonUnavailable(_) => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Import(_) => 1,
        }
    }
}

impl From<EvePipelineError> for CliError {
    fn from(e: EvePipelineError) -> Self {
        Self::Import(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchpost_core::error::{ConfigError, PluginError};

    #[test]
    fn test_config_errors_map_to_exit_code_2() {
        let direct = CliError::Config("missing [eve] section".to_owned());
        assert_eq!(direct.exit_code(), 2);

        let wrapped = CliError::Core(WatchpostError::Config(ConfigError::FileNotFound {
            path: "watchpost.toml".to_owned(),
        }));
        assert_eq!(
            wrapped.exit_code(),
            2,
            "a config error stays code 2 even when it arrives via the core wrapper"
        );
    }

    #[test]
    fn test_daemon_unavailable_maps_to_exit_code_3() {
        let err = CliError::DaemonUnavailable("no pid file".to_owned());
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_io_errors_map_to_exit_code_10() {
        let err = CliError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "capture.json",
        ));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_remaining_variants_map_to_exit_code_1() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops")
            .expect_err("parse should fail");

        let code_one: Vec<CliError> = vec![
            CliError::Command("nothing to do".to_owned()),
            CliError::JsonSerialize(json_err),
            CliError::Import("truncated array".to_owned()),
            CliError::Core(WatchpostError::Plugin(PluginError::NotFound {
                name: "eve-pipeline".to_owned(),
            })),
        ];
        for err in code_one {
            assert_eq!(err.exit_code(), 1, "expected code 1 for {err:?}");
        }
    }

    #[test]
    fn test_config_display_carries_prefix_and_message() {
        let err = CliError::Config("poll_interval_ms must be positive".to_owned());
        let shown = err.to_string();
        assert!(shown.starts_with("configuration error:"), "got: {shown}");
        assert!(shown.contains("poll_interval_ms"), "got: {shown}");
    }

    #[test]
    fn test_command_display_is_the_bare_message() {
        let err = CliError::Command("no sessions connected".to_owned());
        assert_eq!(err.to_string(), "no sessions connected");
    }

    #[test]
    fn test_daemon_unavailable_display_points_at_the_pid_file() {
        let err = CliError::DaemonUnavailable(
            "no running daemon process (pid file: /run/watchpost.pid)".to_owned(),
        );
        let shown = err.to_string();
        assert!(shown.starts_with("daemon not reachable:"), "got: {shown}");
        assert!(shown.contains("/run/watchpost.pid"), "got: {shown}");
    }

    #[test]
    fn test_pipeline_parse_failure_becomes_import_error() {
        let err: CliError = EvePipelineError::Parse {
            line: 7,
            reason: "trailing comma".to_owned(),
        }
        .into();

        let CliError::Import(message) = err else {
            panic!("expected Import variant");
        };
        assert!(message.contains("trailing comma"), "got: {message}");
    }

    #[test]
    fn test_io_conversion_keeps_the_error_kind() {
        let cli_err: CliError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "eve.json").into();

        let CliError::Io(inner) = cli_err else {
            panic!("expected Io variant");
        };
        assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_core_conversion_preserves_the_domain_error_text() {
        let core_err = WatchpostError::Config(ConfigError::FileNotFound {
            path: "missing.toml".to_owned(),
        });
        let expected = core_err.to_string();

        let cli_err: CliError = core_err.into();
        assert_eq!(cli_err.to_string(), expected);
    }
}
