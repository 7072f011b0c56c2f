use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Per-target levels, written as `{ "evadmin_client": "debug" }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct LoggerTargets {
    directives: Vec<Directive>,
}

impl LoggerTargets {
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    fn apply(&self, filter: EnvFilter) -> EnvFilter {
        self.directives
            .iter()
            .cloned()
            .fold(filter, EnvFilter::add_directive)
    }
}

impl TryFrom<BTreeMap<String, String>> for LoggerTargets {
    type Error = ParseError;

    fn try_from(targets: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let directives = targets
            .iter()
            .map(|(target, level)| format!("{target}={level}").parse())
            .collect::<Result<_, _>>()?;
        Ok(Self { directives })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub outputs: Vec<LoggerOutput>,
    pub targets: LoggerTargets,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            outputs: vec![LoggerOutput::Stderr(LoggerStderrOutput::default())],
            targets: LoggerTargets::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum LoggerOutput {
    Stderr(LoggerStderrOutput),
    File(LoggerFileOutput),
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

impl LoggerOutput {
    fn as_layer<S>(&self) -> Result<BoxedLayer<S>>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        match self {
            Self::Stderr(stderr) => Ok(stderr.as_layer()),
            Self::File(file) => file.as_layer(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LoggerStderrOutput {
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggerStderrOutput {
    fn as_layer<S>(&self) -> BoxedLayer<S>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        match self.format {
            LogFormat::Human => fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .boxed(),
            LogFormat::Json => tracing_stackdriver::layer()
                .with_writer(std::io::stderr)
                .boxed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerFileOutput {
    pub dir: PathBuf,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "log_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "max_log_files")]
    pub max_files: NonZeroUsize,
}

impl LoggerFileOutput {
    fn as_layer<S>(&self) -> Result<BoxedLayer<S>>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let writer = tracing_appender::rolling::Builder::new()
            .rotation(Rotation::DAILY)
            .filename_prefix(&self.file_prefix)
            .max_log_files(self.max_files.get())
            .build(&self.dir)
            .with_context(|| format!("failed to open log dir {}", self.dir.display()))?;

        Ok(match self.format {
            LogFormat::Human => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
            LogFormat::Json => tracing_stackdriver::layer().with_writer(writer).boxed(),
        })
    }
}

fn log_file_prefix() -> String {
    "evadmin.log".to_owned()
}

fn max_log_files() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(6)
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_level`; per-target levels from the config
/// are applied on top of both. Fails if a subscriber is already installed.
pub fn init_logger(config: &LoggerConfig, default_level: LevelFilter) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let filter = config.targets.apply(filter);

    let outputs = config
        .outputs
        .iter()
        .map(|o| o.as_layer())
        .collect::<Result<Vec<_>>>()?;

    let subscriber = tracing_subscriber::registry().with(filter).with(outputs);
    tracing::subscriber::set_global_default(subscriber)
        .context("logger was already initialized")
}

/// Routes panics through `tracing` and exits with a failure code, so a
/// panic inside a spawned task still stops the whole command.
pub fn set_abort_with_tracing() {
    std::panic::set_hook(Box::new(|info| {
        use std::io::Write;

        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%backtrace, "panic: {info}");
        eprintln!("fatal: {info}");

        std::io::stdout().flush().ok();
        std::io::stderr().flush().ok();

        #[allow(clippy::exit)]
        std::process::exit(101);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_human_stderr() {
        let config: LoggerConfig = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            config.outputs.as_slice(),
            [LoggerOutput::Stderr(LoggerStderrOutput {
                format: LogFormat::Human
            })]
        ));
        assert!(config.targets.is_empty());
    }

    #[test]
    fn parses_outputs_and_targets() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{
                "outputs": [
                    { "type": "Stderr", "format": "json" },
                    { "type": "File", "dir": "/var/log/evadmin" }
                ],
                "targets": { "evadmin_client": "debug", "reqwest": "warn" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.outputs.len(), 2);
        let LoggerOutput::File(file) = &config.outputs[1] else {
            panic!("expected file output");
        };
        assert_eq!(file.file_prefix, "evadmin.log");
        assert_eq!(file.max_files.get(), 7);
        assert_eq!(config.targets.directives.len(), 2);
    }

    #[test]
    fn rejects_unknown_level() {
        let err = serde_json::from_str::<LoggerConfig>(r#"{ "targets": { "x": "loud" } }"#);
        assert!(err.is_err());
    }
}
