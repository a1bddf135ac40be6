use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::errors::ConfigError;
use crate::initialization::Logging;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}";

/// Installs log4rs as the global logger
///
/// Logs always go to stderr, leaving stdout to the program output, and additionally to a
/// file when a log path is configured.
///
/// # Arguments
///
/// * 'logging' - logging section of the configuration
pub fn setup_logger(logging: &Logging) -> Result<(), ConfigError> {
    let config = logger_config(logging)?;
    log4rs::init_config(config)?;

    Ok(())
}

fn logger_config(logging: &Logging) -> Result<Config, ConfigError> {
    let level = logging.level_filter()?;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut root = Root::builder().appender("stderr");

    if let Some(log_path) = &logging.log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(log_path)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    Ok(builder.build(root.build(level))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_only_config() {
        let config = logger_config(&Logging::default()).unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_file_appender_added() {
        let dir = tempfile::tempdir().unwrap();
        let logging = Logging {
            level: "warn".to_string(),
            log_path: Some(dir.path().join("weatherstore.log").to_str().unwrap().to_string()),
        };

        let config = logger_config(&logging).unwrap();
        assert_eq!(config.appenders().len(), 2);
        assert_eq!(config.root().appenders().len(), 2);
        assert_eq!(config.root().level(), log::LevelFilter::Warn);
    }
}
