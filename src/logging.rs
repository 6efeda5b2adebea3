//! log4rs setup.

use crate::error::Error;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const FALLBACK_PATTERN: &str = "{d(%H:%M:%S)} {h({l:<5})} {m}{n}";

/// Initialise logging from `path`, or log info and above to stderr when the
/// file does not exist.
pub fn init(path: &Path) -> Result<(), Error> {
    if path.exists() {
        log4rs::init_file(path, Default::default())
            .map_err(|e| Error::Logging(format!("{}: {e}", path.display())))?;
        log::debug!("Logging configured from {}", path.display());
        return Ok(());
    }

    log4rs::init_config(fallback_config()?).map_err(|e| Error::Logging(e.to_string()))?;
    log::debug!("{} not found, logging to stderr", path.display());
    Ok(())
}

fn fallback_config() -> Result<Config, Error> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(FALLBACK_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_config_builds() {
        let config = fallback_config().expect("config");
        assert_eq!(config.root().level(), LevelFilter::Info);
        assert_eq!(config.appenders().len(), 1);
    }
}
