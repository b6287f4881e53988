//! INI file configuration adapter.
//!
//! Sections read by the engine: `[backtest]`, `[strategy]` and `[sweep]`.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use log::debug;
use std::path::Path;

pub const KNOWN_SECTIONS: [&str; 3] = ["backtest", "strategy", "sweep"];

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path.as_ref()).map_err(std::io::Error::other)?;
        debug!(
            "{}: sections {:?}",
            path.as_ref().display(),
            config.sections()
        );
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Section names present in the file, lowercased and sorted.
    pub fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }

    /// Sections the engine never reads; usually a typo.
    pub fn unknown_sections(&self) -> Vec<String> {
        self.sections()
            .into_iter()
            .filter(|s| s != "default" && !KNOWN_SECTIONS.contains(&s.as_str()))
            .collect()
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
