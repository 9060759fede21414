//! Key/value configuration: built-in defaults, an optional `musterrc`
//! file, and command-line overrides, applied in that order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

use crate::dates::DisplayFormat;
use crate::holiday::{HolidayProvider, HolidayTable};
use crate::segment::MergeMode;

const RC_ENV_VAR: &str = "MUSTERRC";
const RC_FILE_NAME: &str = "musterrc";

#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rc_override))]
    pub fn load(rc_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map.insert("merge.mode".to_string(), "keep".to_string());
        cfg.map.insert("display.format".to_string(), "dotted".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());
        cfg.map.insert("confirmation".to_string(), "on".to_string());

        if let Some(path) = resolve_rc_path(rc_override) {
            info!(rc = %path.display(), "loading musterrc");
            cfg.load_file(&path)?;
        } else {
            debug!("no musterrc found; using defaults");
        }

        Ok(cfg)
    }

    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }

    /// The configured global merge mode.
    pub fn merge_mode(&self) -> anyhow::Result<MergeMode> {
        let raw = self.get("merge.mode").unwrap_or_else(|| "keep".to_string());
        MergeMode::parse(&raw)
            .ok_or_else(|| anyhow!("invalid merge.mode: {raw} (expected keep, red, or all)"))
    }

    /// The configured display format.
    pub fn display_format(&self) -> anyhow::Result<DisplayFormat> {
        let raw = self
            .get("display.format")
            .unwrap_or_else(|| "dotted".to_string());
        DisplayFormat::parse(&raw)
            .ok_or_else(|| anyhow!("invalid display.format: {raw} (expected short or dotted)"))
    }

    /// The holiday table: `holidays.file` when set, otherwise the
    /// built-in region table.
    pub fn holiday_provider(&self) -> anyhow::Result<Box<dyn HolidayProvider>> {
        match self.get("holidays.file") {
            Some(path) if !path.trim().is_empty() => {
                let table = HolidayTable::from_file(Path::new(path.trim()))
                    .context("failed to load holidays.file")?;
                Ok(Box::new(table))
            }
            _ => Ok(Box::new(HolidayTable::korea())),
        }
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.loaded_files.push(path.to_path_buf());

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }
            if line.is_empty() {
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

fn resolve_rc_path(rc_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = rc_override {
        return Some(path.to_path_buf());
    }

    if let Ok(raw) = std::env::var(RC_ENV_VAR) {
        let trimmed = raw.trim();
        if trimmed == "/dev/null" || trimmed.is_empty() {
            return None;
        }
        return Some(PathBuf::from(trimmed));
    }

    let candidate = PathBuf::from(RC_FILE_NAME);
    if candidate.exists() {
        Some(candidate)
    } else {
        warn!("no {RC_FILE_NAME} in working directory");
        None
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::Config;
    use crate::dates::DisplayFormat;
    use crate::segment::MergeMode;

    fn rc_with(contents: &str) -> Config {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{contents}").expect("write rc");
        Config::load(Some(file.path())).expect("load config")
    }

    #[test]
    fn defaults_without_rc_file() {
        let cfg = rc_with("");
        assert_eq!(cfg.merge_mode().expect("mode"), MergeMode::Keep);
        assert_eq!(cfg.display_format().expect("format"), DisplayFormat::YearDotted);
        assert_eq!(cfg.get_bool("color"), Some(true));
        assert_eq!(cfg.get_bool("confirmation"), Some(true));
    }

    #[test]
    fn rc_file_overrides_defaults_and_skips_comments() {
        let cfg = rc_with(
            "# session defaults\n\
             merge.mode = red\n\
             display.format = short  # terse output\n\
             confirmation = off\n",
        );
        assert_eq!(cfg.merge_mode().expect("mode"), MergeMode::Red);
        assert_eq!(cfg.display_format().expect("format"), DisplayFormat::MonthDay);
        assert_eq!(cfg.get_bool("confirmation"), Some(false));
    }

    #[test]
    fn overrides_win_over_rc_file() {
        let mut cfg = rc_with("merge.mode = red\n");
        cfg.apply_overrides([("rc.merge.mode".to_string(), "all".to_string())]);
        assert_eq!(cfg.merge_mode().expect("mode"), MergeMode::All);
    }

    #[test]
    fn invalid_mode_value_is_an_error() {
        let cfg = rc_with("merge.mode = sometimes\n");
        assert!(cfg.merge_mode().is_err());
    }

    #[test]
    fn malformed_line_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "just some words").expect("write rc");
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn default_provider_is_the_builtin_region() {
        let cfg = rc_with("");
        let provider = cfg.holiday_provider().expect("provider");
        assert_eq!(provider.name(), "South Korea");
    }

    #[test]
    fn provider_from_file_key() {
        let mut holidays = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(holidays, "name = \"elsewhere\"\ndates = [\"2024-05-01\"]").expect("write");

        let cfg = rc_with(&format!(
            "holidays.file = {}\n",
            holidays.path().display()
        ));
        let provider = cfg.holiday_provider().expect("provider");
        assert_eq!(provider.name(), "elsewhere");
    }
}
