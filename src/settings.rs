use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "YAHRTZEIT";
const CONFIG_FILE: &str = "yahrtzeit";

/// Run configuration: built-in defaults, then `yahrtzeit.toml` if present,
/// then `YAHRTZEIT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Topic URL up to and including the `start=` parameter.
    pub base_url: String,
    pub page_start: u32,
    /// Exclusive.
    pub page_end: u32,
    pub page_step: u32,
    /// Only this user's posts are scanned.
    pub author: String,
    pub output: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub accept_invalid_certs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "https://forum.yidtish.com/viewtopic.php?t=803&start=".to_string(),
            page_start: 0,
            page_end: 300,
            page_step: 25,
            author: "אלטערנעסייד פארקינג".to_string(),
            output: "new_yahrtzeit_cache.json".to_string(),
            timeout_secs: 10,
            concurrency: 10,
            accept_invalid_certs: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_with(Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(env: Environment) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env)
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.page_step > 0, "page_step must be positive");
        ensure!(self.concurrency > 0, "concurrency must be positive");
        Ok(())
    }

    /// One URL per page offset, in offset order.
    pub fn page_urls(&self) -> Vec<String> {
        (self.page_start..self.page_end)
            .step_by(self.page_step as usize)
            .map(|start| format!("{}{}", self.base_url, start))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn defaults_cover_twelve_pages() {
        let urls = Settings::default().page_urls();
        assert_eq!(urls.len(), 12);
        assert!(urls[0].ends_with("start=0"));
        assert!(urls[11].ends_with("start=275"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let s = Settings::load_with(env(&[
            ("YAHRTZEIT_PAGE_END", "50"),
            ("YAHRTZEIT_OUTPUT", "out.json"),
            ("YAHRTZEIT_ACCEPT_INVALID_CERTS", "true"),
        ]))
        .unwrap();
        assert_eq!(s.page_end, 50);
        assert_eq!(s.output, "out.json");
        assert!(s.accept_invalid_certs);
        assert_eq!(s.author, Settings::default().author);
        assert_eq!(s.page_urls().len(), 2);
    }

    #[test]
    fn zero_step_rejected() {
        assert!(Settings::load_with(env(&[("YAHRTZEIT_PAGE_STEP", "0")])).is_err());
    }

    #[test]
    fn empty_range_yields_no_pages() {
        let s = Settings { page_start: 100, page_end: 100, ..Settings::default() };
        assert!(s.page_urls().is_empty());
    }
}
