//!
//! # Client configuration
//!
//! Where the ledger's REST API lives, which key signs submissions and how
//! long to wait for commits. Values come from defaults, an optional
//! TOML (or JSON) file, then `CRYPTOPORT_*` environment variables.
//!

#![deny(missing_docs)]

mod test;

use {
    ruc::*,
    serde::{Deserialize, Serialize},
    std::{
        convert::TryFrom,
        env, fs,
        path::{Path, PathBuf},
        time::Duration,
    },
    tracing::debug,
};

/// REST API of a local validator.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8008";

#[allow(missing_docs)]
pub const ENV_URL: &str = "CRYPTOPORT_URL";
#[allow(missing_docs)]
pub const ENV_KEYFILE: &str = "CRYPTOPORT_KEYFILE";
/// Seconds to wait for a commit; `0` disables waiting.
pub const ENV_WAIT: &str = "CRYPTOPORT_WAIT";

/// Settings of a cryptoport client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, with or without a scheme.
    pub url: String,
    /// Hex private key file; `None` means a throwaway random key.
    pub keyfile: Option<PathBuf>,
    /// Commit wait; `None` or zero returns right after submission.
    pub wait: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            url: DEFAULT_URL.to_owned(),
            keyfile: None,
            wait: None,
        }
    }
}

/// On-disk shape, every field optional.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ClientConfigStr {
    #[allow(missing_docs)]
    pub url: Option<String>,
    #[allow(missing_docs)]
    pub keyfile: Option<String>,
    /// In seconds.
    pub wait: Option<u64>,
}

impl TryFrom<ClientConfigStr> for ClientConfig {
    type Error = Box<dyn RucError>;

    fn try_from(cfg: ClientConfigStr) -> Result<Self> {
        let mut res = ClientConfig::default();
        if let Some(url) = cfg.url {
            res.url = check_url(url).c(d!())?;
        }
        res.keyfile = cfg.keyfile.filter(|k| !k.is_empty()).map(PathBuf::from);
        res.wait = cfg.wait.map(Duration::from_secs);
        Ok(res)
    }
}

impl ClientConfig {
    /// Load from a file, TOML first and JSON as a fallback.
    pub fn from_file(path: &Path) -> Result<ClientConfig> {
        let content = fs::read_to_string(path).c(d!(path.display().to_string()))?;
        let raw = toml::from_str::<ClientConfigStr>(&content)
            .c(d!())
            .or_else(|e| serde_json::from_str::<ClientConfigStr>(&content).c(d!(e)))?;
        debug!(path = %path.display(), "client config loaded");
        ClientConfig::try_from(raw).c(d!())
    }

    /// Defaults overlaid with the process environment.
    #[inline(always)]
    pub fn from_env() -> Result<ClientConfig> {
        ClientConfig::default().overlay(|k| env::var(k).ok())
    }

    /// `path` if given, then the process environment on top.
    pub fn load(path: Option<&Path>) -> Result<ClientConfig> {
        path.map(ClientConfig::from_file)
            .unwrap_or_else(|| Ok(ClientConfig::default()))
            .c(d!())?
            .overlay(|k| env::var(k).ok())
    }

    /// Replace fields with whatever `lookup` yields for the `CRYPTOPORT_*`
    /// names. Empty values are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_URL) {
            self.url = check_url(url).c(d!())?;
        }
        if let Some(keyfile) = get(ENV_KEYFILE) {
            self.keyfile = Some(PathBuf::from(keyfile));
        }
        if let Some(wait) = get(ENV_WAIT) {
            let secs = wait
                .parse::<u64>()
                .c(d!(format!("{ENV_WAIT} must be a number of seconds")))?;
            self.wait = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }

    /// The wait to use, `None` when waiting is disabled.
    #[inline(always)]
    pub fn effective_wait(&self) -> Option<Duration> {
        self.wait.filter(|w| !w.is_zero())
    }
}

/// `~/.sawtooth/keys/<user>.priv`, where validator tooling keeps user keys.
pub fn default_keyfile() -> Result<PathBuf> {
    let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_owned());
    let user = ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|k| env::var(k).ok().filter(|u| !u.is_empty()))
        .ok_or_else(|| eg!("can not determine the current user"))?;
    Ok(keyfile_for(Path::new(&home), &user))
}

#[inline(always)]
fn keyfile_for(home: &Path, user: &str) -> PathBuf {
    home.join(".sawtooth").join("keys").join(format!("{user}.priv"))
}

fn check_url(url: String) -> Result<String> {
    let url = url.trim().trim_end_matches('/').to_owned();
    if url.is_empty() || url.contains(char::is_whitespace) {
        return Err(eg!(format!("invalid url: {url:?}")));
    }
    Ok(url)
}
