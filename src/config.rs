use ini::Ini;
use std::path::{Path, PathBuf};

use crate::error::{CoverageError, Result};
use crate::probe::ProbeSettings;

pub const DEFAULT_API_URL: &str = "https://api.ibm.com/geospatial/run/na/core/v3";
pub const DEFAULT_AUTH_URL: &str = "https://api.ibm.com/saascore/run/authentication-retrieve";
pub const DEFAULT_COVERAGE_LABEL: &str = "Global";
pub const DEFAULT_EXPORT_DIR: &str = "export";

const SECTION: &str = "EI";

/// Credentials and endpoints for the EI API.
#[derive(Clone)]
pub struct ClientConfig {
    pub org_id: String,
    pub tenant_id: String,
    pub api_key: String,
    /// Geospatial API base, e.g. `https://api.ibm.com/geospatial/run/na/core/v3`.
    pub api_url: String,
    /// API-key authentication base.
    pub auth_url: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("org_id", &self.org_id)
            .field("tenant_id", &self.tenant_id)
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

/// Values given explicitly, e.g. on the command line. They win over
/// environment variables, which win over the secrets file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub org_id: Option<String>,
    pub tenant_id: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub auth_url: Option<String>,
    /// Secrets file to read instead of the default search path.
    pub secrets: Option<PathBuf>,
}

/// Everything one run of the tool works from.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub coverage_label: String,
    pub batch_size: usize,
    pub probe: ProbeSettings,
    pub export_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            coverage_label: DEFAULT_COVERAGE_LABEL.to_string(),
            batch_size: 1,
            probe: ProbeSettings::default(),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

#[derive(Debug, Default)]
struct SecretsFile {
    org_id: Option<String>,
    tenant_id: Option<String>,
    api_key: Option<String>,
    api_url: Option<String>,
    auth_url: Option<String>,
}

/// Resolves the client configuration from overrides, the process
/// environment and the secrets file.
pub fn load_config(overrides: Overrides) -> Result<ClientConfig> {
    let candidates = match &overrides.secrets {
        Some(p) => vec![p.clone()],
        None => secrets_candidates(std::env::var("EI_SECRETS").ok()),
    };
    resolve(overrides, |name| std::env::var(name).ok(), &candidates)
}

pub(crate) fn resolve<E>(overrides: Overrides, env: E, candidates: &[PathBuf]) -> Result<ClientConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    // Every key falls back independently, so the file is read even when
    // all credentials are already known.
    let file = match candidates.iter().find(|p| p.exists()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "reading secrets file");
            read_secrets(path)?
        }
        None => SecretsFile::default(),
    };

    let org_id = overrides.org_id.or_else(|| lookup("EI_ORG_ID")).or(file.org_id);
    let tenant_id = overrides
        .tenant_id
        .or_else(|| lookup("EI_TENANT_ID"))
        .or(file.tenant_id);
    let api_key = overrides.api_key.or_else(|| lookup("EI_API_KEY")).or(file.api_key);
    let api_url = overrides.api_url.or_else(|| lookup("EI_API_URL")).or(file.api_url);
    let auth_url = overrides
        .auth_url
        .or_else(|| lookup("EI_AUTH_URL"))
        .or(file.auth_url);

    let missing = |key: &'static str, var: &str| {
        let hint = if candidates.is_empty() {
            format!("set {} or create auth/secrets.ini", var)
        } else {
            format!(
                "set {} or put `{}` in the [{}] section of one of: {}",
                var,
                key,
                SECTION,
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        CoverageError::ConfigMissing { key, hint }
    };

    Ok(ClientConfig {
        org_id: org_id.ok_or_else(|| missing("api.org_id", "EI_ORG_ID"))?,
        tenant_id: tenant_id.ok_or_else(|| missing("api.tenant_id", "EI_TENANT_ID"))?,
        api_key: api_key.ok_or_else(|| missing("api.api_key", "EI_API_KEY"))?,
        api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        auth_url: auth_url.unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
    })
}

fn read_secrets(path: &Path) -> Result<SecretsFile> {
    let ini = Ini::load_from_file(path).map_err(|source| CoverageError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(section) = ini.section(Some(SECTION)) else {
        return Ok(SecretsFile::default());
    };
    let get = |key: &str| {
        section
            .get(key)
            .map(strip_quotes)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Ok(SecretsFile {
        org_id: get("api.org_id"),
        tenant_id: get("api.tenant_id"),
        api_key: get("api.api_key"),
        api_url: get("api.url"),
        auth_url: get("api.auth_url"),
    })
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn secrets_candidates(explicit: Option<String>) -> Vec<PathBuf> {
    // 1) EI_SECRETS (explicit)
    // 2) ./auth/secrets.ini
    // 3) ~/.ei/secrets.ini
    if let Some(p) = explicit {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join("auth").join("secrets.ini"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".ei").join("secrets.ini"));
    }
    v
}
