use std::path::PathBuf;

use axum::http::Uri;
use serde_aux::field_attributes::deserialize_number_from_string;

const DEFAULT_ALPHA_ORIGIN: &str = "http://localhost:4000";
const DEFAULT_ALPHA_BASE_PATH: &str = "/alpha";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub storage: StorageSettings,
    pub static_files: StaticFilesSettings,
    pub alpha: AlphaSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct StorageSettings {
    pub subscribers_file: PathBuf,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct StaticFilesSettings {
    pub root: PathBuf,
}

/// Where `/alpha` requests are sent. Both values are taken as written;
/// use [`AlphaSettings::redirect`] to get their normalized form.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AlphaSettings {
    pub origin: String,
    pub base_path: String,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AlphaSettings {
    pub fn redirect(&self) -> AlphaRedirect {
        AlphaRedirect {
            origin: normalize_origin(&self.origin),
            base_path: normalize_base_path(&self.base_path),
        }
    }
}

/// Normalized alpha location: `origin` has no path, `base_path` is either
/// empty or starts with `/` and has no trailing slash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaRedirect {
    pub origin: String,
    pub base_path: String,
}

impl AlphaRedirect {
    /// Maps a request under `/alpha` onto the alpha application.
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        let remainder = path.strip_prefix("/alpha").unwrap_or(path);
        let remainder = match remainder {
            "" | "/" => "/login".to_string(),
            r if r.starts_with('/') => r.to_string(),
            r => format!("/{}", r),
        };
        match query {
            Some(q) if !q.is_empty() => {
                format!("{}{}{}?{}", self.origin, self.base_path, remainder, q)
            }
            _ => format!("{}{}{}", self.origin, self.base_path, remainder),
        }
    }
}

fn normalize_origin(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_ALPHA_ORIGIN.to_string();
    }
    let with_scheme = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    match origin_of(&with_scheme) {
        Some(origin) => origin,
        None => {
            tracing::error!(
                alpha_origin = %with_scheme,
                "Invalid alpha origin, using default {}",
                DEFAULT_ALPHA_ORIGIN
            );
            DEFAULT_ALPHA_ORIGIN.to_string()
        }
    }
}

// Matches `[a-zA-Z][a-zA-Z0-9+.-]*://` at the start of `s`.
fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn origin_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let scheme = uri.scheme_str()?.to_ascii_lowercase();
    let authority = uri.authority()?;
    let host = authority.host();
    if host.is_empty() {
        return None;
    }
    let host = host.to_ascii_lowercase();
    let default_port = match scheme.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    match authority.port_u16() {
        Some(port) if Some(port) != default_port => {
            Some(format!("{}://{}:{}", scheme, host, port))
        }
        _ => Some(format!("{}://{}", scheme, host)),
    }
}

// An unset (empty) value means the default mount; a blank one means the root.
fn normalize_base_path(raw: &str) -> String {
    if raw.is_empty() {
        return DEFAULT_ALPHA_BASE_PATH.to_string();
    }
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// The possible runtime environment for our application.
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, anyhow::Error> {
    let base_path = std::env::current_dir()?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment, defaulting to `local`.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // E.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        // Plain variables understood by the hosting platform win over everything.
        .set_override_option("application.port", std::env::var("PORT").ok())?
        .set_override_option("alpha.origin", std::env::var("ALPHA_ORIGIN").ok())?
        .set_override_option("alpha.base_path", std::env::var("ALPHA_BASE_PATH").ok())?
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}
