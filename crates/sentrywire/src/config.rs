//! Appliance profiles and how a command's settings are resolved.
//!
//! `~/.config/sentrywire/config.toml` (platform equivalent) holds named
//! profiles; `SENTRYWIRE_*` variables can override any key of it. Flags and
//! their `SW_*`/`TARGET` variables win over both. The result is a
//! [`Session`]: a host, a login and a ready `ClientConfig` for the library.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use sentrywire_api::{
    ClientConfig, DEFAULT_API_VERSION, DEFAULT_PORT, MaxRetries, RetryPolicy, TlsMode,
    TransportConfig,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

const FALLBACK_PROFILE: &str = "default";
const KEYRING_SERVICE: &str = "sentrywire";

/// Whole `config.toml`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used without `--profile`.
    pub default_profile: Option<String>,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(FALLBACK_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

/// `[defaults]`: applies to every profile that leaves the key unset.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    pub insecure: bool,
    /// Seconds per request.
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: 30,
        }
    }
}

/// `[profiles.<name>]`: one appliance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Appliance address, e.g. `10.1.55.176`. No port here; see `port`.
    pub target: Option<String>,
    pub port: Option<u16>,
    pub api_version: Option<String>,
    pub username: Option<String>,
    /// Stored in clear text; the keyring is consulted first.
    pub password: Option<String>,
    /// PEM bundle trusted for the appliance's certificate.
    pub ca_cert: Option<PathBuf>,
    pub insecure: Option<bool>,
    pub timeout: Option<u64>,
}

pub fn config_path() -> PathBuf {
    match ProjectDirs::from("com", "sentrywire", "sentrywire") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => std::env::var_os("HOME")
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".config/sentrywire/config.toml"),
    }
}

/// Read `config.toml` with `SENTRYWIRE_` overrides applied. A missing file
/// is an empty config.
pub fn load_config() -> Result<Config, CliError> {
    load_config_from(figment_for(config_path()))
}

fn figment_for(path: PathBuf) -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SENTRYWIRE_").split("__"))
}

fn load_config_from(figment: Figment) -> Result<Config, CliError> {
    Ok(figment.extract()?)
}

/// `--profile`, else the file's `default_profile`, else `default`.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .as_deref()
        .or(config.default_profile.as_deref())
        .unwrap_or(FALLBACK_PROFILE)
        .to_owned()
}

/// Everything needed to open a session.
#[derive(Debug)]
pub struct Session {
    pub profile: String,
    pub target: String,
    pub username: String,
    pub password: SecretString,
    pub client: ClientConfig,
}

/// Resolve the session a command runs in. Only a profile named with
/// `--profile` has to exist; the implicit one may be absent.
pub fn resolve_session(config: &Config, global: &GlobalOpts) -> Result<Session, CliError> {
    let name = active_profile_name(global, config);
    let profile = match (config.profiles.get(&name), &global.profile) {
        (Some(profile), _) => profile.clone(),
        (None, None) => Profile::default(),
        (None, Some(_)) => {
            let mut known: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            known.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if known.is_empty() {
                    "(none)".into()
                } else {
                    known.join(", ")
                },
            });
        }
    };

    let Some(target) = global.target.clone().or_else(|| profile.target.clone()) else {
        return Err(CliError::NoTarget {
            path: config_path().display().to_string(),
        });
    };
    let client = client_config(&profile, &config.defaults, global);
    let username = global
        .username
        .clone()
        .or_else(|| profile.username.clone())
        .ok_or_else(|| CliError::NoCredentials {
            profile: name.clone(),
        })?;
    let password = password(&profile, &name, &username, global)?;

    Ok(Session {
        profile: name,
        target,
        username,
        password,
        client,
    })
}

fn client_config(profile: &Profile, defaults: &Defaults, global: &GlobalOpts) -> ClientConfig {
    let insecure = global.insecure || profile.insecure.unwrap_or(defaults.insecure);
    let tls = match (&profile.ca_cert, insecure) {
        (_, true) => TlsMode::DangerAcceptInvalid,
        (Some(ca), false) => TlsMode::CustomCa(ca.clone()),
        (None, false) => TlsMode::System,
    };
    let timeout = global.timeout.or(profile.timeout).unwrap_or(defaults.timeout);
    let retry = global.retries.map_or_else(RetryPolicy::default, |max| RetryPolicy {
        max_retries: MaxRetries::Limited(max),
        ..RetryPolicy::enabled()
    });

    ClientConfig {
        port: global.port.or(profile.port).unwrap_or(DEFAULT_PORT),
        api_version: profile
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned()),
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout),
            ..TransportConfig::default()
        },
        retry,
    }
}

/// Password lookup order: `--password`/`SW_PASSWORD`, the OS keyring entry
/// `<profile>/<username>`, the profile file, then a prompt when a terminal
/// is attached.
fn password(
    profile: &Profile,
    profile_name: &str,
    username: &str,
    global: &GlobalOpts,
) -> Result<SecretString, CliError> {
    let stored = global
        .password
        .clone()
        .or_else(|| keyring_password(profile_name, username))
        .or_else(|| profile.password.clone());
    if let Some(password) = stored {
        return Ok(SecretString::from(password));
    }

    if std::io::stdin().is_terminal() {
        let typed = rpassword::prompt_password(format!("Password for {username}: "))?;
        return Ok(SecretString::from(typed));
    }
    Err(CliError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_password(profile_name: &str, username: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{username}"))
        .and_then(|entry| entry.get_password())
        .ok()
}
