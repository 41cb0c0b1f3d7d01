use url::Url;

use crate::config::ConfigError;

pub(crate) fn optional_trimmed<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Reads every key, reporting all missing ones together rather than stopping
/// at the first.
pub(crate) fn require_all<F, const N: usize>(
    lookup: &F,
    keys: [&str; N],
) -> Result<[String; N], ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let values = keys.map(|key| optional_trimmed(lookup, key));
    let missing = keys
        .iter()
        .zip(values.iter())
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| (*key).to_string())
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        return Err(ConfigError::MissingVars(missing));
    }

    Ok(values.map(Option::unwrap_or_default))
}

pub(crate) fn parse_u32<F>(lookup: &F, key: &str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional_trimmed(lookup, key) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ConfigError::ParseInt(key.to_string())),
        None => Ok(default),
    }
}

pub(crate) fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional_trimmed(lookup, key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::ParseInt(key.to_string())),
        None => Ok(default),
    }
}

/// The value must parse as an absolute `http` or `https` URL with a host.
pub(crate) fn require_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|err| ConfigError::InvalidConfiguration(format!("{key} is not a valid URL: {err}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidConfiguration(format!(
            "{key} must be an http:// or https:// URL with a host"
        )));
    }
    Ok(())
}
