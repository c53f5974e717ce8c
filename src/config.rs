use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("SOS_API_URL").ok());
    let mut key = key.or_else(|| std::env::var("SOS_API_KEY").ok());

    let rc_candidates = rc_candidates();
    let mut file_verify: Option<bool> = None;

    if url.is_none() || key.is_none() || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read configuration file {}: {}",
                        rc_path.display(),
                        e
                    ))
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if key.is_none() {
                    key = cfg.key;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let url = url.ok_or_else(|| missing("url", "SOS_API_URL", &rc_candidates))?;
    let key = key.ok_or_else(|| missing("key", "SOS_API_KEY", &rc_candidates))?;
    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig { url, key, verify })
}

fn missing(field: &str, env_var: &str, rc_candidates: &[PathBuf]) -> Error {
    if rc_candidates.is_empty() {
        return Error::Config(format!(
            "missing {field} (set {env_var} or create .sosapirc)"
        ));
    }
    Error::Config(format!(
        "missing {field} (set {env_var} or put `{field}:` in one of: {})",
        rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn read_rc(path: &Path) -> std::io::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // Support formatting where `key:` is on one line and the token is on the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key {
            // Continuation value line (no colon)
            if !line.contains(':') {
                let v = strip_quotes(line);
                match pk {
                    "url" => cfg.url = Some(v.to_string()),
                    "key" => cfg.key = Some(v.to_string()),
                    _ => {}
                }
                pending_key = None;
                continue;
            }
            pending_key = None;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    } else {
                        pending_key = Some("url");
                    }
                }
                "key" => {
                    if !v.is_empty() {
                        cfg.key = Some(v.to_string());
                    } else {
                        pending_key = Some("key");
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
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

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) SOS_API_RC (explicit)
    // 2) ./.sosapirc (current working directory)
    // 3) ~/.sosapirc
    if let Ok(p) = std::env::var("SOS_API_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".sosapirc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".sosapirc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rc() {
        let cfg = parse_rc("url: https://example.test/api\nkey: abc123\n");
        assert_eq!(cfg.url.as_deref(), Some("https://example.test/api"));
        assert_eq!(cfg.key.as_deref(), Some("abc123"));
        assert_eq!(cfg.verify, None);
    }

    #[test]
    fn skips_comments_and_strips_quotes() {
        let cfg = parse_rc("# credentials\nurl: \"https://example.test\"\nkey: 'abc'\nverify: 0\n");
        assert_eq!(cfg.url.as_deref(), Some("https://example.test"));
        assert_eq!(cfg.key.as_deref(), Some("abc"));
        assert_eq!(cfg.verify, Some(false));
    }

    #[test]
    fn value_may_continue_on_next_line() {
        let cfg = parse_rc("key:\nabc123\nurl: https://example.test\n");
        assert_eq!(cfg.key.as_deref(), Some("abc123"));
        assert_eq!(cfg.url.as_deref(), Some("https://example.test"));
    }
}
