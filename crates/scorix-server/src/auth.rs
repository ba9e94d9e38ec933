//! Token authentication for the envelope request.
//!
//! Regular callers prove knowledge of `account + login + salt`; admin
//! callers prove knowledge of the admin salt bound to the current hour,
//! so an admin token is only valid within the hour it was minted in.

use scorix_core::MethodRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::OffsetDateTime;
use time::macros::format_description;

/// Salts for the digest computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_salt")]
    pub salt: String,
    #[serde(default = "default_admin_salt")]
    pub admin_salt: String,
}

fn default_salt() -> String {
    "Otus".into()
}
fn default_admin_salt() -> String {
    "42".into()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            admin_salt: default_admin_salt(),
        }
    }
}

/// Hour-resolution timestamp in the server's local time zone, `YYYYMMDDHH`.
fn hour_stamp() -> String {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(format_description!("[year][month][day][hour]"))
        .unwrap_or_default()
}

fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Digest expected from an admin caller for the current hour.
pub fn admin_digest(cfg: &AuthConfig) -> String {
    sha512_hex(&format!("{}{}", hour_stamp(), cfg.admin_salt))
}

/// Digest expected from a regular caller; a missing account counts as
/// the empty string.
pub fn user_digest(account: Option<&str>, login: &str, cfg: &AuthConfig) -> String {
    sha512_hex(&format!(
        "{}{}{}",
        account.unwrap_or_default(),
        login,
        cfg.salt
    ))
}

/// Compare the caller-supplied token against the expected digest.
///
/// The hex comparison is case-sensitive and constant-time; a failed check
/// reveals nothing about the expected digest.
pub fn check_auth(request: &MethodRequest, cfg: &AuthConfig) -> bool {
    let expected = if request.is_admin() {
        admin_digest(cfg)
    } else {
        user_digest(request.account.as_deref(), &request.login, cfg)
    };
    constant_time_eq(request.token.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(account: Option<&str>, login: &str, token: &str) -> MethodRequest {
        let mut body = json!({
            "login": login,
            "token": token,
            "arguments": {},
            "method": "online_score",
        });
        if let Some(account) = account {
            body["account"] = json!(account);
        }
        MethodRequest::parse(&body).unwrap()
    }

    #[test]
    fn user_digest_matches_manual_sha512() {
        let cfg = AuthConfig::default();
        let expected = hex::encode(Sha512::digest("horns&hoofsh&fOtus".as_bytes()));
        assert_eq!(user_digest(Some("horns&hoofs"), "h&f", &cfg), expected);
    }

    #[test]
    fn missing_account_defaults_to_empty_string() {
        let cfg = AuthConfig::default();
        assert_eq!(user_digest(None, "h&f", &cfg), user_digest(Some(""), "h&f", &cfg));
    }

    #[test]
    fn valid_user_token_passes() {
        let cfg = AuthConfig::default();
        let token = user_digest(Some("horns&hoofs"), "h&f", &cfg);
        assert!(check_auth(&envelope(Some("horns&hoofs"), "h&f", &token), &cfg));
    }

    #[test]
    fn wrong_token_fails() {
        let cfg = AuthConfig::default();
        assert!(!check_auth(&envelope(Some("horns&hoofs"), "h&f", "sdd"), &cfg));
        assert!(!check_auth(&envelope(Some("horns&hoofs"), "h&f", ""), &cfg));
    }

    #[test]
    fn admin_token_is_bound_to_the_current_hour() {
        let cfg = AuthConfig::default();
        let token = admin_digest(&cfg);
        assert!(check_auth(&envelope(None, "admin", &token), &cfg));
        // A user digest never opens the admin path.
        let user_token = user_digest(None, "admin", &cfg);
        assert!(!check_auth(&envelope(None, "admin", &user_token), &cfg));
    }

    #[test]
    fn digest_is_hex_encoded_sha512() {
        let cfg = AuthConfig::default();
        let digest = admin_digest(&cfg);
        assert_eq!(digest.len(), 128);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
