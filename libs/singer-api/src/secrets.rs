/// Setting names treated as secrets wherever they appear.
pub const COMMON_SECRET_KEYS: &[&str] = &[
    "db_password",
    "password",
    "access_key",
    "private_key",
    "client_id",
    "client_secret",
    "refresh_token",
    "access_token",
];

/// Lowercased suffixes that mark a setting as secret.
pub const COMMON_SECRET_KEY_SUFFIXES: &[&str] = &["access_key_id"];

/// True if `key_name` is a known secret name or ends with a secret suffix.
///
/// Exact names are matched case-sensitively; suffixes are matched against the
/// lowercased name.
pub fn is_common_secret_key(key_name: &str) -> bool {
    if COMMON_SECRET_KEYS.contains(&key_name) {
        return true;
    }
    let lower = key_name.to_lowercase();
    COMMON_SECRET_KEY_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// A sensitive string. `Debug` never prints the contents; `Display` and
/// [`SecretString::expose`] do.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(contents: impl Into<String>) -> Self {
        Self(contents.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
