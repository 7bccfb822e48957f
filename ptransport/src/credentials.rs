//! Redacted secret values and the static API-key header some deployments require.

use pcommon::preview;

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// First `max_chars` characters followed by `...`, safe to print.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.value, max_chars)
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyHeader {
    pub name: String,
    pub value: SecretString,
}

impl ApiKeyHeader {
    pub const DEFAULT_HEADER_NAME: &'static str = "X-API-Key";

    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SecretString::new(value),
        }
    }

    pub fn x_api_key(value: impl Into<String>) -> Self {
        Self::new(Self::DEFAULT_HEADER_NAME, value)
    }
}

impl std::fmt::Debug for ApiKeyHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyHeader")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
