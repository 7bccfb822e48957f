//! Test credential resolution.
//!
//! ```rust
//! use prodder::util::{Credentials, generated_login};
//!
//! let first = Credentials::resolve(None, None, Some(7));
//! let second = Credentials::resolve(None, None, Some(7));
//! assert_eq!(first.login, second.login);
//! assert!(first.login.starts_with("test") && first.login.ends_with("@example.com"));
//!
//! let explicit = Credentials::resolve(Some("me@example.com".into()), None, None);
//! assert_eq!(explicit.login, "me@example.com");
//! assert_eq!(generated_login(1234), "test1234@example.com");
//! ```

use ptransport::SecretString;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_TEST_PASSWORD: &str = "Test@123456";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Explicit values win; otherwise a `test{NNNN}@example.com` login is
    /// drawn, reproducibly when `seed` is given.
    pub fn resolve(login: Option<String>, password: Option<String>, seed: Option<u64>) -> Self {
        let login = login.unwrap_or_else(|| {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            generated_login(rng.random_range(1000..=9999))
        });
        let password = password.unwrap_or_else(|| DEFAULT_TEST_PASSWORD.to_string());
        Self::new(login, password)
    }
}

pub fn generated_login(number: u16) -> String {
    format!("test{number}@example.com")
}
