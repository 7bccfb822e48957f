//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use pcommon::{EndpointLabel, MetadataMap, ResourceId};
//!
//! let label = EndpointLabel::from("/api/sessions");
//! let resource = ResourceId::new("session-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("environment".to_string(), "staging".to_string());
//!
//! assert_eq!(label.as_str(), "/api/sessions");
//! assert_eq!(resource.to_string(), "session-1");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use pcommon::{EndpointLabel, ResourceId};
    //!
    //! let label = EndpointLabel::with_method("DELETE", "/api/sessions/42");
    //! let resource = ResourceId::from("42");
    //!
    //! assert_eq!(label.as_str(), "DELETE /api/sessions/42");
    //! assert_eq!(resource.as_str(), "42");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    /// Key used to report the outcome of one call site.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct EndpointLabel(String);

    impl EndpointLabel {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn with_method(method: impl Display, path: impl AsRef<str>) -> Self {
            Self(format!("{method} {}", path.as_ref()))
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for EndpointLabel {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for EndpointLabel {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for EndpointLabel {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    /// Server-assigned identifier of a resource created during a run.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct ResourceId(String);

    impl ResourceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for ResourceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ResourceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ResourceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod text {
    //! Display helpers shared by reporters and hooks.
    //!
    //! ```rust
    //! use pcommon::preview;
    //!
    //! assert_eq!(preview("abcdefghijkl", 5), "abcde...");
    //! assert_eq!(preview("abc", 5), "abc");
    //! ```

    /// Truncates `value` to at most `max_chars` characters, appending `...`
    /// when anything was cut. Counts characters, not bytes.
    pub fn preview(value: &str, max_chars: usize) -> String {
        match value.char_indices().nth(max_chars) {
            Some((byte_index, _)) => format!("{}...", &value[..byte_index]),
            None => value.to_string(),
        }
    }
}

pub use context::{EndpointLabel, MetadataMap, ResourceId};
pub use future::BoxFuture;
pub use text::preview;
