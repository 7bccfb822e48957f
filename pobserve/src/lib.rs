//! Observability hooks for transport attempts and scenario execution.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeTransportHooks, TracingObservabilityHooks};
//!
//! let _transport_hooks = SafeTransportHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod composite;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use composite::{FanoutHarnessHooks, FanoutTransportHooks};
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeHarnessHooks, SafeTransportHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        FanoutHarnessHooks, FanoutTransportHooks, MetricsObservabilityHooks, SafeHarnessHooks,
        SafeTransportHooks, TracingObservabilityHooks,
    };
}
