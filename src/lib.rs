//! Lifecycle orchestration for long-running service components.
//!
//! A [`LifeAdmin`] owns a set of [`Member`]s, starts them concurrently and
//! shuts every started member down when one fails or when shutdown is
//! requested. Member work runs through the [`Delegate`] runner, which turns
//! panics into errors instead of tearing down the caller.
//!
//! ```ignore
//! let admin = Arc::new(LifeAdmin::new(config.lifecycle));
//! admin.add(Member::new("http", http_member))?;
//! admin.add(Member::new("worker", worker_member))?;
//!
//! lifecycle::shutdown_on_signal(admin.clone());
//! admin.start().await?;
//! ```

pub mod config;
pub mod delegate;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use delegate::{Concurrency, Delegate, DelegateHandle};
pub use error::{AdminError, BoxError, MemberError, ShutdownError, ShutdownFailure};
pub use lifecycle::{LifeAdmin, Member, RunState, Service};
