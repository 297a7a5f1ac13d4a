//! Admin-panel authentication bootstrap.
//!
//! SYSTEM CONTEXT
//! ==============
//! The abbey website's admin pages sit behind a server-side gate. This crate
//! is the browser-side half: it finds the identity-provider config, checks
//! the session within a bounded budget without ever hanging the page, keeps
//! login/protected-page redirects from looping, and drives sign-in.
//!
//! Entry point is [`AuthContext`], built once per page load.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod login;
pub mod loop_guard;
pub mod session;
pub mod settings;
pub mod verify;

#[cfg(test)]
mod test_helpers;

pub use config::{ConfigBootstrapper, ConfigSources, IdentityConfig, PageGlobals};
pub use context::AuthContext;
pub use error::{AuthError, ConfigError, ErrorCode};
pub use login::{LoginController, MountOutcome, Navigator};
pub use loop_guard::{LoopGuard, MemoryPageStorage, PageStorage};
pub use session::{IdentitySdk, SessionAdapter, SessionUser};
pub use settings::Settings;
pub use verify::{AuthCheck, AuthVerifier, TrustReason, Verdict, VerifyPhase};
