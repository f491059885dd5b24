//! CLI command dispatch.
//!
//! Commands are plain handlers registered by name in a [`CommandRegistry`];
//! the binary looks the invoked name up and calls its single `execute`
//! capability.

mod agg;
mod feeds;
mod posts;
mod registry;
mod users;

pub use registry::{default_registry, CommandHandler, CommandRegistry};

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::db::{get_user_by_name, Database, User};

/// Shared state handed to every command handler.
pub struct AppContext {
    pub db: Database,
    pub config: Config,
}

impl AppContext {
    /// The user the config file says is logged in.
    ///
    /// # Errors
    ///
    /// Returns an error when nobody is logged in or the recorded user no
    /// longer exists.
    pub async fn current_user(&self) -> Result<User> {
        let Some(name) = self.config.current_user_name.as_deref() else {
            bail!("not logged in; run 'register <name>' or 'login <name>' first");
        };

        get_user_by_name(self.db.pool(), name)
            .await
            .with_context(|| format!("couldn't find user '{name}'"))
    }
}
