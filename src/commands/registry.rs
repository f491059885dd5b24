use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::AppContext;

/// A single CLI command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the command is invoked by.
    fn name(&self) -> &'static str;

    /// One-line usage string shown on argument errors.
    fn usage(&self) -> &'static str;

    /// Run the command.
    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()>;
}

/// Registry of commands, looked up by name.
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own name.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    /// Dispatch to the named command.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown command name, or whatever the handler
    /// itself fails with.
    pub async fn run(&self, ctx: &mut AppContext, name: &str, args: &[String]) -> Result<()> {
        match self.handlers.get(name) {
            Some(handler) => handler.execute(ctx, args).await,
            None => bail!("unknown command '{name}'"),
        }
    }

    /// Registered command names, sorted, for the top-level usage message.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the registry with every command wired in.
#[must_use]
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Box::new(super::users::RegisterCommand));
    registry.register(Box::new(super::users::LoginCommand));
    registry.register(Box::new(super::users::ResetCommand));
    registry.register(Box::new(super::users::UsersCommand));
    registry.register(Box::new(super::feeds::AddFeedCommand));
    registry.register(Box::new(super::feeds::FeedsCommand));
    registry.register(Box::new(super::feeds::FollowCommand));
    registry.register(Box::new(super::feeds::FollowingCommand));
    registry.register(Box::new(super::feeds::UnfollowCommand));
    registry.register(Box::new(super::posts::BrowseCommand));
    registry.register(Box::new(super::agg::AggCommand));
    registry
}
