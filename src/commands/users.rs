use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::registry::CommandHandler;
use super::AppContext;
use crate::db::{create_user, delete_all_users, get_user_by_name, list_users};

/// `register <name>`: create a user and log in as them.
pub struct RegisterCommand;

#[async_trait]
impl CommandHandler for RegisterCommand {
    fn name(&self) -> &'static str {
        "register"
    }

    fn usage(&self) -> &'static str {
        "register <name>"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let [name] = args else {
            bail!("usage: {}", self.usage());
        };

        let user = create_user(ctx.db.pool(), name)
            .await
            .with_context(|| format!("couldn't create user '{name}'"))?;
        ctx.config
            .set_user(&user.name)
            .context("couldn't set current user")?;

        println!("User created successfully:");
        println!(" * ID:   {}", user.id);
        println!(" * Name: {}", user.name);
        Ok(())
    }
}

/// `login <name>`: switch the current user.
pub struct LoginCommand;

#[async_trait]
impl CommandHandler for LoginCommand {
    fn name(&self) -> &'static str {
        "login"
    }

    fn usage(&self) -> &'static str {
        "login <name>"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let [name] = args else {
            bail!("usage: {}", self.usage());
        };

        let user = get_user_by_name(ctx.db.pool(), name)
            .await
            .with_context(|| format!("couldn't find user '{name}'"))?;
        ctx.config
            .set_user(&user.name)
            .context("couldn't set current user")?;

        println!("Logged in as {}", user.name);
        Ok(())
    }
}

/// `reset`: delete every user; feeds, follows, and posts cascade.
pub struct ResetCommand;

#[async_trait]
impl CommandHandler for ResetCommand {
    fn name(&self) -> &'static str {
        "reset"
    }

    fn usage(&self) -> &'static str {
        "reset"
    }

    async fn execute(&self, ctx: &mut AppContext, _args: &[String]) -> Result<()> {
        let removed = delete_all_users(ctx.db.pool())
            .await
            .context("couldn't reset users")?;

        println!("Database reset: {removed} user(s) removed");
        Ok(())
    }
}

/// `users`: list users, marking the current one.
pub struct UsersCommand;

#[async_trait]
impl CommandHandler for UsersCommand {
    fn name(&self) -> &'static str {
        "users"
    }

    fn usage(&self) -> &'static str {
        "users"
    }

    async fn execute(&self, ctx: &mut AppContext, _args: &[String]) -> Result<()> {
        let users = list_users(ctx.db.pool())
            .await
            .context("couldn't retrieve users")?;

        let current = ctx.config.current_user_name.as_deref();
        for user in users {
            if Some(user.name.as_str()) == current {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    }
}
