use clap::{Args, Parser, Subcommand};
use sqlx::SqlitePool;

use crate::forms::{is_email, password_problem};
use crate::services::users::{self, NewUser};

#[derive(Debug, Parser)]
#[command(name = "atbooking", about = "Housing rental booking service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Create an account, e.g. the first administrator
    CreateUser(CreateUserArgs),
}

#[derive(Debug, Args)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    /// Grant staff rights
    #[arg(long)]
    pub admin: bool,
}

pub async fn create_user(pool: &SqlitePool, args: CreateUserArgs) -> anyhow::Result<()> {
    if !is_email(&args.email) {
        anyhow::bail!("'{}' is not a valid email address", args.email);
    }
    if let Some(problem) = password_problem(&args.password) {
        anyhow::bail!(problem);
    }

    let user = users::create(
        pool,
        NewUser {
            username: args.username,
            email: args.email,
            first_name: args.first_name,
            last_name: args.last_name,
            password: args.password,
            is_staff: args.admin,
        },
    )
    .await?;

    println!("Created user:");
    println!("  ID: {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Email: {}", user.email);
    println!("  Staff: {}", user.is_staff);

    Ok(())
}
