//! credhash CLI — `credhash` command.
//!
//! Hashes and verifies passwords, and manages a local account store with
//! register/login/password-change flows. Passwords are always read from
//! stdin, never from arguments.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use credhash::{
    AccountId, AccountStore, Authenticator, FileAccountStore, HasherParams, PasswordHasher,
    Pbkdf2Hasher, Salt,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --dir")?;
    Ok(PathBuf::from(home).join(".credhash"))
}

// ── Password helper ───────────────────────────────────────────────────────────

/// Read one line from stdin, prompting on stderr. Only the trailing newline
/// is stripped; other whitespace is part of the password.
fn read_password(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

fn read_new_password() -> Result<String> {
    let password = read_password("New password: ")?;
    if password.is_empty() {
        return Err(anyhow!("password cannot be empty"));
    }
    let confirm = read_password("Confirm password: ")?;
    if password != confirm {
        return Err(anyhow!("passwords do not match"));
    }
    Ok(password)
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// credhash CLI — salted PBKDF2 password hashing and local accounts.
#[derive(Parser, Debug)]
#[command(
    name = "credhash",
    about = "credhash CLI",
    version,
    long_about = "credhash — salted PBKDF2-HMAC-SHA256 password credentials\n\nHash and verify passwords, and manage a local account store."
)]
struct Cli {
    /// Account store directory (default: ~/.credhash)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// JSON file with hasher parameters (iterations, salt_len, key_len)
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash a password read from stdin and print the hash and salt as JSON
    Hash,

    /// Verify a password read from stdin against a stored hash and salt
    Verify {
        /// Stored hash (base64)
        #[arg(long)]
        hash: String,

        /// Stored salt (base64)
        #[arg(long)]
        salt: String,
    },

    /// Manage accounts
    User {
        #[command(subcommand)]
        subcommand: UserCommands,
    },

    /// Check a username and password
    Login {
        #[arg(long)]
        username: String,
    },

    /// Create the administrator account if it does not exist
    SeedAdmin {
        #[arg(long, default_value = "admin")]
        username: String,

        #[arg(long, default_value = "admin@localhost")]
        email: String,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// Register a new account
    Add {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Role to grant (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// List accounts
    List,

    /// Change a password after confirming the current one
    Passwd {
        #[arg(long)]
        username: String,
    },

    /// Change an account's username and/or email
    Update {
        /// Account ID (acct_...)
        #[arg(long)]
        id: AccountId,

        /// New username
        #[arg(long)]
        username: Option<String>,

        /// New email
        #[arg(long)]
        email: Option<String>,
    },

    /// Grant or revoke roles
    Role {
        #[command(subcommand)]
        subcommand: RoleCommands,
    },

    /// Reset a password without the current one
    Reset {
        /// Account ID (acct_...)
        #[arg(long)]
        id: AccountId,
    },

    /// Delete an account
    Remove {
        /// Account ID (acct_...)
        #[arg(long)]
        id: AccountId,
    },
}

#[derive(Subcommand, Debug)]
enum RoleCommands {
    /// Grant a role to an account
    Add {
        /// Account ID (acct_...)
        #[arg(long)]
        id: AccountId,

        #[arg(long)]
        role: String,
    },

    /// Revoke a role from an account
    Remove {
        /// Account ID (acct_...)
        #[arg(long)]
        id: AccountId,

        #[arg(long)]
        role: String,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let params = resolve_params(cli.params.as_deref())?;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Hash => cmd_hash(params),
        Commands::Verify { hash, salt } => cmd_verify(params, &hash, &salt),
        Commands::User { subcommand } => {
            let auth = open_authenticator(cli.dir, params, cli.params.is_some())?;
            match subcommand {
                UserCommands::Add {
                    username,
                    email,
                    roles,
                } => cmd_user_add(&auth, &username, &email, &roles, verbose),
                UserCommands::List => cmd_user_list(&auth, verbose),
                UserCommands::Passwd { username } => cmd_user_passwd(&auth, &username),
                UserCommands::Update {
                    id,
                    username,
                    email,
                } => cmd_user_update(&auth, &id, username.as_deref(), email.as_deref()),
                UserCommands::Role { subcommand } => match subcommand {
                    RoleCommands::Add { id, role } => cmd_role_add(&auth, &id, &role),
                    RoleCommands::Remove { id, role } => cmd_role_remove(&auth, &id, &role),
                },
                UserCommands::Reset { id } => cmd_user_reset(&auth, &id),
                UserCommands::Remove { id } => cmd_user_remove(&auth, &id),
            }
        }
        Commands::Login { username } => {
            let auth = open_authenticator(cli.dir, params, cli.params.is_some())?;
            cmd_login(&auth, &username)
        }
        Commands::SeedAdmin { username, email } => {
            let auth = open_authenticator(cli.dir, params, cli.params.is_some())?;
            cmd_seed_admin(&auth, &username, &email)
        }
    }
}

// ── Setup helpers ─────────────────────────────────────────────────────────────

/// Defaults, then the optional params file, then environment overrides.
fn resolve_params(params_file: Option<&Path>) -> Result<HasherParams> {
    let base = match params_file {
        Some(path) => HasherParams::from_file(path)
            .with_context(|| format!("failed to load params from {}", path.display()))?,
        None => HasherParams::default(),
    };
    base.with_env_overrides()
        .context("invalid hasher parameters in environment")
}

type CliAuthenticator = Authenticator<FileAccountStore, Pbkdf2Hasher>;

/// Open the account store. The first use pins `requested` to the store;
/// afterwards the pinned parameters win so existing accounts keep verifying.
fn open_authenticator(
    dir: Option<PathBuf>,
    requested: HasherParams,
    explicit: bool,
) -> Result<CliAuthenticator> {
    let dir = match dir {
        Some(d) => d,
        None => default_dir()?,
    };
    let store = FileAccountStore::new(&dir)
        .with_context(|| format!("failed to open account store at {}", dir.display()))?;

    let params = match store.pinned_params().context("failed to read pinned params")? {
        Some(pinned) => {
            if explicit && pinned != requested {
                log::warn!(
                    "store at {} is pinned to {pinned:?}; ignoring requested parameters",
                    dir.display()
                );
            }
            pinned
        }
        None => {
            store
                .pin_params(&requested)
                .context("failed to pin hasher parameters")?;
            requested
        }
    };

    let hasher = Pbkdf2Hasher::new(params)?;
    Ok(Authenticator::new(store, hasher))
}

// ── Command implementations ───────────────────────────────────────────────────

#[derive(Serialize)]
struct HashOutput {
    hash: String,
    salt: String,
}

/// `credhash hash`
fn cmd_hash(params: HasherParams) -> Result<()> {
    let hasher = Pbkdf2Hasher::new(params)?;
    let password = read_password("Password: ")?;
    let (hash, salt) = hasher
        .hash_password(&password)
        .context("failed to hash password")?;

    let output = HashOutput {
        hash,
        salt: salt.to_base64(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `credhash verify --hash HASH --salt SALT`
fn cmd_verify(params: HasherParams, hash: &str, salt: &str) -> Result<()> {
    let hasher = Pbkdf2Hasher::new(params)?;
    let salt = Salt::from_base64(salt).context("--salt must be base64")?;
    let password = read_password("Password: ")?;

    if hasher.verify_password(&password, hash, salt.as_bytes()) {
        println!("Password matches");
        Ok(())
    } else {
        Err(anyhow!("password does not match"))
    }
}

/// `credhash user add --username NAME --email EMAIL [--role ROLE]...`
fn cmd_user_add(
    auth: &CliAuthenticator,
    username: &str,
    email: &str,
    roles: &[String],
    verbose: bool,
) -> Result<()> {
    let password = read_new_password()?;
    let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
    let (account, event) = auth
        .register(username, email, &password, &roles)
        .context("failed to register account")?;

    println!("Registered account '{}'", account.username());
    println!("  ID:    {}", account.id);
    println!("  Email: {}", account.email());
    if !account.roles().is_empty() {
        println!("  Roles: {}", account.roles().join(", "));
    }
    if verbose {
        println!("  Event: {}", serde_json::to_string(&event)?);
    }
    Ok(())
}

/// `credhash user list`
fn cmd_user_list(auth: &CliAuthenticator, verbose: bool) -> Result<()> {
    let store = auth.store();
    let mut accounts = Vec::new();
    for id in store.list_ids().context("failed to list accounts")? {
        match store.load(&id) {
            Ok(account) => accounts.push(account),
            Err(e) => log::warn!("skipping unreadable account {id}: {e}"),
        }
    }

    if accounts.is_empty() {
        println!("No accounts found in {}", store.base_dir().display());
        return Ok(());
    }

    accounts.sort_by(|a, b| a.username().cmp(b.username()));
    println!("{} account(s):", accounts.len());
    for account in &accounts {
        let roles = if account.roles().is_empty() {
            "-".to_string()
        } else {
            account.roles().join(",")
        };
        println!(
            "  {:<20} {:<32} {} [{}]",
            account.username(),
            account.id,
            account.email(),
            roles
        );
        if verbose {
            println!(
                "  {:<20} created {}  updated {}",
                "",
                account.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                account.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }
    Ok(())
}

/// `credhash user passwd --username NAME`
fn cmd_user_passwd(auth: &CliAuthenticator, username: &str) -> Result<()> {
    let current = read_password("Current password: ")?;
    let new = read_new_password()?;

    match auth.change_password(username, &current, &new)? {
        Some(_) => {
            println!("Password changed for '{username}'");
            Ok(())
        }
        None => Err(anyhow!("invalid username or password")),
    }
}

/// `credhash user update --id ID [--username NAME] [--email EMAIL]`
fn cmd_user_update(
    auth: &CliAuthenticator,
    id: &AccountId,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    if username.is_none() && email.is_none() {
        return Err(anyhow!("nothing to update; pass --username and/or --email"));
    }
    auth.update_profile(id, username, email)
        .context("failed to update account")?;

    let account = auth.store().load(id)?;
    println!("Updated {id}");
    println!("  Username: {}", account.username());
    println!("  Email:    {}", account.email());
    Ok(())
}

/// `credhash user role add --id ID --role ROLE`
fn cmd_role_add(auth: &CliAuthenticator, id: &AccountId, role: &str) -> Result<()> {
    match auth.grant_role(id, role).context("failed to grant role")? {
        Some(_) => println!("Granted role '{role}' to {id}"),
        None => println!("{id} already has role '{role}'"),
    }
    Ok(())
}

/// `credhash user role remove --id ID --role ROLE`
fn cmd_role_remove(auth: &CliAuthenticator, id: &AccountId, role: &str) -> Result<()> {
    match auth.revoke_role(id, role).context("failed to revoke role")? {
        Some(_) => println!("Revoked role '{role}' from {id}"),
        None => println!("{id} does not have role '{role}'"),
    }
    Ok(())
}

/// `credhash user reset --id ID`
fn cmd_user_reset(auth: &CliAuthenticator, id: &AccountId) -> Result<()> {
    let new = read_new_password()?;
    auth.reset_password(id, &new)
        .context("failed to reset password")?;
    println!("Password reset for {id}");
    Ok(())
}

/// `credhash user remove --id ID`
fn cmd_user_remove(auth: &CliAuthenticator, id: &AccountId) -> Result<()> {
    auth.remove(id).context("failed to remove account")?;
    println!("Removed {id}");
    Ok(())
}

/// `credhash login --username NAME`
fn cmd_login(auth: &CliAuthenticator, username: &str) -> Result<()> {
    let password = read_password("Password: ")?;
    match auth.login(username, &password)? {
        Some(info) => {
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        None => Err(anyhow!("invalid username or password")),
    }
}

/// `credhash seed-admin [--username NAME] [--email EMAIL]`
fn cmd_seed_admin(auth: &CliAuthenticator, username: &str, email: &str) -> Result<()> {
    if auth.store().find_by_username(username)?.is_some() {
        println!("Admin account '{username}' already exists");
        return Ok(());
    }
    let password = read_new_password()?;
    match auth.seed_admin(username, email, &password)? {
        Some(account) => println!("Created admin account '{username}' ({})", account.id),
        None => println!("Admin account '{username}' already exists"),
    }
    Ok(())
}
