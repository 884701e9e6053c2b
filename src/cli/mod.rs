//! Command-line front end for the bootcamp back-office.
//!
//! Subcommands drive the same stores a UI would:
//! - `login` / `logout` / `whoami` / `refresh` - session management
//! - `dashboard` - bootcamp and lead overview, loaded concurrently
//! - `bootcamps ...` - catalog browsing and admin CRUD
//! - `leads ...` - contact-form submissions and funnel status
//! - `config check` - validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::config::{ApiEnvironment, Config};
use crate::http::SessionEvent;
use crate::models::{
    Bootcamp, CreateBootcamp, CreateLead, Credentials, Lead, LeadStatus, UpdateBootcamp,
};
use crate::AppState;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "bootcamp-admin")]
#[command(author, version, about = "Bootcamp catalog and lead management", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "bootcamp-admin.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API base URL, wins over the configured environment
    #[arg(long, env = "BOOTCAMP_API_URL")]
    pub api_url: Option<String>,

    /// API environment to target (development or production)
    #[arg(long = "env")]
    pub environment: Option<ApiEnvironment>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(env) = self.environment {
            config.api.environment = env;
        }
        if let Some(url) = &self.api_url {
            config.api.base_url = Some(url.clone());
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in as an administrator
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "BOOTCAMP_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the logged-in administrator
    Whoami,

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Overview of bootcamps and recent leads
    Dashboard,

    /// Bootcamp catalog commands
    #[command(subcommand)]
    Bootcamps(BootcampCommands),

    /// Lead management commands
    #[command(subcommand)]
    Leads(LeadCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum BootcampCommands {
    /// List all bootcamps
    List,
    /// List featured (active) bootcamps
    Featured,
    /// Show details for a bootcamp
    Show { id: String },
    /// Create a bootcamp
    Create(BootcampArgs),
    /// Change selected fields of a bootcamp
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        price: Option<u64>,
        #[arg(long)]
        next_session: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Replace every field of a bootcamp
    Replace {
        id: String,
        #[command(flatten)]
        fields: BootcampArgs,
    },
    /// Delete a bootcamp
    Delete { id: String },
}

#[derive(clap::Args, Debug)]
pub struct BootcampArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    /// e.g. "12 semaines"
    #[arg(long)]
    pub duration: String,
    /// Price in FCFA
    #[arg(long)]
    pub price: u64,
    /// ISO-8601 start date of the next session
    #[arg(long)]
    pub next_session: String,
    /// Create the bootcamp unpublished
    #[arg(long)]
    pub inactive: bool,
}

impl From<&BootcampArgs> for CreateBootcamp {
    fn from(args: &BootcampArgs) -> Self {
        Self {
            title: args.title.clone(),
            description: args.description.clone(),
            duration: args.duration.clone(),
            price: args.price,
            next_session: args.next_session.clone(),
            is_active: !args.inactive,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LeadCommands {
    /// List leads, one page at a time
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Show details for a lead
    Show { id: String },
    /// Submit a lead, as the public contact form does
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        bootcamp: String,
    },
    /// Move a lead to another funnel status
    Status {
        id: String,
        /// NOUVEAU, CONTACTE, INTERESSE, INSCRIT or PERDU
        status: LeadStatus,
    },
    /// Delete a lead
    Delete { id: String },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command against `config`
pub async fn run_command(cli: &Cli, config: Config) -> Result<()> {
    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        return cmd_config_check(cli);
    }

    let state = AppState::new(config).context("Failed to initialize session storage")?;
    let mut events = state.client.subscribe();

    let result = match &cli.command {
        Commands::Login { email, password } => cmd_login(&state, email, password).await,
        Commands::Logout => cmd_logout(&state).await,
        Commands::Whoami => cmd_whoami(&state).await,
        Commands::Refresh => cmd_refresh(&state).await,
        Commands::Dashboard => cmd_dashboard(&state).await,
        Commands::Bootcamps(command) => cmd_bootcamps(&state, command).await,
        Commands::Leads(command) => cmd_leads(&state, command).await,
        Commands::Config(ConfigCommands::Check) => Ok(()),
    };

    report_session_events(&mut events);
    result
}

fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(SessionEvent::Expired { redirect_to }) = events.try_recv() {
        eprintln!();
        eprintln!("[!!] Session expired. Log in again (admin page: {}).", redirect_to);
    }
}

fn require_login(state: &AppState) -> Result<()> {
    if state.auth_store.snapshot().is_authenticated {
        Ok(())
    } else {
        anyhow::bail!("Not logged in. Run `bootcamp-admin login` first.")
    }
}

/// Turn a store error into a command failure.
fn check(error: Option<String>) -> Result<()> {
    match error {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}

async fn cmd_login(state: &AppState, email: &str, password: &str) -> Result<()> {
    println!("Connecting to {}...", state.client.base_url());

    let auth = state.auth_store.login(&Credentials::new(email, password)).await;
    check(auth.error)?;

    let user = auth.user.context("Login returned no user")?;
    let demo = state
        .auth
        .current_session()
        .map(|s| s.demo)
        .unwrap_or(false);

    println!();
    println!("[OK] Logged in as {} <{}>", user.name, user.email);
    if demo {
        println!("[!] API unreachable, using the offline demo session");
    }
    Ok(())
}

async fn cmd_logout(state: &AppState) -> Result<()> {
    state.auth_store.logout().await;
    println!("[OK] Logged out");
    Ok(())
}

async fn cmd_whoami(state: &AppState) -> Result<()> {
    require_login(state)?;
    let admin = state
        .auth
        .profile()
        .await
        .context("Failed to load profile")?;
    let session = state.auth.current_session();

    println!();
    println!("=== Administrator ===");
    println!();
    println!("ID:         {}", admin.id);
    println!("Name:       {}", admin.name);
    println!("Email:      {}", admin.email);
    println!("Role:       {}", admin.role.as_deref().unwrap_or("-"));
    if let Some(session) = session {
        println!("Logged in:  {}", session.login_timestamp);
        println!("Mode:       {}", if session.demo { "demo" } else { "live" });
    }
    println!();
    Ok(())
}

async fn cmd_refresh(state: &AppState) -> Result<()> {
    require_login(state)?;
    state
        .auth
        .refresh()
        .await
        .context("Failed to refresh the session")?;
    println!("[OK] Access token refreshed");
    Ok(())
}

async fn cmd_dashboard(state: &AppState) -> Result<()> {
    require_login(state)?;

    let (bootcamps, leads) = futures::join!(
        state.bootcamps.fetch_bootcamps(),
        state.leads.fetch_leads(1, 10)
    );
    check(bootcamps.error)?;
    check(leads.error)?;

    let active = bootcamps.bootcamps.iter().filter(|b| b.is_active).count();

    println!();
    println!("=== Dashboard ===");
    println!();
    println!("Bootcamps:  {} ({} active)", bootcamps.bootcamps.len(), active);
    println!("Leads:      {}", leads.pagination.total);
    println!();
    println!("Recent leads by status:");
    for status in LeadStatus::ALL {
        let count = leads.leads.iter().filter(|l| l.status == status).count();
        println!("  {:<10} {}", status.as_str(), count);
    }
    println!();
    Ok(())
}

async fn cmd_bootcamps(state: &AppState, command: &BootcampCommands) -> Result<()> {
    match command {
        BootcampCommands::List => {
            let result = state.bootcamps.fetch_bootcamps().await;
            check(result.error)?;
            print_bootcamps(&result.bootcamps);
        }
        BootcampCommands::Featured => {
            let result = state.bootcamps.fetch_featured_bootcamps().await;
            check(result.error)?;
            print_bootcamps(&result.featured_bootcamps);
        }
        BootcampCommands::Show { id } => {
            let result = state.bootcamps.fetch_bootcamp_by_id(id).await;
            check(result.error)?;
            let bootcamp = result.current_bootcamp.context("Bootcamp not loaded")?;
            print_bootcamp(&bootcamp);
        }
        BootcampCommands::Create(args) => {
            require_login(state)?;
            let result = state.bootcamps.create_bootcamp(&args.into()).await;
            check(result.error)?;
            println!("[OK] Bootcamp created");
            print_bootcamps(&result.bootcamps);
        }
        BootcampCommands::Update {
            id,
            title,
            description,
            duration,
            price,
            next_session,
            active,
        } => {
            require_login(state)?;
            let update = UpdateBootcamp {
                title: title.clone(),
                description: description.clone(),
                duration: duration.clone(),
                price: *price,
                next_session: next_session.clone(),
                is_active: *active,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update. Pass at least one field flag.");
            }
            let result = state.bootcamps.update_bootcamp(id, &update).await;
            check(result.error)?;
            println!("[OK] Bootcamp {} updated", id);
        }
        BootcampCommands::Replace { id, fields } => {
            require_login(state)?;
            let bootcamp = state
                .bootcamp_service
                .replace_bootcamp(id, &fields.into())
                .await
                .context("Failed to replace bootcamp")?;
            println!("[OK] Bootcamp replaced");
            print_bootcamp(&bootcamp);
        }
        BootcampCommands::Delete { id } => {
            require_login(state)?;
            let result = state.bootcamps.delete_bootcamp(id).await;
            check(result.error)?;
            println!("[OK] Bootcamp {} deleted", id);
        }
    }
    Ok(())
}

async fn cmd_leads(state: &AppState, command: &LeadCommands) -> Result<()> {
    match command {
        LeadCommands::List { page, limit } => {
            require_login(state)?;
            let result = state.leads.fetch_leads(*page, *limit).await;
            check(result.error)?;
            print_leads(&result.leads);
            let p = result.pagination;
            println!(
                "Page {}/{} ({} leads, {} per page)",
                p.page, p.total_pages, p.total, p.limit
            );
            println!();
        }
        LeadCommands::Show { id } => {
            require_login(state)?;
            let result = state.leads.fetch_lead_by_id(id).await;
            check(result.error)?;
            let lead = result.current_lead.context("Lead not loaded")?;
            print_lead(&lead);
        }
        LeadCommands::Create {
            name,
            email,
            phone,
            message,
            bootcamp,
        } => {
            let data = CreateLead {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                message: message.clone(),
                bootcamp_id: bootcamp.clone(),
            };
            let result = state.leads.create_lead(&data).await;
            check(result.error)?;
            println!("[OK] Lead submitted");
        }
        LeadCommands::Status { id, status } => {
            require_login(state)?;
            let result = state.leads.update_lead_status(id, *status).await;
            check(result.error)?;
            println!("[OK] Lead {} is now {}", id, status);
        }
        LeadCommands::Delete { id } => {
            require_login(state)?;
            let result = state.leads.delete_lead(id).await;
            check(result.error)?;
            println!("[OK] Lead {} deleted", id);
        }
    }
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("The built-in defaults will be used.");
        println!("To customize, copy bootcamp-admin.example.toml to bootcamp-admin.toml");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(mut config) => {
            cli.apply_overrides(&mut config);

            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Environment:  {}", config.api.environment);
            println!("  Base URL:     {}", config.api.resolved_base_url());
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Session:");
            println!("  Storage:      {}", config.session.storage_path.display());
            println!("  Login page:   {}", config.session.login_path);
            println!();
            println!("Offline behavior:");
            println!("  Mock data:    {}", enabled(config.fallback.enabled));
            println!("  Demo login:   {}", enabled(config.demo.enabled));
            println!();

            let mut warnings = Vec::new();
            if config.demo.enabled {
                warnings.push("Demo login is enabled - anyone can sign in offline with the demo credentials");
            }
            if config.api.timeout_secs == 0 {
                warnings.push("API timeout is 0 - requests will fail immediately");
            }

            if !warnings.is_empty() {
                println!("Warnings:");
                for warning in warnings {
                    println!("  [!] {}", warning);
                }
                println!();
            }

            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            anyhow::bail!("Invalid configuration file");
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn print_bootcamps(bootcamps: &[Bootcamp]) {
    if bootcamps.is_empty() {
        println!("No bootcamps found.");
        return;
    }

    println!();
    println!(
        "{:<26}  {:<32}  {:<12}  {:>12}  {:<10}  {:<6}",
        "ID", "TITLE", "DURATION", "PRICE", "NEXT", "ACTIVE"
    );
    println!("{}", "-".repeat(110));

    for b in bootcamps {
        println!(
            "{:<26}  {:<32}  {:<12}  {:>12}  {:<10}  {:<6}",
            truncate(&b.id, 26),
            truncate(&b.title, 32),
            truncate(&b.duration, 12),
            format_price(&b.price),
            date_only(&b.next_session),
            if b.is_active { "yes" } else { "no" }
        );
    }
    println!();
}

fn print_bootcamp(b: &Bootcamp) {
    println!();
    println!("=== Bootcamp: {} ===", b.title);
    println!();
    println!("ID:            {}", b.id);
    println!("Duration:      {}", b.duration);
    println!("Price:         {}", format_price(&b.price));
    println!("Next session:  {}", date_only(&b.next_session));
    println!("Active:        {}", if b.is_active { "yes" } else { "no" });
    println!("Updated:       {}", b.updated_at);
    println!();
    println!("{}", b.description);
    println!();
}

fn print_leads(leads: &[Lead]) {
    if leads.is_empty() {
        println!("No leads found.");
        return;
    }

    println!();
    println!(
        "{:<26}  {:<22}  {:<28}  {:<10}  {:<24}",
        "ID", "NAME", "EMAIL", "STATUS", "BOOTCAMP"
    );
    println!("{}", "-".repeat(118));

    for l in leads {
        let bootcamp = l
            .bootcamp
            .as_ref()
            .map(|b| b.title.as_str())
            .unwrap_or(l.bootcamp_id.as_str());
        println!(
            "{:<26}  {:<22}  {:<28}  {:<10}  {:<24}",
            truncate(&l.id, 26),
            truncate(&l.name, 22),
            truncate(&l.email, 28),
            l.status.as_str(),
            truncate(bootcamp, 24)
        );
    }
    println!();
}

fn print_lead(l: &Lead) {
    println!();
    println!("=== Lead: {} ===", l.name);
    println!();
    println!("ID:        {}", l.id);
    println!("Email:     {}", l.email);
    println!("Phone:     {}", l.phone);
    println!("Status:    {}", l.status);
    match &l.bootcamp {
        Some(b) => println!("Bootcamp:  {} ({})", b.title, b.id),
        None => println!("Bootcamp:  {}", l.bootcamp_id),
    }
    println!("Received:  {}", l.created_at);
    println!();
    println!("{}", l.message);
    println!();
}

/// Group the digits of a price by thousands: "150000" -> "150 000 FCFA"
fn format_price(price: &str) -> String {
    let digits: Vec<char> = price.chars().collect();
    if digits.is_empty() || !digits.iter().all(|c| c.is_ascii_digit()) {
        return price.to_string();
    }

    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }
    format!("{} FCFA", grouped)
}

fn date_only(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

/// Truncate a string to max length (in characters) with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
