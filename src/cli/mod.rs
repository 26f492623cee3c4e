//! Command-line interface for ytsprint.
//!
//! Provides commands for logging in, browsing the board, verifying links,
//! submitting and editing items, and moving CSV data in and out.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::adapters::{HttpItemService, ItemService};
use crate::auth::{
    Authenticator, EmailAllowlist, Identity, PasswordLogin, PasswordMode, SessionStore,
};
use crate::config::{self, paths, ResolvedConfig};
use crate::core::{
    Board, DeleteOutcome, ItemForm, SubmissionWorkflow, VerifyOutcome, WorkflowError,
};
use crate::domain::{Attachment, ContentItem, ContentType, ItemFilter, ItemId, Status};

/// ytsprint - content sprint dashboard client
#[derive(Parser, Debug)]
#[command(name = "ytsprint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with a company email, or a name and password
    Login {
        /// Company email address
        #[arg(short, long, conflicts_with = "name")]
        email: Option<String>,

        /// Account name (password login)
        #[arg(short, long)]
        name: Option<String>,

        /// Account password
        #[arg(short, long, env = "YTSPRINT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Register a new account instead of logging in
        #[arg(long, requires = "name")]
        signup: bool,
    },

    /// Forget the saved session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show verticals, exams and subjects
    Options,

    /// List submitted items
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Only items you submitted
        #[arg(long)]
        mine: bool,
    },

    /// Check a YouTube link's format and whether it was already submitted
    Verify {
        /// YouTube URL
        link: String,
    },

    /// Submit a new item
    Add {
        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Edit one of your items
    Edit {
        /// Item ID
        id: String,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Delete one of your items
    Delete {
        /// Item ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the filtered view as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bulk-create items from a CSV file
    Import {
        /// CSV file
        file: PathBuf,
    },

    /// Get a download URL for a stored file
    Download {
        /// Item ID
        id: String,

        /// Storage key of the file
        file_key: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Board filter flags
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Vertical
    #[arg(long)]
    pub vertical: Option<String>,

    /// Exam (category)
    #[arg(long)]
    pub category: Option<String>,

    /// Subject (subcategory)
    #[arg(long)]
    pub subcategory: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self, mine: bool) -> ItemFilter {
        let mut filter = ItemFilter::new().mine_only(mine);
        if let Some(vertical) = &self.vertical {
            filter = filter.with_vertical(vertical);
        }
        if let Some(category) = &self.category {
            filter = filter.with_category(category);
        }
        if let Some(subcategory) = &self.subcategory {
            filter = filter.with_subcategory(subcategory);
        }
        filter
    }
}

/// Item fields; on edit, only the given ones change
#[derive(Args, Debug, Default)]
pub struct ItemArgs {
    /// YouTube link
    #[arg(short, long)]
    pub link: Option<String>,

    /// Video file (required for Re-edit)
    #[arg(long)]
    pub video_file: Option<PathBuf>,

    /// Extra attachments
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Exam_Information, Content or Motivational_or_Fun
    #[arg(short = 't', long)]
    pub content_type: Option<String>,

    /// Content subcategory (required for Content)
    #[arg(long)]
    pub subcategory: Option<String>,

    #[arg(long)]
    pub vertical: Option<String>,

    #[arg(long)]
    pub exam: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    /// Draft, Pending, Re-edit, Final or Published
    #[arg(short, long)]
    pub status: Option<String>,
}

impl ItemArgs {
    /// Apply the given fields on top of `form`
    async fn apply(&self, mut form: ItemForm) -> Result<ItemForm> {
        if let Some(link) = &self.link {
            form.verification_link = link.clone();
        }
        if let Some(vertical) = &self.vertical {
            if vertical != &form.vertical {
                form.exam.clear();
                form.subject.clear();
            }
            form.vertical = vertical.clone();
        }
        if let Some(exam) = &self.exam {
            form.exam = exam.clone();
        }
        if let Some(subject) = &self.subject {
            form.subject = subject.clone();
        }
        if let Some(content_type) = &self.content_type {
            form.content_type = Some(content_type.parse::<ContentType>()?);
        }
        if let Some(subcategory) = &self.subcategory {
            form.content_subcategory = subcategory.clone();
        }
        if let Some(status) = &self.status {
            form.status = Some(status.parse::<Status>()?);
        }
        if let Some(path) = &self.video_file {
            let video = Attachment::from_path(path)
                .await
                .with_context(|| format!("Failed to read video file: {}", path.display()))?;
            form.video_file = Some(video);
        }
        for path in &self.files {
            let file = Attachment::from_path(path)
                .await
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            form.files.push(file);
        }
        Ok(form)
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Login {
                email,
                name,
                password,
                signup,
            } => login(email, name, password, signup).await,
            Commands::Logout => logout(),
            Commands::Whoami => whoami(),
            Commands::Options => show_options().await,
            Commands::List { filter, mine } => list_items(filter.to_filter(mine)).await,
            Commands::Verify { link } => verify_link(link).await,
            Commands::Add { fields } => add_item(fields).await,
            Commands::Edit { id, fields } => edit_item(ItemId::new(id), fields).await,
            Commands::Delete { id, yes } => delete_item(ItemId::new(id), yes).await,
            Commands::Export { filter, output } => export_csv(filter, output).await,
            Commands::Import { file } => import_csv(file).await,
            Commands::Download { id, file_key } => download(ItemId::new(id), &file_key).await,
            Commands::Config => show_config(),
        }
    }
}

/// Everything a store-facing command needs
struct Connection {
    config: &'static ResolvedConfig,
    service: Arc<dyn ItemService>,
    identity: Identity,
}

impl Connection {
    fn load() -> Result<Self> {
        let config = config::config()?;
        let identity = SessionStore::open_default()?
            .identity()
            .context("Failed to read session")?
            .context("Not logged in. Run `ytsprint login` first")?;
        let service = HttpItemService::from_config(config).context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            service: Arc::new(service),
            identity,
        })
    }

    fn board(&self) -> Board {
        Board::new(self.service.clone(), self.identity.clone())
    }

    fn workflow(&self) -> SubmissionWorkflow {
        SubmissionWorkflow::new(self.service.clone(), self.identity.clone())
            .with_policy(self.config.submission.duplicate_check)
            .with_max_upload_bytes(self.config.submission.max_upload_bytes)
    }
}

/// Turn a workflow failure into a CLI error, with the remedy for 403s
fn workflow_failure(err: WorkflowError) -> anyhow::Error {
    if err.is_authorization() {
        anyhow::anyhow!("{}\nLog in as the item's owner to change it.", err)
    } else {
        anyhow::Error::new(err)
    }
}

/// Establish an identity and save it as the session
async fn login(
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
    signup: bool,
) -> Result<()> {
    let cfg = config::config()?;

    let authenticator: Box<dyn Authenticator> = match (email, name) {
        (Some(email), _) => Box::new(EmailAllowlist::new(email, cfg.auth.allowed_domains.clone())),
        (None, Some(name)) => {
            let password = password.context("--password is required with --name")?;
            let mode = if signup {
                PasswordMode::Signup
            } else {
                PasswordMode::Login
            };
            Box::new(PasswordLogin::new(cfg.api.base_url.clone(), name, password, mode))
        }
        (None, None) => anyhow::bail!("Provide --email, or --name and --password"),
    };

    let identity = authenticator
        .authenticate()
        .await
        .with_context(|| format!("Login failed ({})", authenticator.name()))?;

    let store = SessionStore::open_default()?;
    store.save(&identity).context("Failed to save session")?;

    println!("Logged in as {}", identity);
    Ok(())
}

fn logout() -> Result<()> {
    SessionStore::open_default()?
        .clear()
        .context("Failed to clear session")?;
    println!("Logged out");
    Ok(())
}

fn whoami() -> Result<()> {
    match SessionStore::open_default()?
        .load()
        .context("Failed to read session")?
    {
        Some(session) => {
            println!("{}", session.identity);
            println!("Logged in at: {}", session.logged_in_at);
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

async fn show_options() -> Result<()> {
    let ctx = Connection::load()?;
    let options = ctx
        .service
        .fetch_options(&ctx.identity)
        .await
        .context("Failed to load options")?;

    if options.is_empty() {
        println!("No options available");
        return Ok(());
    }

    for vertical in &options.verticals {
        println!("{}", vertical);
        let exams = options.exams_for(vertical);
        if !exams.is_empty() {
            println!("  Exams:    {}", exams.join(", "));
        }
        let subjects = options.subjects_for(vertical);
        if !subjects.is_empty() {
            println!("  Subjects: {}", subjects.join(", "));
        }
    }
    if !options.content_subcategories.is_empty() {
        println!();
        println!("Content subcategories: {}", options.content_subcategories.join(", "));
    }
    Ok(())
}

fn print_items(items: &[ContentItem]) {
    if items.is_empty() {
        println!("No items found");
        return;
    }

    println!(
        "{:<38} {:<12} {:<14} {:<20} {:<10} {:<24} {}",
        "ID", "VERTICAL", "EXAM", "TYPE", "STATUS", "BY", "EVIDENCE"
    );
    println!("{}", "-".repeat(140));

    for item in items {
        println!(
            "{:<38} {:<12} {:<14} {:<20} {:<10} {:<24} {}",
            item.id,
            item.vertical,
            item.exam.as_deref().unwrap_or("-"),
            item.type_label(),
            item.status.map(|s| s.as_str()).unwrap_or("-"),
            item.created_by,
            item.evidence_label()
        );
    }
}

async fn list_items(filter: ItemFilter) -> Result<()> {
    let ctx = Connection::load()?;
    let mut board = ctx.board().with_filter(filter);

    let report = board.refresh().await;
    if let Some(err) = report.items_error {
        anyhow::bail!("Failed to load items: {}", err);
    }

    print_items(board.items());
    let stats = board.stats();
    eprintln!(
        "\n[{} submissions, {} verticals]",
        stats.submissions, stats.verticals
    );
    Ok(())
}

async fn verify_link(link: String) -> Result<()> {
    let ctx = Connection::load()?;
    let mut workflow = ctx.workflow();
    workflow.open_new();
    workflow.set_link(link);

    match workflow.verify_link().await.map_err(workflow_failure)? {
        VerifyOutcome::Verified { video_id } => {
            println!("Verified: {} has not been submitted", video_id);
        }
        VerifyOutcome::Unchecked { video_id } => {
            println!("Accepted {} without a duplicate check (service unreachable)", video_id);
        }
    }
    Ok(())
}

/// Verify the link when the form depends on it
async fn verify_if_needed(workflow: &mut SubmissionWorkflow) -> Result<()> {
    if workflow.form().needs_video_file() || workflow.is_link_verified() {
        return Ok(());
    }
    if workflow.form().verification_link.trim().is_empty() {
        // Let validation report the missing link
        return Ok(());
    }
    let outcome = workflow.verify_link().await.map_err(workflow_failure)?;
    if let VerifyOutcome::Unchecked { video_id } = outcome {
        eprintln!("Warning: duplicate check skipped for {}", video_id);
    }
    Ok(())
}

async fn add_item(fields: ItemArgs) -> Result<()> {
    let ctx = Connection::load()?;
    let mut board = ctx.board();
    let mut workflow = ctx.workflow();

    workflow.open_new();
    workflow.set_form(fields.apply(ItemForm::default()).await?);
    verify_if_needed(&mut workflow).await?;

    let item = workflow.submit(&mut board).await.map_err(workflow_failure)?;
    println!("Created item {}", item.id);
    Ok(())
}

async fn find_item(board: &mut Board, id: &ItemId) -> Result<ContentItem> {
    let report = board.refresh().await;
    if let Some(err) = report.items_error {
        anyhow::bail!("Failed to load items: {}", err);
    }
    board
        .items()
        .iter()
        .find(|item| &item.id == id)
        .cloned()
        .with_context(|| format!("Item not found: {}", id))
}

async fn edit_item(id: ItemId, fields: ItemArgs) -> Result<()> {
    let ctx = Connection::load()?;
    let mut board = ctx.board();
    let mut workflow = ctx.workflow();

    let item = find_item(&mut board, &id).await?;
    workflow.edit(item);
    let form = fields.apply(workflow.form().clone()).await?;
    workflow.set_form(form);
    verify_if_needed(&mut workflow).await?;

    let item = workflow.submit(&mut board).await.map_err(workflow_failure)?;
    println!("Updated item {}", item.id);
    Ok(())
}

/// Yes/no prompt on stdin
struct StdinConfirm;

impl crate::core::Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

async fn delete_item(id: ItemId, yes: bool) -> Result<()> {
    let ctx = Connection::load()?;
    let mut board = ctx.board();
    let mut workflow = ctx.workflow();

    let outcome = if yes {
        workflow
            .delete(&id, &|_: &str| true, &mut board)
            .await
    } else {
        workflow.delete(&id, &StdinConfirm, &mut board).await
    }
    .map_err(workflow_failure)?;

    match outcome {
        DeleteOutcome::Deleted => println!("Deleted item {}", id),
        DeleteOutcome::Cancelled => println!("Cancelled"),
    }
    Ok(())
}

async fn export_csv(filter: FilterArgs, output: Option<PathBuf>) -> Result<()> {
    let ctx = Connection::load()?;
    let export_filter = filter.to_filter(false).export_filter();
    let output = output.unwrap_or_else(paths::default_export_file);

    let bytes = ctx
        .service
        .export_csv(&ctx.identity, &export_filter)
        .await
        .context("Failed to export data")?;

    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Exported {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

async fn import_csv(file: PathBuf) -> Result<()> {
    let ctx = Connection::load()?;

    let csv = Attachment::from_path(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if csv.extension().as_deref() != Some("csv") {
        anyhow::bail!("Please select a CSV file");
    }

    let summary = ctx
        .service
        .bulk_upload(&ctx.identity, &csv)
        .await
        .context("Failed to upload CSV")?;
    println!("Successfully uploaded {} items", summary.items_created);

    let mut board = ctx.board();
    let report = board.refresh().await;
    if report.is_clean() {
        eprintln!("[{} submissions]", board.stats().submissions);
    }
    Ok(())
}

async fn download(id: ItemId, file_key: &str) -> Result<()> {
    let ctx = Connection::load()?;
    let url = ctx
        .service
        .download_url(&ctx.identity, &id, file_key)
        .await
        .context("Failed to get download URL")?;
    println!("{}", url);
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("ytsprint configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Session: {}", paths::session_file()?.display());
    println!();
    println!("API:");
    println!("  Base URL: {}", cfg.api.base_url);
    println!("  Timeout:  {}s", cfg.api.timeout_seconds);
    println!();
    println!("Auth:");
    println!("  Allowed domains: {}", cfg.auth.allowed_domains.join(", "));
    println!();
    println!("Submission:");
    println!("  Max upload:      {} bytes", cfg.submission.max_upload_bytes);
    println!("  Duplicate check: {}", cfg.submission.duplicate_check);

    Ok(())
}
