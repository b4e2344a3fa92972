mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ticketdesk::config::{self, Config, DATABASE_FILE};
use ticketdesk::db::Database;
use ticketdesk::desk::Desk;
use ticketdesk::models::{Priority, Role, Status, User};
use ticketdesk::views::{Board, ReviewFilter};

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(about = "Maintenance tickets for units, officers and admins")]
#[command(version)]
struct Cli {
    /// Username to act as (a unit name for users)
    #[arg(long, global = true, env = "TICKETDESK_USER")]
    user: Option<String>,

    /// Role to act as (user, officer, admin)
    #[arg(long, global = true, env = "TICKETDESK_ROLE")]
    role: Option<Role>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ticketdesk in the current directory
    Init,

    /// File a new ticket for your unit
    Create {
        /// Ticket title
        title: String,
        /// Name of the person reporting
        #[arg(short, long)]
        reporter: String,
        /// Category (AC, Kelistrikan, Perabotan, Saluran Air)
        #[arg(short, long)]
        category: String,
        /// Sub-category within the category
        #[arg(short, long)]
        sub_category: String,
        /// What is wrong
        #[arg(short, long)]
        description: String,
        /// Files to attach
        #[arg(short, long = "attach")]
        attach: Vec<PathBuf>,
    },

    /// List tickets visible to your role
    List {
        /// Review filter for users
        #[arg(short, long, value_enum, default_value_t = ReviewFilter::All)]
        filter: ReviewFilter,
        /// Status filter for officers
        #[arg(short, long)]
        status: Option<Status>,
        /// Monitoring board for admins
        #[arg(short, long, value_enum, default_value_t = Board::Live)]
        board: Board,
    },

    /// Show ticket details
    Show {
        /// Ticket ID
        id: String,
    },

    /// Schedule an open ticket for a day
    Schedule {
        /// Ticket ID
        id: String,
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Start work on a ticket
    Start {
        /// Ticket ID
        id: String,
    },

    /// Mark a ticket in progress as done
    Complete {
        /// Ticket ID
        id: String,
    },

    /// Cancel a ticket that has not been completed
    Cancel {
        /// Ticket ID
        id: String,
    },

    /// Change a ticket's priority
    Priority {
        /// Ticket ID
        id: String,
        /// New priority (low, medium, high)
        priority: Priority,
    },

    /// Rate the officer's work on a completed ticket
    Review {
        /// Ticket ID
        id: String,
        #[command(flatten)]
        scores: commands::review::ScoreArgs,
    },

    /// List your completed tickets still waiting for a review
    Pending,

    /// Show officer ratings
    Ratings,

    /// Suggest a work order for open and scheduled tickets
    Suggest,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_env("TICKETDESK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

fn current_user(user: Option<String>, role: Option<Role>) -> Result<User> {
    let username = user
        .filter(|u| !u.trim().is_empty())
        .context("No user given. Pass --user or set TICKETDESK_USER.")?;
    let role = role.context("No role given. Pass --role or set TICKETDESK_ROLE.")?;
    Ok(User::new(username.trim(), role))
}

fn get_desk(user: User) -> Result<Desk<Database>> {
    let desk_dir = config::find_desk_dir(&env::current_dir()?)?;
    let config = Config::load(&desk_dir)?;
    let db_path = desk_dir.join(DATABASE_FILE);
    let db = Database::open(&db_path, &config.attachments_path(&desk_dir))
        .context("Failed to open database")?;

    let desk = Desk::new(db, user, config.default_priority);
    desk.refresh()?;
    Ok(desk)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let open_desk = || -> Result<Desk<Database>> { get_desk(current_user(cli.user.clone(), cli.role)?) };

    match cli.command {
        Commands::Init => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd)
        }

        Commands::Create {
            title,
            reporter,
            category,
            sub_category,
            description,
            attach,
        } => commands::create::run(
            &open_desk()?,
            commands::create::NewTicket {
                title: &title,
                reporter: &reporter,
                category: &category,
                sub_category: &sub_category,
                description: &description,
            },
            &attach,
        ),

        Commands::List {
            filter,
            status,
            board,
        } => commands::list::run(&open_desk()?, filter, status, board),

        Commands::Show { id } => commands::show::run(&open_desk()?, &id),

        Commands::Schedule { id, date } => commands::status::schedule(&open_desk()?, &id, &date),

        Commands::Start { id } => commands::status::start(&open_desk()?, &id),

        Commands::Complete { id } => commands::status::complete(&open_desk()?, &id),

        Commands::Cancel { id } => commands::status::cancel(&open_desk()?, &id),

        Commands::Priority { id, priority } => commands::update::priority(&open_desk()?, &id, priority),

        Commands::Review { id, scores } => commands::review::run(&open_desk()?, &id, scores.into_ratings()),

        Commands::Pending => commands::review::pending(&open_desk()?),

        Commands::Ratings => commands::ratings::run(&open_desk()?),

        Commands::Suggest => commands::next::run(&open_desk()?),
    }
}
