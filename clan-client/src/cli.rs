use std::path::PathBuf;

use chrono::NaiveDate;
use clan_shared::auth::Role;
use clan_shared::domain::{ChoreFilter, ChoreStatus, DayOfWeek, MealType, ShoppingFilter};
use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = r#"Config resolution order:
  1) --config/-c PATH
  2) $CLAN_CONFIG
  3) platform default, e.g. ~/.config/clan-companion/client.yaml

The session token is kept in the OS keyring; session.yaml next to the config
file records which server and account it belongs to.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "clan",
    version,
    about = "Clan Companion: chores, shopping, meals and family settings",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Signup {
        /// Server URL (e.g., http://127.0.0.1:5151). Falls back to config.
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign in and remember the session
    Login {
        /// Server URL (e.g., http://127.0.0.1:5151). Falls back to config.
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the session
    Logout,
    /// Show who is signed in and where to continue
    Status,
    /// Set up your family
    Onboarding {
        #[command(subcommand)]
        step: OnboardingCmd,
    },
    /// Family summary
    Dashboard,
    /// Family chores
    Chores {
        #[command(subcommand)]
        action: Option<ChoreCmd>,
    },
    /// Shopping list
    Shopping {
        #[command(subcommand)]
        action: Option<ShoppingCmd>,
    },
    /// Weekly meal plan
    Meals {
        #[command(subcommand)]
        action: Option<MealCmd>,
    },
    /// Family name and members
    Family {
        #[command(subcommand)]
        action: Option<FamilyCmd>,
    },
}

#[derive(Debug, Subcommand)]
pub enum OnboardingCmd {
    /// Name your family (again to rename it)
    Family { name: String },
    /// Add or remove the people in your family
    Members {
        #[command(subcommand)]
        action: Option<MemberCmd>,
    },
    /// Finish onboarding and open the dashboard
    Finish,
}

#[derive(Debug, Subcommand)]
pub enum MemberCmd {
    /// List members
    List,
    /// Add a member
    Add {
        name: String,
        #[arg(long, default_value = "child")]
        role: Role,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change a member's name or role
    Edit {
        /// Member name or id
        member: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Remove a member
    Remove {
        /// Member name or id
        member: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum FamilyCmd {
    /// Show the family and its members
    Show,
    /// Rename the family
    Rename { name: String },
    #[command(flatten)]
    Members(MemberCmd),
}

#[derive(Debug, Subcommand)]
pub enum ChoreCmd {
    /// List chores (all, open or completed)
    List {
        #[arg(long, default_value = "all")]
        filter: ChoreFilter,
    },
    /// Add a chore
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Member name or id
        #[arg(long)]
        assign: Option<String>,
        #[arg(long)]
        points: Option<i32>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Change a chore
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Empty text clears the description
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "unassign")]
        assign: Option<String>,
        #[arg(long)]
        unassign: bool,
        #[arg(long)]
        points: Option<i32>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Flip a chore between open and completed
    Toggle { id: String },
    /// Set a chore's status (open, in_progress, completed)
    Status { id: String, status: ChoreStatus },
    /// Delete a chore
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ShoppingCmd {
    /// List items (all, needed or purchased)
    List {
        #[arg(long, default_value = "all")]
        filter: ShoppingFilter,
    },
    /// Add an item
    Add {
        name: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Mark an item purchased or needed again
    Toggle { id: String },
    /// Delete an item
    Remove { id: String },
    /// Delete every purchased item
    ClearPurchased,
}

#[derive(Debug, Subcommand)]
pub enum MealCmd {
    /// Show the week
    List,
    /// Plan a meal; omitted fields are kept, blank ones cleared
    Set {
        /// Day name or number (0 = Sunday)
        day: DayOfWeek,
        meal: MealType,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove a planned meal
    Clear { day: DayOfWeek, meal: MealType },
}
