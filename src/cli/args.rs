use clap::{ArgAction, Args, Parser, Subcommand};

use crate::listing::FilterCriteria;
use crate::models::AnimalPatch;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "paws",
    version,
    about = "command-line client for the pet adoption service",
    long_about = "Paws browses adoptable animals, manages your login session, and submits donations and volunteer applications against the adoption backend.\n\nExamples:\n  paws list --type dog --breed beagle\n  paws list --search golden --page 2 --output animals.html\n  paws login --email ada@example.com --password secret\n  paws donate --amount 50 --email ada@example.com\n\nTip: Use --config or PAWS_BASE_URL to point at a different backend."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.paws/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "base-url",
        visible_alias = "api",
        value_name = "URL",
        global = true,
        help_heading = "Connection",
        help = "Backend base URL (default http://localhost:8080)."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECS",
        global = true,
        help_heading = "Connection",
        help = "Per-attempt timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "retries",
        value_name = "N",
        global = true,
        help_heading = "Connection",
        help = "Extra attempts after a timeout, network error or retryable status."
    )]
    pub retries: Option<u32>,

    #[arg(
        long = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "Connection",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "storage",
        value_name = "FILE",
        global = true,
        help_heading = "Session",
        help = "Session storage file (defaults to ~/.paws/storage.json)."
    )]
    pub storage: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Browse animals with filters and pagination.
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show one animal in detail.
    Show {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Search animals on the server by free text.
    Search {
        term: String,
        #[arg(long, value_name = "N", help = "Page to show (1-based).")]
        page: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Featured animals, recent donations and backend status.
    Home,

    /// Log in and store the session locally.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account, then log in with it.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: String,
    },

    /// Forget the local session.
    Logout,

    /// Show the logged-in user.
    Whoami {
        #[arg(long, help = "Ask the server instead of reading the stored profile.")]
        remote: bool,
    },

    /// Make a donation.
    Donate {
        #[arg(long)]
        amount: f64,
        #[arg(long, help = "Donor email (defaults to the logged-in user).")]
        email: Option<String>,
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        #[arg(long = "method", default_value = "card")]
        method: String,
    },

    /// List recent donations.
    Donations {
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Apply to volunteer.
    Volunteer {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "")]
        experience: String,
        #[arg(long, default_value = "")]
        availability: String,
    },

    /// Edit an animal record (admin only).
    Update {
        id: String,
        #[command(flatten)]
        patch: PatchArgs,
    },

    /// Check whether the backend is reachable.
    Health,

    /// Write a commented default config file if none exists.
    Init,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    #[arg(
        long = "format",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write output to a file (format inferred from extension)."
    )]
    pub output: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long = "type", value_name = "KIND", help_heading = "Filters")]
    pub animal_type: Option<String>,
    #[arg(long, help_heading = "Filters", help = "Breed substring; 'mixed' also matches mutts.")]
    pub breed: Option<String>,
    #[arg(long, value_name = "CATEGORY", help_heading = "Filters", help = "Age category (e.g. puppy, young, adult, senior).")]
    pub age: Option<String>,
    #[arg(long, help_heading = "Filters")]
    pub gender: Option<String>,
    #[arg(long, help_heading = "Filters")]
    pub size: Option<String>,
    #[arg(long, help_heading = "Filters")]
    pub location: Option<String>,
    #[arg(long, value_name = "yes|no", help_heading = "Filters")]
    pub neutered: Option<String>,
    #[arg(long, value_name = "TRAIT", help_heading = "Filters")]
    pub personality: Option<String>,
    #[arg(short = 's', long, value_name = "TEXT", help_heading = "Filters", help = "Match name, breed, type, location, personality or story.")]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            animal_type: self.animal_type.clone(),
            breed: self.breed.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
            size: self.size.clone(),
            location: self.location.clone(),
            neutered: self.neutered.clone(),
            personality: self.personality.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, value_name = "N", help = "Page to show (1-based).")]
    pub page: Option<usize>,

    #[arg(long = "page-size", value_name = "N", help = "Animals per page (default 6).")]
    pub page_size: Option<usize>,

    #[arg(long, help = "Include adopted and reserved animals (admin only).")]
    pub all: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PatchArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "type", value_name = "KIND")]
    pub kind: Option<String>,
    #[arg(long)]
    pub breed: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, value_name = "yes|no")]
    pub neutered: Option<String>,
    #[arg(long, help = "available, reserved, adopted or pending")]
    pub status: Option<String>,
    #[arg(long, value_name = "URL")]
    pub image: Option<String>,
    #[arg(long)]
    pub story: Option<String>,
    #[arg(long, value_name = "TRAITS", help = "Comma-separated personality traits.")]
    pub personality: Option<String>,
}

impl PatchArgs {
    pub fn to_patch(&self) -> Result<AnimalPatch, String> {
        let neutered = match self.neutered.as_deref().map(|v| v.trim().to_lowercase()) {
            None => None,
            Some(v) if v == "yes" || v == "true" => Some(true),
            Some(v) if v == "no" || v == "false" => Some(false),
            Some(v) => return Err(format!("invalid --neutered '{v}', expected yes or no")),
        };
        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => Some(
                crate::utils::parse_status(raw)
                    .ok_or_else(|| format!("invalid --status '{raw}'"))?,
            ),
        };
        let personality = self
            .personality
            .as_deref()
            .map(crate::utils::parse_csv_list);
        Ok(AnimalPatch {
            name: self.name.clone(),
            kind: self.kind.clone(),
            breed: self.breed.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
            size: self.size.clone(),
            location: self.location.clone(),
            neutered,
            status,
            image: self.image.clone(),
            story: self.story.clone(),
            personality,
        })
    }
}
