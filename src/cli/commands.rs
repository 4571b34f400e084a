use clap::{Parser, Subcommand};

use crate::domain::Category;

#[derive(Parser)]
#[command(name = "flipboard")]
#[command(about = "Curated news reader with generated fallback articles and a local library")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show top headlines for a category
    Headlines {
        /// Category (news, tech, entertainment, sports, travel, food, business, science)
        #[arg(short, long, default_value = "news")]
        category: Category,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Search articles by keyword
    Search {
        /// Search terms
        query: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Interactive reading session
    Browse {
        /// Category to start with
        #[arg(short, long, default_value = "news")]
        category: Category,
    },

    /// List bookmarked articles
    Bookmarks,

    /// List liked articles
    Likes,

    /// List recently read articles
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}
