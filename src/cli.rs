use clap::{Parser, Subcommand};

/// Backoffice — multi-tenant admin backend
#[derive(Parser)]
#[command(name = "backoffice", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Administrative bootstrap commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create the admin role (if missing) and a user bound to it,
    /// for the first login into a fresh deployment
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Company the user belongs to; created as HQ if absent
        #[arg(long, default_value = "1")]
        company_id: i64,
    },
}
