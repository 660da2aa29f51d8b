use clap::{Parser, Subcommand};

/// Teamlink — workspace integration gateway
#[derive(Parser)]
#[command(name = "teamlink", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind (overrides TEAMLINK_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Use the in-memory store instead of Postgres. Linked workspaces
        /// are lost on restart.
        #[arg(long)]
        memory: bool,
    },

    /// Mint a development session token
    Session {
        #[arg(long)]
        user_id: i64,

        #[arg(long, default_value = "1440")]
        ttl_minutes: i64,
    },
}
