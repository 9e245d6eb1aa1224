use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "floorwalk", version, about = "floorwalk - floor-plan walkthrough engine")]
pub struct CliArgs {
    /// Subcommand (run, inspect, watch)
    #[command(subcommand)]
    pub command: Command,

    /// Path to floorwalk.yaml (default: search upward from the working directory)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Building JSON, overriding the one named in floorwalk.yaml
    #[arg(long, global = true)]
    pub building: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play session scripts headlessly and report their assertions
    Run {
        /// Session YAML files
        #[arg(required = true)]
        sessions: Vec<String>,

        /// Append every flushed event as a JSON line to this file
        #[arg(long)]
        event_log: Option<String>,
    },
    /// Summarize a building, or search its directory
    Inspect {
        /// Only this floor
        #[arg(long)]
        floor: Option<i32>,

        /// Case-insensitive label search
        #[arg(long)]
        search: Option<String>,
    },
    /// Rebuild the current floor whenever the building file changes
    Watch {
        /// Floor to keep loaded
        #[arg(long)]
        floor: Option<i32>,
    },
}
