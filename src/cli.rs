use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "pstore", version, about = "Manage parameters in AWS SSM Parameter Store")]
pub struct Args {
    /// AWS region to target. Defaults to the ambient AWS configuration.
    #[clap(long, global = true)]
    pub region: Option<String>,

    #[clap(subcommand)]
    pub action: Action,
}

#[derive(clap::Subcommand, Debug)]
pub enum Action {
    /// Browse parameters interactively: view, update, create or delete.
    List,

    /// Create a parameter, optionally pre-filled from a template.
    Create,

    /// Print the raw value of the parameter with the given name.
    Get { name: String },

    /// Delete the parameter with the given name.
    Delete {
        name: String,

        /// Skip the confirmation prompt.
        #[clap(long)]
        force: bool,
    },
}
