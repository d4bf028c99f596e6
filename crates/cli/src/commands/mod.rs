use clap::Subcommand;

pub mod build;
pub mod clean;
pub mod info;
pub mod resolve;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Create the workspace, check the tools and resolve missing modules
    #[command(visible_alias = "b")]
    Build,

    /// Fetch every required module missing from the library
    Resolve,

    /// Print the configuration and the scanned module graph
    Info,

    /// Delete the workspace directory
    Clean,

    /// Print the modsmith version
    Version,
}
