use clap::Parser;
use std::path::PathBuf;

/// Build-and-deploy orchestrator for the SOPT tracker service stack
#[derive(Parser, Debug)]
#[command(
    name = "soptctl",
    about = "Build-and-deploy orchestrator for the SOPT tracker service stack",
    version,
    long_about = "soptctl verifies the host toolchain, installs the sqlx CLI and the MinIO \
                  server when missing, runs database migrations, compiles the workspace, \
                  stages binaries and configuration into a deployment directory, and starts \
                  MinIO, redis-server, sopt, and sopt_proxy in dependency order."
)]
pub struct CliArgs {
    #[arg(
        short = 'd',
        long,
        help = "Build and stage the debug subtree (default: release)"
    )]
    pub debug: bool,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "bin",
        help = "Deployment directory"
    )]
    pub dest: PathBuf,

    #[arg(
        long,
        help = "Symlink artifacts into the deployment directory instead of copying"
    )]
    pub link: bool,

    #[arg(long, help = "Stop after staging; do not start the service stack")]
    pub no_launch: bool,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        // Verify that CLI structure is valid
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["soptctl"]);
        assert!(!args.debug);
        assert_eq!(args.dest, PathBuf::from("bin"));
        assert!(!args.link);
        assert!(!args.no_launch);
        assert!(args.log_level.is_none());
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_debug_flag_short_and_long() {
        assert!(CliArgs::parse_from(["soptctl", "-d"]).debug);
        assert!(CliArgs::parse_from(["soptctl", "--debug"]).debug);
    }

    #[test]
    fn test_staging_options() {
        let args = CliArgs::parse_from(["soptctl", "--dest", "/srv/sopt", "--link", "--no-launch"]);
        assert_eq!(args.dest, PathBuf::from("/srv/sopt"));
        assert!(args.link);
        assert!(args.no_launch);
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["soptctl", "--log-level", "debug"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(CliArgs::try_parse_from(["soptctl", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_unrecognized_option_is_rejected() {
        assert!(CliArgs::try_parse_from(["soptctl", "--frobnicate"]).is_err());
    }
}
