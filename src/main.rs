use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use rb_keeper::chat::{self, ChatContext};
use rb_keeper::commands::{
    self, find_merged, list_mine, ship_check, submit, submit_all, CommandError, EXIT_SUCCESS,
};
use rb_keeper::config::{configured_username, load_config, Settings};
use rb_keeper::credentials::resolve_credentials;
use rb_keeper::git::{GitCheckout, RefSpec};
use rb_keeper::output::{labelled, should_use_colors, Label};
use rb_keeper::reviewboard::{create_client, PendingFilter, RbClient};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that a branch's review is shipped and matches the local diff
    ShipCheck {
        /// Review Board repository name
        #[arg(short, long)]
        repo: String,
        /// Branch the review tracks
        #[arg(short, long)]
        branch: String,
        /// Commit being tested (accepted for compatibility, unused)
        #[arg(short, long)]
        commit: Option<String>,
        /// Ship-its required since the last diff upload (default 2)
        #[arg(short = 's', long = "shipits")]
        ship_its: Option<usize>,
        /// Review Board server URL
        #[arg(short, long)]
        url: Option<String>,
        /// Path to a git checkout of the repository. It is fetched, pulled
        /// and left on the branch.
        #[arg(short = 'g', long = "git-dir")]
        git_dir: PathBuf,
        /// Reference branch as remote/branch (default origin/master)
        #[arg(short, long = "master-branch")]
        master_branch: Option<String>,
    },
    /// Find open reviews that appear merged into the reference branch
    FindMerged {
        /// Path to a git checkout of the repository
        #[arg(short = 'g', long = "git-dir", default_value = ".")]
        git_dir: PathBuf,
        /// Review Board server URL
        #[arg(short, long)]
        url: Option<String>,
        /// Reference branch as remote/branch (default origin/master)
        #[arg(short, long = "master-branch")]
        master_branch: Option<String>,
        /// Also match repositories whose path is a suffix of the remote URL
        #[arg(long)]
        match_path_end: bool,
    },
    /// List pending reviews for a user or group
    ListMine {
        /// Reviews targeting this user (or posted by them, with --posted)
        #[arg(short, long)]
        user: Option<String>,
        /// Reviews targeting this group
        #[arg(short, long, conflicts_with = "user")]
        group: Option<String>,
        /// List reviews posted by the user instead
        #[arg(long, conflicts_with = "group")]
        posted: bool,
        /// Review Board server URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Mark every pending review posted by a user as submitted
    SubmitAll {
        #[arg(short, long)]
        user: String,
        /// Only list the reviews that would be closed
        #[arg(long)]
        dry_run: bool,
        /// Review Board server URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Mark the open review for a repository branch as submitted
    Submit {
        #[arg(short, long)]
        repo: String,
        #[arg(short, long)]
        branch: String,
        /// Review Board server URL
        #[arg(short, long)]
        url: Option<String>,
        /// Close description
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Answer a chat-bot message such as "reviews me"
    Chat {
        /// Channel (starting with #) or nick the message came from
        #[arg(long)]
        sender: String,
        /// Nick of the person asking
        #[arg(long)]
        nick: String,
        /// Review Board server URL
        #[arg(long)]
        url: Option<String>,
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "rb-keeper")]
#[command(about = "Review Board bookkeeping for git repositories", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/rb-keeper/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    rb_keeper::logging::init(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(c) => c,
        Err(e) => fail(CommandError::Usage(format!("Config error: {:#}", e))),
    };

    let credentials = match resolve_credentials(configured_username(&config)) {
        Ok(c) => c,
        Err(e) => fail(CommandError::Usage(e.to_string())),
    };
    let settings = Settings::resolve(config, credentials);

    match run(cli.command, &settings).await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => fail(e),
    }
}

async fn run(command: Commands, settings: &Settings) -> Result<(), CommandError> {
    let use_colors = should_use_colors();
    let mut out = std::io::stdout().lock();

    match command {
        Commands::ShipCheck {
            repo,
            branch,
            commit,
            ship_its,
            url,
            git_dir,
            master_branch,
        } => {
            if let Some(commit) = commit {
                tracing::debug!(%commit, "ignoring --commit");
            }
            let reference = reference_branch(master_branch, settings)?;
            let server = connect(url, settings)?;
            let checkout = GitCheckout::open(git_dir)?;
            let options = ship_check::ShipCheckOptions {
                repo,
                branch,
                ship_its: ship_its.unwrap_or(settings.ship_its),
                reference,
            };
            let report = ship_check::run(&server, &checkout, &options, &mut out).await?;
            writeln!(out, "{}", labelled(Label::Shipped, &report.summary(), use_colors))?;
        }
        Commands::FindMerged {
            git_dir,
            url,
            master_branch,
            match_path_end,
        } => {
            let reference = reference_branch(master_branch, settings)?;
            let server = connect(url, settings)?;
            let checkout = GitCheckout::open(git_dir)?;
            let options = find_merged::FindMergedOptions {
                reference,
                match_path_end,
                use_colors,
            };
            find_merged::run(&server, &checkout, &options, &mut out).await?;
        }
        Commands::ListMine {
            user,
            group,
            posted,
            url,
        } => {
            let filter = match (user, group, posted) {
                (Some(user), None, true) => PendingFilter::FromUser(user),
                (Some(user), None, false) => PendingFilter::ToUser(user),
                (None, Some(group), false) => PendingFilter::ToGroup(group),
                _ => {
                    return Err(CommandError::Usage(
                        "You must specify either a user (-u) or group (-g) to find reviews for"
                            .to_string(),
                    ))
                }
            };
            let server = connect(url, settings)?;
            let options = list_mine::ListMineOptions { filter, use_colors };
            list_mine::run(&server, &options, &mut out).await?;
        }
        Commands::SubmitAll { user, dry_run, url } => {
            let server = connect(url, settings)?;
            let options = submit_all::SubmitAllOptions { user, dry_run };
            submit_all::run(&server, &options, &mut out).await?;
        }
        Commands::Submit {
            repo,
            branch,
            url,
            message,
        } => {
            let server = connect(url, settings)?;
            let options = submit::SubmitOptions {
                repo,
                branch,
                message,
            };
            submit::run(&server, &options, &mut out).await?;
        }
        Commands::Chat {
            sender,
            nick,
            url,
            message,
        } => {
            let server = connect(url, settings)?;
            let context = ChatContext { sender, nick };
            let reply = chat::respond(&server, &settings.chat, &context, &message.join(" ")).await;
            for line in reply.unwrap_or_default() {
                writeln!(out, "{}", line)?;
            }
        }
    }
    Ok(())
}

/// Reference branch from the flag or the configuration
fn reference_branch(flag: Option<String>, settings: &Settings) -> Result<RefSpec, CommandError> {
    commands::reference_branch(flag.as_deref().unwrap_or(&settings.master_branch))
}

fn connect(flag: Option<String>, settings: &Settings) -> Result<RbClient, CommandError> {
    let url = settings.server_url(flag.as_deref()).ok_or_else(|| {
        CommandError::Usage(
            "You must specify a reviewboard server URL (-u|--url) to use".to_string(),
        )
    })?;
    Ok(create_client(&url, settings.credentials.clone())?)
}

fn fail(error: CommandError) -> ! {
    for line in commands::render_error(&error, should_use_colors()) {
        eprintln!("{}", line);
    }
    std::process::exit(error.exit_code())
}
