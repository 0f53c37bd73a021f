//! LCT governance client
//!
//! Lists proposals with their tallies and the actions open to the configured
//! account, and submits proposals, votes and withdrawals.

mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lct_governance::board::display_order;
use lct_governance::time_codec::now_epoch_seconds;
use lct_governance::{
    Account, Config, GovernanceActions, LedgerClient, LedgerQuery, ProposalBoard, ProposalDraft,
    ProposalId, ProposalView, VoteSide, VotingPower,
};
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "lct")]
#[command(about = "LCT governance client", version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LCT_GIT_HASH"), ")"))]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ledger gateway endpoint (overrides the config file)
    #[arg(long)]
    api: Option<String>,

    /// Account to act as (overrides the config file)
    #[arg(long)]
    account: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all proposals, newest first
    List,

    /// Show a single proposal
    Show { id: ProposalId },

    /// Compose a proposal
    Propose {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// Finish date, YYYY-MM-DD (UTC), at least tomorrow
        #[arg(short, long)]
        finish: String,
    },

    /// Cast a vote
    Vote {
        id: ProposalId,

        #[arg(value_enum)]
        side: Side,

        /// Voting power in whole tokens
        #[arg(short, long, default_value_t = 1)]
        power: u64,
    },

    /// Withdraw stake from a closed proposal
    Withdraw { id: ProposalId },

    /// Show the token balance of the configured account
    Balance,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    For,
    Against,
}

impl From<Side> for VoteSide {
    fn from(side: Side) -> Self {
        match side {
            Side::For => VoteSide::InFavor,
            Side::Against => VoteSide::Against,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(api) = cli.api {
        config.api_endpoint = api;
    }
    if let Some(account) = cli.account {
        config.account = Some(account);
    }

    let account = config.account();
    let client = config.ledger_client()?;
    let mut board = ProposalBoard::new();

    match cli.command {
        Commands::List => {
            board.refresh(&client, now_epoch_seconds()).await?;
            let views = evaluate(&board, &client, account.as_ref()).await;

            println!("\n{}", "Proposals".bold());
            println!("═══════════════════════════════════\n");
            if views.is_empty() {
                println!("No proposals yet.\n");
            }
            for view in display_order(&views) {
                render::print_proposal(view);
            }
        }

        Commands::Show { id } => {
            board.refresh(&client, now_epoch_seconds()).await?;
            show(&board, &client, account.as_ref(), id).await?;
        }

        Commands::Propose {
            title,
            description,
            finish,
        } => {
            require_account(account.as_ref())?;
            let draft = ProposalDraft::new(title, description, finish);
            let proposal = draft.validate(now_epoch_seconds())?;
            client.submit_proposal(&proposal).await?;
            println!("{} Proposal submitted: {}", "✓".green(), proposal.title);

            board.refresh(&client, now_epoch_seconds()).await?;
            if let Some(id) = board.newest_matching(&proposal) {
                show(&board, &client, account.as_ref(), id).await?;
            }
        }

        Commands::Vote { id, side, power } => {
            let account = require_account(account.as_ref())?;
            board.refresh(&client, now_epoch_seconds()).await?;

            let balance = client.token_balance(account).await?;
            let power = VotingPower::select(power, balance)?;
            let request = board.plan_vote(id, account, side.into(), power, now_epoch_seconds())?;
            client.cast_vote(&request).await?;
            println!("{} Vote recorded", "✓".green());

            board.refresh(&client, now_epoch_seconds()).await?;
            show(&board, &client, Some(account), id).await?;
        }

        Commands::Withdraw { id } => {
            let account = require_account(account.as_ref())?;
            board.refresh(&client, now_epoch_seconds()).await?;

            let id = board
                .plan_withdraw(id, account, now_epoch_seconds(), &client)
                .await?;
            client.withdraw(id).await?;
            println!("{} Stake withdrawn", "✓".green());

            board.refresh(&client, now_epoch_seconds()).await?;
            show(&board, &client, Some(account), id).await?;
        }

        Commands::Balance => {
            let account = require_account(account.as_ref())?;
            let balance = client.token_balance(account).await?;
            println!(
                "{}: {} tokens",
                account,
                lct_governance::to_display_stake(balance).to_string().green()
            );
        }
    }

    Ok(())
}

fn require_account(account: Option<&Account>) -> Result<&Account, lct_governance::GovernanceError> {
    account.ok_or_else(|| {
        lct_governance::GovernanceError::Unauthorized(
            "no account configured; pass --account or set it in the config file".to_string(),
        )
    })
}

/// Full evaluation, falling back to the local one when the withdrawal
/// lookups fail.
async fn evaluate(
    board: &ProposalBoard,
    client: &LedgerClient,
    account: Option<&Account>,
) -> Vec<ProposalView> {
    let now = now_epoch_seconds();
    match board.evaluate(account, now, client).await {
        Ok(views) => views,
        Err(e) => {
            log::warn!("⚠️ Withdrawal status unavailable: {}", e);
            board.evaluate_local(account, now)
        }
    }
}

async fn show(
    board: &ProposalBoard,
    client: &LedgerClient,
    account: Option<&Account>,
    id: ProposalId,
) -> Result<(), lct_governance::GovernanceError> {
    board.get(id)?;
    let views = evaluate(board, client, account).await;
    if let Some(view) = views.iter().find(|v| v.id == id) {
        println!();
        render::print_proposal(view);
    }
    Ok(())
}
