use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ethers::{
    signers::{LocalWallet, Signer},
    types::TxHash,
};
use flowearn_client::{
    config::Config,
    controller::{
        create::{parse_task_id, CreateTaskForm},
        detail::{ActionOutcome, DetailView, TaskDetail},
        list::{BountyList, ListView},
    },
    models::TaskId,
    ContractGateway, WalletContext,
};
use flowearn_contract::{ReadClient, SignerClient};
use log::{debug, info, warn};

mod render;

use render::{DetailPage, ListPage};

type Reader = ContractGateway<ReadClient>;
type Writer = ContractGateway<SignerClient>;

pub struct AppState {
    config: Config,
    /// Read-only handle, usable without a wallet
    reader: Reader,
    wallet: WalletContext<Writer>,
}

impl AppState {
    pub async fn init(config: Config) -> anyhow::Result<AppState> {
        let reader = ContractGateway::new(flowearn_contract::get_contract(
            &config.rpc_url,
            config.contract,
        )?);

        info!(
            "Using task board {:?} on chain {} via {}",
            reader.address(),
            config.chain_id,
            config.rpc_url
        );

        Ok(AppState {
            config,
            reader,
            wallet: WalletContext::disconnected(),
        })
    }

    fn signer(&self) -> anyhow::Result<Option<LocalWallet>> {
        let Some(key) = &self.config.private_key else {
            debug!("No private key configured, wallet not connected");
            return Ok(None);
        };
        let signer = flowearn_contract::parse_wallet(key.expose(), self.config.chain_id)
            .context("FLOWEARN_PRIVATE_KEY is not a valid private key")?;
        Ok(Some(signer))
    }

    /// Only write commands connect, since connecting asks the node for its chain id
    async fn connect_wallet(&mut self) -> anyhow::Result<()> {
        let Some(signer) = self.signer()? else {
            return Ok(());
        };
        let account = signer.address();
        let contract =
            flowearn_contract::get_signing_contract(&self.config.rpc_url, self.config.contract, signer)
                .await?;
        self.wallet.connect(account, ContractGateway::new(contract));
        Ok(())
    }

    fn print_tx(&self, action: &str, tx_hash: &TxHash) {
        println!("{action}");
        println!("Transaction Hash: {tx_hash:?}");
        println!("{}", self.config.explorer_tx_url(tx_hash));
    }
}

#[derive(Parser, Debug)]
#[command(name = "flowearn")]
#[command(bin_name = "flowearn")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    config: Config,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse bounties
    List {
        /// Pages of six bounties to show
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show one bounty
    Show {
        #[arg(value_parser = parse_task_id)]
        id: TaskId,
    },
    /// Publish a new bounty
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Reward in base units of the currency
        #[arg(long)]
        reward: String,
    },
    /// Accept a bounty as the connected wallet
    Accept {
        #[arg(value_parser = parse_task_id)]
        id: TaskId,
    },
    /// Submit proof of work for an accepted bounty
    SubmitProof {
        #[arg(value_parser = parse_task_id)]
        id: TaskId,
        proof: String,
    },
    /// Show the account the configured key signs as
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    env_logger::builder().format_timestamp(None).init();

    if dotenv.is_err() {
        warn!("Error reading .env file");
    } else {
        debug!("Loaded env vars from .env");
    }

    let cli = Cli::parse();
    let json = cli.json;
    let mut state = AppState::init(cli.config).await?;

    match cli.command {
        Command::List { pages } => list(&state, pages, json).await,
        Command::Show { id } => show(&state, id, json).await,
        Command::Create {
            title,
            description,
            reward,
        } => {
            let mut form = CreateTaskForm::new();
            form.title = title;
            form.description = description;
            form.reward = reward;

            state.connect_wallet().await?;
            let tx_hash = form.submit(&state.wallet).await?;
            state.print_tx("Bounty created successfully!", &tx_hash);
            Ok(())
        },
        Command::Accept { id } => {
            state.connect_wallet().await?;
            let detail = TaskDetail::new(id);
            let outcome = detail.accept(&state.reader, &state.wallet).await?;
            after_write(&state, &detail, "Task accepted!", outcome, json).await
        },
        Command::SubmitProof { id, proof } => {
            state.connect_wallet().await?;
            let detail = TaskDetail::new(id);
            let outcome = detail
                .submit_proof(&state.reader, &state.wallet, &proof)
                .await?;
            after_write(&state, &detail, "Proof submitted!", outcome, json).await
        },
        Command::Whoami => {
            match state.signer()? {
                Some(signer) => println!("{}", ethers::utils::to_checksum(&signer.address(), None)),
                None => println!("Wallet not connected"),
            }
            Ok(())
        },
    }
}

async fn list(state: &AppState, pages: usize, json: bool) -> anyhow::Result<()> {
    let mut list = BountyList::new(state.config.decimals);
    // a failed read still renders as an error page below
    let _ = list.refresh(&state.reader).await;
    for _ in 1..pages {
        if !list.load_more() {
            break;
        }
    }

    debug!(
        "Showing {} of {} bounties",
        list.shown_count(),
        list.total_count()
    );
    let view = list.view(now());
    if json {
        match &view {
            ListView::Ready { projection, .. } => {
                println!("{}", serde_json::to_string_pretty(projection.as_ref())?)
            },
            ListView::Empty { .. } => println!("[]"),
            ListView::Failed(err) => bail!("{err}"),
            ListView::Loading => {},
        }
        return Ok(());
    }

    print!(
        "{}",
        ListPage {
            view: &view,
            config: &state.config,
            pages: pages.max(1),
        }
    );
    if let ListView::Failed(err) = view {
        bail!(err);
    }
    Ok(())
}

async fn show(state: &AppState, id: TaskId, json: bool) -> anyhow::Result<()> {
    let detail = TaskDetail::new(id);
    let res = detail.load(&state.reader).await;
    render_detail(state, &detail, json).await?;
    res?;
    Ok(())
}

async fn after_write(
    state: &AppState,
    detail: &TaskDetail,
    action: &str,
    outcome: ActionOutcome,
    json: bool,
) -> anyhow::Result<()> {
    state.print_tx(action, &outcome.tx_hash);
    if !outcome.refreshed {
        warn!("Could not re-read bounty #{}, status may be stale", detail.id());
    }
    println!();
    render_detail(state, detail, json).await
}

async fn render_detail(state: &AppState, detail: &TaskDetail, json: bool) -> anyhow::Result<()> {
    let view = detail.view().await;
    if json {
        if let DetailView::Ready { task, .. } = &view {
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        return Ok(());
    }

    print!(
        "{}",
        DetailPage {
            view: &view,
            config: &state.config,
        }
    );
    Ok(())
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_ids_parse_alike() {
        for command in ["show", "accept", "submit-proof"] {
            let mut args = vec!["flowearn", command, "7"];
            if command == "submit-proof" {
                args.push("https://proof");
            }
            let cli = Cli::try_parse_from(args.clone()).unwrap();
            let id = match cli.command {
                Command::Show { id } | Command::Accept { id } | Command::SubmitProof { id, .. } => id,
                _ => panic!("unexpected command"),
            };
            assert_eq!(id, TaskId(7));

            args[2] = "seven";
            let err = Cli::try_parse_from(args.clone()).unwrap_err();
            assert!(err.to_string().contains("seven"), "{command}: {err}");
        }
    }

    #[tokio::test]
    async fn test_read_commands_keep_wallet_disconnected() {
        let cli = Cli::try_parse_from([
            "flowearn",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "--rpc-url",
            "http://127.0.0.1:1",
            "list",
        ])
        .unwrap();

        // no node listens there, so connecting would fail
        let state = AppState::init(cli.config).await.unwrap();
        assert!(!state.wallet.is_connected());
        assert!(state.signer().unwrap().is_some());
    }
}
