use anyhow::{format_err, Result};
use clap::{Parser, ValueEnum};
use colorful::{Color, Colorful};
use stake_link_client::config::{load_cfg, ClientConfig, DEFAULT_CONFIG_PATH};
use stake_link_client::contracts::{
    connect_contracts, connected_account, wallet_account, RpcContracts, WalletContracts,
};
use stake_link_client::controllers::{
    Allowance, SocialLinkController, StaticEnvironment, WalletController,
};
use stake_link_client::instructions::rpc::TxReceipt;
use stake_link_client::notify::ConsoleNotifier;
use stake_link_client::services::{HttpSocialApi, RestStakeLogStore};
use stake_link_client::states::{LinkStatus, LinkedSocialAccount, Platform};
use stake_link_client::units::format_ether;
use stake_link_client::ClientError;

type Wallet = WalletController<RpcContracts, WalletContracts, RestStakeLogStore>;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PlatformArg {
    Ios,
    Android,
    Other,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Platform::MobileIos,
            PlatformArg::Android => Platform::MobileAndroid,
            PlatformArg::Other => Platform::Other,
        }
    }
}

#[derive(Debug, Parser)]
pub struct Opts {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
    #[clap(subcommand)]
    pub command: StakeLinkCommands,
}

#[derive(Debug, Parser)]
pub enum StakeLinkCommands {
    Status {},
    Link {
        #[arg(long, value_enum, default_value_t = PlatformArg::Other)]
        platform: PlatformArg,
        /// Open the authorization page in the X app when asked.
        #[arg(long)]
        app: bool,
    },
    Unlink {},
    Snapshot {},
    Allowance {},
    Approve {
        #[arg(long)]
        amount: String,
    },
    Stake {
        #[arg(long)]
        amount: String,
    },
    Unstake {
        #[arg(long)]
        stake_id: String,
    },
    Claim {},
    EmergencyWithdraw {
        #[arg(long)]
        stake_id: String,
    },
}

fn social_controller(
    config: &ClientConfig,
) -> SocialLinkController<HttpSocialApi, ConsoleNotifier> {
    SocialLinkController::new(HttpSocialApi::new(config.api_base_url.clone()), ConsoleNotifier)
}

fn wallet_controller(config: &ClientConfig) -> Result<Wallet> {
    let address = wallet_account(config)?.ok_or(ClientError::NotConnected)?;
    let mut controller = WalletController::new(
        RestStakeLogStore::new(config.store_url.clone(), config.store_api_key.clone()),
        config.error_display(),
    );
    let (read, write) = connect_contracts(config, address);
    controller.on_wallet_connected(address, read, write)?;
    Ok(controller)
}

fn print_link(status: LinkStatus, account: Option<&LinkedSocialAccount>) {
    let text = format!("{:?}", status);
    let label = match status {
        LinkStatus::Connected => text.as_str().color(Color::Green),
        LinkStatus::Connecting => text.as_str().color(Color::Yellow),
        LinkStatus::Disconnected => text.as_str().color(Color::Red),
    };
    println!("X account: {}", label);
    if let Some(account) = account {
        println!(
            "  @{} ({}){}",
            account.username,
            account.name,
            if account.verified { " verified" } else { "" }
        );
        println!(
            "  followers {} following {} posts {}",
            account.followers_count, account.following_count, account.tweet_count
        );
    }
}

fn print_receipt(receipt: &TxReceipt) {
    println!("{}", receipt.transaction_hash);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    let client_config = load_cfg(&opts.config)?;

    match opts.command {
        StakeLinkCommands::Status {} => {
            let wallet = connected_account(&client_config);
            let mut social = social_controller(&client_config);
            let status = social.check_status(wallet.as_ref());
            print_link(status, social.account());
        }
        StakeLinkCommands::Link { platform, app } => {
            let wallet = connected_account(&client_config);
            let mut social = social_controller(&client_config);
            let env = StaticEnvironment {
                platform: platform.into(),
                prefers_app: app,
            };
            let plan = social
                .initiate(wallet.as_ref(), &env)
                .ok_or_else(|| format_err!("X authentication was not started"))?;
            let target = if plan.open_in_app { "X app" } else { "browser" };
            println!("Open in {}:", target);
            println!("{}", plan.url);
        }
        StakeLinkCommands::Unlink {} => {
            let wallet = connected_account(&client_config);
            let mut social = social_controller(&client_config);
            if !social.disconnect(wallet.as_ref()) {
                return Err(format_err!("X account was not disconnected"));
            }
        }
        StakeLinkCommands::Snapshot {} => {
            let controller = wallet_controller(&client_config)?;
            let view = controller.user_data().to_display_json();
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        StakeLinkCommands::Allowance {} => {
            let controller = wallet_controller(&client_config)?;
            match controller.allowance() {
                Allowance::Amount(amount) => println!("{}", format_ether(amount)),
                Allowance::Unavailable => return Err(ClientError::ContractsUnavailable.into()),
                Allowance::ReadFailed(message) => return Err(format_err!(message)),
            }
        }
        StakeLinkCommands::Approve { amount } => {
            let controller = wallet_controller(&client_config)?;
            print_receipt(&controller.approve_tokens(&amount)?);
        }
        StakeLinkCommands::Stake { amount } => {
            let controller = wallet_controller(&client_config)?;
            print_receipt(&controller.stake_tokens(&amount)?);
        }
        StakeLinkCommands::Unstake { stake_id } => {
            let controller = wallet_controller(&client_config)?;
            print_receipt(&controller.unstake_tokens(&stake_id)?);
        }
        StakeLinkCommands::Claim {} => {
            let controller = wallet_controller(&client_config)?;
            print_receipt(&controller.claim_rewards()?);
        }
        StakeLinkCommands::EmergencyWithdraw { stake_id } => {
            let controller = wallet_controller(&client_config)?;
            print_receipt(&controller.emergency_withdraw(&stake_id)?);
        }
    }
    Ok(())
}
