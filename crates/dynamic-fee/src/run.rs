use {
    crate::{
        domain::{
            eth,
            events::Feed,
            fee::{self, Schedule},
            pool,
            swap,
        },
        infra::{
            cli,
            config,
            ledger::{Hook, Ledger},
            observe,
            subscription,
        },
        preview::{self, Verification},
        swapper::{Outcome, Swapper},
        traits::FeeOracle,
    },
    alloy::{providers::Provider, signers::local::PrivateKeySigner},
    anyhow::{Context, Result, bail, ensure},
    clap::Parser,
    ethrpc::AlloyProvider,
    url::Url,
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = cli::Args::parse_from(args);
    let obs_config = ::observe::Config::new(&args.log, None, args.use_json_logs);
    ::observe::tracing::initialize(&obs_config);
    observe::metrics::init();
    tracing::info!("running dynamic fee client with arguments:\n{args}");

    if let Err(err) = run(args).await {
        tracing::error!(?err, "dynamic fee client failed");
        std::process::exit(1);
    }
}

pub async fn run(args: cli::Args) -> Result<()> {
    let config = config::file::load_path(&args.config).await?;
    match args.command {
        cli::Command::Quote {
            amount,
            direction,
            onchain,
        } => {
            // Without a hook to ask, previews work offline.
            let needs_hook =
                onchain || config.schedule.is_none() || config.verification != Verification::Off;
            let hook = if needs_hook {
                connect_hook(&config, &args.node_url).await?
            } else {
                None
            };
            let schedule = schedule(&config, hook.as_ref()).await?;

            let input = config.pool.input(direction.into());
            let amount = eth::parse_amount(&amount, fee::SIZE_DECIMALS);
            let oracle = hook
                .as_ref()
                .filter(|_| onchain)
                .map(|hook| hook as &dyn FeeOracle);
            if onchain && oracle.is_none() {
                tracing::warn!("no hook deployed, quoting from the configured tiers only");
            }
            let quote = preview::quote(&schedule, oracle, amount).await?;

            println!(
                "{} {}: {}",
                eth::format_amount(amount, fee::SIZE_DECIMALS),
                input.address,
                quote.tier,
            );
            if let Some(fee) = quote.onchain_fee {
                println!("hook charges {}", eth::format_fee(fee));
            }
        }
        cli::Command::Tiers => {
            let hook = connect_hook(&config, &args.node_url).await?;
            let schedule = schedule(&config, hook.as_ref()).await?;
            println!("fees {} with swap size", schedule.monotonicity());
            for tier in schedule.tiers() {
                println!(
                    "{:>24}  {:>6}  {}",
                    eth::format_amount(tier.threshold, fee::SIZE_DECIMALS),
                    eth::format_fee(tier.fee),
                    tier.label,
                );
            }
        }
        cli::Command::Swap {
            amount,
            direction,
            min_amount_out,
        } => {
            let hook = config
                .hook
                .context("swaps are disabled until the hook is deployed")?;
            let signer = args
                .private_key
                .as_deref()
                .context("swapping requires --private-key")?
                .parse::<PrivateKeySigner>()
                .context("invalid private key")?;
            let owner = signer.address();
            let provider = ethrpc::alloy::provider_with_signer(&args.node_url, Box::new(signer));
            ensure_chain(&provider, config.chain_id).await?;

            let direction = pool::Direction::from(direction);
            let request = swap::Request::new(
                direction,
                eth::parse_amount_strict(&amount, config.pool.input(direction).decimals)?,
                eth::parse_amount_strict(&min_amount_out, config.pool.output(direction).decimals)?,
            )?;

            let hook = Hook::new(hook, provider.clone());
            let schedule = schedule(&config, Some(&hook)).await?;
            let size = eth::parse_amount(&amount, fee::SIZE_DECIMALS);
            let quote = preview::quote(&schedule, None, size).await?;
            tracing::info!(%owner, %direction, tier = %quote.tier, "swapping");

            let ledger = Ledger::new(provider, config.contracts.permit2);
            let mut swapper = Swapper::new(
                Box::new(ledger.clone()),
                Box::new(ledger),
                owner,
                config.pool,
                config.contracts,
                config.timing,
            );
            match swapper.swap(&request).await? {
                Outcome::Swapped { tx } => println!("swap confirmed in {tx}"),
                Outcome::Failed { reason } => bail!("swap failed: {reason}"),
            }
        }
        cli::Command::Watch {
            poll_interval,
            metrics_address,
        } => {
            let hook = config
                .hook
                .context("no hook deployed, there are no fee events to watch")?;
            let provider = ethrpc::alloy::provider(&args.node_url);
            ensure_chain(&provider, config.chain_id).await?;
            if let Some(address) = metrics_address {
                ::observe::metrics::serve_metrics(address);
            }

            let pool = config.pool.id();
            let events = subscription::subscribe(&provider, hook, pool, poll_interval).await?;
            tracing::info!(%pool, %hook, "watching fee events");
            let mut feed = Feed::default();
            tokio::select! {
                _ = subscription::follow(events, &mut feed, print_feed) => {
                    tracing::info!("fee event stream ended");
                }
                _ = tokio::signal::ctrl_c() => tracing::info!("stopped watching"),
            }
        }
    }
    Ok(())
}

async fn ensure_chain(provider: &AlloyProvider, chain_id: u64) -> Result<()> {
    let actual = provider
        .get_chain_id()
        .await
        .context("failed to read chain id from the node")?;
    ensure!(
        actual == chain_id,
        "node is on chain {actual} but the pool is configured for chain {chain_id}"
    );
    Ok(())
}

async fn connect_hook(config: &config::Config, url: &Url) -> Result<Option<Hook>> {
    let Some(address) = config.hook else {
        return Ok(None);
    };
    let provider = ethrpc::alloy::provider(url);
    ensure_chain(&provider, config.chain_id).await?;
    Ok(Some(Hook::new(address, provider)))
}

async fn schedule(config: &config::Config, hook: Option<&Hook>) -> Result<Schedule> {
    preview::schedule(
        config.schedule.clone(),
        hook.map(|hook| hook as &dyn FeeOracle),
        config.verification,
    )
    .await
}

fn print_feed(feed: &Feed) {
    println!("recent fees:");
    for event in feed.iter() {
        println!("  {event}");
    }
}
