//! Command-line client for the PayZen payment web services.
//!
//! # Usage
//!
//! ```bash
//! # Create a payment with the shop configured in payzen.toml
//! payzen create --order-id ORD-1 --amount 1000 --card 4970100000000003 \
//!     --expiry-month 12 --expiry-year 2030 --cvv 123
//!
//! # Complete the verification with the values posted back by the ACS
//! payzen finalize --pares "$PARES" --md "$MD"
//!
//! # Run an operation as another shop
//! payzen --shop-id 87654321 --shop-key "$KEY" details --uuid b5e4c2a1
//! ```
//!
//! # Environment Variables
//!
//! - `PAYZEN_CONFIG` - Path to the TOML configuration file (default: `payzen.toml`)
//! - `PAYZEN_SHOP_ID`, `PAYZEN_SHOP_KEY`, `PAYZEN_MODE`, `PAYZEN_ENDPOINT` - Overrides
//! - `RUST_LOG` - Log level filter (default: `info`)

mod args;

use std::io::Write;

use clap::Parser;
use payzen::{
    CallOptions, CallbackError, ChallengeResponse, NormalizedResult, Payment, SdkConfig,
};
use payzen_http::HttpClientFactory;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command, Target};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!("Operation failed: {e}");
        std::process::exit(1);
    }
}

fn log_result(result: &NormalizedResult) -> Result<(), CallbackError> {
    let common = result.common();
    tracing::info!(
        operation = %result.operation(),
        response_code = ?common.and_then(|c| c.response_code),
        detail = ?common.and_then(|c| c.response_code_detail.as_deref()),
        uuid = ?result.transaction_uuid(),
        "Received response"
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = SdkConfig::load()?;
    tracing::debug!(?config, "Loaded configuration");
    let payment = Payment::new(config, HttpClientFactory::new()?);

    let overrides = cli.overrides.to_override();
    let mut options = CallOptions::new().with_callback(&log_result);
    if let Some(overrides) = &overrides {
        options = options.with_overrides(overrides);
    }

    let result = match cli.command {
        Command::Create(args) => payment.create(payzen::SimplePayment::from(args), options).await?,
        Command::Finalize { pares, md } => {
            payment
                .complete_challenge(ChallengeResponse::new(pares, md), options)
                .await?
        }
        Command::Details(args) => match args.target().ok_or("missing transaction")? {
            Target::Uuid(uuid) => payment.details(&uuid, options).await?,
            Target::Key(key) => payment.details_by_key(key, options).await?,
        },
        Command::Cancel(args) => match args.target().ok_or("missing transaction")? {
            Target::Uuid(uuid) => payment.cancel(&uuid, options).await?,
            Target::Key(key) => payment.cancel_by_key(key, options).await?,
        },
        Command::Update(args) => {
            let update = args
                .into_update()
                .ok_or("either --amount and --currency or --capture-date is required")?;
            payment.update(update, options).await?
        }
        Command::Validate(args) => payment.validate(&args.uuid, args.comment, options).await?,
        Command::Token(args) => {
            payment
                .create_token(&args.uuid, args.comment, options)
                .await?
        }
        Command::Refund(args) => payment.refund(args.into(), options).await?,
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &result)?;
    writeln!(stdout)?;
    if let Some(redirect) = result.acs_redirect() {
        writeln!(stdout, "ACS URL: {}", redirect.acs_url)?;
        writeln!(stdout, "PaReq:   {}", redirect.pareq)?;
        writeln!(stdout, "MD:      {}", redirect.md)?;
    } else if let Some(md) = result.redirect_md() {
        writeln!(stdout, "MD:      {md}")?;
    }
    Ok(())
}
