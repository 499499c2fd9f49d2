//! Command-line arguments.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use payzen::proto::LegacyTransactionKeyRequest;
use payzen::{ConfigOverride, PaymentChange, PaymentUpdate, Refund, SimplePayment};

/// Runs one PayZen operation and prints the normalized result as JSON.
#[derive(Debug, Parser)]
#[command(name = "payzen", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Per-invocation overrides of the loaded configuration.
#[derive(Debug, Default, Args)]
pub struct OverrideArgs {
    /// Shop id to sign with.
    #[arg(long, global = true)]
    pub shop_id: Option<String>,

    /// Shop key to sign with.
    #[arg(long, global = true)]
    pub shop_key: Option<String>,

    /// `TEST` or `PRODUCTION`.
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Web-service endpoint.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

impl OverrideArgs {
    /// The override map, or `None` when no flag was given.
    pub fn to_override(&self) -> Option<ConfigOverride> {
        let mut overrides = ConfigOverride::new();
        let pairs = [
            ("shopId", &self.shop_id),
            ("shopKey", &self.shop_key),
            ("mode", &self.mode),
            ("endpoint", &self.endpoint),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                overrides.insert(key, value);
            }
        }
        (!overrides.is_empty()).then_some(overrides)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Creates a card payment.
    Create(CreateArgs),
    /// Completes a 3-D Secure verification with the PaRes and MD posted back by the ACS.
    Finalize {
        /// PaRes returned by the access control server.
        #[arg(long)]
        pares: String,
        /// MD printed by `create`.
        #[arg(long)]
        md: String,
    },
    /// Fetches a transaction.
    Details(TargetArgs),
    /// Cancels a transaction.
    Cancel(TargetArgs),
    /// Changes the amount or the capture date of a transaction.
    Update(UpdateArgs),
    /// Validates a transaction.
    Validate(CommentedTarget),
    /// Creates a payment token from a transaction.
    Token(CommentedTarget),
    /// Refunds a transaction.
    Refund(RefundArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub order_id: String,
    /// Amount in the smallest currency unit.
    #[arg(long)]
    pub amount: i64,
    /// ISO 4217 numeric code.
    #[arg(long, default_value_t = 978)]
    pub currency: u16,
    #[arg(long)]
    pub card: String,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub expiry_month: u8,
    #[arg(long)]
    pub expiry_year: u16,
    #[arg(long)]
    pub cvv: String,
}

impl From<CreateArgs> for SimplePayment {
    fn from(args: CreateArgs) -> Self {
        Self {
            order_id: args.order_id,
            amount: args.amount,
            currency: args.currency,
            card_number: args.card,
            expiry_month: args.expiry_month,
            expiry_year: args.expiry_year,
            cvv: args.cvv,
        }
    }
}

/// A transaction, by UUID or by legacy key.
#[derive(Debug, Args)]
pub struct TargetArgs {
    #[arg(long, required_unless_present = "transaction_id", conflicts_with = "transaction_id")]
    pub uuid: Option<String>,
    /// Six-digit legacy transaction id.
    #[arg(long, requires = "date")]
    pub transaction_id: Option<String>,
    /// Creation date of the legacy transaction (RFC 3339).
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,
    #[arg(long, default_value_t = 1)]
    pub sequence: u32,
}

/// Where a [`TargetArgs`] points.
#[derive(Debug)]
pub enum Target {
    Uuid(String),
    Key(LegacyTransactionKeyRequest),
}

impl TargetArgs {
    /// Resolves the target; clap guarantees one of the two forms is present.
    pub fn target(self) -> Option<Target> {
        if let Some(uuid) = self.uuid {
            return Some(Target::Uuid(uuid));
        }
        let id = self.transaction_id?;
        let date = self.date?;
        Some(Target::Key(LegacyTransactionKeyRequest::new(
            id,
            date,
            self.sequence,
        )))
    }
}

#[derive(Debug, Args)]
pub struct CommentedTarget {
    #[arg(long)]
    pub uuid: String,
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub uuid: String,
    #[arg(long, requires = "currency", conflicts_with = "capture_date")]
    pub amount: Option<i64>,
    #[arg(long)]
    pub currency: Option<u16>,
    /// New expected capture date (RFC 3339).
    #[arg(long, required_unless_present = "amount")]
    pub capture_date: Option<DateTime<Utc>>,
}

impl UpdateArgs {
    pub fn into_update(self) -> Option<PaymentUpdate> {
        let change = match (self.amount, self.currency, self.capture_date) {
            (Some(amount), Some(currency), _) => PaymentChange::Amount { amount, currency },
            (_, _, Some(date)) => PaymentChange::CaptureDate(date),
            _ => return None,
        };
        Some(PaymentUpdate {
            uuid: self.uuid,
            change,
        })
    }
}

#[derive(Debug, Args)]
pub struct RefundArgs {
    #[arg(long)]
    pub uuid: String,
    #[arg(long)]
    pub amount: i64,
    #[arg(long, default_value_t = 978)]
    pub currency: u16,
    #[arg(long)]
    pub comment: Option<String>,
}

impl From<RefundArgs> for Refund {
    fn from(args: RefundArgs) -> Self {
        Self {
            uuid: args.uuid,
            amount: args.amount,
            currency: args.currency,
            comment: args.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_become_override() {
        let cli = Cli::parse_from([
            "payzen",
            "--shop-id",
            "87654321",
            "--mode",
            "PRODUCTION",
            "details",
            "--uuid",
            "u-1",
        ]);
        let overrides = cli.overrides.to_override().unwrap();
        assert_eq!(overrides.get("shopId"), Some("87654321"));
        assert_eq!(overrides.get("mode"), Some("PRODUCTION"));
        assert_eq!(overrides.get("shopKey"), None);
    }

    #[test]
    fn test_legacy_target() {
        let cli = Cli::parse_from([
            "payzen",
            "cancel",
            "--transaction-id",
            "123456",
            "--date",
            "2024-05-06T10:00:00Z",
        ]);
        let Command::Cancel(args) = cli.command else {
            panic!("expected cancel");
        };
        let Some(Target::Key(key)) = args.target() else {
            panic!("expected legacy key");
        };
        assert_eq!(key.transaction_id, "123456");
        assert_eq!(key.sequence_number, 1);
    }

    #[test]
    fn test_update_by_capture_date() {
        let cli = Cli::parse_from([
            "payzen",
            "update",
            "--uuid",
            "u-1",
            "--capture-date",
            "2024-05-10T00:00:00Z",
        ]);
        let Command::Update(args) = cli.command else {
            panic!("expected update");
        };
        let update = args.into_update().unwrap();
        assert!(matches!(update.change, PaymentChange::CaptureDate(_)));
    }
}
