use std::{error::Error, path::PathBuf, str::FromStr};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{
    BillId, CreateTransactionCmd, Engine, MoneyCents, TagId, TransactionId, TransactionKind,
    UpdateBillCmd, UpdateTransactionCmd, UpdateUserCmd, UserId,
};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;

mod settings;

type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "financery")]
#[command(about = "Personal finance ledger: users, bills, tags and transactions")]
struct Cli {
    /// Settings file (defaults to `settings.toml` when present).
    #[arg(long, env = "FINANCERY_CONFIG")]
    config: Option<PathBuf>,

    /// Database connection string, overrides the configured database.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Bill(Bill),
    Tag(Tag),
    Tx(Tx),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    List,
    Show {
        #[arg(required_unless_present = "email")]
        id: Option<UserId>,
        #[arg(long, conflicts_with = "id")]
        email: Option<String>,
    },
    Update {
        id: UserId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        id: UserId,
    },
}

#[derive(Args, Debug)]
struct Bill {
    #[command(subcommand)]
    command: BillCommand,
}

#[derive(Subcommand, Debug)]
enum BillCommand {
    Create {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        name: String,
        /// Opening balance, e.g. `1000` or `12,50`.
        #[arg(long, default_value = "0")]
        balance: MoneyCents,
    },
    /// Bills of a user, or every bill.
    List {
        #[arg(long)]
        user: Option<UserId>,
    },
    Update {
        id: BillId,
        #[arg(long)]
        name: Option<String>,
        /// Corrected balance.
        #[arg(long)]
        balance: Option<MoneyCents>,
    },
    Delete {
        id: BillId,
    },
}

#[derive(Args, Debug)]
struct Tag {
    #[command(subcommand)]
    command: TagCommand,
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    Create {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        name: String,
    },
    /// Tags of a user or a transaction, or every tag.
    List {
        #[arg(long)]
        user: Option<UserId>,
        #[arg(long, conflicts_with = "user")]
        transaction: Option<TransactionId>,
    },
    /// Rename a tag.
    Update {
        id: TagId,
        #[arg(long)]
        name: String,
    },
    Delete {
        id: TagId,
    },
}

#[derive(Args, Debug)]
struct Tx {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Income,
    Expense,
}

impl From<Kind> for TransactionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Income => TransactionKind::Income,
            Kind::Expense => TransactionKind::Expense,
        }
    }
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    Create {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        bill: BillId,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long)]
        amount: MoneyCents,
        /// `YYYY-MM-DD` or `DD.MM.YYYY`; defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        /// Tag id, repeatable.
        #[arg(long = "tag")]
        tags: Vec<TagId>,
    },
    Update {
        id: TransactionId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<Kind>,
        #[arg(long)]
        amount: Option<MoneyCents>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Pass an empty string to clear it.
        #[arg(long)]
        description: Option<String>,
        /// Replaces the tag set, repeatable.
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<TagId>,
        /// Remove every tag.
        #[arg(long)]
        clear_tags: bool,
    },
    Delete {
        id: TransactionId,
    },
    /// Transactions of a user, a bill or a tag, or every transaction.
    List {
        #[arg(long, conflicts_with_all = ["bill", "tag"])]
        user: Option<UserId>,
        #[arg(long, conflicts_with = "tag")]
        bill: Option<BillId>,
        #[arg(long)]
        tag: Option<TagId>,
    },
    Show {
        id: TransactionId,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .map_err(|_| format!("invalid date `{raw}`: expected YYYY-MM-DD or DD.MM.YYYY"))
}

fn print<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "financery={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let engine = match build_engine(&settings, cli.database_url.as_deref()).await {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!("failed to initialize engine: {err}");
            return Err(err);
        }
    };

    if let Err(err) = run(&engine, cli.command).await {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn build_engine(settings: &settings::Settings, database_url: Option<&str>) -> AppResult<Engine> {
    let url = match database_url {
        Some(url) => url.to_string(),
        None => settings.database().url(),
    };
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;

    let mut builder = Engine::builder()
        .database(database)
        .cache_capacity(settings.engine.cache_capacity);
    if let Some(max_amount) = settings.engine.max_amount.as_deref() {
        builder = builder.max_amount(MoneyCents::from_str(max_amount)?);
    }
    Ok(builder.build().await?)
}

async fn run(engine: &Engine, command: Command) -> AppResult<()> {
    match command {
        Command::User(User { command }) => match command {
            UserCommand::Create { name, email } => print(&engine.create_user(&name, &email).await?),
            UserCommand::List => print(&engine.users().await?),
            UserCommand::Show { id, email } => {
                let user = match (id, email) {
                    (Some(id), _) => engine.user(id).await?,
                    (None, Some(email)) => engine.user_by_email(&email).await?,
                    (None, None) => return Err("user id or --email required".into()),
                };
                print(&user)
            }
            UserCommand::Update { id, name, email } => {
                let mut cmd = UpdateUserCmd::new(id);
                cmd.name = name;
                cmd.email = email;
                print(&engine.update_user(cmd).await?)
            }
            UserCommand::Delete { id } => {
                engine.delete_user(id).await?;
                tracing::info!(user_id = id, "user deleted");
                Ok(())
            }
        },
        Command::Bill(Bill { command }) => match command {
            BillCommand::Create {
                user,
                name,
                balance,
            } => print(&engine.create_bill(user, &name, balance).await?),
            BillCommand::List { user } => match user {
                Some(user) => print(&engine.bills_for_user(user).await?),
                None => print(&engine.bills().await?),
            },
            BillCommand::Update { id, name, balance } => {
                let mut cmd = UpdateBillCmd::new(id);
                cmd.name = name;
                cmd.balance = balance;
                print(&engine.update_bill(cmd).await?)
            }
            BillCommand::Delete { id } => {
                engine.delete_bill(id).await?;
                tracing::info!(bill_id = id, "bill deleted");
                Ok(())
            }
        },
        Command::Tag(Tag { command }) => match command {
            TagCommand::Create { user, name } => print(&engine.create_tag(user, &name).await?),
            TagCommand::List { user, transaction } => match (user, transaction) {
                (Some(user), _) => print(&engine.tags_for_user(user).await?),
                (None, Some(transaction)) => {
                    print(&engine.tags_for_transaction(transaction).await?)
                }
                (None, None) => print(&engine.tags().await?),
            },
            TagCommand::Update { id, name } => print(&engine.update_tag(id, &name).await?),
            TagCommand::Delete { id } => {
                engine.delete_tag(id).await?;
                tracing::info!(tag_id = id, "tag deleted");
                Ok(())
            }
        },
        Command::Tx(Tx { command }) => match command {
            TxCommand::Create {
                user,
                bill,
                name,
                kind,
                amount,
                date,
                description,
                tags,
            } => {
                let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                let mut cmd =
                    CreateTransactionCmd::new(user, bill, name, kind.into(), amount, date)
                        .tag_ids(tags);
                cmd.description = description;
                print(&engine.create_transaction(cmd).await?)
            }
            TxCommand::Update {
                id,
                name,
                kind,
                amount,
                date,
                description,
                tags,
                clear_tags,
            } => {
                let cmd = UpdateTransactionCmd {
                    transaction_id: id,
                    name,
                    description,
                    kind: kind.map(Into::into),
                    amount,
                    date,
                    tag_ids: (clear_tags || !tags.is_empty()).then_some(tags),
                    ..UpdateTransactionCmd::default()
                };
                print(&engine.update_transaction(cmd).await?)
            }
            TxCommand::Delete { id } => {
                engine.delete_transaction(id).await?;
                tracing::info!(transaction_id = id, "transaction deleted");
                Ok(())
            }
            TxCommand::List { user, bill, tag } => match (user, bill, tag) {
                (Some(user), _, _) => print(engine.transactions_for_user(user).await?.as_slice()),
                (None, Some(bill), _) => print(&engine.transactions_for_bill(bill).await?),
                (None, None, Some(tag)) => print(&engine.transactions_for_tag(tag).await?),
                (None, None, None) => print(&engine.transactions().await?),
            },
            TxCommand::Show { id } => print(&engine.transaction(id).await?),
        },
    }
}
