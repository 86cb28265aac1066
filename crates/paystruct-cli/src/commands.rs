//! Non-interactive subcommands.

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
};

use anyhow::Context as _;
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Subcommand, ValueEnum};
use paystruct_client::{
  ApiClient, Fetchable, FileTokenStore, Resource, Session, TokenStore,
  mutation::{create_contractor, create_status_statement, create_wbs},
};
use paystruct_core::{
  calendar::{DatePicker, PersianDate},
  digits::{format_currency, format_number, persian},
  entity::{Contract, Contractor, Entity, StatusStatement},
  form::{Credentials, NewContract, NewContractor, NewStatusStatement, NewWbs, ScannedFile},
  wbs::{WbsItem, WbsTotals},
};
use tracing::info;

use crate::settings::Settings;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Interactive terminal UI (the default).
  Tui,
  /// Sign in and store the session token.
  Signin {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "PAYSTRUCT_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Register a new account and store the session token.
  Signup {
    #[arg(long)]
    email:    String,
    #[arg(long)]
    password: String,
    /// Must repeat `--password`.
    #[arg(long)]
    confirm:  String,
  },
  /// Forget the stored session.
  Logout,
  #[command(subcommand)]
  Contractor(ContractorCommand),
  #[command(subcommand)]
  Contract(ContractCommand),
  #[command(subcommand)]
  Statement(StatementCommand),
  #[command(subcommand)]
  Wbs(WbsCommand),
  /// Delete a record by identifier, after confirming its label.
  Delete {
    #[arg(value_enum)]
    resource: DeleteTarget,
    id:       String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes:      bool,
  },
}

#[derive(Subcommand, Debug)]
pub enum ContractorCommand {
  Add(ContractorArgs),
}

#[derive(Args, Debug)]
pub struct ContractorArgs {
  /// Register a company; `--last-name` then holds its name.
  #[arg(long)]
  legal:           bool,
  #[arg(long, default_value = "")]
  first_name:      String,
  #[arg(long)]
  last_name:       String,
  #[arg(long)]
  national_id:     String,
  #[arg(long, default_value = "")]
  preferential_id: String,
}

#[derive(Subcommand, Debug)]
pub enum ContractCommand {
  Add(ContractArgs),
}

#[derive(Args, Debug)]
pub struct ContractArgs {
  #[arg(long)]
  contractor_id:    String,
  #[arg(long)]
  project_id:       String,
  #[arg(long)]
  contract_number:  String,
  #[arg(long)]
  gross_budget:     String,
  #[arg(long)]
  insurance_rate:   String,
  #[arg(long)]
  performance_bond: String,
  #[arg(long)]
  added_value_tax:  String,
  /// Gregorian `YYYY-MM-DD`.
  #[arg(long)]
  start_date:       Option<NaiveDate>,
  #[arg(long)]
  end_date:         Option<NaiveDate>,
  /// The signed agreement; required by the server.
  #[arg(long)]
  scanned_file:     Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum StatementCommand {
  Add {
    #[arg(long)]
    contract_id: String,
    /// Persian `YYYY/MM/DD`.
    #[arg(long)]
    from:        PersianDate,
    #[arg(long)]
    to:          PersianDate,
  },
}

#[derive(Subcommand, Debug)]
pub enum WbsCommand {
  Add {
    #[arg(long)]
    contract_number: String,
    /// `description;quantity;unit;unit_price`, repeatable.
    #[arg(long = "item", required = true)]
    items:           Vec<WbsItem>,
  },
  Show {
    contract_number: String,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DeleteTarget {
  Contractor,
  Contract,
  Statement,
}

impl From<DeleteTarget> for Resource {
  fn from(target: DeleteTarget) -> Self {
    match target {
      DeleteTarget::Contractor => Resource::Contractors,
      DeleteTarget::Contract => Resource::Contracts,
      DeleteTarget::Statement => Resource::StatusStatements,
    }
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

pub async fn run(command: Command, settings: Settings) -> anyhow::Result<()> {
  let store = FileTokenStore::new(&settings.token_path);

  match command {
    Command::Tui => crate::run_tui(&settings, &store),

    Command::Signin { email, password } => {
      let credentials = Credentials::sign_in(&email, &password)?;
      let client = ApiClient::new(&settings.api_url)?;
      let session = Session::sign_in(&client, &store, &credentials)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      println!("signed in as {}", session.role().unwrap_or("-"));
      Ok(())
    }

    Command::Signup {
      email,
      password,
      confirm,
    } => {
      let credentials = Credentials::sign_up(&email, &password, &confirm)?;
      let client = ApiClient::new(&settings.api_url)?;
      let session = Session::sign_up(&client, &store, &credentials)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      println!("registered, signed in as {}", session.role().unwrap_or("-"));
      Ok(())
    }

    Command::Logout => {
      Session::clear(&store)?;
      info!(path = %store.path().display(), "session cleared");
      Ok(())
    }

    Command::Contractor(ContractorCommand::Add(args)) => {
      let form = if args.legal {
        NewContractor::legal(&args.last_name, &args.national_id)
      } else {
        NewContractor::natural(&args.first_name, &args.last_name, &args.national_id)
      }
      .with_preferential_id(&args.preferential_id);
      form.validate()?;

      let client = authed_client(&settings, &store)?;
      create_contractor(&client, &form)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      println!("پیمانکار با موفقیت ثبت شد");
      Ok(())
    }

    Command::Contract(ContractCommand::Add(args)) => {
      let scanned_file = match &args.scanned_file {
        Some(path) => Some(read_scan(path).await?),
        None => None,
      };
      let form = NewContract {
        contractor_id: args.contractor_id,
        project_id: args.project_id,
        contract_number: args.contract_number,
        gross_budget: args.gross_budget,
        insurance_rate: args.insurance_rate,
        performance_bond: args.performance_bond,
        added_value_tax: args.added_value_tax,
        start_date: args.start_date,
        end_date: args.end_date,
        scanned_file,
      };
      let submission = form.validate()?;

      let client = authed_client(&settings, &store)?;
      client
        .create_contract(submission)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      println!("قرارداد با موفقیت ثبت شد");
      Ok(())
    }

    Command::Statement(StatementCommand::Add {
      contract_id,
      from,
      to,
    }) => {
      let mut picker = DatePicker::new(Local::now().date_naive());
      let form = NewStatusStatement {
        contract_id,
        from: Some(picker.pick(from)?),
        to: Some(picker.pick(to)?),
      };
      form.validate()?;

      let client = authed_client(&settings, &store)?;
      create_status_statement(&client, &form)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      println!("صورت وضعیت با موفقیت ثبت شد");
      Ok(())
    }

    Command::Wbs(WbsCommand::Add {
      contract_number,
      items,
    }) => {
      let form = NewWbs {
        contract_number,
        items,
      };
      form.validate()?;
      let client = authed_client(&settings, &store)?;
      create_wbs(&client, &form)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      print_wbs(&form.items);
      Ok(())
    }

    Command::Wbs(WbsCommand::Show { contract_number }) => {
      let client = authed_client(&settings, &store)?;
      let items = client
        .wbs_for(&contract_number)
        .await
        .map_err(|e| anyhow::anyhow!(e.toast()))?;
      print_wbs(&items);
      Ok(())
    }

    Command::Delete { resource, id, yes } => {
      let client = authed_client(&settings, &store)?;
      let confirmed = if yes {
        None
      } else {
        Some((io::stdin().lock(), io::stderr()))
      };
      if delete_record(&client, resource, &id, confirmed).await? {
        println!("حذف شد");
      } else {
        println!("لغو شد");
      }
      Ok(())
    }
  }
}

/// A client carrying the stored session. Fails before any request when
/// there is no usable token.
fn authed_client(settings: &Settings, store: &dyn TokenStore) -> anyhow::Result<ApiClient> {
  let session = Session::load(store, Utc::now()).context("not signed in (run `paystruct signin`)")?;
  Ok(ApiClient::new(&settings.api_url)?.with_session(session))
}

/// Look up the record's label, ask on `prompt` unless confirmation is
/// skipped, then delete. Returns `false` when the user declined.
async fn delete_record<R: BufRead, W: Write>(
  client: &ApiClient,
  target: DeleteTarget,
  id: &str,
  confirmation: Option<(R, W)>,
) -> anyhow::Result<bool> {
  if let Some((mut input, mut prompt)) = confirmation {
    let label = match target {
      DeleteTarget::Contractor => label_of::<Contractor>(client, id).await?,
      DeleteTarget::Contract => label_of::<Contract>(client, id).await?,
      DeleteTarget::Statement => label_of::<StatusStatement>(client, id).await?,
    };
    if !confirm(&label, &mut input, &mut prompt)? {
      info!(resource = %Resource::from(target), id, "delete declined");
      return Ok(false);
    }
  }

  client
    .delete(target.into(), id)
    .await
    .map_err(|e| anyhow::anyhow!(e.toast()))?;
  info!(resource = %Resource::from(target), id, "deleted");
  Ok(true)
}

async fn label_of<T: Fetchable>(client: &ApiClient, id: &str) -> anyhow::Result<String> {
  let items = client
    .fetch_all::<T>()
    .await
    .map_err(|e| anyhow::anyhow!(e.toast()))?;
  items
    .iter()
    .find(|item| item.id() == id)
    .map(Entity::label)
    .with_context(|| format!("no record with id {id} in {}", T::RESOURCE))
}

/// Blocking y/N prompt; anything but an explicit yes declines.
fn confirm(label: &str, input: &mut impl BufRead, prompt: &mut impl Write) -> io::Result<bool> {
  write!(prompt, "آیا از حذف «{label}» اطمینان دارید؟ [y/N] ")?;
  prompt.flush()?;
  let mut answer = String::new();
  input.read_line(&mut answer)?;
  Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn read_scan(path: &std::path::Path) -> anyhow::Result<ScannedFile> {
  let content = tokio::fs::read(path)
    .await
    .with_context(|| format!("reading {}", path.display()))?;
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "scan".to_string());
  Ok(ScannedFile { file_name, content })
}

fn print_wbs(items: &[WbsItem]) {
  for (index, item) in items.iter().enumerate() {
    println!(
      "{}. {}  {} {} × {} = {}",
      persian(index + 1),
      item.description,
      format_number(item.quantity, 2),
      item.unit,
      format_number(item.unit_price, 0),
      format_number(item.total_price(), 0),
    );
  }
  let totals = WbsTotals::compute(items);
  println!(
    "جمع: {} آیتم، مقدار {}، مبلغ {}، میانگین قیمت واحد {}",
    persian(totals.items),
    format_number(totals.total_quantity, 2),
    format_currency(totals.total_amount, 0),
    format_number(totals.avg_unit_price, 0),
  );
}
