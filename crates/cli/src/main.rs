use anyhow::Context;
use boardroom_core::advisor::Advisor;
use boardroom_core::domain::company::CompanySnapshot;
use boardroom_core::domain::conversation::NonBlankText;
use boardroom_core::llm::GenerateRequest;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "boardroom")]
struct Args {
    /// Company snapshot JSON (camelCase). Defaults to COMPANY_DATA_PATH, then the built-in seed.
    #[arg(long, global = true)]
    company: Option<String>,

    /// Print the request that would be sent instead of calling the service.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the AI strategist a question (single turn, fresh session).
    Advise {
        #[arg(long)]
        text: String,
    },
    /// Run a decision scenario and print the executive memo.
    Simulate {
        #[arg(long)]
        scenario: String,
    },
    /// Generate next best actions for the marketing segments.
    Actions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = boardroom_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(path) = args.company.clone() {
        settings.company_data_path = Some(path);
    }

    let result = run(&settings, args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run(settings: &boardroom_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let company = settings.load_company()?;

    if args.dry_run {
        let request = build_request(&company, &args.command)?;
        tracing::info!(company = %company.name, dry_run = true, "printing request payload");
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let llm = boardroom_core::llm::gemini::GeminiClient::from_settings(settings)?;
    let advisor = Advisor::new(Arc::new(llm));

    match args.command {
        Command::Advise { text } => {
            let query = non_blank(&text, "--text")?;
            println!("{}", advisor.advise(&[], &company, &query).await);
        }
        Command::Simulate { scenario } => {
            let scenario = non_blank(&scenario, "--scenario")?;
            println!("{}", advisor.simulate(&company, &scenario).await);
        }
        Command::Actions => {
            let actions = advisor.recommend_actions(&company).await;
            println!("{}", serde_json::to_string_pretty(&actions)?);
        }
    }

    Ok(())
}

fn build_request(company: &CompanySnapshot, command: &Command) -> anyhow::Result<GenerateRequest> {
    Ok(match command {
        Command::Advise { text } => {
            Advisor::advice_request(&[], company, &non_blank(text, "--text")?)
        }
        Command::Simulate { scenario } => {
            Advisor::simulation_request(company, &non_blank(scenario, "--scenario")?)
        }
        Command::Actions => Advisor::actions_request(company)?,
    })
}

fn non_blank(text: &str, flag: &str) -> anyhow::Result<NonBlankText> {
    NonBlankText::parse(text).with_context(|| format!("{flag} must not be blank"))
}

fn init_sentry(settings: &boardroom_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
