use crate::{api, config::PlannerConfig};
use anyhow::Context;
use clap::{builder::RangedU64ValueParser, value_parser, Arg, ArgAction, ArgMatches, Command};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn command() -> Command {
    let top_k = Arg::new("top-k")
        .short('k')
        .long("top-k")
        .value_name("COUNT")
        .help("Places retrieved per collection (or set PLANNER_TOP_K)")
        .value_parser(RangedU64ValueParser::<usize>::new().range(1..));

    let model = Arg::new("model")
        .short('m')
        .long("model")
        .value_name("MODEL")
        .help("Chat model id (or set PLANNER_MODEL)");

    Command::new("trip-planner")
        .version("0.1.0")
        .about("Retrieval-augmented trip planner returning structured itineraries")
        .subcommand_required(true)
        .subcommand(
            Command::new("plan")
                .about("Plan a trip and print the itinerary")
                .arg(
                    Arg::new("query")
                        .help("Natural-language travel request")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the itinerary as JSON instead of Markdown")
                        .action(ArgAction::SetTrue),
                )
                .arg(top_k.clone())
                .arg(model.clone()),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .default_value("0.0.0.0"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .default_value("8000")
                        .value_parser(value_parser!(u16)),
                )
                .arg(top_k)
                .arg(model),
        )
}

/// CLI entry point for the trip-planner binary
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = command().get_matches();
    match matches.subcommand() {
        Some(("plan", sub)) => plan(sub).await,
        Some(("serve", sub)) => serve(sub).await,
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<PlannerConfig> {
    let mut config = PlannerConfig::from_env()?;
    if let Some(top_k) = matches.get_one::<usize>("top-k") {
        config = config.with_top_k(*top_k);
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.chat_model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn plan(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches)?;
    let query = matches
        .get_one::<String>("query")
        .context("query argument is required")?;

    info!("Using model: {}", config.chat_model);
    let planner = config.build_planner();

    match planner.plan(query).await {
        Ok(itinerary) => {
            if matches.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&itinerary)?);
            } else {
                println!("{}", itinerary.to_markdown());
            }
            Ok(())
        }
        Err(err) => {
            error!("Trip planning failed: {}", err);
            Err(err.into())
        }
    }
}

async fn serve(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches)?;
    let host = matches
        .get_one::<String>("host")
        .context("host has a default")?;
    let port = *matches.get_one::<u16>("port").context("port has a default")?;
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let planner = Arc::new(config.build_planner());
    api::serve(planner, addr, config.timeout).await?;
    Ok(())
}
