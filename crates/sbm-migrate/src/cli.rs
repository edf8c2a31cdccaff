//! Command line surface of `sbm-migrate`
//!
//! One subcommand per migration tool. Every subcommand takes the messaging
//! service URL and token and runs dry unless `--execute` is given. Progress
//! lines are written to `out`; logs go through tracing.

use crate::clone_sets::clone_evening_sets;
use crate::error::MigrateError;
use crate::input::BatchSource;
use crate::logging::LogFormat;
use crate::orchestrator::{Migrator, MigratorOptions};
use crate::resubscribe::Resubscriber;
use crate::scenario_file::load_scenario;
use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use sbm_gateway::{GatewayConfig, IdentityStoreClient, MessagingApi, RunMode, SbmClient};
use sbm_model::{FixedScenario, MessageSetId, Scenario, ThresholdScenario};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Build the command tree
#[must_use]
pub fn command() -> Command {
    Command::new("sbm-migrate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Migrate stage based messaging subscribers between message sets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log progress at info level when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(value_parser!(LogFormat))
                .help("Log line format: text or json"),
        )
        .subcommand(
            batch_args(gateway_args(
                Command::new("pmtct").about("Resubscribe PMTCT identities to missed message sets"),
            ))
            .arg(
                Arg::new("scenario")
                    .long("scenario")
                    .required(true)
                    .value_parser(value_parser!(PathBuf))
                    .help("TOML scenario file"),
            ),
        )
        .subcommand(
            batch_args(gateway_args(
                Command::new("immunisation")
                    .about("Send immunisation messages skipped by fast-forwarded identities"),
            ))
            .arg(
                Arg::new("messageset-ids")
                    .long("messageset-ids")
                    .num_args(4)
                    .value_parser(value_parser!(u64))
                    .help("Sets sending messages 13, 21 and 29 of set 8 and 36 of set 7"),
            )
            .arg(
                Arg::new("feeders")
                    .long("feeders")
                    .num_args(1..)
                    .value_parser(value_parser!(u64))
                    .conflicts_with("scenario")
                    .help("Only migrate identities on a track or on one of these sets"),
            )
            .arg(
                Arg::new("scenario")
                    .long("scenario")
                    .value_parser(value_parser!(PathBuf))
                    .help("Threshold scenario file replacing the built in table"),
            )
            .group(
                ArgGroup::new("table")
                    .args(["messageset-ids", "scenario"])
                    .required(true),
            ),
        )
        .subcommand(
            batch_args(gateway_args(
                Command::new("service-disruption")
                    .about("Subscribe identities to a service disruption message set"),
            ))
            .arg(
                Arg::new("messageset-id")
                    .long("messageset-id")
                    .required(true)
                    .value_parser(value_parser!(u64))
                    .help("Service disruption message set"),
            ),
        )
        .subcommand(
            gateway_args(
                Command::new("resubscribe")
                    .about("Move subscribers of an expired message set to its replacement"),
            )
            .arg(
                Arg::new("is-url")
                    .long("is-url")
                    .required(true)
                    .help("Identity store URL"),
            )
            .arg(
                Arg::new("is-token")
                    .long("is-token")
                    .required(true)
                    .help("Identity store token"),
            )
            .arg(
                Arg::new("old-messageset")
                    .long("old-messageset")
                    .required(true)
                    .value_parser(value_parser!(u64))
                    .help("Expired message set"),
            )
            .arg(
                Arg::new("new-messageset")
                    .long("new-messageset")
                    .required(true)
                    .value_parser(value_parser!(u64))
                    .help("Replacement message set"),
            ),
        )
        .subcommand(gateway_args(
            Command::new("clone-sets").about("Create 6-8pm copies of the 9-11am audio message sets"),
        ))
}

fn gateway_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("sbm-url")
                .long("sbm-url")
                .required(true)
                .help("Stage based messaging service URL"),
        )
        .arg(
            Arg::new("sbm-token")
                .long("sbm-token")
                .required(true)
                .help("Stage based messaging service token"),
        )
        .arg(
            Arg::new("execute")
                .long("execute")
                .action(ArgAction::SetTrue)
                .help("Send writes; without it the run is dry"),
        )
}

fn batch_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("file")
                .long("file")
                .value_parser(value_parser!(PathBuf))
                .help("File of newline delimited identity records"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .help("Identity records passed inline"),
        )
        .arg(
            Arg::new("no-duplicate-check")
                .long("no-duplicate-check")
                .action(ArgAction::SetTrue)
                .help("Create without checking for an existing subscription"),
        )
        .group(ArgGroup::new("input").args(["file", "data"]).required(true))
}

fn required<'a, T>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .ok_or_else(|| anyhow!("missing required argument --{name}"))
}

fn message_set(args: &ArgMatches, name: &str) -> anyhow::Result<MessageSetId> {
    required::<u64>(args, name).map(|id| MessageSetId(*id))
}

fn gateway_config(args: &ArgMatches, url: &str, token: &str) -> anyhow::Result<GatewayConfig> {
    Ok(GatewayConfig::new(
        required::<String>(args, url)?.as_str(),
        required::<String>(args, token)?.as_str(),
    )
    .with_mode(RunMode::from_execute_flag(args.get_flag("execute"))))
}

fn messaging_client(args: &ArgMatches) -> anyhow::Result<Arc<dyn MessagingApi>> {
    let client = SbmClient::new(&gateway_config(args, "sbm-url", "sbm-token")?)
        .context("failed to build messaging client")?;
    Ok(Arc::new(client))
}

fn batch_source(args: &ArgMatches) -> anyhow::Result<BatchSource> {
    if let Some(path) = args.get_one::<PathBuf>("file") {
        return Ok(BatchSource::File(path.clone()));
    }
    args.get_one::<String>("data")
        .map(|data| BatchSource::Data(data.clone()))
        .ok_or_else(|| anyhow!("one of --file or --data is required"))
}

fn immunisation_scenario(args: &ArgMatches) -> anyhow::Result<Scenario> {
    if let Some(path) = args.get_one::<PathBuf>("scenario") {
        let scenario = load_scenario(path)?;
        if scenario.kind() != "threshold" {
            return Err(MigrateError::ScenarioFile(format!(
                "immunisation needs a threshold scenario, {} given",
                scenario.kind()
            ))
            .into());
        }
        return Ok(scenario);
    }
    let ids: Vec<MessageSetId> = args
        .get_many::<u64>("messageset-ids")
        .into_iter()
        .flatten()
        .map(|id| MessageSetId(*id))
        .collect();
    let destinations: [MessageSetId; 4] = ids
        .try_into()
        .map_err(|ids: Vec<_>| anyhow!("expected 4 message set ids, got {}", ids.len()))?;
    let scenario = ThresholdScenario::immunisation(destinations).map_err(MigrateError::from)?;
    Ok(match args.get_many::<u64>("feeders") {
        Some(feeders) => scenario.with_feeders(feeders.map(|id| MessageSetId(*id))),
        None => scenario,
    }
    .into())
}

/// Scenario of a batch subcommand; reads no network
fn batch_scenario(name: &str, args: &ArgMatches) -> anyhow::Result<Scenario> {
    match name {
        "pmtct" => Ok(load_scenario(required::<PathBuf>(args, "scenario")?)?),
        "immunisation" => immunisation_scenario(args),
        "service-disruption" => Ok(FixedScenario::new(message_set(args, "messageset-id")?).into()),
        other => Err(anyhow!("{other} is not a batch command")),
    }
}

async fn run_batch(name: &str, args: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    // all input is validated before the first request
    let scenario = batch_scenario(name, args)?;
    let batch = batch_source(args)?.load()?;

    let options = MigratorOptions {
        check_duplicates: !args.get_flag("no-duplicate-check"),
    };
    let migrator = Migrator::new(messaging_client(args)?, scenario).with_options(options);

    let mut write_error = None;
    let report = migrator
        .run(&batch, |outcome| {
            if let Err(error) = writeln!(out, "{outcome}") {
                write_error.get_or_insert(error);
            }
        })
        .await?;
    if let Some(error) = write_error {
        return Err(error.into());
    }
    writeln!(out, "{}", report.summary())?;
    Ok(())
}

async fn run_resubscribe(args: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let identities = IdentityStoreClient::new(&gateway_config(args, "is-url", "is-token")?)
        .context("failed to build identity store client")?;
    let resubscriber = Resubscriber::new(
        messaging_client(args)?,
        Arc::new(identities),
        message_set(args, "old-messageset")?,
        message_set(args, "new-messageset")?,
    );

    let mut write_error = None;
    let report = resubscriber
        .run(|outcome| {
            if let Err(error) = writeln!(out, "{outcome}") {
                write_error.get_or_insert(error);
            }
        })
        .await?;
    if let Some(error) = write_error {
        return Err(error.into());
    }
    writeln!(out, "{}", report.summary())?;
    Ok(())
}

async fn run_clone_sets(args: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let gateway = messaging_client(args)?;
    let mut write_error = None;
    let cloned = clone_evening_sets(gateway.as_ref(), |entry| {
        if let Err(error) = writeln!(out, "{entry}") {
            write_error.get_or_insert(error);
        }
    })
    .await?;
    if let Some(error) = write_error {
        return Err(error.into());
    }
    writeln!(out, "Operation complete. {} message sets handled.", cloned.len())?;
    Ok(())
}

/// Log settings picked from the top level arguments
#[must_use]
pub fn log_settings(matches: &ArgMatches) -> (LogFormat, bool) {
    (
        matches
            .get_one::<LogFormat>("log-format")
            .copied()
            .unwrap_or_default(),
        matches.get_flag("verbose"),
    )
}

/// Run the selected subcommand
///
/// # Errors
/// Usage errors (wrapping [`crate::MigrateError`] where one applies) and
/// fatal setup errors. Per identity failures are reported on `out` instead.
pub async fn run(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some((name @ ("pmtct" | "immunisation" | "service-disruption"), args)) => {
            run_batch(name, args, out).await
        }
        Some(("resubscribe", args)) => run_resubscribe(args, out).await,
        Some(("clone-sets", args)) => run_clone_sets(args, out).await,
        Some((other, _)) => Err(anyhow!("unknown command {other}")),
        None => Err(anyhow!("no command given")),
    }
}
