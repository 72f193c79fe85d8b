//! Command implementations for Docdex CLI.

use log::warn;

use crate::cache::DocInventory;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::inventory::Topic;

/// Execute a CLI command.
pub fn execute_command(args: DocdexArgs) -> Result<()> {
    match &args.command {
        Command::Add(add_args) => add_source(add_args.clone(), &args),
        Command::List(list_args) => list_topics(list_args.clone(), &args),
        Command::Browse(browse_args) => browse_topics(browse_args.clone(), &args),
        Command::Sources(sources_args) => list_sources(sources_args.clone(), &args),
    }
}

fn open_inventory(cli_args: &DocdexArgs) -> DocInventory {
    match &cli_args.base_path {
        Some(path) => DocInventory::with_base_path(path),
        None => DocInventory::new(),
    }
}

/// Register an inventory source.
fn add_source(args: AddArgs, cli_args: &DocdexArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Registering inventory from: {}", args.url);
    }

    let mut inventory = open_inventory(cli_args);
    inventory.add_url(&args.url)?;

    output_result(
        "Inventory registered",
        &AddResult {
            url: crate::cache::normalize_url(&args.url)?,
        },
        cli_args,
    )?;

    Ok(())
}

/// Resolve a name and print each documentation location.
fn list_topics(args: ListArgs, cli_args: &DocdexArgs) -> Result<()> {
    let mut inventory = open_inventory(cli_args);
    let topics = collect_topics(&mut inventory, &args.name)?;

    match cli_args.output_format {
        OutputFormat::Human => {
            // An unknown name prints nothing and exits 0.
            for topic in &topics {
                println!("{}", format_topic(topic, args.long));
            }
        }
        OutputFormat::Json => {
            output_result(
                "",
                &ListResults {
                    name: args.name.clone(),
                    topics,
                },
                cli_args,
            )?;
        }
    }

    Ok(())
}

/// Resolve a name and open each documentation location in a browser.
fn browse_topics(args: BrowseArgs, cli_args: &DocdexArgs) -> Result<()> {
    let mut inventory = open_inventory(cli_args);
    let topics = collect_topics(&mut inventory, &args.name)?;

    for topic in &topics {
        if cli_args.verbosity() > 1 {
            println!("Opening: {}", topic.location);
        }
        if let Err(e) = webbrowser::open(&topic.location) {
            warn!("failed to open {}: {e}", topic.location);
        }
    }

    Ok(())
}

/// List registered inventory sources.
fn list_sources(args: SourcesArgs, cli_args: &DocdexArgs) -> Result<()> {
    let inventory = open_inventory(cli_args);
    let urls = inventory.known_urls()?;

    match cli_args.output_format {
        OutputFormat::Human => {
            if args.long {
                for (url, records) in inventory.known_sources()? {
                    println!("{url}\t{records} records");
                }
            } else {
                for url in &urls {
                    println!("{url}");
                }
            }
        }
        OutputFormat::Json => {
            output_result("", &SourcesResult { urls }, cli_args)?;
        }
    }

    Ok(())
}

fn collect_topics(inventory: &mut DocInventory, name: &str) -> Result<Vec<Topic>> {
    inventory.lookup(name)?.collect()
}
