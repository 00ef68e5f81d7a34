use clap::Parser;
use colored::*;
use mdplay::api::{CmdMessage, CmdResult, ConfigAction, MessageLevel, PlaygroundApi};
use mdplay::config::{PlaygroundConfig, PlaygroundPaths};
use mdplay::error::{PlaygroundError, Result};
use mdplay::store::{self, FsBackend};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mdplay=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let paths = PlaygroundPaths::discover()?;
    let config = PlaygroundConfig::load(&paths.data_dir)?;
    let store = store::shared(&paths)?;
    let api = PlaygroundApi::new(store, paths, config);

    match cli.command {
        Some(Commands::Render { file }) => handle_render(&api, file).await,
        Some(Commands::Save { file }) => handle_save(&api, file).await,
        Some(Commands::Show { html }) => handle_show(&api, html).await,
        Some(Commands::Sample { name }) => {
            let result = api.load_sample(&name).await?;
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Samples) => {
            let result = api.list_samples()?;
            for name in &result.samples {
                println!("{}", name);
            }
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Theme { action }) => handle_theme(&api, action).await,
        Some(Commands::Export { title, output }) => {
            let result = api.export(title, output).await?;
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Config { key, value }) => handle_config(&api, key, value),
        None => handle_show(&api, false).await,
    }
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path).map_err(PlaygroundError::Io),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(PlaygroundError::Io)?;
            Ok(buffer)
        }
    }
}

async fn handle_render(api: &PlaygroundApi<'_, FsBackend>, file: Option<PathBuf>) -> Result<()> {
    let source = read_input(file)?;
    let result = api.render(source).await?;
    print_rendered(&result);
    print_messages(&result.messages);
    Ok(())
}

async fn handle_save(api: &PlaygroundApi<'_, FsBackend>, file: Option<PathBuf>) -> Result<()> {
    let content = read_input(file)?;
    let result = api.save_document(content).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_show(api: &PlaygroundApi<'_, FsBackend>, html: bool) -> Result<()> {
    let result = api.show_document(html).await?;
    if html {
        print_rendered(&result);
    } else if let Some(document) = &result.document {
        println!("{}", document);
    }
    print_warnings(&result.messages);
    Ok(())
}

async fn handle_theme(api: &PlaygroundApi<'_, FsBackend>, action: Option<String>) -> Result<()> {
    let result = api.theme(action.as_deref()).await?;
    if let Some(theme) = result.theme {
        println!("{}", theme);
    }
    print_warnings(&result.messages);
    Ok(())
}

fn handle_config(
    api: &PlaygroundApi<'_, FsBackend>,
    key: Option<String>,
    value: Option<String>,
) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = api.config_command(action)?;
    print_messages(&result.messages);
    if let Some(config) = &result.config {
        if result.messages.is_empty() {
            for (key, value) in config.entries() {
                println!("{} = {}", key.bold(), value);
            }
        }
    }
    Ok(())
}

fn print_rendered(result: &CmdResult) {
    if let Some(rendered) = &result.rendered {
        println!("{}", rendered.html);
    }
}

/// Messages that should not mix with document output go to stderr.
fn print_warnings(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Warning => eprintln!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
            MessageLevel::Info | MessageLevel::Success => {}
        }
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}
