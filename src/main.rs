use clap::{CommandFactory, Parser};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use vidgrab::app::App;
use vidgrab::cli::{Cli, Targets};
use vidgrab::config::Settings;
use vidgrab::handlers::PluginResolver;
use vidgrab::interaction::{Interaction, Scripted, Terminal};
use vidgrab::observability;
use vidgrab::plugins::{self, PluginStore};
use vidgrab::session::Session;
use vidgrab::update::{UpdateManager, UpdateStatus};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli.overrides()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("vidgrab: {}", e);
            return ExitCode::FAILURE;
        }
    };
    observability::init(settings.quiet, settings.debug);

    match run(cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<ExitCode, BoxError> {
    let interactive = std::io::stdin().is_terminal() && !settings.yes;
    let interaction: Arc<dyn Interaction> = if interactive {
        Arc::new(Terminal)
    } else {
        Arc::new(Scripted::new(settings.yes))
    };
    let store = PluginStore::new(settings.plugins_dir());
    let mut did_something = false;

    if let Some(source) = &cli.add_plugin {
        let session = Session::from_settings(&settings)?;
        let path = plugins::install(&store, source, &session).await?;
        println!("Installed plugin {}", path.display());
        did_something = true;
    }

    if cli.update {
        let session = Session::from_settings(&settings)?;
        let manager = UpdateManager::new(&settings, session, interaction.clone());

        if let UpdateStatus::UpToDate { current } = manager.check_self_update().await? {
            println!("vidgrab {} is up to date.", current);
        }

        let report = manager
            .check_plugin_updates(&PluginResolver::new(store.clone()))
            .await?;
        for name in &report.updated {
            println!("Updated plugin {}", name);
        }
        did_something = true;
    }

    let app = App::new(settings, interaction, interactive);

    let urls = match cli.targets() {
        None if did_something => return Ok(ExitCode::SUCCESS),
        None => {
            Cli::command().print_help()?;
            return Ok(ExitCode::FAILURE);
        }
        Some(Targets::Urls(urls)) => urls,
        Some(Targets::Search(phrase)) => app.search(&phrase).await?,
    };

    let snapshot = app.run_batch(&urls).await;
    Ok(ExitCode::from(snapshot.exit_code()))
}
