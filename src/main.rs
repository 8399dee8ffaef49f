// main.rs

use dotenv::dotenv;
use std::io::{self, Write};
use std::sync::Arc;
use tasklist_sync::api::HttpSeedSource;
use tasklist_sync::config::Config;
use tasklist_sync::flag::TomlFlagStore;
use tasklist_sync::parser::{parse_command, Command, HELP};
use tasklist_sync::store::SqliteTaskStore;
use tasklist_sync::sync::SyncOrchestrator;
use tasklist_sync::App;
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_tasks(app: &App) {
    if app.tasks.is_empty() {
        println!("No tasks yet. Try `add <title>`.");
        return;
    }
    for (i, task) in app.tasks.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        println!(
            "{:>3}. [{}] {}  ({})",
            i + 1,
            mark,
            task.title,
            task.created_at.format("%d/%m/%y")
        );
        if !task.description.is_empty() {
            println!("          {}", task.description);
        }
    }
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let config = Config::load()?;
    log::debug!("Using {:?}", config);

    let store = Arc::new(SqliteTaskStore::open(&config.database_path)?);
    let source = Arc::new(HttpSeedSource::new(
        config.seed_url.clone(),
        config.request_timeout,
    )?);
    let flags = Arc::new(TomlFlagStore::new(config.flags_path.clone()));
    let sync = SyncOrchestrator::new(store.clone(), source, flags);
    let mut app = App::new(sync, store);

    if let Err(err) = app.load_tasks().await {
        log::warn!("Loading tasks failed: {}", err);
        eprintln!("{}", err.user_message());
    }
    print_tasks(&app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::List) => {
                // a failed reload keeps showing the previous list
                if let Err(err) = app.load_tasks().await {
                    log::warn!("Loading tasks failed: {}", err);
                    eprintln!("{}", err.user_message());
                }
                print_tasks(&app);
            }
            Ok(command) => match app.handle_command(command).await {
                Ok(true) => break,
                Ok(false) => print_tasks(&app),
                Err(err) => {
                    log::warn!("Command failed: {}", err);
                    eprintln!("{}", err.user_message());
                }
            },
            Err(err) => eprintln!("{}", err),
        }
        prompt()?;
    }

    Ok(())
}
