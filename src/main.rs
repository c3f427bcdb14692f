mod allocator;
mod app;
mod form;
mod options;
mod receipt;
mod stall;
mod store;
mod ui;

use clap::Parser as _;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt as _;
use itertools::Itertools as _;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    ffi::OsStr,
    io,
    path::Path,
    sync::Arc,
};
use tokio::{io::AsyncWriteExt as _, process::Command, sync::mpsc};

use crate::{
    allocator::next_stall_numbers,
    app::{key_bindings, App, Effect},
    options::{Options, PrintOnExit},
    receipt::{decode_scan_code, render_receipt, scan_code},
    stall::{format_cents, StallRecord},
    store::{JsonStore, RecordStore},
    ui::{action::{Action, QuitAction}, popup::KeysPopup},
};

#[derive(Debug)]
enum AppEvent {
    Stored(StallRecord),
    StoreFailed(String),
}

fn init_logging(options: &Options) -> io::Result<()> {
    if let (Some(filters), Some(path)) = (&options.logging, &options.log_file) {
        let file = std::fs::File::create(path)?;
        env_logger::Builder::new()
            .parse_filters(filters)
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }
    Ok(())
}

async fn write_receipt(dir: &Path, record: &StallRecord) -> io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.txt", record.id));
    tokio::fs::write(&path, render_receipt(record)).await?;
    log::info!("receipt written to {}", path.display());
    Ok(())
}

/// Shows `text` in the pager, giving it the terminal until it exits.
async fn launch_pager(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    pager: &OsStr,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    let mut file = async_tempfile::TempFile::new().await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    log::info!("launch pager: {pager:?}");
    let status = Command::new(pager).arg(file.file_path()).status().await;

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen, EnableMouseCapture)?;
    terminal.clear()?;

    let status = status?;
    if !status.success() {
        log::warn!("pager exited with {status}");
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    store: Arc<dyn RecordStore>,
    options: &Options,
) -> Result<App, Box<dyn Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut events = EventStream::new();
    let keys = KeysPopup::new(key_bindings());
    let mut clipboard: Option<arboard::Clipboard> = None;

    loop {
        terminal.draw(|f| ui::form_view::render(f, &app, &keys))?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let event = event?;
                let action = keys.get_action(&event).or_else(|| match event {
                    Event::Key(key) if key.is_press() => Some(Action::Input(key)),
                    _ => None,
                });
                let Some(action) = action else { continue };

                match app.apply(action) {
                    None => {}
                    Some(Effect::Persist(registration)) => {
                        let store = store.clone();
                        let store_tx = tx.clone();
                        tokio::spawn(async move {
                            let result = tokio::task::spawn_blocking(move || store.insert(registration)).await;
                            let event = match result {
                                Ok(Ok(record)) => AppEvent::Stored(record),
                                Ok(Err(err)) => AppEvent::StoreFailed(err.to_string()),
                                Err(err) => AppEvent::StoreFailed(err.to_string()),
                            };
                            let _ = store_tx.send(event);
                        });
                    }
                    Some(Effect::Copy(text)) => {
                        if clipboard.is_none() {
                            match arboard::Clipboard::new() {
                                Ok(new) => clipboard = Some(new),
                                Err(err) => log::warn!("clipboard is not available: {err}"),
                            }
                        }
                        if let Some(clipboard) = &mut clipboard
                            && let Err(err) = clipboard.set_text(text)
                        {
                            log::warn!("failed to copy to clipboard: {err}");
                        }
                    }
                    Some(Effect::Page(text)) => {
                        if let Err(err) = launch_pager(terminal, &options.resolve_pager(), &text).await {
                            log::warn!("failed to launch pager: {err}");
                        }
                    }
                }
            }
            Some(event) = rx.recv() => match event {
                AppEvent::Stored(record) => {
                    if let Some(dir) = &options.receipt_dir
                        && let Err(err) = write_receipt(dir, &record).await
                    {
                        log::error!("failed to write receipt for {}: {err}", record.id);
                    }
                    app.stored(record);
                }
                AppEvent::StoreFailed(error) => {
                    log::error!("failed to store registration: {error}");
                    app.store_failed(error);
                }
            },
        }

        if app.quit.is_some() {
            break;
        }
    }

    Ok(app)
}

fn print_stalls(stalls: &[StallRecord]) {
    for stall in stalls {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}..{}\t{}",
            stall.id,
            stall.name,
            stall.stall_type,
            [stall.vendor_name.as_str(), stall.business_name.as_str()].iter().filter(|s| !s.is_empty()).join(" / "),
            format_cents(stall.rent),
            stall.start_date,
            stall.end_date,
            stall.status,
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();
    init_logging(&options)?;

    if let Some(code) = &options.decode {
        let payload = decode_scan_code(code)?;
        let key = payload.key.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string());
        println!("key:      {key}");
        println!("stall:    {} ({})", payload.name, payload.id);
        println!("type:     {}", payload.stall_type);
        println!("vendor:   {} / {}", payload.vendor, payload.business);
        println!("rent:     {}", format_cents(payload.rent_cents));
        println!("period:   {} to {}", payload.start, payload.end);
        return Ok(());
    }

    let store = Arc::new(JsonStore::new(options.resolve_store()));
    log::info!("using record store {}", store.path().display());
    let stalls = store.list()?;

    if options.list {
        print_stalls(&stalls);
        return Ok(());
    }
    if options.next_numbers {
        let next = next_stall_numbers(&stalls, options.type_filter());
        println!("{}\n{}", next.stall_id(), next.stall_name());
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(stalls, options.stall_type.clone());
    let res = run_app(&mut terminal, app, store, &options).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let app = res?;
    if app.quit == Some(QuitAction::Finish) {
        for record in &app.registered {
            match options.print_on_exit {
                PrintOnExit::Nothing => {}
                PrintOnExit::Receipt => print!("{}", render_receipt(record)),
                PrintOnExit::Code => println!("{}", scan_code(record)),
            }
        }
    }

    Ok(())
}
