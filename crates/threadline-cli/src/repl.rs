use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use threadline_engine::{SendOutcome, SyncEngine};
use threadline_persist::{ImageRef, Sender, Thread, ThreadId};

pub const HELP: &str = "\
Commands:
  <text>          send a message (creates a thread if none is selected)
  /new            start a new conversation
  /threads        list your conversations
  /select <n>     open conversation n from /threads
  /delete <n>     delete conversation n and all its messages
  /image <ref>    attach an image reference to the next message
  /whoami         show the signed-in user
  /help           show this help
  /quit           exit";

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    New,
    Threads,
    Select(usize),
    Delete(usize),
    Image(String),
    WhoAmI,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    /// Thread positions are 1-based, as printed by `/threads`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Send(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "new" => Command::New,
            "threads" => Command::Threads,
            "select" => parse_position(arg).map_or_else(
                || Command::Invalid("usage: /select <n>".to_string()),
                Command::Select,
            ),
            "delete" => parse_position(arg).map_or_else(
                || Command::Invalid("usage: /delete <n>".to_string()),
                Command::Delete,
            ),
            "image" if !arg.is_empty() => Command::Image(arg.to_string()),
            "image" => Command::Invalid("usage: /image <ref>".to_string()),
            "whoami" => Command::WhoAmI,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command: /{}", other)),
        };
        Some(command)
    }
}

fn parse_position(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

/// Render the thread list with 1-based positions
pub fn format_threads(threads: &[Thread], selected: Option<&ThreadId>) -> String {
    if threads.is_empty() {
        return "No conversations yet.".to_string();
    }
    threads
        .iter()
        .enumerate()
        .map(|(i, thread)| {
            let marker = if Some(&thread.id) == selected { "*" } else { " " };
            format!(
                "{}{:>3}. {}  ({})",
                marker,
                i + 1,
                thread.title,
                thread.created_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read commands from stdin until `/quit` or end of input
pub async fn run(engine: &SyncEngine) -> Result<()> {
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(engine, command).await {
            println!("error: {:#}", e);
        }
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

async fn execute(engine: &SyncEngine, command: Command) -> Result<()> {
    match command {
        Command::Send(text) => {
            let outcome = engine.send_message(text).await?;
            report(engine, outcome).await?;
        }
        Command::New => {
            engine.new_thread().await;
            println!("Started a new conversation.");
        }
        Command::Threads => {
            let threads = engine.current_threads();
            let selected = engine.selected_thread().await;
            println!("{}", format_threads(&threads, selected.as_ref()));
        }
        Command::Select(index) => {
            let thread = thread_at(engine, index)?;
            engine.select_thread(thread.id.clone()).await?;
            println!("Opened \"{}\".", thread.title);
            let messages = engine.store().messages().list(&thread.id).await?;
            for message in messages {
                println!("[{}] {}", message.sender, message.text);
            }
        }
        Command::Delete(index) => {
            let thread = thread_at(engine, index)?;
            engine.delete_thread(&thread.id).await?;
            println!("Deleted \"{}\".", thread.title);
        }
        Command::Image(reference) => {
            engine.attach_image(ImageRef::new(reference));
            println!("Image attached to the next message.");
        }
        Command::WhoAmI => match engine.principal().await {
            Some(principal) => println!(
                "{} ({})",
                principal.display_name.as_deref().unwrap_or("anonymous"),
                principal.id
            ),
            None => println!("Not signed in."),
        },
        Command::Help => println!("{}", HELP),
        Command::Invalid(message) => println!("{}", message),
        Command::Quit => {}
    }
    Ok(())
}

fn thread_at(engine: &SyncEngine, index: usize) -> Result<Thread> {
    engine
        .current_threads()
        .into_iter()
        .nth(index)
        .ok_or_else(|| anyhow::anyhow!("no conversation #{}; try /threads", index + 1))
}

async fn report(engine: &SyncEngine, outcome: SendOutcome) -> Result<()> {
    match outcome {
        SendOutcome::Ignored => println!("Nothing to send."),
        SendOutcome::Busy => println!("Still waiting for the previous reply."),
        SendOutcome::Completed { thread_id, .. } | SendOutcome::Failed { thread_id: Some(thread_id), .. } => {
            let messages = engine.store().messages().list(&thread_id).await?;
            if let Some(reply) = messages.iter().rev().find(|m| m.sender == Sender::Assistant) {
                println!("{}", reply.text);
            }
        }
        SendOutcome::Failed { thread_id: None, reason } => {
            println!("Could not start a conversation: {}", reason);
        }
    }
    Ok(())
}
