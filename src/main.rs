// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! sechat CLI - Stack Exchange chat from the terminal

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use sechat::{AuthSession, AuthState, ChatClient, ClientConfig, Credentials, StreamConfig};

const DEFAULT_SESSION_FILE: &str = "sechat-session.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sechat=info")),
        )
        .init();

    let (args, session_file) = match split_session_flag(env::args().skip(1).collect()) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    let Some(command) = args.first() else {
        print_usage();
        return ExitCode::from(1);
    };

    let result = match command.as_str() {
        "login" => login(&session_file).await,
        "watch" => match room_arg(&args) {
            Ok(room) => watch(&session_file, room).await,
            Err(e) => Err(e),
        },
        "users" => match room_arg(&args) {
            Ok(room) => users(&session_file, room).await,
            Err(e) => Err(e),
        },
        "send" => match room_arg(&args) {
            Ok(room) if args.len() > 2 => send(&session_file, room, &args[2..].join(" ")).await,
            Ok(_) => Err(anyhow::anyhow!("Usage: sechat send <room> <text>")),
            Err(e) => Err(e),
        },
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("sechat {}", sechat::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"sechat - Stack Exchange chat client

USAGE:
    sechat [--session <path>] <COMMAND> [ARGS]

COMMANDS:
    login               Log in and save the session
    watch <room>        Print events from a room until Ctrl-C
    users <room>        List users present in a room
    send <room> <text>  Post a message to a room
    help                Show this help message
    version             Show version information

ENVIRONMENT:
    SECHAT_EMAIL        Account email (needed when no saved session exists)
    SECHAT_PASSWORD     Account password
    RUST_LOG            Log filter (default: sechat=info)

The session is saved to ./{} unless --session is given.
"#,
        DEFAULT_SESSION_FILE
    );
}

/// Pull `--session <path>` out of the argument list
fn split_session_flag(args: Vec<String>) -> anyhow::Result<(Vec<String>, PathBuf)> {
    let mut rest = Vec::with_capacity(args.len());
    let mut session_file = PathBuf::from(DEFAULT_SESSION_FILE);

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--session" {
            let path = iter.next().context("--session needs a path")?;
            session_file = PathBuf::from(path);
        } else {
            rest.push(arg);
        }
    }
    Ok((rest, session_file))
}

fn room_arg(args: &[String]) -> anyhow::Result<u64> {
    let Some(room) = args.get(1) else {
        bail!("Usage: sechat {} <room>", args[0]);
    };
    room.parse()
        .with_context(|| format!("invalid room id '{}'", room))
}

fn credentials() -> anyhow::Result<Credentials> {
    let email = env::var("SECHAT_EMAIL").context("SECHAT_EMAIL is not set")?;
    let password = env::var("SECHAT_PASSWORD").context("SECHAT_PASSWORD is not set")?;
    Ok(Credentials::new(email, password))
}

async fn login(session_file: &Path) -> anyhow::Result<()> {
    let mut session = AuthSession::new(credentials()?, ClientConfig::default())?;
    session.login().await?;
    save(&session, session_file)?;

    println!("Logged in as user {}", session.user_id());
    Ok(())
}

/// Restore the saved session, or log in and save a new one
async fn open_session(session_file: &Path) -> anyhow::Result<AuthSession> {
    if session_file.exists() {
        let state = AuthState::load(session_file)
            .with_context(|| format!("reading {}", session_file.display()))?;
        let session = AuthSession::restore(state, ClientConfig::default())?;
        if session.is_logged_in() {
            return Ok(session);
        }
    }

    let mut session = AuthSession::new(credentials()?, ClientConfig::default())?;
    session.login().await?;
    save(&session, session_file)?;
    Ok(session)
}

fn save(session: &AuthSession, session_file: &Path) -> anyhow::Result<()> {
    session
        .state()?
        .save(session_file)
        .with_context(|| format!("writing {}", session_file.display()))
}

async fn watch(session_file: &Path, room: u64) -> anyhow::Result<()> {
    let client = ChatClient::new(open_session(session_file).await?)?;
    let mut stream = client.stream(StreamConfig::new(room))?;

    println!("Watching room {} (Ctrl-C to stop)", room);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = stream.recv() => match event {
                Some(event) => {
                    let time = event
                        .time()
                        .map(|t| t.format("%H:%M:%S").to_string())
                        .unwrap_or_default();
                    println!(
                        "[{}] {:?} #{} {}: {}",
                        time, event.event_type, event.room_id, event.user_name, event.text_content
                    );
                }
                None => break,
            },
        }
    }

    stream.close().await;
    save(client.session(), session_file)?;
    Ok(())
}

async fn users(session_file: &Path, room: u64) -> anyhow::Result<()> {
    let client = ChatClient::new(open_session(session_file).await?)?;
    let users = client.users_in_room(room).await?;

    println!("{} users in room {}", users.len(), room);
    for user in &users {
        let role = if user.is_owner {
            " (owner)"
        } else if user.is_moderator {
            " (moderator)"
        } else {
            ""
        };
        println!("  {:>10}  {}{}", user.id, user.name, role);
    }
    Ok(())
}

async fn send(session_file: &Path, room: u64, text: &str) -> anyhow::Result<()> {
    let client = ChatClient::new(open_session(session_file).await?)?;
    client.send(room, text).await?;
    println!("Sent to room {}", room);
    Ok(())
}
