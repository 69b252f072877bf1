use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use sweeptoken_core::{CellIndex, Game, Owner};
use sweeptoken_protocol::*;

mod draw;

#[derive(Parser, Debug)]
#[command(version, about = "Minesweeper whose whole state lives in its control tokens")]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Secret keying the credential cipher, overrides the `CRYPTO_KEY` variable
    #[arg(long, global = true)]
    crypto_key: Option<String>,

    /// Platform credential, the cipher secret when no crypto key is given
    #[arg(long, global = true)]
    platform_token: Option<String>,

    /// Print rendered messages as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a game and print its state
    New {
        #[arg(long)]
        owner: Owner,
        #[arg(long)]
        size: Option<u8>,
        /// Force a seed instead of random
        #[arg(long)]
        seed: Option<u64>,
        /// Interaction credential to seal into the flag toggle
        #[arg(long)]
        credential: Option<String>,
    },
    /// Click a cell of an encoded game
    Click {
        #[arg(long = "as")]
        actor: Owner,
        #[arg(long)]
        cell: CellIndex,
        /// Hex game state
        state: String,
    },
    /// Flip flag mode using the flag toggle token
    Flag {
        #[arg(long = "as")]
        actor: Owner,
        flag_token: String,
        /// Hex game state of the board the toggle belongs to
        state: String,
    },
    /// Retire the followup controls of a game
    Leave {
        #[arg(long = "as")]
        actor: Owner,
        token: String,
    },
    /// Show the player's view of an encoded game
    Show { state: String },
    /// Seal a credential with the configured secret
    Seal { credential: String },
    /// Open a sealed credential
    Open { sealed: String },
    /// Play interactively with games held in memory
    Play {
        #[arg(long)]
        owner: Owner,
        #[arg(long)]
        size: Option<u8>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    use tracing_subscriber::filter::LevelFilter;

    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    }
    .from_env();
    if let Some(key) = &args.crypto_key {
        settings.crypto_key = Some(key.clone());
    }
    if let Some(token) = &args.platform_token {
        settings.platform_token = Some(token.clone());
    }
    log::debug!("{settings:?}");
    Ok(settings)
}

fn decode_hex(text: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(text.trim()).with_context(|| format!("{what} is not hex"))
}

fn cell_token(index: CellIndex, state: &str) -> Result<String> {
    let state = decode_hex(state, "game state")?;
    Ok(Control::Cell { index, state }.to_token())
}

fn cipher(settings: &Settings) -> Result<TokenCipher> {
    settings
        .cipher()
        .context("configuring the credential cipher")?
        .ok_or_else(|| anyhow!("no {CRYPTO_KEY_VAR} or {PLATFORM_TOKEN_VAR} configured"))
}

fn run(args: Args) -> Result<()> {
    let mut settings = settings(&args)?;
    let out = draw::Printer::new(args.json);

    match args.command {
        Command::New {
            owner,
            size,
            seed,
            credential,
        } => {
            if let Some(size) = size {
                settings.size = size;
            }
            let config = settings.config()?;
            let session = TokenSession::new(settings.cipher()?);
            let started = session.start(
                owner,
                config,
                seed.unwrap_or_else(rand::random),
                credential.as_deref(),
            )?;

            out.board(&started.board)?;
            if let Some(followup) = &started.followup {
                out.followup(followup)?;
            }
            out.state(&started.state);
        }
        Command::Click { actor, cell, state } => {
            let session = TokenSession::new(None);
            let outbound = session.click(actor, &cell_token(cell, &state)?)?;
            log::info!("{:?}", outbound.click);
            out.board(&outbound.board)?;
            out.state(&outbound.state);
        }
        Command::Flag {
            actor,
            flag_token,
            state,
        } => {
            let session = TokenSession::new(Some(cipher(&settings)?));
            let toggled = session.toggle_flag(actor, &flag_token, &cell_token(0, &state)?)?;
            log::info!("Credential for editing the board: {}", toggled.credential);
            if let Some(board) = &toggled.board {
                out.board(board)?;
            }
            out.followup(&toggled.followup)?;
        }
        Command::Leave { actor, token } => {
            let followup = TokenSession::new(None).leave(actor, &token)?;
            out.followup(&followup)?;
        }
        Command::Show { state } => {
            let game = Game::decode(&decode_hex(&state, "game state")?)?;
            out.board(&board_message(&game))?;
            println!(
                "owner {} · size {} · flag mode {}",
                game.owner(),
                game.size(),
                if game.flag_mode() { "on" } else { "off" }
            );
        }
        Command::Seal { credential } => {
            let sealed = cipher(&settings)?.seal(&credential)?;
            println!("{}", hex::encode(sealed));
        }
        Command::Open { sealed } => {
            let opened = cipher(&settings)?.open(&decode_hex(&sealed, "sealed credential")?)?;
            println!("{opened}");
        }
        Command::Play { owner, size, seed } => {
            if let Some(size) = size {
                settings.size = size;
            }
            play(&out, owner, settings.config()?, seed.unwrap_or_else(rand::random))?;
        }
    }

    Ok(())
}

fn play(
    out: &draw::Printer,
    owner: Owner,
    config: sweeptoken_core::GameConfig,
    seed: u64,
) -> Result<()> {
    let mut store = SessionStore::new();
    let view = store.start(owner, config, seed)?;
    let nonce = view.nonce;
    out.board(&view.board)?;
    println!("Enter a cell number, `f` to toggle flag mode, `s` for the state, `q` to leave.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while store.is_playing(owner) {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };

        let control = match line.trim() {
            "f" => SessionControl::Flag { nonce },
            "q" => SessionControl::Leave { nonce },
            "s" => {
                if let Some(state) = store.snapshot(owner) {
                    out.state(&state);
                }
                continue;
            }
            input => match input.parse() {
                Ok(index) => SessionControl::Cell { nonce, index },
                Err(_) => {
                    println!("Unknown command {input:?}");
                    continue;
                }
            },
        };

        match store.handle(owner, &control.to_id()) {
            Ok(SessionReply::Board(board)) => out.board(&board)?,
            Ok(SessionReply::Followup(followup)) => out.followup(&followup)?,
            Err(err) if err.is_silent() => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);
    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_click() {
        let args =
            Args::try_parse_from(["sweeptoken", "click", "--as", "42", "--cell", "7", "01ab"])
                .unwrap();
        let Command::Click { actor, cell, state } = args.command else {
            panic!("expected click");
        };
        assert_eq!((actor, cell, state.as_str()), (42, 7, "01ab"));
    }

    #[test]
    fn state_must_be_hex() {
        assert_eq!(decode_hex(" 0a0b\n", "state").unwrap(), [10, 11]);
        assert!(decode_hex("abc", "state").is_err());
        assert!(cell_token(0, "zz").is_err());
    }

    #[test]
    fn secrets_come_from_flags() {
        let args = Args::try_parse_from([
            "sweeptoken",
            "seal",
            "--crypto-key",
            "an operator secret that is long enough",
            "hello",
        ])
        .unwrap();
        let settings = settings(&args).unwrap();
        let sealed = cipher(&settings).unwrap().seal("hello").unwrap();
        assert_eq!(cipher(&settings).unwrap().open(&sealed).unwrap(), "hello");
    }
}
