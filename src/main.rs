use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use terminal_size::{Width, terminal_size};

use gofish::config::AppConfig;
use gofish::logging::init_logging;
use gofish::{Game, Rank, Seat, server, simulation};

#[derive(Debug, Parser)]
#[command(name = "gofish", about = "Go Fish against a computer that keeps score of what you ask for")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[arg(long, global = true)]
    hand_size: Option<usize>,
    /// trace, debug, info, warn or error.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play in the terminal (the default).
    Play {
        /// Print the computer's belief table after each of its moves.
        #[arg(long)]
        show_beliefs: bool,
    },
    /// Serve the JSON API.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Pit the computer against a random opponent.
    Simulate {
        #[arg(long)]
        games: Option<usize>,
        #[arg(long)]
        threads: Option<usize>,
    },
}

enum Choice {
    Ask(Rank),
    Quit,
}

struct GameState {
    game: Game,
    actions_log: Vec<String>,
    messages: Vec<String>,
    show_beliefs: bool,
}

impl GameState {
    fn clear_screen() {
        print!("\x1B[2J\x1B[1;1H");
        let _ = io::stdout().flush();
    }

    fn separator() -> String {
        let width = terminal_size()
            .map(|(Width(width), _)| width as usize)
            .unwrap_or(40)
            .min(80);
        "─".repeat(width)
    }

    fn display(&self) {
        Self::clear_screen();

        let books = self.game.books();
        println!("Go Fish\n");
        println!(
            "Books: you {}, computer {}    Pile: {}    Computer holds {} card(s)",
            books[Seat::Human.index()],
            books[Seat::Computer.index()],
            self.game.deck_remaining(),
            self.game.hand(Seat::Computer).len()
        );
        println!("{}", Self::separator());
        println!(" {}\n", self.game.hand(Seat::Human));
    }

    fn display_with_actions(&self) {
        self.display();

        if !self.actions_log.is_empty() {
            println!("Actions:");
            let start = self.actions_log.len().saturating_sub(3);
            for action in &self.actions_log[start..] {
                println!("{action}");
            }
        }

        if self.show_beliefs {
            println!("\n{}", self.game.belief());
        }

        if !self.messages.is_empty() {
            println!("\nMessages:");
            for msg in &self.messages {
                println!("{msg}");
            }
        }

        print!("\nWhich rank do you ask for? (q to quit) ");
        let _ = io::stdout().flush();
    }

    fn add_action(&mut self, action: String) {
        self.actions_log.push(action);
    }

    fn add_message(&mut self, msg: String) {
        self.messages.push(msg);
        if self.messages.len() > 3 {
            self.messages.remove(0);
        }
    }

    fn clear_messages(&mut self) {
        self.messages.clear();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Play {
        show_beliefs: false,
    }) {
        Command::Play { show_beliefs } => {
            // Quiet by default so turn logs don't scroll the board away.
            if cli.log_level.is_none() {
                config.logging.tracing_level = "warn".to_string();
            }
            init_logging(&config.logging);
            play(&config, show_beliefs)
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            config.validate().context("invalid server settings")?;
            init_logging(&config.logging);

            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(server::serve(&config))?;
            Ok(())
        }
        Command::Simulate { games, threads } => {
            if let Some(games) = games {
                config.simulation.games = games;
            }
            if threads.is_some() {
                config.simulation.threads = threads;
            }
            config.validate().context("invalid simulation settings")?;
            init_logging(&config.logging);

            let summary = simulation::simulate(&config.game, &config.simulation)?;
            print!("{summary}");
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.game.seed = Some(seed);
    }
    if let Some(hand_size) = cli.hand_size {
        config.game.hand_size = hand_size;
    }
    if let Some(level) = &cli.log_level {
        config.logging.tracing_level = level.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn play(config: &AppConfig, show_beliefs: bool) -> Result<()> {
    let pattern = request_pattern()?;
    let mut game_state = GameState {
        game: Game::new(&config.game),
        actions_log: Vec::new(),
        messages: Vec::new(),
        show_beliefs,
    };

    while !game_state.game.is_game_over() {
        match game_state.game.current_player() {
            Seat::Computer => {
                let outcome = game_state.game.computer_move()?;
                game_state.add_action(outcome.to_string());
            }
            Seat::Human => {
                game_state.clear_messages();
                game_state.display_with_actions();

                let rank = loop {
                    let mut input = String::new();
                    if io::stdin().read_line(&mut input)? == 0 {
                        return Ok(());
                    }

                    match parse_choice(&pattern, &input) {
                        Ok(Choice::Quit) => return Ok(()),
                        Ok(Choice::Ask(rank)) => {
                            let hand = game_state.game.hand(Seat::Human);
                            if hand.is_empty() || hand.count_of(rank) > 0 {
                                break rank;
                            }
                            game_state.add_message(format!("You don't hold any {rank}s!"));
                        }
                        Err(err) => game_state.add_message(err),
                    }
                    game_state.display_with_actions();
                };

                let outcome = game_state.game.ask_for_cards(Seat::Human, rank)?;
                game_state.add_action(outcome.to_string());
            }
        }
    }

    game_state.clear_messages();
    game_state.display();
    let start = game_state.actions_log.len().saturating_sub(3);
    for action in &game_state.actions_log[start..] {
        println!("{action}");
    }
    let books = game_state.game.books();
    let headline = match game_state.game.winner() {
        Some(Seat::Human) => "You ran out of cards first and win!",
        Some(Seat::Computer) => "The computer ran out of cards first and wins.",
        None => "Game over.",
    };
    println!(
        "\n{headline} Books: you {}, computer {}.",
        books[0], books[1]
    );
    Ok(())
}

fn request_pattern() -> Result<Regex, regex::Error> {
    Regex::new(r"(?i)^(?:ask\s+(?:for\s+)?)?(10|[2-9]|[jqka])s?$")
}

fn parse_choice(pattern: &Regex, input: &str) -> Result<Choice, String> {
    let input = input.trim();
    if matches!(input.to_lowercase().as_str(), "q" | "quit") {
        return Ok(Choice::Quit);
    }

    pattern
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|rank| rank.as_str().parse().ok())
        .map(Choice::Ask)
        .ok_or_else(|| "Invalid input. Expected a rank such as 7, 10 or Q.".to_string())
}
