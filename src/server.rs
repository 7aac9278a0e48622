//! JSON API over a single live game.
//!
//! Handlers are thin async wrappers around synchronous `*_core` functions so
//! the game logic can be exercised without a running server.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State as AxumState,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{Level, event};

use crate::card::{ParseRankError, Rank};
use crate::config::{AppConfig, GameConfig, ValidationError};
use crate::game::{Game, GameError, Hand, Seat, TurnOutcome};

pub type AppState = Arc<ServerState>;

#[derive(Debug)]
pub struct ServerState {
    game: Mutex<Option<Game>>,
    config: GameConfig,
}

impl ServerState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            game: Mutex::new(None),
            config,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub from_player: usize,
    pub to_player: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGameResponse {
    pub player1_hand: Vec<String>,
    pub player2_hand: Vec<String>,
    pub current_player: usize,
    pub books: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub cards: Vec<String>,
    pub sets: Vec<String>,
    pub player1_hand: Vec<String>,
    pub player2_hand: Vec<String>,
    pub current_player: usize,
    pub game_over: bool,
    pub winner: Option<usize>,
    pub books: [u32; 2],
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_player: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    game_over: Option<bool>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("No active game. Please start a new game.")]
    NoActiveGame,
    #[error("Not your turn")]
    NotYourTurn { current: Seat },
    #[error("Not AI's turn")]
    NotComputersTurn { current: Seat },
    #[error("The game is over")]
    GameOver,
    #[error(transparent)]
    InvalidRank(#[from] ParseRankError),
    #[error("unknown player {0}")]
    UnknownPlayer(usize),
    #[error("player {0} must ask the other player")]
    InvalidTarget(usize),
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::NotYourTurn { current } => ApiError::NotYourTurn { current },
            GameError::GameOver => ApiError::GameOver,
        }
    }
}

impl ApiError {
    fn body(&self) -> ErrorBody {
        let (current_player, game_over) = match self {
            ApiError::NoActiveGame | ApiError::GameOver => (None, Some(true)),
            ApiError::NotYourTurn { current } | ApiError::NotComputersTurn { current } => {
                (Some(current.index()), None)
            }
            _ => (None, None),
        };
        ErrorBody {
            error: self.to_string(),
            current_player,
            game_over,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        event!(
            target: "gofish::server",
            Level::WARN,
            error = %self,
            "rejected request"
        );
        (StatusCode::BAD_REQUEST, Json(self.body())).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Address(#[from] ValidationError),
    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

fn card_strings(hand: &Hand) -> Vec<String> {
    hand.cards().iter().map(ToString::to_string).collect()
}

/// `cards` holds the cards handed over on a hit. On a computer miss it holds
/// the card the computer drew instead; a human miss reports nothing.
fn move_response(game: &Game, outcome: &TurnOutcome) -> MoveResponse {
    let cards = match (outcome.success, outcome.requester, outcome.drawn) {
        (false, Seat::Computer, Some(drawn)) => vec![drawn.to_string()],
        _ => outcome.cards.iter().map(ToString::to_string).collect(),
    };
    MoveResponse {
        success: outcome.success,
        cards,
        sets: outcome.books.iter().map(|rank| rank.label().to_string()).collect(),
        player1_hand: card_strings(game.hand(Seat::Human)),
        player2_hand: card_strings(game.hand(Seat::Computer)),
        current_player: game.current_player().index(),
        game_over: game.is_game_over(),
        winner: game.winner().map(Seat::index),
        books: game.books(),
    }
}

/// Deals a fresh game, replacing any game in progress.
pub fn new_game_core(state: &ServerState) -> NewGameResponse {
    let game = Game::new(&state.config);
    let response = NewGameResponse {
        player1_hand: card_strings(game.hand(Seat::Human)),
        player2_hand: card_strings(game.hand(Seat::Computer)),
        current_player: game.current_player().index(),
        books: game.books(),
    };
    event!(
        target: "gofish::server",
        Level::INFO,
        deck_remaining = game.deck_remaining(),
        books = ?game.books(),
        "new game"
    );
    *state.game.lock() = Some(game);
    response
}

pub fn ask_cards_core(state: &ServerState, request: AskRequest) -> Result<MoveResponse, ApiError> {
    let mut guard = state.game.lock();
    let game = guard.as_mut().ok_or(ApiError::NoActiveGame)?;

    let from = Seat::from_index(request.from_player)
        .ok_or(ApiError::UnknownPlayer(request.from_player))?;
    let to = Seat::from_index(request.to_player)
        .ok_or(ApiError::UnknownPlayer(request.to_player))?;
    if to != from.other() {
        return Err(ApiError::InvalidTarget(request.from_player));
    }
    let rank: Rank = request.value.parse()?;

    let outcome = game.ask_for_cards(from, rank)?;
    Ok(move_response(game, &outcome))
}

pub fn ai_move_core(state: &ServerState) -> Result<MoveResponse, ApiError> {
    let mut guard = state.game.lock();
    let game = guard.as_mut().ok_or(ApiError::NoActiveGame)?;

    if game.is_game_over() {
        return Err(ApiError::GameOver);
    }
    if game.current_player() != Seat::Computer {
        return Err(ApiError::NotComputersTurn {
            current: game.current_player(),
        });
    }

    let outcome = game.computer_move()?;
    Ok(move_response(game, &outcome))
}

async fn handle_new_game(AxumState(state): AxumState<AppState>) -> Json<NewGameResponse> {
    Json(new_game_core(&state))
}

async fn handle_ask_cards(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    ask_cards_core(&state, request).map(Json)
}

async fn handle_ai_move(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<MoveResponse>, ApiError> {
    ai_move_core(&state).map(Json)
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::POST])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/new-game", post(handle_new_game))
        .route("/api/ask-cards", post(handle_ask_cards))
        .route("/api/ai-move", post(handle_ai_move))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(config: &AppConfig) -> Result<(), ServerError> {
    let addr = config.server.socket_addr()?;
    let state: AppState = Arc::new(ServerState::new(config.game.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    event!(
        target: "gofish::server",
        Level::INFO,
        %addr,
        "listening"
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
