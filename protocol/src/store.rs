use std::collections::HashMap;

use sweeptoken_core::{CellIndex, Game, GameConfig, GameError, Outcome, Owner, RandomBoardGenerator};

use crate::*;

/// Identifies one game lineage in a [`SessionStore`]; controls from older games carry a
/// different nonce and are ignored.
pub type SessionNonce = u64;

/// Control payloads for in-memory sessions: `kind::nonce[::index]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionControl {
    Cell { nonce: SessionNonce, index: CellIndex },
    Flag { nonce: SessionNonce },
    Leave { nonce: SessionNonce },
}

impl SessionControl {
    pub fn nonce(self) -> SessionNonce {
        match self {
            Self::Cell { nonce, .. } | Self::Flag { nonce } | Self::Leave { nonce } => nonce,
        }
    }

    pub fn to_id(self) -> String {
        match self {
            Self::Cell { nonce, index } => format!("cell::{nonce:016x}::{index}"),
            Self::Flag { nonce } => format!("flag::{nonce:016x}"),
            Self::Leave { nonce } => format!("leave::{nonce:016x}"),
        }
    }

    pub fn parse(id: &str) -> Result<Self, GameError> {
        let mut parts = id.split("::");
        let kind = parts.next().unwrap_or_default();
        let nonce = parts
            .next()
            .and_then(|nonce| SessionNonce::from_str_radix(nonce, 16).ok())
            .ok_or(GameError::Malformed("session control without nonce"))?;

        let control = match kind {
            "cell" => {
                let index = parts
                    .next()
                    .and_then(|index| index.parse().ok())
                    .ok_or(GameError::Malformed("cell control without index"))?;
                Self::Cell { nonce, index }
            }
            "flag" => Self::Flag { nonce },
            "leave" => Self::Leave { nonce },
            _ => return Err(GameError::Malformed("unknown control kind")),
        };

        if parts.next().is_some() {
            return Err(GameError::Malformed("trailing control fields"));
        }
        Ok(control)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub nonce: SessionNonce,
    pub board: BoardMessage,
    pub followup: FollowupMessage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionReply {
    Board(BoardMessage),
    Followup(FollowupMessage),
}

#[derive(Debug)]
struct Entry {
    nonce: SessionNonce,
    game: Game,
}

/// Keeps one live game per player in process memory instead of in the controls.
#[derive(Debug, Default)]
pub struct SessionStore {
    games: HashMap<Owner, Entry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn is_playing(&self, owner: Owner) -> bool {
        self.games.contains_key(&owner)
    }

    pub fn start(&mut self, owner: Owner, config: GameConfig, seed: u64) -> Result<SessionView> {
        self.insert(Game::generate(owner, config, RandomBoardGenerator::new(seed)))
    }

    /// Resumes a game from its encoded bytes, e.g. a [`snapshot`](Self::snapshot) taken
    /// before a restart.
    pub fn restore(&mut self, state: &[u8]) -> Result<SessionView> {
        let game = Game::decode(state)?;
        if game.is_finished() {
            return Err(GameError::InvalidState.into());
        }
        self.insert(game)
    }

    pub fn snapshot(&self, owner: Owner) -> Option<Vec<u8>> {
        self.games.get(&owner).map(|entry| entry.game.encode())
    }

    pub fn handle(&mut self, actor: Owner, id: &str) -> Result<SessionReply> {
        let control = SessionControl::parse(id)?;

        let Some(entry) = self.games.get_mut(&actor) else {
            return match control {
                SessionControl::Cell { .. } => Err(ProtocolError::NoSession),
                _ => Ok(SessionReply::Followup(retired_followup(
                    control.nonce(),
                    BLANK.to_string(),
                ))),
            };
        };
        if entry.nonce != control.nonce() {
            log::debug!("Stale control {} from {}", id, actor);
            return Err(ProtocolError::StaleSession);
        }

        match control {
            SessionControl::Cell { index, .. } => {
                let click = entry.game.click(index)?;
                log::debug!("Click {} by {} -> {:?}", index, actor, click);

                let board = session_board(entry);
                let finished = entry.game.is_finished();
                if finished {
                    self.games.remove(&actor);
                }
                Ok(SessionReply::Board(board))
            }
            SessionControl::Flag { .. } => {
                entry.game.toggle_flag_mode()?;
                Ok(SessionReply::Followup(live_followup(entry)))
            }
            SessionControl::Leave { nonce } => {
                self.games.remove(&actor);
                Ok(SessionReply::Followup(retired_followup(
                    nonce,
                    "You have left the game.".to_string(),
                )))
            }
        }
    }

    fn insert(&mut self, game: Game) -> Result<SessionView> {
        let owner = game.owner();
        if self.games.contains_key(&owner) {
            return Err(ProtocolError::AlreadyPlaying);
        }

        let entry = Entry {
            nonce: rand::random(),
            game,
        };
        let view = SessionView {
            nonce: entry.nonce,
            board: session_board(&entry),
            followup: live_followup(&entry),
        };
        self.games.insert(owner, entry);
        Ok(view)
    }
}

fn session_board(entry: &Entry) -> BoardMessage {
    let owner = entry.game.owner();
    let content = match entry.game.outcome() {
        Outcome::Playing => format!("{owner} is playing."),
        Outcome::Won => format!("{owner} won!"),
        Outcome::Lost => format!("{owner} lost."),
    };
    render_board(&entry.game, content, |index| {
        SessionControl::Cell {
            nonce: entry.nonce,
            index,
        }
        .to_id()
    })
}

fn live_followup(entry: &Entry) -> FollowupMessage {
    let nonce = entry.nonce;
    FollowupMessage {
        content: BLANK.to_string(),
        buttons: vec![
            flag_button(
                entry.game.flag_mode(),
                SessionControl::Flag { nonce }.to_id(),
                false,
            ),
            leave_button(SessionControl::Leave { nonce }.to_id(), false),
        ],
    }
}

fn retired_followup(nonce: SessionNonce, content: String) -> FollowupMessage {
    FollowupMessage {
        content,
        buttons: vec![
            flag_button(false, SessionControl::Flag { nonce }.to_id(), true),
            leave_button(SessionControl::Leave { nonce }.to_id(), true),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeptoken_core::Board;

    fn diagonal(owner: Owner) -> Vec<u8> {
        let config = GameConfig::new(5).unwrap();
        let board = Board::from_mine_indices(config, &[0, 6, 12, 18, 24]).unwrap();
        Game::new(owner, board, Some(4)).unwrap().encode()
    }

    #[test]
    fn control_ids_parse_back() {
        for control in [
            SessionControl::Cell { nonce: 0xabc, index: 24 },
            SessionControl::Flag { nonce: u64::MAX },
            SessionControl::Leave { nonce: 0 },
        ] {
            assert_eq!(SessionControl::parse(&control.to_id()), Ok(control));
        }
        assert_eq!(
            SessionControl::parse("cell::00000000000000ff"),
            Err(GameError::Malformed("cell control without index"))
        );
        assert_eq!(
            SessionControl::parse("flag"),
            Err(GameError::Malformed("session control without nonce"))
        );
        assert_eq!(
            SessionControl::parse("flag::01::9"),
            Err(GameError::Malformed("trailing control fields"))
        );
    }

    #[test]
    fn one_game_per_player() {
        let mut store = SessionStore::new();
        store.start(1, GameConfig::default(), 0).unwrap();

        assert_eq!(
            store.start(1, GameConfig::default(), 1).unwrap_err(),
            ProtocolError::AlreadyPlaying
        );
        assert!(store.start(2, GameConfig::default(), 1).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn losing_evicts_the_game() {
        let mut store = SessionStore::new();
        let view = store.restore(&diagonal(1)).unwrap();

        let reply = store
            .handle(1, &SessionControl::Cell { nonce: view.nonce, index: 12 }.to_id())
            .unwrap();

        let SessionReply::Board(board) = reply else {
            panic!("expected board reply");
        };
        assert_eq!(board.content, "1 lost.");
        assert!(board.buttons().all(|button| button.disabled));
        assert!(!store.is_playing(1));
    }

    #[test]
    fn flag_toggle_changes_click_meaning() {
        let mut store = SessionStore::new();
        let view = store.restore(&diagonal(1)).unwrap();
        let nonce = view.nonce;

        let SessionReply::Followup(followup) =
            store.handle(1, &SessionControl::Flag { nonce }.to_id()).unwrap()
        else {
            panic!("expected followup reply");
        };
        assert_eq!(followup.buttons[0].label, "On");

        store
            .handle(1, &SessionControl::Cell { nonce, index: 12 }.to_id())
            .unwrap();
        let game = Game::decode(&store.snapshot(1).unwrap()).unwrap();
        assert!(game.is_flagged(12));
        assert_eq!(game.outcome(), Outcome::Playing);
    }

    #[test]
    fn stale_and_missing_sessions() {
        let mut store = SessionStore::new();
        let view = store.restore(&diagonal(1)).unwrap();
        let stale = view.nonce.wrapping_add(1);

        assert_eq!(
            store
                .handle(1, &SessionControl::Cell { nonce: stale, index: 3 }.to_id())
                .unwrap_err(),
            ProtocolError::StaleSession
        );
        assert_eq!(
            store
                .handle(2, &SessionControl::Cell { nonce: view.nonce, index: 3 }.to_id())
                .unwrap_err(),
            ProtocolError::NoSession
        );

        let reply = store
            .handle(2, &SessionControl::Flag { nonce: view.nonce }.to_id())
            .unwrap();
        let SessionReply::Followup(followup) = reply else {
            panic!("expected followup reply");
        };
        assert!(followup.buttons.iter().all(|button| button.disabled));
    }

    #[test]
    fn leave_ends_the_session() {
        let mut store = SessionStore::new();
        let view = store.start(1, GameConfig::new(3).unwrap(), 4).unwrap();

        store
            .handle(1, &SessionControl::Leave { nonce: view.nonce }.to_id())
            .unwrap();

        assert!(store.is_empty());
        assert!(store.snapshot(1).is_none());
    }

    #[test]
    fn snapshot_restores_into_a_fresh_store() {
        let mut store = SessionStore::new();
        let view = store.restore(&diagonal(1)).unwrap();
        store
            .handle(1, &SessionControl::Cell { nonce: view.nonce, index: 2 }.to_id())
            .unwrap();
        let snapshot = store.snapshot(1).unwrap();

        let mut fresh = SessionStore::new();
        fresh.restore(&snapshot).unwrap();
        assert_eq!(fresh.snapshot(1), Some(snapshot));
    }
}
