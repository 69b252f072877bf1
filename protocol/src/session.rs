use sweeptoken_core::{
    Action, CellIndex, ClickOutcome, Game, GameConfig, GameError, Outcome, Owner,
    RandomBoardGenerator,
};

use crate::*;

/// Applies one action to an encoded game on behalf of `actor`, returning the new bytes.
/// The owner is checked before anything else, so a stranger learns nothing about the board.
pub fn apply_action(actor: Owner, state: &[u8], action: Action) -> Result<(Vec<u8>, Outcome)> {
    let game = Game::decode(state)?;
    let (next, _) = game.apply(actor, action)?;
    Ok((next.encode(), next.outcome()))
}

/// Messages posted when a game starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Started {
    pub state: Vec<u8>,
    pub board: BoardMessage,
    /// Only present when a cipher and a credential were available to seal.
    pub followup: Option<FollowupMessage>,
}

/// Result of a cell click, ready to replace the board message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub state: Vec<u8>,
    pub outcome: Outcome,
    pub click: ClickOutcome,
    pub board: BoardMessage,
}

/// Result of flipping flag mode from the followup message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagToggled {
    pub enabled: bool,
    /// Opened credential the host uses to edit the board message.
    pub credential: String,
    /// Replacement board, absent when the game is already over and must stay untouched.
    pub board: Option<BoardMessage>,
    pub followup: FollowupMessage,
}

/// Runs games whose entire state travels inside the control tokens.
#[derive(Debug, Default)]
pub struct TokenSession {
    cipher: Option<TokenCipher>,
}

impl TokenSession {
    pub fn new(cipher: Option<TokenCipher>) -> Self {
        Self { cipher }
    }

    pub fn start(
        &self,
        owner: Owner,
        config: GameConfig,
        seed: u64,
        credential: Option<&str>,
    ) -> Result<Started> {
        let game = Game::generate(owner, config, RandomBoardGenerator::new(seed));
        log::debug!("Started size {} game for {}", config.size, owner);

        let followup = match (&self.cipher, credential) {
            (Some(cipher), Some(credential)) => {
                let sealed = cipher.seal(credential)?;
                let message = followup(owner, false, sealed, false);
                let flag_len = message.buttons[0].token.len();
                if flag_len > CUSTOM_ID_LIMIT {
                    log::warn!(
                        "Flag toggle token is {} characters, over the {} character custom id limit",
                        flag_len,
                        CUSTOM_ID_LIMIT
                    );
                }
                Some(message)
            }
            _ => None,
        };

        Ok(Started {
            state: game.encode(),
            board: board_message(&game),
            followup,
        })
    }

    pub fn click(&self, actor: Owner, token: &str) -> Result<Outbound> {
        let (index, game) = decode_cell(token)?;
        authorize(&game, actor)?;

        let (game, click) = game.apply(actor, Action::Click(index))?;
        log::debug!("Click {} by {} -> {:?}", index, actor, click);

        Ok(Outbound {
            state: game.encode(),
            outcome: game.outcome(),
            click,
            board: board_message(&game),
        })
    }

    /// Flips flag mode. `board_token` is any cell token from the board message the switch
    /// belongs to; every cell of that message is re-rendered with the new mode.
    pub fn toggle_flag(
        &self,
        actor: Owner,
        flag_token: &str,
        board_token: &str,
    ) -> Result<FlagToggled> {
        let Control::FlagToggle {
            owner,
            enabled,
            credential,
        } = Control::from_token(flag_token)?
        else {
            return Err(ProtocolError::UnexpectedControl {
                expected: "flag toggle",
            });
        };
        if owner != actor {
            log::debug!("Flag toggle by {} on a game owned by {}", actor, owner);
            return Err(GameError::Unauthorized.into());
        }

        let cipher = self.cipher.as_ref().ok_or(ProtocolError::CipherUnavailable)?;
        let opened = cipher.open(&credential)?;
        let enabled = !enabled;

        let (_, mut game) = decode_cell(board_token)?;
        authorize(&game, actor)?;
        let finished = game.is_finished();
        let board = if finished {
            None
        } else {
            game.set_flag_mode(enabled)?;
            Some(board_message(&game))
        };

        Ok(FlagToggled {
            enabled,
            credential: opened,
            board,
            followup: followup(owner, enabled, credential, finished),
        })
    }

    /// Retires the followup controls; the board message itself is left as is.
    pub fn leave(&self, actor: Owner, token: &str) -> Result<FollowupMessage> {
        let Control::Leave { owner } = Control::from_token(token)? else {
            return Err(ProtocolError::UnexpectedControl { expected: "leave" });
        };
        if owner != actor {
            return Err(GameError::Unauthorized.into());
        }

        Ok(FollowupMessage {
            content: "You have left the game.".to_string(),
            buttons: vec![
                flag_button(false, String::new(), true),
                leave_button(Control::Leave { owner }.to_token(), true),
            ],
        })
    }
}

fn decode_cell(token: &str) -> Result<(CellIndex, Game)> {
    match Control::from_token(token)? {
        Control::Cell { index, state } => Ok((index, Game::decode(&state)?)),
        other => {
            log::debug!("Got a {} control where a cell was expected", other.kind_name());
            Err(ProtocolError::UnexpectedControl { expected: "cell" })
        }
    }
}

fn authorize(game: &Game, actor: Owner) -> Result<()> {
    game.authorize(actor).map_err(|err| {
        log::debug!("Rejected {} acting on a game owned by {}", actor, game.owner());
        err.into()
    })
}

pub fn board_message(game: &Game) -> BoardMessage {
    let state = game.encode();
    render_board(game, status_content(game), |index| {
        Control::Cell {
            index,
            state: state.clone(),
        }
        .to_token()
    })
}

fn followup(owner: Owner, enabled: bool, credential: Vec<u8>, disabled: bool) -> FollowupMessage {
    FollowupMessage {
        content: BLANK.to_string(),
        buttons: vec![
            flag_button(
                enabled,
                Control::FlagToggle {
                    owner,
                    enabled,
                    credential,
                }
                .to_token(),
                disabled,
            ),
            leave_button(Control::Leave { owner }.to_token(), disabled),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeptoken_core::{Board, CellView};

    const SECRET: &[u8] = b"an operator secret that is long enough";

    fn session() -> TokenSession {
        TokenSession::new(Some(TokenCipher::new(SECRET).unwrap()))
    }

    fn diagonal() -> Game {
        let config = GameConfig::new(5).unwrap();
        let board = Board::from_mine_indices(config, &[0, 6, 12, 18, 24]).unwrap();
        Game::new(42, board, Some(4)).unwrap()
    }

    fn token_at(board: &BoardMessage, index: usize) -> String {
        board.buttons().nth(index).unwrap().token.clone()
    }

    #[test]
    fn start_posts_board_and_followup() {
        let started = session()
            .start(42, GameConfig::default(), 3, Some("credential"))
            .unwrap();

        assert_eq!(started.board.rows.len(), 5);
        assert_eq!(started.board.content, "State: Playing");
        assert!(started.board.buttons().all(|button| button.token.len() <= CUSTOM_ID_LIMIT));
        let followup = started.followup.unwrap();
        assert_eq!(followup.buttons[0].label, "Off");
        assert_eq!(Game::decode(&started.state).unwrap().owner(), 42);
    }

    #[test]
    fn start_without_cipher_has_no_followup() {
        let started = TokenSession::default()
            .start(42, GameConfig::default(), 3, Some("credential"))
            .unwrap();
        assert!(started.followup.is_none());
    }

    #[test]
    fn click_round_trips_through_tokens() {
        let board = board_message(&diagonal());

        let outbound = session().click(42, &token_at(&board, 12)).unwrap();

        assert_eq!(outbound.click, ClickOutcome::HitMine);
        assert_eq!(outbound.outcome, Outcome::Lost);
        assert!(outbound.board.buttons().all(|button| button.disabled));
        let game = Game::decode(&outbound.state).unwrap();
        assert_eq!(game.cell_view(12), Ok(CellView::Mine));
    }

    #[test]
    fn strangers_are_refused_without_board() {
        let board = board_message(&diagonal());

        let err = session().click(7, &token_at(&board, 3)).unwrap_err();

        assert_eq!(err, ProtocolError::Game(GameError::Unauthorized));
        assert!(err.is_silent());
    }

    #[test]
    fn finished_game_click_is_a_silent_caller_error() {
        let lost = session().click(42, &token_at(&board_message(&diagonal()), 0)).unwrap();

        let err = session().click(42, &token_at(&lost.board, 1)).unwrap_err();
        assert_eq!(err, ProtocolError::Game(GameError::InvalidState));
        assert!(err.is_silent());
    }

    #[test]
    fn toggle_flag_rewrites_every_cell_token() {
        let session = session();
        let started = session.start(42, GameConfig::default(), 11, Some("credential")).unwrap();
        let flag_token = started.followup.unwrap().buttons[0].token.clone();

        let toggled = session
            .toggle_flag(42, &flag_token, &token_at(&started.board, 0))
            .unwrap();

        assert!(toggled.enabled);
        assert_eq!(toggled.credential, "credential");
        assert_eq!(toggled.followup.buttons[0].label, "On");
        for button in toggled.board.unwrap().buttons() {
            let Control::Cell { state, .. } = Control::from_token(&button.token).unwrap() else {
                panic!("expected cell control");
            };
            assert!(Game::decode(&state).unwrap().flag_mode());
        }

        let again = session
            .toggle_flag(42, &toggled.followup.buttons[0].token, &token_at(&started.board, 0))
            .unwrap();
        assert!(!again.enabled);
    }

    #[test]
    fn toggle_flag_leaves_finished_board_alone() {
        let session = session();
        let mut game = diagonal();
        game.click(0).unwrap();
        let sealed = TokenCipher::new(SECRET).unwrap().seal("credential").unwrap();
        let flag_token = followup(42, false, sealed, false).buttons[0].token.clone();

        let toggled = session
            .toggle_flag(42, &flag_token, &token_at(&board_message(&game), 0))
            .unwrap();
        assert!(toggled.board.is_none());
        assert!(toggled.followup.buttons.iter().all(|button| button.disabled));
    }

    #[test]
    fn toggle_flag_checks_owner_and_control_kind() {
        let session = session();
        let started = session.start(42, GameConfig::default(), 5, Some("credential")).unwrap();
        let flag_token = started.followup.unwrap().buttons[0].token.clone();
        let cell_token = token_at(&started.board, 0);

        assert_eq!(
            session.toggle_flag(7, &flag_token, &cell_token).unwrap_err(),
            ProtocolError::Game(GameError::Unauthorized)
        );
        assert_eq!(
            session.toggle_flag(42, &cell_token, &cell_token).unwrap_err(),
            ProtocolError::UnexpectedControl {
                expected: "flag toggle"
            }
        );
        assert_eq!(
            TokenSession::default()
                .toggle_flag(42, &flag_token, &cell_token)
                .unwrap_err(),
            ProtocolError::CipherUnavailable
        );
    }

    #[test]
    fn leave_disables_followup() {
        let token = Control::Leave { owner: 42 }.to_token();
        let message = session().leave(42, &token).unwrap();
        assert!(message.buttons.iter().all(|button| button.disabled));
        assert_eq!(
            session().leave(1, &token).unwrap_err(),
            ProtocolError::Game(GameError::Unauthorized)
        );
    }

    #[test]
    fn apply_action_matches_engine() {
        let state = diagonal().encode();

        let (next, outcome) = apply_action(42, &state, Action::Click(12)).unwrap();
        assert_eq!(outcome, Outcome::Lost);
        assert_eq!(Game::decode(&next).unwrap().outcome(), Outcome::Lost);

        assert_eq!(
            apply_action(42, &state[..10], Action::ToggleFlagMode),
            Err(ProtocolError::Game(GameError::Malformed("shorter than header")))
        );
        assert_eq!(
            apply_action(1, &state, Action::Click(12)),
            Err(ProtocolError::Game(GameError::Unauthorized))
        );
    }
}
