use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

impl Outcome {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::Playing
    }
}

/// A single inbound player action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Click(CellIndex),
    ToggleFlagMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Game {
    owner: Owner,
    board: Board,
    revealed: CellSet,
    flagged: CellSet,
    flag_mode: bool,
    outcome: Outcome,
}

impl Game {
    /// Starts a game on `board`, showing `start` if given. The start must be a zero cell,
    /// as [`RandomBoardGenerator`] picks it.
    pub fn new(owner: Owner, board: Board, start: Option<CellIndex>) -> Result<Self> {
        let mut revealed = CellSet::new();
        if let Some(start) = start {
            let start = board.validate_index(start)?;
            if board.value_at(start) != 0 {
                return Err(GameError::InvalidStart);
            }
            revealed.insert(start);
        }

        Ok(Self {
            owner,
            board,
            revealed,
            flagged: CellSet::new(),
            flag_mode: false,
            outcome: Outcome::Playing,
        })
    }

    pub fn generate(owner: Owner, config: GameConfig, generator: impl BoardGenerator) -> Self {
        let GeneratedBoard { board, start } = generator.generate(config);
        let mut revealed = CellSet::new();
        if let Some(start) = start {
            revealed.insert(start);
        }

        Self {
            owner,
            board,
            revealed,
            flagged: CellSet::new(),
            flag_mode: false,
            outcome: Outcome::Playing,
        }
    }

    /// Reassembles a game from stored fields, rejecting combinations no sequence of
    /// moves could have produced.
    pub fn from_parts(
        owner: Owner,
        board: Board,
        revealed: CellSet,
        flagged: CellSet,
        flag_mode: bool,
        outcome: Outcome,
    ) -> Result<Self> {
        let total = board.total_cells();
        if !revealed.is_within(total) || !flagged.is_within(total) {
            return Err(GameError::Malformed("bitset marks cells beyond the board"));
        }

        let game = Self {
            owner,
            board,
            revealed,
            flagged,
            flag_mode,
            outcome,
        };

        let consistent = match outcome {
            Outcome::Lost => game.mine_revealed(),
            Outcome::Won => !game.mine_revealed() && game.all_safe_revealed(),
            Outcome::Playing => !game.mine_revealed(),
        };
        if !consistent {
            return Err(GameError::Malformed("outcome contradicts revealed cells"));
        }

        Ok(game)
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn size(&self) -> Coord {
        self.board.size()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn revealed(&self) -> CellSet {
        self.revealed
    }

    pub fn flagged(&self) -> CellSet {
        self.flagged
    }

    pub fn flag_mode(&self) -> bool {
        self.flag_mode
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_finished()
    }

    pub fn is_revealed(&self, index: CellIndex) -> bool {
        self.revealed.contains(index)
    }

    pub fn is_flagged(&self, index: CellIndex) -> bool {
        self.flagged.contains(index)
    }

    pub fn authorize(&self, actor: Owner) -> Result<()> {
        if actor == self.owner {
            Ok(())
        } else {
            Err(GameError::Unauthorized)
        }
    }

    /// Revealed takes precedence over flagged.
    pub fn cell_view(&self, index: CellIndex) -> Result<CellView> {
        let index = self.board.validate_index(index)?;
        Ok(if self.revealed.contains(index) {
            if self.board.is_mine(index) {
                CellView::Mine
            } else {
                CellView::Revealed(self.board.value_at(index))
            }
        } else if self.flagged.contains(index) {
            CellView::Flagged
        } else {
            CellView::Hidden
        })
    }

    /// Views of every cell in index order.
    pub fn views(&self) -> impl Iterator<Item = CellView> + '_ {
        self.board
            .indices()
            .map(|index| self.cell_view(index).unwrap_or_default())
    }

    /// Flips flag mode, returning the new mode.
    pub fn toggle_flag_mode(&mut self) -> Result<bool> {
        self.check_playing()?;
        self.flag_mode = !self.flag_mode;
        Ok(self.flag_mode)
    }

    pub fn set_flag_mode(&mut self, enabled: bool) -> Result<()> {
        self.check_playing()?;
        self.flag_mode = enabled;
        Ok(())
    }

    /// Clicks a cell: flags or unflags it in flag mode, reveals it otherwise, and chords
    /// when it is already revealed. Chording opens only the immediate ring of neighbors.
    pub fn click(&mut self, index: CellIndex) -> Result<ClickOutcome> {
        use ClickOutcome::*;

        self.check_playing()?;
        let index = self.board.validate_index(index)?;

        if self.revealed.contains(index) {
            if self.flag_mode {
                return Ok(NoChange);
            }

            let mut updated = false;
            for pos in self.board.iter_neighbors(index) {
                if !self.revealed.contains(pos) && !self.flagged.contains(pos) {
                    self.revealed.insert(pos);
                    updated = true;
                }
            }
            return Ok(self.settle(updated));
        }

        if self.flag_mode {
            self.flagged.toggle(index);
            return Ok(FlagChanged);
        }

        if self.flagged.contains(index) {
            return Ok(NoChange);
        }

        self.revealed.insert(index);
        Ok(self.settle(true))
    }

    /// Applies `action` on behalf of `actor` to a copy of this game.
    pub fn apply(&self, actor: Owner, action: Action) -> Result<(Self, ClickOutcome)> {
        self.authorize(actor)?;

        let mut next = self.clone();
        let outcome = match action {
            Action::Click(index) => next.click(index)?,
            Action::ToggleFlagMode => {
                next.toggle_flag_mode()?;
                ClickOutcome::FlagChanged
            }
        };
        Ok((next, outcome))
    }

    fn settle(&mut self, updated: bool) -> ClickOutcome {
        self.outcome = if self.mine_revealed() {
            Outcome::Lost
        } else if self.all_safe_revealed() {
            Outcome::Won
        } else {
            Outcome::Playing
        };

        match self.outcome {
            Outcome::Lost => ClickOutcome::HitMine,
            Outcome::Won => ClickOutcome::Won,
            Outcome::Playing if updated => ClickOutcome::Revealed,
            Outcome::Playing => ClickOutcome::NoChange,
        }
    }

    fn mine_revealed(&self) -> bool {
        self.revealed.iter().any(|index| self.board.is_mine(index))
    }

    fn all_safe_revealed(&self) -> bool {
        self.board
            .indices()
            .all(|index| self.board.is_mine(index) || self.revealed.contains(index))
    }

    fn check_playing(&self) -> Result<()> {
        if self.outcome.is_finished() {
            Err(GameError::InvalidState)
        } else {
            Ok(())
        }
    }
}
