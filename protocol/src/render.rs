use serde::{Deserialize, Serialize};
use sweeptoken_core::{CellIndex, CellView, Game, Outcome};

pub const BOMB: &str = "💣";
pub const FLAG: &str = "🚩";

/// Zero-width space; platforms refuse buttons with empty labels.
pub const BLANK: &str = "\u{200b}";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub style: ButtonStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub token: String,
    pub disabled: bool,
}

/// The board as one row of buttons per board row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMessage {
    pub content: String,
    pub rows: Vec<Vec<Button>>,
}

impl BoardMessage {
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// The controls posted under the board: the flag mode switch and the leave button.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupMessage {
    pub content: String,
    pub buttons: Vec<Button>,
}

pub fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Playing => "Playing",
        Outcome::Won => "Won",
        Outcome::Lost => "Lost",
    }
}

pub fn status_content(game: &Game) -> String {
    format!("State: {}", outcome_label(game.outcome()))
}

pub fn cell_button(view: CellView, token: String, disabled: bool) -> Button {
    let (label, style, emoji) = match view {
        CellView::Hidden => (BLANK.to_string(), ButtonStyle::Secondary, None),
        CellView::Flagged => (String::new(), ButtonStyle::Success, Some(FLAG)),
        CellView::Revealed(count) => (count.to_string(), ButtonStyle::Primary, None),
        CellView::Mine => (String::new(), ButtonStyle::Danger, Some(BOMB)),
    };

    Button {
        label,
        style,
        emoji: emoji.map(str::to_string),
        token,
        disabled,
    }
}

/// Renders every cell, asking `token_for` for the payload of each button. Cells are
/// disabled once the game is over.
pub fn render_board(
    game: &Game,
    content: String,
    mut token_for: impl FnMut(CellIndex) -> String,
) -> BoardMessage {
    let disabled = game.is_finished();
    let buttons: Vec<Button> = game
        .board()
        .indices()
        .zip(game.views())
        .map(|(index, view)| cell_button(view, token_for(index), disabled))
        .collect();

    BoardMessage {
        content,
        rows: buttons
            .chunks(usize::from(game.size()))
            .map(<[Button]>::to_vec)
            .collect(),
    }
}

pub fn flag_button(enabled: bool, token: String, disabled: bool) -> Button {
    Button {
        label: if enabled { "On" } else { "Off" }.to_string(),
        style: if enabled {
            ButtonStyle::Success
        } else {
            ButtonStyle::Danger
        },
        emoji: Some(FLAG.to_string()),
        token,
        disabled,
    }
}

pub fn leave_button(token: String, disabled: bool) -> Button {
    Button {
        label: "Leave".to_string(),
        style: ButtonStyle::Danger,
        emoji: None,
        token,
        disabled,
    }
}
