use bytes::{Buf, BufMut};
use sweeptoken_core::{CellIndex, Game, GameError, MAX_ENCODED_LEN, Owner};

const CELL: u8 = 0;
const FLAG_TOGGLE: u8 = 1;
const LEAVE: u8 = 2;

/// Longest custom id a chat platform accepts on a button.
pub const CUSTOM_ID_LIMIT: usize = 100;

/// Longest token a cell button can carry: kind, index, and the game bytes, hex encoded.
///
/// Only cell tokens are bounded. A flag toggle token grows with the sealed credential
/// (`2 * (10 + NONCE_LEN + credential + 16)` characters) and usually exceeds
/// [`CUSTOM_ID_LIMIT`]; hosts with that limit keep it out of the custom id.
pub const MAX_CELL_TOKEN_LEN: usize = 2 * (2 + MAX_ENCODED_LEN);

/// Payload attached to a single interactive control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Control {
    /// A board cell; carries the whole encoded game.
    Cell { index: CellIndex, state: Vec<u8> },
    /// The flag mode switch posted next to the board, holding the sealed credential
    /// needed to edit the board message later.
    FlagToggle {
        owner: Owner,
        enabled: bool,
        credential: Vec<u8>,
    },
    Leave { owner: Owner },
}

impl Control {
    pub fn cell(game: &Game, index: CellIndex) -> Self {
        Self::Cell {
            index,
            state: game.encode(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Cell { .. } => "cell",
            Self::FlagToggle { .. } => "flag toggle",
            Self::Leave { .. } => "leave",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Cell { index, state } => {
                buf.put_u8(CELL);
                buf.put_u8(*index);
                buf.put_slice(state);
            }
            Self::FlagToggle {
                owner,
                enabled,
                credential,
            } => {
                buf.put_u8(FLAG_TOGGLE);
                buf.put_u8((*enabled).into());
                buf.put_u64(*owner);
                buf.put_slice(credential);
            }
            Self::Leave { owner } => {
                buf.put_u8(LEAVE);
                buf.put_u8(0);
                buf.put_u64(*owner);
            }
        }
        buf
    }

    pub fn from_bytes(mut data: &[u8]) -> Result<Self, GameError> {
        if data.remaining() < 2 {
            return Err(GameError::Malformed("control shorter than its header"));
        }

        let kind = data.get_u8();
        let current = data.get_u8();
        match kind {
            CELL => {
                if data.is_empty() {
                    return Err(GameError::Malformed("cell control without game state"));
                }
                Ok(Self::Cell {
                    index: current,
                    state: data.to_vec(),
                })
            }
            FLAG_TOGGLE => {
                let enabled = match current {
                    0 => false,
                    1 => true,
                    _ => return Err(GameError::Malformed("flag toggle state is not a boolean")),
                };
                if data.remaining() < 8 {
                    return Err(GameError::Malformed("flag toggle without owner"));
                }
                let owner = data.get_u64();
                Ok(Self::FlagToggle {
                    owner,
                    enabled,
                    credential: data.to_vec(),
                })
            }
            LEAVE => {
                if data.remaining() != 8 {
                    return Err(GameError::Malformed("leave control has wrong length"));
                }
                Ok(Self::Leave {
                    owner: data.get_u64(),
                })
            }
            _ => Err(GameError::Malformed("unknown control kind")),
        }
    }

    /// Printable form carried by the platform.
    pub fn to_token(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_token(token: &str) -> Result<Self, GameError> {
        let data = hex::decode(token).map_err(|_| GameError::Malformed("token is not hex"))?;
        Self::from_bytes(&data)
    }
}
