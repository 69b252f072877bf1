//! Fixed-layout binary form of a [`Game`], the only place a game lives between actions.
//!
//! Layout (big-endian):
//!
//! | offset | width   | field             |
//! |-------:|--------:|-------------------|
//! | 0      | 1       | format version    |
//! | 1      | 8       | owner             |
//! | 9      | 1       | outcome tag       |
//! | 10     | 1       | flag mode         |
//! | 11     | 1       | size              |
//! | 12     | 4       | flagged bitset    |
//! | 16     | 4       | revealed bitset   |
//! | 20     | size²   | cell values       |

use alloc::vec::Vec;
use bytes::{Buf, BufMut};

use crate::*;

pub const FORMAT_VERSION: u8 = 1;

/// Bytes preceding the cell values.
pub const HEADER_LEN: usize = 20;

pub const MAX_ENCODED_LEN: usize = HEADER_LEN + cell_count(MAX_SIZE);

const fn outcome_tag(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Playing => 0,
        Outcome::Won => 1,
        Outcome::Lost => 2,
    }
}

const fn outcome_from_tag(tag: u8) -> Option<Outcome> {
    match tag {
        0 => Some(Outcome::Playing),
        1 => Some(Outcome::Won),
        2 => Some(Outcome::Lost),
        _ => None,
    }
}

pub fn encoded_len(game: &Game) -> usize {
    HEADER_LEN + game.board().total_cells()
}

pub fn write(game: &Game, writer: &mut impl BufMut) {
    writer.put_u8(FORMAT_VERSION);
    writer.put_u64(game.owner());
    writer.put_u8(outcome_tag(game.outcome()));
    writer.put_u8(game.flag_mode().into());
    writer.put_u8(game.size());
    writer.put_u32(game.flagged().bits());
    writer.put_u32(game.revealed().bits());
    for value in game.board().values() {
        writer.put_u8(value);
    }
}

pub fn encode(game: &Game) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(game));
    write(game, &mut buf);
    buf
}

/// Decodes a complete buffer. Nothing is trusted until every field has been checked.
pub fn decode(mut data: &[u8]) -> Result<Game> {
    if data.remaining() < HEADER_LEN {
        return Err(GameError::Malformed("shorter than header"));
    }

    if data.get_u8() != FORMAT_VERSION {
        return Err(GameError::Malformed("unknown format version"));
    }
    let owner = data.get_u64();
    let outcome =
        outcome_from_tag(data.get_u8()).ok_or(GameError::Malformed("unknown outcome tag"))?;
    let flag_mode = match data.get_u8() {
        0 => false,
        1 => true,
        _ => return Err(GameError::Malformed("flag mode is not a boolean")),
    };
    let config = GameConfig::new(data.get_u8())
        .map_err(|_| GameError::Malformed("board size out of range"))?;
    let flagged = CellSet::from_bits(data.get_u32());
    let revealed = CellSet::from_bits(data.get_u32());

    if data.remaining() != config.total_cells() {
        return Err(GameError::Malformed("cell count does not match board size"));
    }
    let board = Board::from_cells(config, data)?;

    Game::from_parts(owner, board, revealed, flagged, flag_mode, outcome)
}

impl Game {
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn diagonal() -> Game {
        let config = GameConfig::new(5).unwrap();
        let board = Board::from_mine_indices(config, &[0, 6, 12, 18, 24]).unwrap();
        Game::new(42, board, Some(4)).unwrap()
    }

    #[test]
    fn header_layout() {
        let mut game = diagonal();
        game.set_flag_mode(true).unwrap();
        game.click(3).unwrap();

        let data = game.encode();

        assert_eq!(data.len(), MAX_ENCODED_LEN);
        assert_eq!(data[0], FORMAT_VERSION);
        assert_eq!(&data[1..9], &42u64.to_be_bytes());
        assert_eq!(data[9], 0);
        assert_eq!(data[10], 1);
        assert_eq!(data[11], 5);
        assert_eq!(&data[12..16], &(1u32 << 3).to_be_bytes());
        assert_eq!(&data[16..20], &(1u32 << 4).to_be_bytes());
        assert_eq!(data[20], MINE);
        assert_eq!(data[21], 2);
    }

    #[test]
    fn decode_reproduces_flag_and_reveal_membership() {
        let config = GameConfig::new(5).unwrap();
        let board = Board::from_mine_indices(config, &[0, 6, 12, 18, 24]).unwrap();
        let revealed: CellSet = [7].into_iter().collect();
        let flagged: CellSet = [3].into_iter().collect();
        let game = Game::from_parts(42, board, revealed, flagged, true, Outcome::Playing).unwrap();

        let decoded = decode(&game.encode()).unwrap();

        assert_eq!(decoded, game);
        assert_eq!(decoded.owner(), 42);
        assert!(decoded.flag_mode());
        assert_eq!(decoded.flagged().iter().collect::<Vec<_>>(), [3]);
        assert_eq!(decoded.revealed().iter().collect::<Vec<_>>(), [7]);
    }

    #[test]
    fn finished_games_keep_their_outcome() {
        let mut game = diagonal();
        game.click(12).unwrap();

        let decoded = decode(&game.encode()).unwrap();
        assert_eq!(decoded.outcome(), Outcome::Lost);
        assert_eq!(decoded, game);
    }

    #[test]
    fn rejects_short_buffers() {
        let data = diagonal().encode();
        assert_eq!(
            decode(&data[..HEADER_LEN - 1]),
            Err(GameError::Malformed("shorter than header"))
        );
        assert_eq!(
            decode(&data[..data.len() - 1]),
            Err(GameError::Malformed("cell count does not match board size"))
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut data = diagonal().encode();
        data.push(0);
        assert_eq!(
            decode(&data),
            Err(GameError::Malformed("cell count does not match board size"))
        );
    }

    #[test]
    fn rejects_corrupt_header_fields() {
        let data = diagonal().encode();

        let mut bad = data.clone();
        bad[0] = 0;
        assert_eq!(decode(&bad), Err(GameError::Malformed("unknown format version")));

        let mut bad = data.clone();
        bad[9] = 3;
        assert_eq!(decode(&bad), Err(GameError::Malformed("unknown outcome tag")));

        let mut bad = data.clone();
        bad[10] = 2;
        assert_eq!(decode(&bad), Err(GameError::Malformed("flag mode is not a boolean")));

        let mut bad = data.clone();
        bad[11] = 6;
        assert_eq!(decode(&bad), Err(GameError::Malformed("board size out of range")));

        let mut bad = data;
        bad[12] = 0x80;
        assert_eq!(
            decode(&bad),
            Err(GameError::Malformed("bitset marks cells beyond the board"))
        );
    }

    #[test]
    fn rejects_tampered_cells() {
        let mut data = diagonal().encode();
        // move a mine without fixing the counts around it
        data[HEADER_LEN] = 0;
        data[HEADER_LEN + 1] = MINE;
        assert_eq!(
            decode(&data),
            Err(GameError::Malformed("adjacency counts disagree with mines"))
        );
    }

    #[test]
    fn rejects_playing_game_with_revealed_mine() {
        let mut data = diagonal().encode();
        data[16..20].copy_from_slice(&1u32.to_be_bytes());
        assert_eq!(
            decode(&data),
            Err(GameError::Malformed("outcome contradicts revealed cells"))
        );
    }

    #[test]
    fn smallest_board_round_trips() {
        let config = GameConfig::new(1).unwrap();
        let board = Board::from_mine_indices(config, &[0]).unwrap();
        let game = Game::new(u64::MAX, board, None).unwrap();

        let data = game.encode();
        assert_eq!(data.len(), HEADER_LEN + 1);
        assert_eq!(decode(&data), Ok(game));
        assert_eq!(decode(&vec![0u8; 3]), Err(GameError::Malformed("shorter than header")));
    }
}
