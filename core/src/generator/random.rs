use alloc::vec::Vec;

use super::*;

/// Places exactly `size` mines uniformly at random and picks a random zero cell to start
/// from. The same seed always yields the same board.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: GameConfig) -> GeneratedBoard {
        use rand::prelude::*;

        let total_cells = config.total_cells() as CellIndex;
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let mut mines = CellSet::new();
        while mines.len() < config.mines() {
            mines.insert(rng.random_range(0..total_cells));
        }
        let board = Board::with_mines(config, mines);

        let zeros: Vec<CellIndex> = board
            .indices()
            .filter(|&index| board.value_at(index) == 0)
            .collect();
        let start = zeros.choose(&mut rng).copied();
        if start.is_none() {
            log::warn!(
                "No zero cell on a size {} board, starting with nothing revealed",
                config.size
            );
        }

        GeneratedBoard { board, start }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_one_mine_per_side_and_counts_neighbors() {
        for size in 1..=MAX_SIZE {
            let config = GameConfig::new(size).unwrap();
            for seed in 0..200 {
                let GeneratedBoard { board, start } =
                    RandomBoardGenerator::new(seed).generate(config);

                assert_eq!(board.mine_count(), usize::from(size));
                for index in board.indices().filter(|&index| !board.is_mine(index)) {
                    assert_eq!(board.value_at(index), board.adjacent_mine_count(index));
                }
                if let Some(start) = start {
                    assert_eq!(board.value_at(start), 0);
                }
            }
        }
    }

    #[test]
    fn start_exists_whenever_a_zero_exists() {
        let config = GameConfig::new(5).unwrap();
        for seed in 0..200 {
            let GeneratedBoard { board, start } = RandomBoardGenerator::new(seed).generate(config);
            let has_zero = board.values().any(|value| value == 0);
            assert_eq!(start.is_some(), has_zero);
        }
    }

    #[test]
    fn same_seed_same_board() {
        let config = GameConfig::new(4).unwrap();
        let a = RandomBoardGenerator::new(0x5eed).generate(config);
        let b = RandomBoardGenerator::new(0x5eed).generate(config);
        assert_eq!(a, b);
    }

    #[test]
    fn generated_game_starts_playing() {
        let config = GameConfig::new(5).unwrap();
        let game = Game::generate(123, config, RandomBoardGenerator::new(9));

        assert_eq!(game.owner(), 123);
        assert_eq!(game.outcome(), Outcome::Playing);
        assert!(!game.flag_mode());
        assert!(game.flagged().is_empty());
        assert!(game.revealed().len() <= 1);
    }
}
