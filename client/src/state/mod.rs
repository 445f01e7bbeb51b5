pub mod game_record;
pub mod game_state;

pub use game_record::GameRecord;
pub use game_state::{GameState, NO_WINNER};
