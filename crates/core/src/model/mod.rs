mod card;
mod deck;
mod ids;
mod progress;

pub use ids::{CardId, DeckId, ParseIdError};

pub use card::{Card, CardError, Highlight};
pub use deck::{Deck, DeckError};
pub use progress::{CardStatus, ProgressBoard, ProgressRecord, ProgressStats};
