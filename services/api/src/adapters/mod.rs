pub mod cards_llm;
pub mod db;
pub mod llm;

pub use cards_llm::OpenAiCardsAdapter;
pub use db::DbAdapter;
pub use llm::build_card_generator;
