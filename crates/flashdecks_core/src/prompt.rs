//! crates/flashdecks_core/src/prompt.rs
//!
//! Builds the natural-language prompt for one card-generation call. The
//! prompt is a deterministic function of the request, with no side effects,
//! so the adapters that talk to a provider stay free of wording decisions.

use std::fmt::Write;

use crate::domain::GenerateCardsRequest;

/// Builds the full user prompt for a generation request.
///
/// The prompt states the requested count, deck title and target language,
/// includes the deck description when present, and lists existing cards
/// verbatim with an instruction to avoid duplicating them. It ends with fixed
/// formatting instructions demanding a bare JSON array of front/back objects.
pub fn build_prompt(request: &GenerateCardsRequest) -> String {
    let mut prompt = format!(
        "Generate {} high-quality flashcards for a deck titled \"{}\".",
        request.count, request.deck_title
    );

    if !request.deck_description.trim().is_empty() {
        let _ = write!(prompt, "\n\nDeck description: {}", request.deck_description);
    }

    let _ = write!(
        prompt,
        "\n\nLanguage: Generate all cards in {}.",
        request.language
    );

    if !request.existing_cards.is_empty() {
        let _ = write!(
            prompt,
            "\n\nThe deck already has {} cards. Here they are:\n",
            request.existing_cards.len()
        );
        for (index, card) in request.existing_cards.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "{}. Front: \"{}\" | Back: \"{}\"",
                index + 1,
                card.front,
                card.back
            );
        }
        prompt.push_str(
            "\nIMPORTANT: Generate NEW cards that are DIFFERENT from the existing ones. \
             Avoid duplicates and maintain consistency with the existing cards' style \
             and difficulty level.",
        );
    }

    let _ = write!(
        prompt,
        "\n\nInstructions:\n\
         1. Each card should have a \"front\" (question/term) and \"back\" (answer/definition)\n\
         2. Cards should be educational and appropriate for studying\n\
         3. Vary the difficulty and coverage of topics\n\
         4. Maintain consistency with the deck's theme\n\
         5. Ensure cards are clear, concise, and useful for learning\n\
         6. Generate exactly {} cards\n\
         \n\
         Return your response as a valid JSON array with this exact structure:\n\
         [\n\
         {{\n\
         \x20\x20\"front\": \"Question or term here\",\n\
         \x20\x20\"back\": \"Answer or definition here\"\n\
         }}\n\
         ]\n\
         \n\
         CRITICAL: Return ONLY the JSON array, no additional text, explanations, or markdown formatting.",
        request.count
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::ExistingCard;

    fn request() -> GenerateCardsRequest {
        GenerateCardsRequest {
            deck_title: "Spanish Vocabulary".to_string(),
            deck_description: String::new(),
            existing_cards: Vec::new(),
            count: 3,
            language: "es".to_string(),
        }
    }

    #[test]
    fn states_count_title_and_language() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Generate 3 high-quality flashcards"));
        assert!(prompt.contains("\"Spanish Vocabulary\""));
        assert!(prompt.contains("Generate all cards in es."));
        assert!(prompt.contains("ONLY the JSON array"));
    }

    #[test]
    fn description_appears_only_when_non_empty() {
        let without = build_prompt(&request());
        assert!(!without.contains("Deck description:"));

        let mut req = request();
        req.deck_description = "Common words for travel".to_string();
        let with = build_prompt(&req);
        assert!(with.contains("Deck description: Common words for travel"));
    }

    #[test]
    fn existing_cards_are_listed_verbatim_with_duplicate_warning() {
        let mut req = request();
        req.existing_cards = vec![ExistingCard {
            front: "Dog".to_string(),
            back: "Perro".to_string(),
        }];

        let prompt = build_prompt(&req);
        assert!(prompt.contains("Dog"));
        assert!(prompt.contains("Perro"));
        assert!(prompt.contains("3"));
        assert!(prompt.contains("Avoid duplicates"));
        assert!(prompt.contains("The deck already has 1 cards"));
    }

    #[test]
    fn is_deterministic_for_equal_input() {
        let mut req = request();
        req.existing_cards = vec![
            ExistingCard {
                front: "Cat".to_string(),
                back: "Gato".to_string(),
            },
            ExistingCard {
                front: "House".to_string(),
                back: "Casa".to_string(),
            },
        ];
        assert_eq!(build_prompt(&req), build_prompt(&req));
    }
}
