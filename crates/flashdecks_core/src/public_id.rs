//! crates/flashdecks_core/src/public_id.rs
//!
//! Generation of the short public identifiers that cards are addressed by
//! externally. IDs are drawn uniformly from a 62-symbol alphanumeric alphabet
//! using rejection sampling over random bytes, so every symbol is equally
//! likely regardless of the alphabet size.

use std::collections::HashSet;

use rand::RngCore;

/// The 62-symbol alphabet public IDs are drawn from.
pub const PUBLIC_ID_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of every card public ID.
pub const PUBLIC_ID_LENGTH: usize = 10;

/// The largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above this value are discarded and redrawn; mapping them through a modulo
/// would skew the distribution toward the low end of the alphabet.
fn rejection_threshold(alphabet_len: usize) -> usize {
    256 / alphabet_len * alphabet_len
}

/// Generates an ID of exactly `length` symbols from `rng`.
///
/// The caller chooses the randomness source; production code goes through
/// [`generate_public_id`], which uses a CSPRNG.
pub fn generate_id_with<R: RngCore>(rng: &mut R, length: usize) -> String {
    let alphabet = PUBLIC_ID_ALPHABET;
    let threshold = rejection_threshold(alphabet.len());

    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 32];
    while out.len() < length {
        rng.fill_bytes(&mut buf);
        for &byte in &buf {
            if (byte as usize) >= threshold {
                continue;
            }
            out.push(alphabet[byte as usize % alphabet.len()] as char);
            if out.len() == length {
                break;
            }
        }
    }
    out
}

/// Generates a fresh card public ID from a cryptographically secure RNG.
pub fn generate_public_id() -> String {
    generate_id_with(&mut rand::rng(), PUBLIC_ID_LENGTH)
}

/// Generates `count` public IDs that are pairwise distinct within the batch.
///
/// Distinctness against storage is still the database's job; this only rules
/// out collisions between candidates submitted in the same statement.
pub fn generate_distinct_public_ids(count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let id = generate_public_id();
        if seen.insert(id.clone()) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// An RNG that replays a fixed byte sequence, for driving the sampling
    /// loop through specific byte values.
    struct ScriptedRng {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl ScriptedRng {
        fn new(bytes: Vec<u8>) -> Self {
            Self { bytes, pos: 0 }
        }

        fn next_byte(&mut self) -> u8 {
            let b = self.bytes[self.pos % self.bytes.len()];
            self.pos += 1;
            b
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.fill_bytes(&mut buf);
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.fill_bytes(&mut buf);
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for slot in dest.iter_mut() {
                *slot = self.next_byte();
            }
        }
    }

    #[test]
    fn threshold_is_largest_multiple_of_alphabet_size() {
        assert_eq!(rejection_threshold(62), 248);
        // The relationship holds for other alphabet sizes too.
        assert_eq!(rejection_threshold(16), 256);
        assert_eq!(rejection_threshold(10), 250);
        assert_eq!(rejection_threshold(36), 252);
    }

    #[test]
    fn ids_have_exact_length_and_stay_in_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for length in [1, 2, 5, 10, 32, 100] {
            let id = generate_id_with(&mut rng, length);
            assert_eq!(id.chars().count(), length);
            assert!(id.bytes().all(|b| PUBLIC_ID_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn bytes_at_or_above_threshold_are_discarded() {
        // 248..=255 must all be rejected; 0 and 247 map to the first and
        // last alphabet symbols respectively.
        let mut script = vec![248, 249, 250, 251, 252, 253, 254, 255, 0, 247];
        // Pad so fill_bytes always has material to replay.
        script.extend([0u8; 64]);
        let mut rng = ScriptedRng::new(script);

        let id = generate_id_with(&mut rng, 2);
        assert_eq!(id.as_bytes()[0], PUBLIC_ID_ALPHABET[0]);
        assert_eq!(id.as_bytes()[1], PUBLIC_ID_ALPHABET[247 % 62]);
    }

    #[test]
    fn symbol_frequencies_are_unbiased() {
        // 62,000 symbols, expected count 1000 per symbol. A biased modulo
        // mapping would push the first 8 symbols to ~1333; the bounds below
        // are far wider than honest sampling noise (sigma is about 31).
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<char, usize> = HashMap::new();
        for _ in 0..6_200 {
            for c in generate_id_with(&mut rng, 10).chars() {
                *counts.entry(c).or_insert(0) += 1;
            }
        }

        assert_eq!(counts.len(), 62);
        for (symbol, count) in counts {
            assert!(
                (800..=1200).contains(&count),
                "symbol {symbol:?} appeared {count} times"
            );
        }
    }

    #[test]
    fn batch_candidates_are_pairwise_distinct() {
        for batch_size in [1, 2, 10, 50] {
            let ids = generate_distinct_public_ids(batch_size);
            assert_eq!(ids.len(), batch_size);
            let unique: HashSet<&String> = ids.iter().collect();
            assert_eq!(unique.len(), batch_size);
            for id in &ids {
                assert_eq!(id.len(), PUBLIC_ID_LENGTH);
            }
        }
    }

    #[test]
    fn empty_batch_yields_no_ids() {
        assert!(generate_distinct_public_ids(0).is_empty());
    }
}
