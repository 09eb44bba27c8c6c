use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{Config, TicketIdStrategy},
    domain::TicketId,
};

/// Letters, digits and a small symbol set. None of the symbols collide with
/// Telegram's command/handle markers at the start of a token.
pub const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789*#@$&";

/// Source of candidate ticket ids.
///
/// Generators only propose ids; the store rejects collisions and asks again,
/// so a generator never has to remember what it handed out.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> TicketId;
}

pub struct RandomIdGenerator {
    prefix: String,
    length: usize,
    alphabet: Vec<char>,
    rng: StdRng,
}

impl RandomIdGenerator {
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self::with_rng(prefix, length, StdRng::from_entropy())
    }

    pub fn with_rng(prefix: impl Into<String>, length: usize, rng: StdRng) -> Self {
        Self {
            prefix: prefix.into(),
            length: length.max(1),
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            rng,
        }
    }

    pub fn with_alphabet(mut self, alphabet: &str) -> Self {
        let chars: Vec<char> = alphabet.chars().collect();
        if !chars.is_empty() {
            self.alphabet = chars;
        }
        self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> TicketId {
        let token: String = (0..self.length)
            .map(|_| self.alphabet[self.rng.gen_range(0..self.alphabet.len())])
            .collect();
        TicketId(format!("{}{token}", self.prefix))
    }
}

pub struct CounterIdGenerator {
    prefix: String,
    width: usize,
    next: u64,
}

impl CounterIdGenerator {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
            next: 1,
        }
    }
}

impl IdGenerator for CounterIdGenerator {
    fn next_id(&mut self) -> TicketId {
        let n = self.next;
        self.next += 1;
        TicketId(format!("{}{:0width$}", self.prefix, n, width = self.width))
    }
}

/// Build the generator selected by configuration.
pub fn from_config(cfg: &Config) -> Box<dyn IdGenerator> {
    match cfg.ticket_id_strategy {
        TicketIdStrategy::Random => Box::new(RandomIdGenerator::new(
            cfg.ticket_id_prefix.clone(),
            cfg.ticket_id_length,
        )),
        TicketIdStrategy::Counter => Box::new(CounterIdGenerator::new(
            cfg.ticket_id_prefix.clone(),
            cfg.ticket_id_length,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_carry_prefix_and_length() {
        let mut g = RandomIdGenerator::with_rng("BV-", 8, StdRng::seed_from_u64(7));
        let id = g.next_id();
        let token = id.as_str().strip_prefix("BV-").unwrap();
        assert_eq!(token.chars().count(), 8);
        assert!(token.chars().all(|c| DEFAULT_ALPHABET.contains(c)));
    }

    #[test]
    fn counter_ids_are_monotonic_and_padded() {
        let mut g = CounterIdGenerator::new("T-", 4);
        assert_eq!(g.next_id().as_str(), "T-0001");
        assert_eq!(g.next_id().as_str(), "T-0002");
    }

    #[test]
    fn custom_alphabet_is_respected() {
        let mut g = RandomIdGenerator::with_rng("X", 5, StdRng::seed_from_u64(1)).with_alphabet("z");
        assert_eq!(g.next_id().as_str(), "Xzzzzz");
    }
}
