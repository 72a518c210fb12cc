//! Per-player token deck

use serde::{Deserialize, Serialize};

use crate::army::Army;
use crate::coords::CACHE_SIZE;
use crate::token::Token;

/// Source of uniform floats in `[0, 1)`, seeded identically for every replica
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: rand::RngCore> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        rand::Rng::gen::<f64>(self)
    }
}

/// Remaining tokens of one player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Identifier of the army
    pub army: String,
    /// Headquarters tokens, drawn from the back
    hq_tokens: Vec<Token>,
    /// Playable tokens, drawn at random
    tokens: Vec<Token>,
}

impl Deck {
    /// Build a fresh deck holding every token of the army
    ///
    /// Headquarters tokens get `hq_health` on their own copy and are capped at
    /// the cache size.
    pub fn new(army: &Army, hq_health: u32) -> Self {
        let mut hq_tokens = Vec::new();
        let mut tokens = Vec::new();

        for entry in &army.entries {
            for _ in 0..entry.count {
                let mut token = entry.token.clone();
                if token.hq {
                    token.health = hq_health.max(1);
                    if hq_tokens.len() < CACHE_SIZE {
                        hq_tokens.push(token);
                    }
                } else {
                    tokens.push(token);
                }
            }
        }

        Self {
            army: army.id.clone(),
            hq_tokens,
            tokens,
        }
    }

    /// Check whether every headquarters token has been drawn
    pub fn all_hqs_drawn(&self) -> bool {
        self.hq_tokens.is_empty()
    }

    /// Draw the next headquarters token
    pub fn draw_hq(&mut self) -> Option<Token> {
        self.hq_tokens.pop()
    }

    /// Draw a playable token uniformly at random
    pub fn draw(&mut self, random: &mut dyn RandomSource) -> Option<Token> {
        let len = self.tokens.len();
        if len == 0 {
            return None;
        }

        let idx = loop {
            let idx = (random.next_f64() * len as f64).floor() as usize;
            if idx < len {
                break idx;
            }
        };

        Some(self.tokens.swap_remove(idx))
    }

    /// Playable tokens left
    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }

    /// Headquarters tokens left
    pub fn remaining_hqs(&self) -> usize {
        self.hq_tokens.len()
    }
}
