//! Dice notation parsing and rolling.
//!
//! Supported grammar (case-insensitive; surrounding whitespace is trimmed and
//! spaces are allowed only before a keep/drop or `+`/`-` operator):
//!
//! ```text
//! [count]d<sides|f>[k|kh|kl|d|dh|dl<n>][+|-<modifier>]
//! ```
//!
//! `f` rolls fudge dice with faces -1, 0 and +1. `k`/`kh` keep the highest
//! `n` dice, `kl` keeps the lowest, `d`/`dl` drop the lowest and `dh` drops
//! the highest.

use rand::Rng;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Upper bound on dice in a single roll.
pub const MAX_DICE: u32 = 1000;

static NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)?d(\d+|f)(?:\s*(kh|kl|k|dh|dl|d)\s*(\d+))?(?:\s*([+-])\s*(\d+))?$")
        .expect("dice notation pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Bad roll format")]
    BadFormat,

    #[error("Count must be 1 or more")]
    CountTooSmall,

    #[error("Count must be 1000 or less")]
    CountTooLarge,

    #[error("Sides must be 1 or more")]
    SidesTooSmall,

    #[error("Cannot keep or drop more dice than rolled")]
    SelectionTooLarge,

    #[error("Invalid output, must be sum or full")]
    InvalidOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Die {
    Standard(u32),
    Fudge,
}

impl Die {
    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        match self {
            Die::Standard(sides) => i64::from(rng.gen_range(1..=*sides)),
            Die::Fudge => rng.gen_range(-1..=1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    KeepHighest(u32),
    KeepLowest(u32),
    DropHighest(u32),
    DropLowest(u32),
}

impl Selection {
    fn amount(&self) -> u32 {
        match self {
            Selection::KeepHighest(n)
            | Selection::KeepLowest(n)
            | Selection::DropHighest(n)
            | Selection::DropLowest(n) => *n,
        }
    }

    /// Number of dice to discard from the top and bottom of the sorted roll.
    fn discard(&self, count: usize) -> (usize, usize) {
        let n = (self.amount() as usize).min(count);
        match self {
            Selection::KeepHighest(_) => (0, count - n),
            Selection::KeepLowest(_) => (count - n, 0),
            Selection::DropHighest(_) => (n, 0),
            Selection::DropLowest(_) => (0, n),
        }
    }
}

/// A parsed dice expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub count: u32,
    pub die: Die,
    pub selection: Option<Selection>,
    pub modifier: i64,
}

impl FromStr for DiceRoll {
    type Err = DiceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase();

        let caps = NOTATION.captures(&normalized).ok_or(DiceError::BadFormat)?;

        let count = match caps.get(1) {
            Some(m) => m.as_str().parse::<u32>().map_err(|_| DiceError::BadFormat)?,
            None => 1,
        };
        if count == 0 {
            return Err(DiceError::CountTooSmall);
        }
        if count > MAX_DICE {
            return Err(DiceError::CountTooLarge);
        }

        let die = match &caps[2] {
            "f" => Die::Fudge,
            sides => {
                let sides = sides.parse::<u32>().map_err(|_| DiceError::BadFormat)?;
                if sides == 0 {
                    return Err(DiceError::SidesTooSmall);
                }
                Die::Standard(sides)
            }
        };

        let selection = match (caps.get(3), caps.get(4)) {
            (Some(kind), Some(amount)) => {
                let n = amount.as_str().parse::<u32>().map_err(|_| DiceError::BadFormat)?;
                if n > count {
                    return Err(DiceError::SelectionTooLarge);
                }
                Some(match kind.as_str() {
                    "k" | "kh" => Selection::KeepHighest(n),
                    "kl" => Selection::KeepLowest(n),
                    "dh" => Selection::DropHighest(n),
                    _ => Selection::DropLowest(n),
                })
            }
            _ => None,
        };

        let modifier = match (caps.get(5), caps.get(6)) {
            (Some(sign), Some(amount)) => {
                let amount = amount.as_str().parse::<i64>().map_err(|_| DiceError::BadFormat)?;
                if sign.as_str() == "-" { -amount } else { amount }
            }
            _ => 0,
        };

        Ok(DiceRoll {
            count,
            die,
            selection,
            modifier,
        })
    }
}

impl DiceRoll {
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> RollOutcome {
        let faces: Vec<i64> = (0..self.count).map(|_| self.die.roll(rng)).collect();

        let mut dropped_mask = vec![false; faces.len()];
        if let Some(selection) = self.selection {
            let (from_top, from_bottom) = selection.discard(faces.len());

            // Indices ordered from highest to lowest face; ties keep roll order.
            let mut order: Vec<usize> = (0..faces.len()).collect();
            order.sort_by(|a, b| faces[*b].cmp(&faces[*a]));

            for &index in order.iter().take(from_top) {
                dropped_mask[index] = true;
            }
            for &index in order.iter().rev().take(from_bottom) {
                dropped_mask[index] = true;
            }
        }

        let (kept, dropped): (Vec<_>, Vec<_>) = faces
            .into_iter()
            .zip(dropped_mask)
            .partition(|(_, dropped)| !dropped);
        let kept: Vec<i64> = kept.into_iter().map(|(face, _)| face).collect();
        let dropped: Vec<i64> = dropped.into_iter().map(|(face, _)| face).collect();

        let total = kept.iter().sum::<i64>().saturating_add(self.modifier);

        RollOutcome {
            total,
            kept,
            dropped,
        }
    }
}

/// Result of rolling a [`DiceRoll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub total: i64,
    pub kept: Vec<i64>,
    pub dropped: Vec<i64>,
}

fn join_faces(faces: &[i64]) -> String {
    faces
        .iter()
        .map(|face| face.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.total, join_faces(&self.kept))?;
        if !self.dropped.is_empty() {
            write!(f, " ([{}])", join_faces(&self.dropped))?;
        }
        Ok(())
    }
}

/// How a roll is rendered in a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceOutput {
    Sum,
    Full,
}

impl FromStr for DiceOutput {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(DiceOutput::Sum),
            "full" => Ok(DiceOutput::Full),
            _ => Err(DiceError::InvalidOutput),
        }
    }
}

impl DiceOutput {
    pub fn render(&self, outcome: &RollOutcome) -> String {
        match self {
            DiceOutput::Sum => outcome.total.to_string(),
            DiceOutput::Full => outcome.to_string(),
        }
    }
}
