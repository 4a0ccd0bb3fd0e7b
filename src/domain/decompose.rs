use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Amount, SynthesisError};

/// What to do when a draw's upper bound `floor(remaining / divisor)` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegenerateDrawPolicy {
    /// Stop with `SynthesisError::DegenerateRange`.
    #[default]
    Fail,
    /// Emit a zero-valued piece and keep descending.
    Zero,
}

impl DegenerateDrawPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegenerateDrawPolicy::Zero => "zero",
            DegenerateDrawPolicy::Fail => "fail",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zero" => Some(DegenerateDrawPolicy::Zero),
            "fail" => Some(DegenerateDrawPolicy::Fail),
            _ => None,
        }
    }
}

impl std::fmt::Display for DegenerateDrawPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split `target_total` into `count` non-negative amounts that sum to it exactly.
///
/// Pieces are drawn greedily: while more than two pieces are left, the next one
/// is uniform in `[1, remaining / pieces_left]`. The last two pieces take a
/// quarter and three quarters of whatever is left, which absorbs all rounding.
/// The split is front-loaded: early draws see the widest ranges, and the last
/// piece always takes three quarters of the leftover.
///
/// A draw range can only collapse when `target_total < count`, since the
/// ratio `remaining / divisor` never shrinks during the descent.
pub fn decompose<R: Rng>(
    target_total: Amount,
    count: i64,
    policy: DegenerateDrawPolicy,
    rng: &mut R,
) -> Result<Vec<Amount>, SynthesisError> {
    if target_total < 0 {
        return Err(SynthesisError::InvalidInput(format!(
            "target total must not be negative, got {}",
            target_total
        )));
    }
    if count < 1 {
        return Err(SynthesisError::InvalidInput(format!(
            "transaction count must be positive, got {}",
            count
        )));
    }

    let mut pieces = Vec::new();
    let mut remaining = target_total;
    let mut divisor = count;

    while divisor > 2 {
        let upper = remaining / divisor;
        let piece = if upper >= 1 {
            rng.gen_range(1..=upper)
        } else {
            match policy {
                DegenerateDrawPolicy::Zero => 0,
                DegenerateDrawPolicy::Fail => {
                    return Err(SynthesisError::DegenerateRange { remaining, divisor });
                }
            }
        };

        remaining -= piece;
        pieces.push(piece);
        divisor -= 1;
    }

    if divisor == 2 {
        let drawn: Amount = pieces.iter().sum();
        let leftover = target_total - drawn;
        let first = leftover / 4;
        pieces.push(first);
        pieces.push(leftover - first);
    } else {
        pieces.push(remaining);
    }

    Ok(pieces)
}
