//! EMG movement classification.
//!
//! The companion application streams 4 raw scores per datagram, ordered
//! isometric, extension, flexion, rest. Classification is a numerically
//! stable softmax followed by argmax; the winning probability doubles as
//! the strength scalar. Pure functions, no hidden state.

/// Discrete wrist movement labels, in wire score order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Isometric,
    Extension,
    Flexion,
    Rest,
}

impl Movement {
    pub fn as_str(self) -> &'static str {
        match self {
            Movement::Isometric => "isometric",
            Movement::Extension => "extension",
            Movement::Flexion => "flexion",
            Movement::Rest => "rest",
        }
    }
}

/// Latest classification of the EMG stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub movement: Movement,
    /// Winning softmax probability in [0, 1].
    pub strength: f64,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            movement: Movement::Rest,
            strength: 0.0,
        }
    }
}

/// Softmax over the 4 raw scores, shifted by the maximum before
/// exponentiating so large scores cannot overflow.
fn softmax(scores: &[f64; 4]) -> [f64; 4] {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut exps = [0.0; 4];
    let mut sum = 0.0;
    for (e, s) in exps.iter_mut().zip(scores) {
        *e = (s - max).exp();
        sum += *e;
    }
    for e in &mut exps {
        *e /= sum;
    }
    exps
}

fn movement_at(index: usize) -> Movement {
    match index {
        0 => Movement::Isometric,
        1 => Movement::Extension,
        2 => Movement::Flexion,
        _ => Movement::Rest,
    }
}

/// Classify one raw prediction vector.
///
/// Ties break to the lowest index (uniform scores yield Isometric). No
/// confidence threshold is applied here; that is caller-side policy.
pub fn classify(scores: &[f64; 4]) -> Classification {
    let probs = softmax(scores);
    let mut idx = 0;
    for (i, p) in probs.iter().enumerate() {
        if *p > probs[idx] {
            idx = i;
        }
    }
    Classification {
        movement: movement_at(idx),
        strength: probs[idx],
    }
}

/// Stricter caller-side gate: the winner must clear `min_confidence` and
/// beat the runner-up by `min_margin`, else the result collapses to Rest.
/// Not applied in the live control path, which gates on the configured
/// minimum movement threshold instead.
pub fn confident(scores: &[f64; 4], min_confidence: f64, min_margin: f64) -> Classification {
    let probs = softmax(scores);
    let mut idx = 0;
    for (i, p) in probs.iter().enumerate() {
        if *p > probs[idx] {
            idx = i;
        }
    }
    let winner = probs[idx];
    let runner_up = probs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, p)| *p)
        .fold(f64::NEG_INFINITY, f64::max);
    if winner > min_confidence && winner - runner_up > min_margin {
        Classification {
            movement: movement_at(idx),
            strength: winner,
        }
    } else {
        Classification {
            movement: Movement::Rest,
            strength: winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_score_wins() {
        let c = classify(&[0.8, 0.1, 0.05, 0.05]);
        assert_eq!(c.movement, Movement::Isometric);
        // Winner's probability strictly beats each of the other three.
        let probs = softmax(&[0.8, 0.1, 0.05, 0.05]);
        assert!(probs[0] > probs[1] && probs[0] > probs[2] && probs[0] > probs[3]);
        assert!((c.strength - probs[0]).abs() < 1e-12);
    }

    #[test]
    fn uniform_scores_tie_break_to_isometric() {
        let c = classify(&[0.1, 0.1, 0.1, 0.1]);
        assert_eq!(c.movement, Movement::Isometric);
        assert!((c.strength - 0.25).abs() < 1e-12);
    }

    #[test]
    fn each_index_maps_to_its_movement() {
        assert_eq!(classify(&[5.0, 0.0, 0.0, 0.0]).movement, Movement::Isometric);
        assert_eq!(classify(&[0.0, 5.0, 0.0, 0.0]).movement, Movement::Extension);
        assert_eq!(classify(&[0.0, 0.0, 5.0, 0.0]).movement, Movement::Flexion);
        assert_eq!(classify(&[0.0, 0.0, 0.0, 5.0]).movement, Movement::Rest);
    }

    #[test]
    fn large_scores_do_not_overflow() {
        let c = classify(&[1000.0, 999.0, 0.0, -1000.0]);
        assert_eq!(c.movement, Movement::Isometric);
        assert!(c.strength.is_finite());
        assert!(c.strength > 0.5 && c.strength <= 1.0);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let probs = softmax(&[0.3, -1.2, 4.5, 0.0]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let scores = [0.2, 0.7, 0.1, 0.4];
        assert_eq!(classify(&scores), classify(&scores));
    }

    #[test]
    fn confidence_gate_collapses_weak_winners_to_rest() {
        // Clear winner passes the gate.
        let c = confident(&[0.0, 4.0, 0.0, 0.0], 0.5, 0.2);
        assert_eq!(c.movement, Movement::Extension);
        // Near-uniform input fails both confidence and margin.
        let c = confident(&[0.1, 0.12, 0.1, 0.1], 0.5, 0.2);
        assert_eq!(c.movement, Movement::Rest);
    }
}
