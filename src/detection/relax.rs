/// Progressive confidence relaxation for the landlord bonus cards
///
/// The three bonus cards are drawn small and often render below the normal
/// match threshold. The sweep lowers the threshold step by step until enough
/// instances show up, remembering each (symbol, count) pair with the highest
/// confidence it appeared at, then accepts the most confident pairs first.
use crate::card::{CardSymbol, Detection, BONUS_CARDS};

/// Descending sequence of confidences to try
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    pub start: f32,
    /// Lowest confidence tried (inclusive)
    pub floor: f32,
    pub step: f32,
    /// Instances wanted before the sweep stops
    pub target: u32,
}

impl Relaxation {
    pub fn bonus_cards(start: f32, floor: f32, step: f32) -> Self {
        Self {
            start,
            floor,
            step,
            target: BONUS_CARDS,
        }
    }

    /// `start, start - step, ...` down to `floor`.
    ///
    /// Each value is computed from its index so rounding does not accumulate.
    pub fn confidences(&self) -> impl Iterator<Item = f32> {
        let Relaxation {
            start, floor, step, ..
        } = *self;
        let slack = step * 1e-3;
        (0u32..)
            .map(move |i| start - step * i as f32)
            .take_while(move |&confidence| step > 0.0 && confidence >= floor - slack)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedDetection {
    /// Accepted counts; may exceed the target when the last pair holds several instances
    pub counts: Detection,
    /// Confidence of the last accepted pair, or the last one tried if nothing was accepted
    pub threshold: f32,
    /// Number of confidences tried
    pub steps: u32,
}

/// Run the sweep with `detect` evaluating one confidence.
///
/// A pair already accepted for the same symbol is replaced by a later pair
/// for that symbol, so the accepted total is always the sum of `counts`.
pub fn relax(schedule: &Relaxation, mut detect: impl FnMut(f32) -> Detection) -> RelaxedDetection {
    let mut pairs: Vec<(CardSymbol, u8, f32)> = Vec::new();
    let mut last_tried = schedule.start;
    let mut steps = 0;

    for confidence in schedule.confidences() {
        let found = detect(confidence);
        steps += 1;
        last_tried = confidence;

        for (symbol, count) in found.iter() {
            if !pairs.iter().any(|&(s, c, _)| s == symbol && c == count) {
                pairs.push((symbol, count, confidence));
            }
        }

        if found.total() >= schedule.target {
            break;
        }
    }

    // Stable sort keeps first-seen order among equal confidences
    pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

    let mut counts = Detection::empty();
    let mut threshold = last_tried;
    for (symbol, count, confidence) in pairs {
        if counts.total() >= schedule.target {
            break;
        }
        counts.set(symbol, count);
        threshold = confidence;
    }

    RelaxedDetection {
        counts,
        threshold,
        steps,
    }
}
