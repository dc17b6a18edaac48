//! Surface-feature confidence scoring for upstream answers

/// Answers longer than this many characters earn the length bonus
const LONG_ANSWER_CHARS: usize = 120;

/// Score an answer in `[0, 1]` from cheap text features.
///
/// Points are tallied in tenths so that sums like 0.4 + 0.2 come out exact.
pub fn score_confidence(answer: &str) -> f64 {
    if answer.is_empty() {
        return 0.0;
    }

    let lower = answer.to_lowercase();
    let mut tenths: u8 = 0;

    if answer.chars().count() > LONG_ANSWER_CHARS {
        tenths += 4;
    }
    if answer.contains('.') {
        tenths += 2;
    }
    if !lower.contains("no answer") {
        tenths += 2;
    }
    if !lower.contains("cannot") {
        tenths += 2;
    }

    (f64::from(tenths) / 10.0).min(1.0)
}
