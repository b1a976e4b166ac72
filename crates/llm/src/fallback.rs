use crate::provider::GenerationResult;

/// Canned responses for when the LLM provider cannot produce a real
/// answer, ordered by how many consecutive failures preceded them
/// (spec.md §4.G). Tier 1 asks the user to repeat themselves — the
/// failure might be transient. Tier 2 apologizes and suggests trying
/// again shortly. Tier 3 is used once the ladder is exhausted and
/// just asks the user to try again later; callers are expected to end
/// the turn after a tier-3 response rather than keep retrying.
const TIER_1: &str = "Sorry, could you say that again?";
const TIER_2: &str = "I'm having trouble processing that right now. Could you try again in a moment?";
const TIER_3: &str = "I'm unable to respond right now. Please try again later.";

/// Maps a 1-based consecutive-failure count onto the fallback ladder.
///
/// `fatal` reflects the triggering call's own error classification
/// (spec.md §4.G): a non-retryable failure (bad credentials,
/// malformed configuration, a provider-side rejection) means retrying
/// won't help, so the ladder jumps straight to at least tier 2 even on
/// the very first failure rather than spending a tier-1 "please
/// repeat" on an error repeating it cannot fix.
pub fn fallback_for_attempt(consecutive_failures: u32, fatal: bool) -> GenerationResult {
    let effective = if fatal {
        consecutive_failures.max(2)
    } else {
        consecutive_failures
    };
    let (text, tier) = match effective {
        0 => unreachable!("fallback should only be requested after at least one failure"),
        1 => (TIER_1, 1),
        2 => (TIER_2, 2),
        _ => (TIER_3, 3),
    };
    GenerationResult {
        text: text.to_string(),
        is_fallback: true,
        tier: Some(tier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalates_through_tiers_on_retryable_failures() {
        assert_eq!(fallback_for_attempt(1, false).tier, Some(1));
        assert_eq!(fallback_for_attempt(2, false).tier, Some(2));
        assert_eq!(fallback_for_attempt(3, false).tier, Some(3));
        assert_eq!(fallback_for_attempt(10, false).tier, Some(3));
    }

    #[test]
    fn fatal_failure_skips_tier_one_even_on_the_first_attempt() {
        assert_eq!(fallback_for_attempt(1, true).tier, Some(2));
    }

    #[test]
    fn fatal_failure_after_prior_failures_still_escalates() {
        assert_eq!(fallback_for_attempt(3, true).tier, Some(3));
    }

    #[test]
    fn fallback_results_are_flagged() {
        assert!(fallback_for_attempt(1, false).is_fallback);
    }
}
