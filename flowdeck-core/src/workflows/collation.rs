use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};
use tracing::warn;

thread_local! {
    // Root-locale collator; `None` only if the compiled data cannot be loaded.
    static COLLATOR: Option<Collator> = root_collator();
}

fn root_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(err) => {
            warn!(error = %err, "root collator unavailable, using case-folded order");
            None
        }
    }
}

/// Locale-aware label ordering (Unicode root collation, tertiary strength).
/// Labels that only differ by case put the lowercase form first; anything
/// the collator treats as equal falls back to code points.
pub fn compare_labels(left: &str, right: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(left, right),
            None => case_folded(left, right),
        })
        .then_with(|| left.cmp(right))
}

fn case_folded(left: &str, right: &str) -> Ordering {
    let folded = left
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }

    for (l, r) in left.chars().zip(right.chars()) {
        if l == r {
            continue;
        }
        return match (l.is_lowercase(), r.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => l.cmp(&r),
        };
    }

    Ordering::Equal
}
