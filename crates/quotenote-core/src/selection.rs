//! Random quote selection.

use rand::seq::SliceRandom;

use crate::models::{Quote, QuoteId};

/// Pick a quote uniformly at random, avoiding `exclude` when possible.
///
/// A single quote is always returned, even if it is the excluded one. With two
/// or more quotes the excluded id is never picked.
pub fn pick_random<'a>(quotes: &'a [Quote], exclude: Option<&QuoteId>) -> Option<&'a Quote> {
    match quotes {
        [] => None,
        [only] => Some(only),
        _ => {
            let candidates = quotes
                .iter()
                .filter(|quote| Some(&quote.id) != exclude)
                .collect::<Vec<_>>();

            let mut rng = rand::thread_rng();
            if candidates.is_empty() {
                quotes.choose(&mut rng)
            } else {
                candidates.choose(&mut rng).copied()
            }
        }
    }
}
