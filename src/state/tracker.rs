use crate::state::UrlState;
use crate::LensError;
use std::collections::HashMap;

/// Tracks the state of every URL in a crawl run
///
/// Insertion order is kept so reports list URLs the way the input did.
#[derive(Debug, Default)]
pub struct UrlTracker {
    order: Vec<String>,
    states: HashMap<String, UrlState>,
}

impl UrlTracker {
    /// Creates a tracker with every URL `Pending`; duplicates are ignored
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tracker = Self::default();
        for url in urls {
            let url = url.into();
            if !tracker.states.contains_key(&url) {
                tracker.states.insert(url.clone(), UrlState::Pending);
                tracker.order.push(url);
            }
        }
        tracker
    }

    /// Moves a URL to `next`, rejecting transitions the state machine forbids
    pub fn transition(&mut self, url: &str, next: UrlState) -> Result<(), LensError> {
        let current = self
            .states
            .get_mut(url)
            .ok_or_else(|| LensError::InvalidTransition {
                url: url.to_string(),
                from: UrlState::Pending,
                to: next,
            })?;

        if !current.can_transition_to(next) {
            return Err(LensError::InvalidTransition {
                url: url.to_string(),
                from: *current,
                to: next,
            });
        }

        *current = next;
        Ok(())
    }

    /// URLs in input order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// URLs that have not reached a terminal state, in input order
    pub fn unfinished(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|url| {
                self.states
                    .get(url.as_str())
                    .map_or(false, |state| !state.is_terminal())
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
