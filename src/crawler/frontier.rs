use std::collections::{HashSet, VecDeque};

use crate::url_parser::NormalizedUrl;

/// To-visit queue and visited set driving crawl order and termination.
///
/// `pending` and `visited` never overlap: [`Frontier::pop`] moves a URL from
/// one to the other in a single step, before the page is processed, so a URL
/// rediscovered while its own page is being handled cannot be queued again.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<NormalizedUrl>,
    pending: HashSet<NormalizedUrl>,
    visited: HashSet<NormalizedUrl>,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    pub fn new(seed: NormalizedUrl) -> Self {
        let mut frontier = Self::default();
        frontier.push(seed);
        frontier
    }

    /// Queues `url` unless it is already pending or visited.
    ///
    /// Returns whether the URL was added.
    pub fn push(&mut self, url: NormalizedUrl) -> bool {
        if self.visited.contains(&url) || self.pending.contains(&url) {
            return false;
        }
        self.pending.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Takes the next URL and marks it visited
    pub fn pop(&mut self) -> Option<NormalizedUrl> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        self.visited.insert(url.clone());
        Some(url)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_pending(&self, url: &NormalizedUrl) -> bool {
        self.pending.contains(url)
    }

    pub fn is_visited(&self, url: &NormalizedUrl) -> bool {
        self.visited.contains(url)
    }
}
