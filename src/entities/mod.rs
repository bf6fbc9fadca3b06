//! Query workflows over a dataset snapshot: search, statistics and symptom lookup.

pub mod drug;
pub mod recommend;
pub mod stats;

#[derive(Debug, Clone)]
pub struct SearchPage<T> {
    pub results: Vec<T>,
    pub total: usize,
}

impl<T> SearchPage<T> {
    pub(crate) fn new(results: Vec<T>, total: usize) -> Self {
        Self { results, total }
    }

    pub fn showing(&self) -> usize {
        self.results.len()
    }
}
