use std::collections::HashSet;

use crate::domain::listing::{IdentityKey, Listing};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchStats {
    pub accepted: usize,
    pub duplicates: usize,
    pub over_cap: usize,
}

/// Listings in discovery order, deduplicated by identity and capped.
#[derive(Debug)]
pub struct ResultSet {
    listings: Vec<Listing>,
    seen: HashSet<IdentityKey>,
    max_records: usize,
}

impl ResultSet {
    pub fn new(max_records: usize) -> Self {
        ResultSet {
            listings: Vec::new(),
            seen: HashSet::new(),
            max_records,
        }
    }

    pub fn absorb(&mut self, batch: Vec<Listing>) -> BatchStats {
        let mut stats = BatchStats::default();

        for listing in batch {
            let key = listing.identity();
            if let Some(key) = &key {
                if self.seen.contains(key) {
                    stats.duplicates += 1;
                    continue;
                }
            }
            if self.is_full() {
                stats.over_cap += 1;
                continue;
            }
            if let Some(key) = key {
                self.seen.insert(key);
            }
            self.listings.push(listing);
            stats.accepted += 1;
        }

        stats
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.listings.len() >= self.max_records
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn into_listings(self) -> Vec<Listing> {
        self.listings
    }
}
