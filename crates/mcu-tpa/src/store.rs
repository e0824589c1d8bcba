//! Pending requests keyed by sender.

use std::collections::HashMap;

use mcu_plugin_api::PlayerId;

use crate::request::{RequestId, TpaRequest};

/// At most one request per sender; a recipient may be addressed by many senders.
#[derive(Debug, Default)]
pub struct RequestStore {
    by_sender: HashMap<PlayerId, TpaRequest>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `request`, returning the request it replaced from the same sender.
    pub fn insert(&mut self, request: TpaRequest) -> Option<TpaRequest> {
        self.by_sender.insert(request.from(), request)
    }

    pub fn get(&self, sender: PlayerId) -> Option<&TpaRequest> {
        self.by_sender.get(&sender)
    }

    pub fn remove(&mut self, sender: PlayerId) -> Option<TpaRequest> {
        self.by_sender.remove(&sender)
    }

    /// Remove the request with this exact id. A newer request from the same
    /// sender is left alone.
    pub fn remove_by_id(&mut self, id: RequestId) -> Option<TpaRequest> {
        let sender = self
            .by_sender
            .values()
            .find(|r| r.id() == id)
            .map(|r| r.from())?;
        self.by_sender.remove(&sender)
    }

    /// The newest request addressed to `recipient`.
    pub fn latest_to(&self, recipient: PlayerId) -> Option<&TpaRequest> {
        self.by_sender
            .values()
            .filter(|r| r.to() == recipient)
            .max_by_key(|r| (r.created_at(), r.id()))
    }

    /// All requests addressed to `recipient`, oldest first.
    pub fn all_to(&self, recipient: PlayerId) -> Vec<&TpaRequest> {
        let mut found: Vec<&TpaRequest> = self
            .by_sender
            .values()
            .filter(|r| r.to() == recipient)
            .collect();
        found.sort_by_key(|r| (r.created_at(), r.id()));
        found
    }

    /// Remove every request addressed to `recipient`.
    pub fn remove_all_to(&mut self, recipient: PlayerId) -> Vec<TpaRequest> {
        let senders: Vec<PlayerId> = self
            .by_sender
            .values()
            .filter(|r| r.to() == recipient)
            .map(|r| r.from())
            .collect();
        senders
            .into_iter()
            .filter_map(|s| self.by_sender.remove(&s))
            .collect()
    }

    pub fn drain(&mut self) -> Vec<TpaRequest> {
        self.by_sender.drain().map(|(_, r)| r).collect()
    }

    pub fn len(&self) -> usize {
        self.by_sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sender.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn player(n: u128) -> PlayerId {
        PlayerId::from_u128(n)
    }

    fn request(id: u32, from: u128, to: u128, at: Instant) -> TpaRequest {
        TpaRequest::new(RequestId::new(id), player(from), player(to), at)
    }

    #[test]
    fn insert_replaces_same_sender() {
        let now = Instant::now();
        let mut store = RequestStore::new();
        assert!(store.insert(request(1, 1, 2, now)).is_none());
        let replaced = store.insert(request(2, 1, 3, now)).unwrap();
        assert_eq!(replaced.id(), RequestId::new(1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(player(1)).unwrap().to(), player(3));
    }

    #[test]
    fn remove_by_id_ignores_replacement() {
        let now = Instant::now();
        let mut store = RequestStore::new();
        store.insert(request(1, 1, 2, now));
        store.insert(request(2, 1, 3, now));
        assert!(store.remove_by_id(RequestId::new(1)).is_none());
        assert_eq!(store.len(), 1);
        let removed = store.remove_by_id(RequestId::new(2)).unwrap();
        assert_eq!(removed.to(), player(3));
        assert!(store.is_empty());
    }

    #[test]
    fn latest_to_prefers_newest() {
        let now = Instant::now();
        let mut store = RequestStore::new();
        store.insert(request(1, 1, 9, now));
        store.insert(request(2, 2, 9, now + Duration::from_secs(5)));
        store.insert(request(3, 3, 8, now + Duration::from_secs(9)));
        assert_eq!(store.latest_to(player(9)).unwrap().from(), player(2));
        assert!(store.latest_to(player(7)).is_none());

        let all: Vec<PlayerId> = store.all_to(player(9)).iter().map(|r| r.from()).collect();
        assert_eq!(all, vec![player(1), player(2)]);
    }

    #[test]
    fn remove_all_to_keeps_others() {
        let now = Instant::now();
        let mut store = RequestStore::new();
        store.insert(request(1, 1, 9, now));
        store.insert(request(2, 2, 9, now));
        store.insert(request(3, 9, 1, now));
        let removed = store.remove_all_to(player(9));
        assert_eq!(removed.len(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(player(9)).is_some());
        assert_eq!(store.drain().len(), 1);
        assert!(store.is_empty());
    }
}
