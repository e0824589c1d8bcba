use std::fmt;
use std::time::Instant;

use mcu_plugin_api::PlayerId;

/// Identifies one request instance. Doubles as the scheduler task id that
/// expires it, so a replacement from the same sender never matches a stale
/// timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u32);

impl RequestId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for RequestId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An outstanding request from `from` to be moved to `to`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpaRequest {
    id: RequestId,
    from: PlayerId,
    to: PlayerId,
    created_at: Instant,
}

impl TpaRequest {
    pub fn new(id: RequestId, from: PlayerId, to: PlayerId, created_at: Instant) -> Self {
        Self {
            id,
            from,
            to,
            created_at,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn from(&self) -> PlayerId {
        self.from
    }

    pub fn to(&self) -> PlayerId {
        self.to
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}
