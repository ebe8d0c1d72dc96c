//! Hysteresis sizing rules, kept free of device types so they can be checked
//! exhaustively.

/// Outcome of comparing a requested element count to the current buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferStatus {
    /// Same request as last time; nothing to decide.
    Valid,
    /// Request exceeds capacity; grow.
    TooSmall,
    /// Request is under a quarter of capacity and the floor allows a halving.
    TooBig,
    /// Request changed but current capacity still fits it.
    ///
    /// Also the initial state, so the first request always gets classified.
    Invalid,
}

impl BufferStatus {
    /// Whether this status replaces the buffer.
    pub fn reallocates(self) -> bool {
        matches!(self, Self::TooSmall | Self::TooBig)
    }
}

pub(crate) fn initial_capacity(initial_count: u64, minimum_floor: u64) -> u64 {
    // At least one slot, otherwise doubling can never catch up.
    initial_count.max(minimum_floor / 2).max(1)
}

pub(crate) fn classify(
    requested: u64,
    last_observed: Option<u64>,
    capacity: u64,
    minimum_floor: u64,
) -> BufferStatus {
    if last_observed == Some(requested) {
        BufferStatus::Valid
    } else if requested > capacity {
        BufferStatus::TooSmall
    } else if capacity / 4 >= minimum_floor && requested < capacity / 4 {
        BufferStatus::TooBig
    } else {
        BufferStatus::Invalid
    }
}

/// Doubles `capacity` until it holds `requested`.
pub(crate) fn grown(capacity: u64, requested: u64) -> u64 {
    let mut next = capacity.max(1);
    while next < requested {
        next = next.saturating_mul(2);
    }
    next
}

pub(crate) fn shrunk(capacity: u64) -> u64 {
    capacity / 2
}

/// Capacity to hold after a request classified as `status`.
pub(crate) fn target_capacity(status: BufferStatus, capacity: u64, requested: u64) -> u64 {
    match status {
        BufferStatus::TooSmall => grown(capacity, requested),
        BufferStatus::TooBig => shrunk(capacity),
        BufferStatus::Valid | BufferStatus::Invalid => capacity,
    }
}
