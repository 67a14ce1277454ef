//! Client-side device filtering.
//!
//! Filters narrow the rendered device list only. They never issue a
//! backend query, never mutate a device, and never reorder the
//! snapshot. Aggregate statistics ignore them entirely and always see
//! the full snapshot.

use crate::model::Device;

// ---------------------------------------------------------------------------
// Filter types
// ---------------------------------------------------------------------------

/// On/off predicate for the device list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    On,
    Off,
}

impl StatusFilter {
    /// Parse a `--status` value. Anything other than `on`/`off` means
    /// no status filtering, matching the dashboard's "All" option.
    pub fn from_str_opt(s: Option<&str>) -> Option<Self> {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("on") => Some(Self::On),
            Some("off") => Some(Self::Off),
            _ => None,
        }
    }
}

/// Search, room, and status predicates, ANDed together.
///
/// Unset fields match everything, so `DeviceFilter::default()` passes
/// the whole snapshot through.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    search: Option<String>,
    room: Option<String>,
    status: Option<StatusFilter>,
}

impl DeviceFilter {
    /// Build a filter from raw CLI values. Empty strings count as unset.
    pub fn new(
        search: Option<String>,
        room: Option<String>,
        status: Option<StatusFilter>,
    ) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()),
            room: room.filter(|r| !r.is_empty()),
            status,
        }
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.room.is_none() && self.status.is_none()
    }

    /// Whether a single device passes all predicates.
    pub fn matches(&self, device: &Device) -> bool {
        self.matches_search(device) && self.matches_room(device) && self.matches_status(device)
    }

    /// Filter a snapshot, preserving order.
    pub fn apply<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        devices.iter().filter(|d| self.matches(d)).collect()
    }

    // -- predicates ---------------------------------------------------------

    /// Case-insensitive substring match over `"{name} {room}"`, so a
    /// query can hit the name, the room, or span the boundary.
    fn matches_search(&self, device: &Device) -> bool {
        match &self.search {
            Some(query) => {
                let haystack = format!("{} {}", device.name, device.room).to_lowercase();
                haystack.contains(&query.to_lowercase())
            }
            None => true,
        }
    }

    /// Case-insensitive exact match on the room name.
    fn matches_room(&self, device: &Device) -> bool {
        match &self.room {
            Some(room) => device.room.eq_ignore_ascii_case(room),
            None => true,
        }
    }

    fn matches_status(&self, device: &Device) -> bool {
        match self.status {
            Some(StatusFilter::On) => device.is_on,
            Some(StatusFilter::Off) => !device.is_on,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
