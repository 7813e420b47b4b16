use crate::hotels::types::RoomAvailability;
use tracing::{debug, info};

/// Case-insensitive room-name fragments we are watching for.
#[derive(Debug, Clone)]
pub struct TargetSet {
    needles: Vec<String>,
}

impl TargetSet {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            needles: targets
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Substring match, not token or exact match.
    pub fn matches(&self, room_name: &str) -> bool {
        let name = room_name.to_lowercase();
        self.needles.iter().any(|n| name.contains(n.as_str()))
    }
}

/// Keep rooms that are not sold out and whose name contains a target.
/// Input order is preserved.
pub fn select_targets(rooms: Vec<RoomAvailability>, targets: &TargetSet) -> Vec<RoomAvailability> {
    rooms
        .into_iter()
        .filter(|r| {
            if r.sold_out {
                debug!(room = %r.name(), "Skipping sold out room");
                return false;
            }
            let hit = targets.matches(r.name());
            if hit {
                info!(room = %r.name(), "Target room found");
            }
            hit
        })
        .collect()
}
