//! Channel layouts for the loopback server

use std::path::Path;

use simcom_core::ChannelEntry;

/// The fly-in layout the loopback server starts with when no file is set
///
/// Two events side by side, the second with departure, en-route and arrival
/// groups, and some duplicate tags to show the first-match rule.
pub fn demo_layout() -> Vec<ChannelEntry> {
    vec![
        ChannelEntry::new(1, "Lobby", 0),
        ChannelEntry::new(2, "Fly-in 1", 0),
        ChannelEntry::new(3, "F1 Dep - 118.300", 2),
        ChannelEntry::new(4, "F1 Unicom - 122.800", 2),
        ChannelEntry::new(5, "F1 Dep - 119.125", 2),
        ChannelEntry::new(6, "Fly-in 2", 0),
        ChannelEntry::new(7, "F2 Departure", 6),
        ChannelEntry::new(8, "F2D Ground - 118.300", 7),
        ChannelEntry::new(9, "F2D Tower - 125.100", 7),
        ChannelEntry::new(10, "F2D Departure - 119.125", 7),
        ChannelEntry::new(11, "F2 EnRoute", 6),
        ChannelEntry::new(12, "F2 Unicom - 122.800", 11),
        ChannelEntry::new(13, "F2 Arrival", 6),
        ChannelEntry::new(14, "F2A Departure - 118.300", 13),
        ChannelEntry::new(15, "F2A Tower - 125.100", 13),
        ChannelEntry::new(16, "F2A Ground - 119.125", 13),
        ChannelEntry::new(17, "F2 Other - 118.300", 6),
        ChannelEntry::new(18, "F2 Other - 122.800", 17),
        ChannelEntry::new(19, "F2 Other - 118.300", 18),
    ]
}

/// Read a layout file: a JSON array of `{"id", "name", "parent"}` objects
pub fn load_layout(path: &Path) -> Result<Vec<ChannelEntry>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read layout {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse layout {}: {}", path.display(), e))
}
