//! Configuration types.

use std::time::Duration;

/// Assistant configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Tag recorded on the session as the lead source.
    pub lead_source: String,
    /// Gap after which the next reply is prefixed with a welcome-back line.
    pub away_gap: Duration,
    /// Minimum simulated typing delay before a bot turn is shown.
    pub typing_delay_floor: Duration,
    /// Random extra typing delay added on top of the floor.
    pub typing_delay_jitter: Duration,
    /// Deadline for a single external responder call.
    pub responder_timeout: Duration,
    /// Scheduling link offered when the consultation step is accepted.
    pub scheduling_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            lead_source: "chat".to_string(),
            away_gap: Duration::from_secs(300), // 5 minutes
            typing_delay_floor: Duration::from_secs(1),
            typing_delay_jitter: Duration::from_secs(1),
            responder_timeout: Duration::from_secs(10),
            scheduling_url: "https://calendly.com/your-link-here".to_string(),
        }
    }
}
