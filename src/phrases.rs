//! Canned personality phrase pools.
//!
//! Static fallbacks used whenever the external responder is unavailable.

use rand::Rng;

/// Shown when a positive message deserves a quick acknowledgment.
pub const ENCOURAGEMENTS: &[&str] = &[
    "That's great to hear! 😊",
    "I'm glad you're taking this step!",
    "You're doing great! Let's keep going.",
];

/// Shown when the visitor declines the readiness check up front.
pub const LEAD_CONVERSION: &[&str] = &[
    "Before you go, would you like to receive our free mortgage guide? It's packed with valuable insights!",
    "I'd love to send you some helpful resources about the home buying process. Would that be okay?",
    "Would you like to receive our weekly mortgage market updates? It's free and you can unsubscribe anytime.",
];

/// Prepended after a long idle gap.
pub const WELCOME_BACK: &str =
    "Welcome back! I'm still here to help with your mortgage journey. ";

/// Shown when a visitor moves from asking for help to wanting to buy.
pub const HELP_TO_BUY: &str =
    "I'm glad you're interested in buying! Let me guide you through the process. ";

/// Pick a random phrase from a pool.
pub fn pick(pool: &[&str]) -> String {
    let idx = rand::thread_rng().gen_range(0..pool.len());
    pool[idx].to_string()
}
