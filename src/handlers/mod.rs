// handlers/mod.rs - Handler tiers
//
// Public (no credential) → Protected (bearer credential verified per request)
pub mod public;
pub mod protected;
