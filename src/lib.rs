pub mod boss_ai;
pub mod config;
pub mod constants;
pub mod engine;
pub mod frontier;
pub mod input;
pub mod knockback;
pub mod logging;
pub mod rng;
pub mod session;
pub mod timers;
pub mod types;
