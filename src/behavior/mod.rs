pub mod sampler;
pub mod simulator;

pub use sampler::{Sampler, ThreadRngSampler};
pub use simulator::BehaviorSimulator;
