pub mod classifier;
pub mod network;
pub mod neuron;
pub mod params;
pub mod state_snapshot;
pub mod synapse;

mod types;
mod util;
