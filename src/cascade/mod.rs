//! Multi-loop cascade simulation.
//!
//! A run starts from a fuel set, pairs pool nuclides each loop, merges the
//! reactions it finds by identity, and feeds selected outputs back into the
//! pool until it converges, hits the loop cap, or is cancelled.

mod cancel;
mod params;
mod result;
mod simulator;
mod state;

pub use cancel::CancellationToken;
pub use params::{CascadeParameters, CascadeParametersBuilder, MAX_LOOPS};
pub use result::{
    CascadeEvent, CascadeResult, DiscoveredReaction, LoopProgress, TerminationReason,
};
pub use simulator::CascadeSimulator;
pub use state::{CascadePhase, CascadeRunState};
