//! Filter graphs and argv construction for the two engine passes.

mod argv;
mod diagnostic;
mod synth;

pub use argv::{diagnostic_argv, display_argv, excision_argv};
pub use diagnostic::{diagnostic_graph, DIAGNOSTIC_SAMPLE_FPS};
pub use synth::{selection_filter, synthesize, IDENTITY_EXPRESSION, RENORMALIZE_PTS};
