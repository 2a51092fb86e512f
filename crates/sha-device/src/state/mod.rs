/// Block-pipeline state machine states.
pub mod pipeline_state;

pub use pipeline_state::{PipelineState, PIPELINE_STATE_COUNT};
