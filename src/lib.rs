pub mod analyzers;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod trajectory;

pub use engine::{
    AggregateRecord, AggregateTable, CancellationToken, GridParams, compute, compute_with_cancel,
};
pub use error::GridError;
pub use trajectory::{ColumnMap, TrajectoryTable};
