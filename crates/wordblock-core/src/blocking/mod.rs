mod interval;
mod poller;
pub mod policy;

pub use interval::BlockingInterval;
pub use poller::{
    BlockCallback, BlockEvent, BlockingStore, PollSnapshot, UsagePoller,
    DEFAULT_CHECK_INTERVAL,
};
pub use policy::{aggregate_foreground, evaluate, BlockingStatus};
