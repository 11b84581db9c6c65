pub mod lifecycle;
pub mod pipeline;
pub mod rank;
pub mod scorer;
pub mod signals;

pub use lifecycle::LifecycleTracker;
pub use pipeline::EnrichmentPipeline;
pub use signals::SignalCalculator;
