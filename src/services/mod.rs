pub mod cleanup;
pub mod detector;
pub mod imgur;
pub mod ingest;
pub mod labels;
pub mod line;
pub mod queue;
pub mod signature;
pub mod worker;
