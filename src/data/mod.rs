pub mod client;
pub mod fallback;
pub mod model;

pub use client::{
    load_or_fallback, DataOrigin, DataSource, HttpDataSource, LoadKind, LoadedData, RequestId,
    RequestTracker,
};
pub use model::{ConversationPoint, DataResponse, SharedConnection, Stats};
