pub mod detail;
pub mod logging;
pub mod map;
pub mod materializer;
pub mod runtime;
pub mod scroll;
pub mod synchronizer;
pub mod view;

pub use detail::{load_detail, DetailMap, DetailView};
pub use logging::{init_logging, Logger};
pub use map::{latest_geotagged, MapEntry, MapPanel};
pub use materializer::{materialize, MaterializedView, PaginationCursor, ViewQuery};
pub use runtime::{settle, FetchMessage, FetchRunner};
pub use scroll::{LoadMoreButton, PageTrigger, ScrollTrigger, TriggerEvent};
pub use synchronizer::{Applied, FeedSynchronizer, FetchOutcome, FetchTicket, SyncState};
pub use view::FeedView;

pub mod prelude {
    pub use super::{
        load_detail, FeedSynchronizer, FeedView, FetchMessage, FetchRunner, MapPanel, PageTrigger,
        TriggerEvent, ViewQuery,
    };
}
