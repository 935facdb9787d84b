mod aggregator;
mod client;
mod oauth;
mod record;
mod tree;

pub use aggregator::{
    AggregateOptions, AggregationError, ChangeFeed, DeltaAggregator, DeltaOutcome, FeedError,
};
pub use client::{AccountInfo, ApiErrorClass, DeltaPage, DropboxClient, DropboxError, QuotaInfo};
pub use oauth::{OAuthClient, OAuthError, OAuthToken};
pub use record::{ChangeRecord, DeltaMapping};
pub use tree::{ROOT_ID, ROOT_NAME, TreeBuilder, TreeInvariantViolation, TreeNode, build_tree};
