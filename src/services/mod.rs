pub mod auth;
pub mod comments;
pub mod lookup;
pub mod posts;
pub mod slug;
pub mod taxonomy;
pub mod token;
pub mod validation;
