//! Small pure helpers shared by every resource.

pub mod pagination;
pub mod slug;
