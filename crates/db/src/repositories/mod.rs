//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod device_repo;
pub mod event_graph_repo;
pub mod event_member_repo;
pub mod event_repo;
pub mod folder_member_repo;
pub mod folder_repo;
pub mod friend_repo;
pub mod friend_request_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use device_repo::DeviceRepo;
pub use event_member_repo::EventMemberRepo;
pub use event_repo::EventRepo;
pub use folder_member_repo::FolderMemberRepo;
pub use folder_repo::FolderRepo;
pub use friend_repo::FriendRepo;
pub use friend_request_repo::FriendRequestRepo;
pub use user_repo::UserRepo;
