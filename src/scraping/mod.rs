pub mod activation;
pub mod browser_manager;
pub mod extract;
pub mod offline;
pub mod page_view;
pub mod scripts;
pub mod selectors;

pub use offline::OfflineSnapshot;
pub use page_view::PlaylistPage;
