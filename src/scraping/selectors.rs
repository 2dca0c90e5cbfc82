//! CSS selectors for the playlist page markup.
//!
//! Shared by the live page scripts and the saved-HTML reader so both see the
//! same fields.

pub const ITEM: &str = "ytd-playlist-video-renderer";
pub const LIST_CONTAINER: &str = "ytd-playlist-video-list-renderer #contents";
pub const TITLE: &str = "#video-title";
pub const CHANNEL: &str = "ytd-channel-name a, #channel-name a";
pub const WATCHED_MARKER: &str = "ytd-thumbnail-overlay-playback-status-renderer";
pub const RESUME_BAR: &str = "ytd-thumbnail-overlay-resume-playback-renderer #progress";
pub const METADATA_TEXT: &str = "#video-info span, #metadata-line span";
pub const LOADING_PLACEHOLDER: &str = "ytd-continuation-item-renderer";
pub const MENU_BUTTON: &str =
    "ytd-menu-renderer yt-icon-button#button, ytd-menu-renderer button[aria-label], ytd-menu-renderer #button";
pub const MENU_ENTRY: &str =
    "ytd-menu-popup-renderer tp-yt-paper-item, ytd-menu-popup-renderer ytd-menu-service-item-renderer";

/// Attribute stamped on each item when the snapshot is taken.
pub const HANDLE_ATTR: &str = "data-playlist-sweep-handle";
/// Attribute stamped on the menu entry chosen by `locate_control`.
pub const CONTROL_ATTR: &str = "data-playlist-sweep-control";
/// Id of the injected status overlay.
pub const OVERLAY_ID: &str = "__playlist_sweep_overlay__";
