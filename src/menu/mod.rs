//! Menu module
//!
//! - `static_menu`: conversation states rendered with a reply keyboard
//! - `inline_menu`: message-attached keyboards addressed by callback data

pub mod inline_menu;
pub mod static_menu;

pub use inline_menu::InlineMenu;
pub use static_menu::StaticMenu;
