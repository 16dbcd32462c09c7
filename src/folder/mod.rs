//! Drive folder tree for drivebot.
//!
//! This module provides:
//! - Tree construction from the backend's flat `(path, id)` listing
//! - Rendering of the tree as an indented, clickable chat listing

mod render;
mod tree;

pub use render::{escape_html, folder_url, format_listing, render, BULLET, INDENT};
pub use tree::{build, split_path, FolderEntry, PathIdIndex, PathNode, PATH_SEPARATOR};
