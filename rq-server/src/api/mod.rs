//! HTTP API handlers for rq-server

pub mod audio;
pub mod choice;
pub mod health;
pub mod search;
pub mod story;
pub mod ui;

pub use audio::get_audio;
pub use choice::{get_votes, submit_choice};
pub use health::health_routes;
pub use search::search_segments;
pub use story::{get_story_json, get_story_page};
pub use ui::serve_index;
