//! Built-in fallback content
//!
//! Served when the content store is unavailable, errors, or has no match, so
//! the opening of the adventure always renders.

use once_cell::sync::Lazy;
use rq_common::{Choice, Segment};
use std::collections::HashMap;

static MOCK_STORIES: Lazy<HashMap<String, Segment>> = Lazy::new(|| {
    [
        Segment::new(
            "intro",
            "Welcome to Goma",
            "Once upon a time in the beautiful city of Goma, nestled between Lake Kivu and the \
             Virunga Mountains, a group of curious children discovered something magical. Through \
             their solar-powered radios, they could hear stories that came alive with voices from \
             their own land. This is RadioQuest - where every story is an adventure, and every \
             child is the hero of their own tale.",
        )
        .with_choice(Choice::new("forest", "Explore the enchanted forest", "forest"))
        .with_choice(Choice::new("mountain", "Climb the mystical mountain", "mountain")),
        Segment::new(
            "forest",
            "The Enchanted Forest Adventure",
            "You venture into the lush forests of Virunga, where ancient trees whisper secrets and \
             colorful birds guide your path. The children of Goma often play here, but today you \
             discover something extraordinary - a hidden grove where stories grow on trees like \
             magical fruit, waiting to be shared with the world.",
        )
        .with_choice(Choice::new("village", "Return to the village", "village"))
        .with_choice(Choice::new("lake", "Head to Lake Kivu", "lake")),
        Segment::new(
            "mountain",
            "Mountain Peak Stories",
            "High atop the Virunga Mountains, you find a place where the clouds touch the earth \
             and the views stretch across all of Eastern Africa. Here, the elders say, is where all \
             the best stories begin - with a view so vast it contains infinite possibilities for \
             adventure.",
        )
        .with_choice(Choice::new("intro", "Start a new adventure", "intro"))
        .with_choice(Choice::new("village", "Visit the village below", "village")),
    ]
    .into_iter()
    .map(|segment| (segment.id.clone(), segment))
    .collect()
});

/// Short descriptors returned by lexical search when the store has nothing
static MOCK_SEARCH_RESULTS: Lazy<Vec<Segment>> = Lazy::new(|| {
    vec![
        Segment::new("intro", "Welcome to Goma", "Stories from the heart of Goma..."),
        Segment::new(
            "forest",
            "The Enchanted Forest Adventure",
            "Magical adventures in Virunga forests...",
        ),
        Segment::new("mountain", "Mountain Peak Stories", "Tales from the high peaks of Virunga..."),
        Segment::new("village", "Village Life Chronicles", "Daily adventures in Goma village..."),
        Segment::new("lake", "Lake Kivu Legends", "Ancient stories from the shores of Lake Kivu..."),
    ]
});

/// Fallback segment by id
pub fn mock_segment(id: &str) -> Option<Segment> {
    MOCK_STORIES.get(id).cloned()
}

/// Fallback search results matching `query` case-insensitively
pub fn mock_search(query: &str) -> Vec<Segment> {
    MOCK_SEARCH_RESULTS
        .iter()
        .filter(|segment| segment.matches_text(query))
        .cloned()
        .collect()
}
