//! Stories and their ordered segments.

use chrono::{DateTime, Utc};
use layer0::{SegmentId, StoryId, WorldId};
use serde::{Deserialize, Serialize};

/// An ordered unit of story text. `order` is assigned as
/// `max(existing.order) + 1` at insertion and never reused, even if
/// earlier segments are later removed by an external caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Stable identifier.
    pub segment_id: SegmentId,
    /// The story this segment belongs to.
    pub story_id: StoryId,
    /// Monotonically increasing position within the story.
    pub order: u64,
    /// The segment's text content.
    pub text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A story within a world: a title plus its ordered segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// Stable identifier.
    pub story_id: StoryId,
    /// The world this story belongs to.
    pub world_id: WorldId,
    /// The story's title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp, bumped on every appended segment.
    pub updated_at: DateTime<Utc>,
    /// Segments in ascending `order`.
    pub segments: Vec<Segment>,
}

impl Story {
    /// Construct a newly created, segment-less story.
    pub fn new(story_id: StoryId, world_id: WorldId, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            story_id,
            world_id,
            title: title.into(),
            created_at: now,
            updated_at: now,
            segments: Vec::new(),
        }
    }

    /// The next `order` value for a newly appended segment.
    pub fn next_order(&self) -> u64 {
        self.segments.iter().map(|s| s.order).max().map_or(0, |m| m + 1)
    }

    /// Append a segment, bumping `updated_at`. The caller is responsible
    /// for minting the segment with [`Story::next_order`].
    pub fn push_segment(&mut self, segment: Segment, now: DateTime<Utc>) {
        self.segments.push(segment);
        self.updated_at = now;
    }

    /// The last `n` segments' text, for `current_story` memory block
    /// reconciliation.
    pub fn last_segment_excerpts(&self, n: usize) -> Vec<&str> {
        let start = self.segments.len().saturating_sub(n);
        self.segments[start..].iter().map(|s| s.text.as_str()).collect()
    }
}
