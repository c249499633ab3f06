// Client-side half of the avatar pipeline: interactive crop + transcode,
// progress-tracked upload, and the controller tying them together.
pub mod avatar_flow;
pub mod transcoder;
pub mod upload;
