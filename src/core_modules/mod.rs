pub mod depth_frame;
pub mod depth_masker;
pub mod event_bus;
pub mod geometry;
pub mod gesture;
pub mod hand_tracker;
pub mod silhouette_analyzer;
