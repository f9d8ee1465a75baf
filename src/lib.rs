// THEORY:
// This file is the entry point for the `hand_vision` library crate.
//
// The public face of the crate is the `TrackingPipeline` in `pipeline`, together
// with its configuration and `Report` types. It takes depth frames in and hands
// back candidates, pointer motion and named gestures.
//
// The stages behind it stay reachable through `core_modules` for callers that only
// need one layer: masking alone, finger extraction on their own contours, or gesture
// recognition fed from another tracker.

pub mod core_modules;
pub mod error;
pub mod pipeline;
