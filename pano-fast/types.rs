use pano_core::Keypoint;

/// Keypoint with corner response score for NMS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: f32,
}

/// Resolution at which a frame is analysed, relative to its full size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    /// Full-resolution pixels per analysed pixel (>= 1)
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}

/// Corner type classification of the segment test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}
