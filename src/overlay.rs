//! Landmark overlays for the outgoing video stream.
//!
//! The video pipeline draws an SVG document over the streamed video, so the person operating the
//! hand can see what the pose estimator detected. This module builds that document; rendering it is
//! up to the video pipeline.

use std::fmt::Write;

use crate::{
    landmark::{Landmarks, CONNECTIVITY},
    resolution::Resolution,
};

/// Receives the landmarks of every frame in which a hand was detected.
///
/// Closures of type `FnMut(&Landmarks)` implement this trait.
pub trait OverlaySink {
    fn update(&mut self, landmarks: &Landmarks);
}

impl<F: FnMut(&Landmarks)> OverlaySink for F {
    fn update(&mut self, landmarks: &Landmarks) {
        self(landmarks)
    }
}

/// Renders `landmarks` as an SVG document the size of the source frame.
///
/// Each landmark is drawn as a small circle, and each bone of the hand skeleton ([`CONNECTIVITY`])
/// as a red line. Depth is ignored.
pub fn to_svg(landmarks: &Landmarks, resolution: Resolution) -> String {
    let mut svg = String::new();
    // Writing to a `String` can't fail.
    write!(
        svg,
        r#"<svg width="{}" height="{}">"#,
        resolution.width(),
        resolution.height()
    )
    .ok();
    for [x, y, _] in landmarks.positions() {
        write!(svg, r#"<circle cx="{x}" cy="{y}" r="2" />"#).ok();
    }
    for &(a, b) in CONNECTIVITY {
        let [x1, y1, _] = landmarks[a];
        let [x2, y2, _] = landmarks[b];
        write!(
            svg,
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="red" stroke-width="1" />"#
        )
        .ok();
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use crate::landmark::{LandmarkIdx, NUM_LANDMARKS};

    use super::*;

    #[test]
    fn document_structure() {
        let mut lms = Landmarks::default();
        lms.positions_mut()[LandmarkIdx::ThumbCmc as usize] = [10.5, 20.0, 0.3];
        let svg = to_svg(&lms, Resolution::new(176, 144));

        assert!(svg.starts_with(r#"<svg width="176" height="144">"#));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), NUM_LANDMARKS);
        assert_eq!(svg.matches("<line").count(), CONNECTIVITY.len());
        assert!(svg.contains(r#"<circle cx="10.5" cy="20" r="2" />"#));
        // The first connection goes from the wrist to the thumb's CMC.
        assert!(svg.contains(r#"<line x1="0" y1="0" x2="10.5" y2="20" "#));
    }

    #[test]
    fn closure_sink() {
        let mut seen = 0;
        let mut sink = |_: &Landmarks| seen += 1;
        sink.update(&Landmarks::default());
        sink.update(&Landmarks::default());
        assert_eq!(seen, 2);
    }
}
