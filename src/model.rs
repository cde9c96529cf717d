//! Domain model for annotation boxes on a transformer thermal image.
//!
//! All geometry is stored in image-pixel coordinates with the origin at the
//! top-left corner of the image. Conversion to and from screen coordinates
//! happens in the canvas layer only.

use std::fmt;

use egui::Pos2;

/// Minimum edge length of a committed box, in image pixels.
pub const MIN_BOX_SIZE: f32 = 10.0;

// ── Fault types ─────────────────────────────────────────────────────────────

/// The fault categories the backend understands. The wire format is the
/// human-readable label string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultType {
    LooseJoint,
    PointOverload,
    FullWireOverload,
    TinyFaultySpot,
    TinyPotentialSpot,
    CustomAnomaly,
}

impl FaultType {
    pub const ALL: [FaultType; 6] = [
        FaultType::LooseJoint,
        FaultType::PointOverload,
        FaultType::FullWireOverload,
        FaultType::TinyFaultySpot,
        FaultType::TinyPotentialSpot,
        FaultType::CustomAnomaly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FaultType::LooseJoint => "Loose Joint (Faulty)",
            FaultType::PointOverload => "Point Overload (Faulty)",
            FaultType::FullWireOverload => "Full Wire Overload (Faulty)",
            FaultType::TinyFaultySpot => "Tiny Faulty Spot",
            FaultType::TinyPotentialSpot => "Tiny Potential Spot",
            FaultType::CustomAnomaly => "Custom Anomaly",
        }
    }

    /// Unrecognized labels collapse to the catch-all category, mirroring the
    /// backend's default for blank types.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == label)
            .unwrap_or(FaultType::CustomAnomaly)
    }

    /// "Potential" faults render yellow instead of the provenance color.
    pub fn is_potential(&self) -> bool {
        self.label().contains("Potential")
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Provenance ──────────────────────────────────────────────────────────────

/// Where a box came from. Detector output always carries a confidence in
/// [0,1]; hand-drawn boxes never do. This variant is the only source of
/// truth for the user-added/AI-generated distinction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Provenance {
    Detected { confidence: f64 },
    Manual,
}

impl Provenance {
    pub fn from_confidence(confidence: Option<f64>) -> Self {
        match confidence {
            Some(confidence) => Provenance::Detected { confidence },
            None => Provenance::Manual,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Provenance::Detected { confidence } => Some(*confidence),
            Provenance::Manual => None,
        }
    }

    pub fn is_user_added(&self) -> bool {
        matches!(self, Provenance::Manual)
    }
}

// ── Change tracking ─────────────────────────────────────────────────────────

/// Per-box change marker reported to the backend on save. Deleted boxes are
/// dropped from the working set instead of being tagged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxAction {
    Unchanged,
    Added,
    Modified,
}

impl BoxAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxAction::Unchanged => "UNCHANGED",
            BoxAction::Added => "ADDED",
            BoxAction::Modified => "MODIFIED",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ADDED" => BoxAction::Added,
            "MODIFIED" => BoxAction::Modified,
            _ => BoxAction::Unchanged,
        }
    }
}

// ── Identity ────────────────────────────────────────────────────────────────

/// Stable in-session identity. Boxes loaded from the backend keep their
/// database id; boxes drawn this session get a timestamp-based local id
/// until the next save replaces the set server-side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxId {
    Server(i64),
    Local(i64),
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxId::Server(id) => write!(f, "{id}"),
            BoxId::Local(id) => write!(f, "new-{id}"),
        }
    }
}

/// Generates local ids from the wall clock, bumping on collision so two
/// boxes drawn within the same millisecond stay distinct.
#[derive(Debug, Default)]
pub struct LocalIdGen {
    last: i64,
}

impl LocalIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> BoxId {
        let mut stamp = chrono::Utc::now().timestamp_millis();
        if stamp <= self.last {
            stamp = self.last + 1;
        }
        self.last = stamp;
        BoxId::Local(stamp)
    }
}

// ── Geometry ────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in image pixels: top-left corner plus extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle between two drag corners; dragging in any of the
    /// four directions yields non-negative extents.
    pub fn from_corners(a: Pos2, b: Pos2) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Pos2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn translated(&self, delta: egui::Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..*self
        }
    }

    /// Enforce the minimum size, then keep the rectangle fully inside the
    /// image. Out-of-bounds geometry is clamped, never rejected.
    pub fn clamp_to(&self, image_size: (f32, f32), min_size: f32) -> Self {
        let (image_w, image_h) = image_size;
        let width = self.width.max(min_size).min(image_w);
        let height = self.height.max(min_size).min(image_h);
        Self {
            x: self.x.clamp(0.0, (image_w - width).max(0.0)),
            y: self.y.clamp(0.0, (image_h - height).max(0.0)),
            width,
            height,
        }
    }
}

// ── Boxes ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationBox {
    pub id: BoxId,
    pub rect: Rect,
    pub fault_type: FaultType,
    pub provenance: Provenance,
    pub action: BoxAction,
    pub comments: String,
}

impl AnnotationBox {
    /// Label text drawn above the box on the canvas.
    pub fn label(&self) -> String {
        match self.provenance {
            Provenance::Detected { confidence } => {
                format!("{} ({:.1}%)", self.fault_type, confidence * 100.0)
            }
            Provenance::Manual => self.fault_type.label().to_string(),
        }
    }

    /// Geometry and type edits flag the box for the backend, but a box added
    /// this session stays `Added` no matter how often it is edited.
    pub fn mark_modified(&mut self) {
        if self.action != BoxAction::Added {
            self.action = BoxAction::Modified;
        }
    }

    pub fn is_user_added(&self) -> bool {
        self.provenance.is_user_added()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_fault_type_labels_round_trip() {
        for fault_type in FaultType::ALL {
            assert_eq!(FaultType::from_label(fault_type.label()), fault_type);
        }
    }

    #[test]
    fn test_unknown_fault_type_becomes_custom_anomaly() {
        assert_eq!(
            FaultType::from_label("Hotspot Cluster"),
            FaultType::CustomAnomaly
        );
    }

    #[test]
    fn test_only_tiny_potential_spot_is_potential() {
        let potential: Vec<FaultType> = FaultType::ALL
            .into_iter()
            .filter(FaultType::is_potential)
            .collect();
        assert_eq!(potential, vec![FaultType::TinyPotentialSpot]);
    }

    #[test]
    fn test_provenance_from_nullable_confidence() {
        assert_eq!(
            Provenance::from_confidence(Some(0.83)),
            Provenance::Detected { confidence: 0.83 }
        );
        assert_eq!(Provenance::from_confidence(None), Provenance::Manual);
        assert!(Provenance::Manual.is_user_added());
        assert!(!Provenance::Detected { confidence: 0.5 }.is_user_added());
    }

    #[test]
    fn test_box_action_parse_defaults_to_unchanged() {
        assert_eq!(BoxAction::parse("ADDED"), BoxAction::Added);
        assert_eq!(BoxAction::parse("MODIFIED"), BoxAction::Modified);
        assert_eq!(BoxAction::parse("UNCHANGED"), BoxAction::Unchanged);
        assert_eq!(BoxAction::parse("REMOVED"), BoxAction::Unchanged);
    }

    #[test]
    fn test_rect_from_corners_normalizes_all_directions() {
        let expected = Rect::new(10.0, 20.0, 30.0, 40.0);
        let a = pos2(10.0, 20.0);
        let b = pos2(40.0, 60.0);
        assert_eq!(Rect::from_corners(a, b), expected);
        assert_eq!(Rect::from_corners(b, a), expected);
        assert_eq!(
            Rect::from_corners(pos2(40.0, 20.0), pos2(10.0, 60.0)),
            expected
        );
        assert_eq!(
            Rect::from_corners(pos2(10.0, 60.0), pos2(40.0, 20.0)),
            expected
        );
    }

    #[test]
    fn test_clamp_keeps_rect_inside_image() {
        let clamped = Rect::new(750.0, -5.0, 100.0, 40.0).clamp_to((800.0, 600.0), MIN_BOX_SIZE);
        assert_eq!(clamped, Rect::new(700.0, 0.0, 100.0, 40.0));
    }

    #[test]
    fn test_clamp_enforces_minimum_size() {
        let clamped = Rect::new(50.0, 50.0, 2.0, 4.0).clamp_to((800.0, 600.0), MIN_BOX_SIZE);
        assert_eq!(clamped.width, MIN_BOX_SIZE);
        assert_eq!(clamped.height, MIN_BOX_SIZE);
    }

    #[test]
    fn test_local_id_gen_is_collision_proof() {
        let mut ids = LocalIdGen::new();
        let a = ids.next();
        let b = ids.next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_label_includes_confidence_percentage() {
        let detected = AnnotationBox {
            id: BoxId::Server(7),
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            fault_type: FaultType::LooseJoint,
            provenance: Provenance::Detected { confidence: 0.835 },
            action: BoxAction::Unchanged,
            comments: String::new(),
        };
        assert_eq!(detected.label(), "Loose Joint (Faulty) (83.5%)");

        let manual = AnnotationBox {
            provenance: Provenance::Manual,
            ..detected
        };
        assert_eq!(manual.label(), "Loose Joint (Faulty)");
    }

    #[test]
    fn test_mark_modified_never_downgrades_added() {
        let mut added = AnnotationBox {
            id: BoxId::Local(1),
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            fault_type: FaultType::CustomAnomaly,
            provenance: Provenance::Manual,
            action: BoxAction::Added,
            comments: String::new(),
        };
        added.mark_modified();
        assert_eq!(added.action, BoxAction::Added);

        let mut unchanged = AnnotationBox {
            action: BoxAction::Unchanged,
            ..added.clone()
        };
        unchanged.mark_modified();
        assert_eq!(unchanged.action, BoxAction::Modified);
    }
}
