//! Renderer-facing scene data.
//!
//! A [`SceneUpdate`] is the complete per-frame output of a
//! [`MorphController`](crate::animation::MorphController): one
//! [`AtomInstance`] per atom slot and one [`BondInstance`] per bond slot,
//! including slots that are currently fading in or out. Instances are
//! `#[repr(C)]` + [`bytemuck::Pod`] so a GPU renderer can upload the slices
//! directly with [`bytemuck::cast_slice`].

pub mod bond_geometry;

use std::io::Write;

pub use bond_geometry::{find_perpendicular, BondGeometry};
use glam::{Quat, Vec3};
use serde::Serialize;

use crate::error::MorphError;

/// Per-instance data for one atom sphere.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize,
)]
pub struct AtomInstance {
    /// Sphere center.
    pub position: [f32; 3],
    /// Sphere radius.
    pub radius: f32,
    /// RGB color.
    pub color: [f32; 3],
    /// 0.0 = invisible, 1.0 = fully opaque.
    pub opacity: f32,
}

impl AtomInstance {
    /// Sphere center as a vector.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Whether the atom contributes anything to the frame.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Per-instance data for one bond cylinder.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize,
)]
pub struct BondInstance {
    /// Start of the visible segment.
    pub endpoint_a: [f32; 3],
    /// End of the visible segment.
    pub endpoint_b: [f32; 3],
    /// Cylinder center.
    pub midpoint: [f32; 3],
    /// Quaternion (xyzw) rotating +Y onto the bond axis.
    pub orientation: [f32; 4],
    /// Cylinder length.
    pub length: f32,
    /// Cylinder radius.
    pub radius: f32,
    /// 0.0 = invisible, 1.0 = fully opaque.
    pub opacity: f32,
    /// Bond order code (1 single, 2 double, 3 triple, others as parsed).
    pub order: u32,
}

impl BondInstance {
    /// Instance for `geometry` with the given style.
    #[must_use]
    pub fn from_geometry(
        geometry: &BondGeometry,
        radius: f32,
        opacity: f32,
        order: u32,
    ) -> Self {
        Self {
            endpoint_a: geometry.endpoint_a.to_array(),
            endpoint_b: geometry.endpoint_b.to_array(),
            midpoint: geometry.midpoint.to_array(),
            orientation: geometry.orientation.to_array(),
            length: geometry.length,
            radius,
            opacity,
            order,
        }
    }

    /// Rotation from +Y onto the bond axis.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_array(self.orientation)
    }

    /// Offsets of the parallel strands a renderer draws for this bond's
    /// order, perpendicular to the bond axis and `spacing` apart. Single and
    /// unrecognized orders yield one centered strand.
    #[must_use]
    pub fn strand_offsets(&self, spacing: f32) -> Vec<Vec3> {
        let perp = find_perpendicular(self.rotation() * Vec3::Y) * spacing;
        match self.order {
            2 => vec![perp * 0.5, -perp * 0.5],
            3 => vec![Vec3::ZERO, perp, -perp],
            _ => vec![Vec3::ZERO],
        }
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SceneUpdate {
    /// Sequence index the current transition started from.
    pub from_index: Option<usize>,
    /// Sequence index the current transition is heading to.
    pub to_index: Option<usize>,
    /// Raw transition progress in [0, 1].
    pub progress: f32,
    /// Whether a transition is still running.
    pub playing: bool,
    /// One entry per atom slot.
    pub atoms: Vec<AtomInstance>,
    /// One entry per bond slot.
    pub bonds: Vec<BondInstance>,
}

impl SceneUpdate {
    /// Atom instances as raw bytes for GPU upload.
    #[must_use]
    pub fn atom_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.atoms)
    }

    /// Bond instances as raw bytes for GPU upload.
    #[must_use]
    pub fn bond_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bonds)
    }

    /// Number of atoms with non-zero opacity.
    #[must_use]
    pub fn visible_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_visible()).count()
    }
}

/// Renderer seam: receives one [`SceneUpdate`] per frame.
pub trait SceneSink {
    /// Consume the frame's scene.
    fn submit(&mut self, update: &SceneUpdate);
}

impl SceneSink for Vec<SceneUpdate> {
    fn submit(&mut self, update: &SceneUpdate) {
        self.push(update.clone());
    }
}

/// Sink writing every update as one JSON object per line.
///
/// [`SceneSink::submit`] cannot fail, so the first write error is kept and
/// later frames are dropped; [`JsonLinesSink::finish`] reports it.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    frames: usize,
    error: Option<std::io::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            frames: 0,
            error: None,
        }
    }

    /// Frames written so far.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Flush and return the writer.
    ///
    /// # Errors
    ///
    /// [`MorphError::Io`] with the first write or flush failure.
    pub fn finish(mut self) -> Result<W, MorphError> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_line(&mut self, update: &SceneUpdate) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, update)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> SceneSink for JsonLinesSink<W> {
    fn submit(&mut self, update: &SceneUpdate) {
        if self.error.is_some() {
            return;
        }
        match self.write_line(update) {
            Ok(()) => self.frames += 1,
            Err(err) => {
                log::error!("scene output failed: {err}");
                self.error = Some(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layouts_are_packed() {
        assert_eq!(size_of::<AtomInstance>(), 32);
        assert_eq!(size_of::<BondInstance>(), 68);
    }

    #[test]
    fn byte_views_cover_all_instances() {
        let update = SceneUpdate {
            atoms: vec![AtomInstance::default(); 3],
            bonds: vec![BondInstance::default(); 2],
            ..SceneUpdate::default()
        };
        assert_eq!(update.atom_bytes().len(), 96);
        assert_eq!(update.bond_bytes().len(), 136);
    }

    #[test]
    fn strand_offsets_follow_order() {
        let g = BondGeometry::between(
            Vec3::ZERO,
            0.0,
            Vec3::X,
            0.0,
            1.0,
            0.001,
        );
        let double = BondInstance::from_geometry(&g, 0.02, 1.0, 2);
        let offsets = double.strand_offsets(0.1);
        assert_eq!(offsets.len(), 2);
        assert!(((offsets[0] - offsets[1]).length() - 0.1).abs() < 1e-6);
        assert!(offsets[0].dot(Vec3::X).abs() < 1e-6);

        let single = BondInstance::from_geometry(&g, 0.02, 1.0, 1);
        assert_eq!(single.strand_offsets(0.1), vec![Vec3::ZERO]);
        let triple = BondInstance::from_geometry(&g, 0.02, 1.0, 3);
        assert_eq!(triple.strand_offsets(0.1).len(), 3);
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let update = SceneUpdate {
            to_index: Some(1),
            progress: 0.5,
            playing: true,
            atoms: vec![AtomInstance {
                position: [1.0, 2.0, 3.0],
                radius: 0.1,
                color: [1.0, 1.0, 1.0],
                opacity: 1.0,
            }],
            ..SceneUpdate::default()
        };
        sink.submit(&update);
        sink.submit(&update);
        assert_eq!(sink.frames(), 2);

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["to_index"], 1);
        assert!(value["from_index"].is_null());
        assert_eq!(value["atoms"][0]["position"][2], 3.0);
    }

    #[test]
    fn collecting_sink_clones_updates() {
        let mut frames: Vec<SceneUpdate> = Vec::new();
        frames.submit(&SceneUpdate::default());
        assert_eq!(frames.len(), 1);
    }
}
