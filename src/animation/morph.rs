//! Per-frame transition state machine.
//!
//! The controller keeps a list of *atom slots*. A slot is a persistent
//! sphere in the scene; during a transition it carries one atom of the
//! source structure onto its corresponding atom of the target structure,
//! fades out when its atom has no partner, or fades in a target atom nobody
//! reached. Bond slots are rebuilt at every transition and always reference
//! atom slots, so bond cylinders follow their endpoints for free.
//!
//! Slots are only ever added (a fading-out slot may be reused later for a
//! fading-in atom once fully invisible); [`MorphController::show`] resets
//! them to exactly one slot per atom.

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};

use super::easing::EasingFunction;
use super::interpolation::{
    lerp_color, lerp_f32, lerp_position, InterpolationContext,
};
use crate::error::MorphError;
use crate::molecule::Molecule;
use crate::options::{
    AnimationOptions, ColorOptions, GeometryOptions, Options, SlotFallback,
};
use crate::scene::{AtomInstance, BondGeometry, BondInstance, SceneUpdate};
use crate::sequence::Sequence;

/// Progress within this distance of 1.0 snaps to 1.0.
const COMPLETION_EPSILON: f32 = 1e-4;

/// Smallest accepted per-tick step.
const MIN_STEP: f32 = 1e-4;

/// Where the controller stands in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MorphState {
    /// Entry the current transition started from.
    pub from_index: Option<usize>,
    /// Entry the current transition is heading to (or showing, when idle).
    pub to_index: Option<usize>,
    /// Raw progress in [0, 1].
    pub progress: f32,
    /// Whether a transition is running.
    pub playing: bool,
}

/// Interpolated attributes of one atom slot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AtomKeyframe {
    position: Vec3,
    opacity: f32,
    radius: f32,
    color: [f32; 3],
}

impl AtomKeyframe {
    const HIDDEN: Self = Self {
        position: Vec3::ZERO,
        opacity: 0.0,
        radius: 0.0,
        color: [0.0; 3],
    };

    fn lerp(&self, target: &Self, ctx: &InterpolationContext) -> Self {
        if ctx.unified_t() >= 1.0 {
            return *target;
        }
        Self {
            position: lerp_position(ctx, self.position, target.position),
            opacity: lerp_f32(ctx, self.opacity, target.opacity),
            radius: lerp_f32(ctx, self.radius, target.radius),
            color: lerp_color(ctx, self.color, target.color),
        }
    }

    const fn with_opacity(self, opacity: f32) -> Self {
        Self { opacity, ..self }
    }
}

#[derive(Debug, Clone, Copy)]
struct AtomSlot {
    /// Atom of the target structure this slot carries, if any.
    atom: Option<usize>,
    start: AtomKeyframe,
    target: AtomKeyframe,
    current: AtomKeyframe,
}

impl AtomSlot {
    const fn settled(keyframe: AtomKeyframe, atom: Option<usize>) -> Self {
        Self {
            atom,
            start: keyframe,
            target: keyframe,
            current: keyframe,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BondSlot {
    /// Endpoint atom slots.
    a: usize,
    b: usize,
    order: u8,
    start_opacity: f32,
    target_opacity: f32,
    opacity: f32,
}

impl BondSlot {
    const fn key(&self) -> (usize, usize) {
        slot_pair(self.a, self.b)
    }
}

const fn slot_pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Drives transitions between sequence entries and produces one
/// [`SceneUpdate`] per tick.
///
/// The controller owns no clock: call [`tick`](Self::tick) once per frame.
#[derive(Debug, Clone)]
pub struct MorphController {
    animation: AnimationOptions,
    geometry: GeometryOptions,
    colors: ColorOptions,
    fallback: SlotFallback,
    state: MorphState,
    atoms: Vec<AtomSlot>,
    bonds: Vec<BondSlot>,
    scene: SceneUpdate,
}

impl Default for MorphController {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl MorphController {
    /// Idle controller with nothing shown.
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            animation: options.animation.clone(),
            geometry: options.geometry.clone(),
            colors: options.colors.clone(),
            fallback: options.sequence.slot_fallback,
            state: MorphState::default(),
            atoms: Vec::new(),
            bonds: Vec::new(),
            scene: SceneUpdate::default(),
        }
    }

    /// Replace the options. Takes effect from the next tick; geometry and
    /// color changes apply to atoms placed by later transitions.
    pub fn set_options(&mut self, options: &Options) {
        self.animation = options.animation.clone();
        self.geometry = options.geometry.clone();
        self.colors = options.colors.clone();
        self.fallback = options.sequence.slot_fallback;
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> MorphState {
        self.state
    }

    /// Raw progress of the current transition.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.state.progress
    }

    /// Whether a transition is running.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Entry shown (or being approached).
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.state.to_index
    }

    /// Number of atom slots, visible or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.atoms.len()
    }

    /// Latest scene.
    #[must_use]
    pub const fn scene(&self) -> &SceneUpdate {
        &self.scene
    }

    /// Snap to entry `index` without animating.
    ///
    /// # Errors
    ///
    /// [`MorphError::InvalidIndex`] if `index` is out of bounds; the
    /// controller is left unchanged.
    pub fn show(
        &mut self,
        sequence: &Sequence,
        index: usize,
    ) -> Result<(), MorphError> {
        let molecule = &sequence.entry(index)?.molecule;

        self.atoms.clear();
        let (geometry, colors) = (&self.geometry, &self.colors);
        self.atoms.extend((0..molecule.atom_count()).map(|j| {
            AtomSlot::settled(
                atom_keyframe(geometry, colors, molecule, j),
                Some(j),
            )
        }));
        self.bonds.clear();
        self.bonds.extend(molecule.bonds().iter().map(|bond| BondSlot {
            a: bond.from,
            b: bond.to,
            order: bond.order,
            start_opacity: 1.0,
            target_opacity: 1.0,
            opacity: 1.0,
        }));

        self.state = MorphState {
            from_index: Some(index),
            to_index: Some(index),
            progress: 1.0,
            playing: false,
        };
        self.rebuild_scene();
        Ok(())
    }

    /// Start a transition from whatever is on screen now to entry
    /// `to_index`.
    ///
    /// Mid-flight calls start from the current interpolated state. Without
    /// anything shown yet, every atom fades in at its target position.
    ///
    /// # Errors
    ///
    /// [`MorphError::InvalidIndex`] if `to_index` is out of bounds; the
    /// running transition is left untouched.
    pub fn begin_transition(
        &mut self,
        sequence: &Sequence,
        to_index: usize,
    ) -> Result<(), MorphError> {
        let molecule = &sequence.entry(to_index)?.molecule;
        // a stale `from` (sequence swapped underneath) just means no map
        let map = self.state.to_index.and_then(|from| {
            sequence
                .correspondence_between(from, to_index, self.fallback)
                .ok()
        });

        for slot in &mut self.atoms {
            slot.start = slot.current;
        }

        // Matched slots move to their partner, the rest fade out in place
        let (geometry, colors) = (&self.geometry, &self.colors);
        let mut slot_of_atom: Vec<Option<usize>> =
            vec![None; molecule.atom_count()];
        for (i, slot) in self.atoms.iter_mut().enumerate() {
            let dest = slot
                .atom
                .zip(map.as_ref())
                .and_then(|(atom, map)| map.get(atom))
                .filter(|&j| slot_of_atom.get(j).is_some_and(Option::is_none));
            if let Some(j) = dest {
                slot_of_atom[j] = Some(i);
                slot.atom = Some(j);
                slot.target = atom_keyframe(geometry, colors, molecule, j);
            } else {
                slot.atom = None;
                slot.target = slot.start.with_opacity(0.0);
            }
        }

        // Unreached target atoms take over invisible slots, then new ones
        let mut free = self
            .atoms
            .iter()
            .enumerate()
            .filter(|(_, s)| s.atom.is_none() && s.start.opacity <= 0.0)
            .map(|(i, _)| i)
            .collect::<Vec<_>>()
            .into_iter();
        for (j, assigned) in slot_of_atom.iter_mut().enumerate() {
            if assigned.is_some() {
                continue;
            }
            let target = atom_keyframe(geometry, colors, molecule, j);
            let slot = if let Some(i) = free.next() {
                let start = target.with_opacity(self.atoms[i].start.opacity);
                self.atoms[i] = AtomSlot {
                    atom: Some(j),
                    start,
                    target,
                    current: start,
                };
                i
            } else {
                let start = target.with_opacity(0.0);
                self.atoms.push(AtomSlot {
                    atom: Some(j),
                    start,
                    target,
                    current: start,
                });
                self.atoms.len() - 1
            };
            *assigned = Some(slot);
        }

        self.rebuild_bonds(molecule, &slot_of_atom);

        let from_index = self.state.to_index.or(Some(to_index));
        log::debug!(
            "transition {from_index:?} -> {to_index}: {} atom slots, {} bond slots",
            self.atoms.len(),
            self.bonds.len()
        );
        self.state = MorphState {
            from_index,
            to_index: Some(to_index),
            progress: 0.0,
            playing: true,
        };
        self.apply(&InterpolationContext::eased(0.0, self.animation.easing));
        Ok(())
    }

    /// Advance one frame. Returns whether the transition is still playing.
    pub fn tick(&mut self) -> bool {
        if !self.state.playing {
            return false;
        }

        let step = self.animation.step.max(MIN_STEP);
        let mut progress = (self.state.progress + step).min(1.0);
        if 1.0 - progress < COMPLETION_EPSILON {
            progress = 1.0;
        }
        self.state.progress = progress;

        self.apply(&InterpolationContext::eased(
            progress,
            self.animation.easing,
        ));

        if progress >= 1.0 {
            self.state.playing = false;
            log::debug!("transition to {:?} finished", self.state.to_index);
        }
        self.state.playing
    }

    /// Easing in use.
    #[must_use]
    pub const fn easing(&self) -> EasingFunction {
        self.animation.easing
    }

    /// One slot per target bond plus fading-out slots for visible bonds
    /// the target does not have.
    fn rebuild_bonds(
        &mut self,
        molecule: &Molecule,
        slot_of_atom: &[Option<usize>],
    ) {
        let visible: FxHashMap<(usize, usize), f32> = self
            .bonds
            .iter()
            .filter(|b| b.opacity > 0.0)
            .map(|b| (b.key(), b.opacity))
            .collect();
        let mut taken = FxHashSet::default();

        let mut bonds = Vec::with_capacity(
            molecule.bond_count() + visible.len(),
        );
        for bond in molecule.bonds() {
            let (Some(&Some(a)), Some(&Some(b))) =
                (slot_of_atom.get(bond.from), slot_of_atom.get(bond.to))
            else {
                continue;
            };
            let key = slot_pair(a, b);
            let start = visible.get(&key).copied().unwrap_or(0.0);
            let _ = taken.insert(key);
            bonds.push(BondSlot {
                a,
                b,
                order: bond.order,
                start_opacity: start,
                target_opacity: 1.0,
                opacity: start,
            });
        }
        for old in &self.bonds {
            if old.opacity > 0.0 && taken.insert(old.key()) {
                bonds.push(BondSlot {
                    start_opacity: old.opacity,
                    target_opacity: 0.0,
                    ..*old
                });
            }
        }
        self.bonds = bonds;
    }

    fn apply(&mut self, ctx: &InterpolationContext) {
        for slot in &mut self.atoms {
            slot.current = slot.start.lerp(&slot.target, ctx);
        }
        for bond in &mut self.bonds {
            bond.opacity = if ctx.unified_t() >= 1.0 {
                bond.target_opacity
            } else {
                lerp_f32(ctx, bond.start_opacity, bond.target_opacity)
            };
        }
        self.rebuild_scene();
    }

    fn rebuild_scene(&mut self) {
        let scene = &mut self.scene;
        scene.from_index = self.state.from_index;
        scene.to_index = self.state.to_index;
        scene.progress = self.state.progress;
        scene.playing = self.state.playing;

        scene.atoms.clear();
        scene.atoms.extend(self.atoms.iter().map(|slot| AtomInstance {
            position: slot.current.position.to_array(),
            radius: slot.current.radius,
            color: slot.current.color,
            opacity: slot.current.opacity,
        }));

        scene.bonds.clear();
        for bond in &self.bonds {
            let (Some(a), Some(b)) = (self.atoms.get(bond.a), self.atoms.get(bond.b))
            else {
                continue;
            };
            let geometry = BondGeometry::between(
                a.current.position,
                a.current.radius,
                b.current.position,
                b.current.radius,
                self.geometry.bond_overlap,
                self.geometry.min_bond_length,
            );
            scene.bonds.push(BondInstance::from_geometry(
                &geometry,
                self.geometry.bond_radius,
                bond.opacity,
                u32::from(bond.order),
            ));
        }
    }
}

/// Fully visible keyframe for `atom` of `molecule`.
fn atom_keyframe(
    geometry: &GeometryOptions,
    colors: &ColorOptions,
    molecule: &Molecule,
    atom: usize,
) -> AtomKeyframe {
    let (Some(&position), Some(&element)) =
        (molecule.atoms().get(atom), molecule.elements().get(atom))
    else {
        return AtomKeyframe::HIDDEN;
    };
    AtomKeyframe {
        position,
        opacity: 1.0,
        radius: geometry.radius_for(element),
        color: colors.element_color(element),
    }
}
