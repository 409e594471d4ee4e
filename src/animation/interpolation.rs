//! Centralized interpolation utilities for animation.

use glam::Vec3;

use super::easing::EasingFunction;

/// Per-frame interpolation context computed once from raw progress, then
/// shared by every atom and bond slot so nothing drifts out of sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationContext {
    /// Raw progress (0.0 to 1.0), as advanced by the controller.
    pub raw_t: f32,
    /// Eased progress. This is the value all interpolation uses.
    pub eased_t: f32,
}

impl InterpolationContext {
    /// Context with explicit raw and eased values.
    #[must_use]
    pub const fn simple(raw_t: f32, eased_t: f32) -> Self {
        Self { raw_t, eased_t }
    }

    /// Context for `raw_t` under `easing`.
    #[must_use]
    pub fn eased(raw_t: f32, easing: EasingFunction) -> Self {
        Self::simple(raw_t, easing.evaluate(raw_t))
    }

    /// Animation complete (t=1.0). Used when no animation is running.
    #[must_use]
    pub const fn identity() -> Self {
        Self::simple(1.0, 1.0)
    }

    /// Linear context (no easing).
    #[must_use]
    pub const fn linear(raw_t: f32) -> Self {
        Self::simple(raw_t, raw_t)
    }

    /// Unified progress value for interpolation.
    #[inline]
    #[must_use]
    pub const fn unified_t(&self) -> f32 {
        self.eased_t
    }
}

impl Default for InterpolationContext {
    fn default() -> Self {
        Self::identity()
    }
}

/// Lerp two positions using the context's unified progress.
#[inline]
#[must_use]
pub fn lerp_position(
    ctx: &InterpolationContext,
    start: Vec3,
    end: Vec3,
) -> Vec3 {
    let t = ctx.unified_t();
    start + (end - start) * t
}

/// Lerp two f32 values using the context's unified progress.
#[inline]
#[must_use]
pub fn lerp_f32(ctx: &InterpolationContext, start: f32, end: f32) -> f32 {
    let t = ctx.unified_t();
    start + (end - start) * t
}

/// Lerp two RGB colors component-wise.
#[inline]
#[must_use]
pub fn lerp_color(
    ctx: &InterpolationContext,
    start: [f32; 3],
    end: [f32; 3],
) -> [f32; 3] {
    [
        lerp_f32(ctx, start[0], end[0]),
        lerp_f32(ctx, start[1], end[1]),
        lerp_f32(ctx, start[2], end[2]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_context() {
        let ctx = InterpolationContext::identity();
        assert_eq!(ctx.raw_t, 1.0);
        assert_eq!(ctx.unified_t(), 1.0);
        assert_eq!(InterpolationContext::default(), ctx);
    }

    #[test]
    fn test_eased_context() {
        let ctx = InterpolationContext::eased(0.25, EasingFunction::QuadraticInOut);
        assert_eq!(ctx.raw_t, 0.25);
        assert!((ctx.unified_t() - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_position() {
        let ctx = InterpolationContext::linear(0.5);
        let result =
            lerp_position(&ctx, Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0));
        assert!((result - Vec3::new(5.0, 10.0, 15.0)).length() < 0.001);
    }

    #[test]
    fn test_lerp_f32_endpoints() {
        assert_eq!(lerp_f32(&InterpolationContext::linear(0.0), 2.0, 4.0), 2.0);
        assert_eq!(lerp_f32(&InterpolationContext::linear(1.0), 2.0, 4.0), 4.0);
    }

    #[test]
    fn test_lerp_color() {
        let ctx = InterpolationContext::linear(0.5);
        let c = lerp_color(&ctx, [0.0, 1.0, 0.5], [1.0, 0.0, 0.5]);
        assert_eq!(c, [0.5, 0.5, 0.5]);
    }
}
