use na::{Vector3, Vector4};
use nalgebra as na;

/// Attribute slots available to a shading program.
pub const MAX_ATTRIBUTES: usize = 8;

/// Interpolated scalars per device vertex: depth, 1/w and 3 per interpolated slot.
pub const MAX_VALUES: usize = 2 + 3 * MAX_ATTRIBUTES;

pub type Attributes = [Vector3<f32>; MAX_ATTRIBUTES];

/// How an attribute slot travels from the vertices to a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// One value per face, taken from the first vertex.
    Flat,
    /// Interpolated with 1/w weighting.
    Smooth,
    /// Interpolated linearly in screen space.
    NoPerspective,
}

/// Slot counts per kind. Slots are packed in the order flat, smooth, no-perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeLayout {
    pub flat: usize,
    pub smooth: usize,
    pub no_perspective: usize,
}

impl AttributeLayout {
    pub const fn new(flat: usize, smooth: usize, no_perspective: usize) -> Self {
        return Self { flat, smooth, no_perspective };
    }

    pub fn total(&self) -> usize {
        return self.flat + self.smooth + self.no_perspective;
    }

    /// Slots that are interpolated across the primitive.
    pub fn interpolated(&self) -> usize {
        return self.smooth + self.no_perspective;
    }

    /// Fails loudly when the layout does not fit in the fixed slot storage.
    pub fn validate(&self) {
        assert!(
            self.total() <= MAX_ATTRIBUTES,
            "attribute layout {:?} needs {} slots, only {} available",
            self,
            self.total(),
            MAX_ATTRIBUTES
        );
    }

    pub fn kind(&self, slot: usize) -> AttributeKind {
        debug_assert!(slot < self.total(), "slot {} outside layout {:?}", slot, self);
        if slot < self.flat {
            return AttributeKind::Flat;
        }
        if slot < self.flat + self.smooth {
            return AttributeKind::Smooth;
        }
        return AttributeKind::NoPerspective;
    }

    /// Offset of an interpolated slot inside the device-vertex value array.
    pub fn value_offset(&self, slot: usize) -> usize {
        debug_assert!(slot >= self.flat);
        return 2 + 3 * (slot - self.flat);
    }
}

/// Output of a vertex shader: clip-space position and attribute slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedVertex {
    pub position: Vector4<f32>,
    pub attributes: Attributes,
}

impl TransformedVertex {
    pub fn new(position: Vector4<f32>) -> Self {
        return Self { position, attributes: [Vector3::zeros(); MAX_ATTRIBUTES] };
    }

    /// Clip-space interpolation of position and every active slot.
    pub fn lerp(&self, other: &TransformedVertex, t: f32, layout: &AttributeLayout) -> TransformedVertex {
        let mut result = *self;
        result.position = self.position + (other.position - self.position) * t;
        for slot in 0..layout.total() {
            result.attributes[slot] = self.attributes[slot] + (other.attributes[slot] - self.attributes[slot]) * t;
        }
        return result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_classifies_slots_in_order() {
        let layout = AttributeLayout::new(2, 1, 3);
        layout.validate();
        assert_eq!(layout.kind(1), AttributeKind::Flat);
        assert_eq!(layout.kind(2), AttributeKind::Smooth);
        assert_eq!(layout.kind(5), AttributeKind::NoPerspective);
        assert_eq!(layout.value_offset(2), 2);
        assert_eq!(layout.value_offset(3), 5);
    }

    #[test]
    #[should_panic(expected = "slots")]
    fn oversized_layout_fails_validation() {
        AttributeLayout::new(4, 4, 1).validate();
    }

    #[test]
    fn lerp_moves_position_and_attributes() {
        let layout = AttributeLayout::new(0, 1, 0);
        let mut a = TransformedVertex::new(Vector4::new(0.0, 0.0, 0.0, 1.0));
        let mut b = TransformedVertex::new(Vector4::new(2.0, 4.0, 0.0, 3.0));
        a.attributes[0] = Vector3::new(1.0, 0.0, 0.0);
        b.attributes[0] = Vector3::new(0.0, 1.0, 0.0);
        b.attributes[1] = Vector3::new(9.0, 9.0, 9.0);
        let mid = a.lerp(&b, 0.5, &layout);
        assert_eq!(mid.position, Vector4::new(1.0, 2.0, 0.0, 2.0));
        assert_eq!(mid.attributes[0], Vector3::new(0.5, 0.5, 0.0));
        // Inactive slots are left alone.
        assert_eq!(mid.attributes[1], Vector3::zeros());
    }
}
