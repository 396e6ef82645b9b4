/// Behaviours on which historical interpreters disagree.
///
/// The defaults follow the original COSMAC VIP interpreter for the logic and
/// shift instructions and clip sprites at the screen edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// `8XY1`, `8XY2` and `8XY3` reset VF to 0.
    pub logic_resets_vf: bool,
    /// `8XY6` and `8XYE` shift VY into VX. When false, VX is shifted in place.
    pub shift_reads_vy: bool,
    /// Sprite pixels past the right or bottom edge wrap around instead of
    /// being clipped.
    pub wrap_sprites: bool,
}

impl Default for Quirks {
    fn default() -> Quirks {
        Quirks {
            logic_resets_vf: true,
            shift_reads_vy: true,
            wrap_sprites: false,
        }
    }
}
