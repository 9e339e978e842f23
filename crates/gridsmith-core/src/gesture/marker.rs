use crate::geometry::Feature;

/// True if a pen stroke may step from `from` to `to`: both are lattice points
/// of the same class and at most one step apart on each axis.
pub fn is_valid_line_marker(from: &Feature, to: &Feature) -> bool {
    let (a, b) = match (from, to) {
        (Feature::Corner(a), Feature::Corner(b)) | (Feature::Cell(a), Feature::Cell(b)) => (a, b),
        _ => return false,
    };
    a.is_king_neighbor(*b)
}
