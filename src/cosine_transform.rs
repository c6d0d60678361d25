pub mod separated;

/// Two dimensional transform of one square, row-major block in place.
pub trait DiscreteCosineTransformer {
    fn transform(&self, block: &mut [f64]);
    fn inverse_transform(&self, block: &mut [f64]);
}
