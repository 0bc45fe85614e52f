//! Scalar value providers for shape function parameters
//!
//! A parameter can be a constant, a random value or a curve sampled along the
//! parent stem. Properties are stateless: randomness comes from the RNG of
//! the function evaluating them, one draw per evaluation.

use crate::math::SimpleRng;

/// Always returns the same value
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantProperty {
    pub value: f32,
}

impl ConstantProperty {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

/// Uniform random value in `[min, max]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomProperty {
    pub min: f32,
    pub max: f32,
}

impl RandomProperty {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

impl Default for RandomProperty {
    fn default() -> Self {
        Self { min: 0.01, max: 1.0 }
    }
}

/// Ease curve `y_min + (y_max - y_min) * t^power` over the stem position `t`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimpleCurveProperty {
    pub y_min: f32,
    pub y_max: f32,
    pub power: f32,
}

impl SimpleCurveProperty {
    pub fn new(y_min: f32, y_max: f32, power: f32) -> Self {
        Self { y_min, y_max, power }
    }
}

impl Default for SimpleCurveProperty {
    fn default() -> Self {
        Self { y_min: 0.01, y_max: 1.0, power: 1.0 }
    }
}

/// Any property variant
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Property {
    Constant(ConstantProperty),
    Random(RandomProperty),
    SimpleCurve(SimpleCurveProperty),
}

impl Property {
    /// Evaluate at `position` in [0, 1] along the stem
    pub fn evaluate(&self, position: f32, rng: &mut SimpleRng) -> f32 {
        match self {
            Property::Constant(p) => p.value,
            Property::Random(p) => p.min + rng.next_float() * (p.max - p.min),
            Property::SimpleCurve(p) => {
                let t = position.clamp(0.0, 1.0);
                p.y_min + (p.y_max - p.y_min) * t.powf(p.power)
            }
        }
    }
}

impl Default for Property {
    fn default() -> Self {
        Property::Constant(ConstantProperty::default())
    }
}

impl From<ConstantProperty> for Property {
    fn from(p: ConstantProperty) -> Self {
        Property::Constant(p)
    }
}

impl From<RandomProperty> for Property {
    fn from(p: RandomProperty) -> Self {
        Property::Random(p)
    }
}

impl From<SimpleCurveProperty> for Property {
    fn from(p: SimpleCurveProperty) -> Self {
        Property::SimpleCurve(p)
    }
}

/// Owning holder for a single [`Property`], so function fields accept a raw
/// constant or any variant uniformly.
///
/// A default wrapper behaves as the constant `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PropertyWrapper {
    property: Property,
}

impl PropertyWrapper {
    pub fn new(property: impl Into<Property>) -> Self {
        Self { property: property.into() }
    }

    pub fn constant(value: f32) -> Self {
        Self::new(ConstantProperty::new(value))
    }

    pub fn set_constant_property(&mut self, property: ConstantProperty) {
        self.property = Property::Constant(property);
    }

    pub fn set_property(&mut self, property: impl Into<Property>) {
        self.property = property.into();
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    pub fn evaluate(&self, position: f32, rng: &mut SimpleRng) -> f32 {
        self.property.evaluate(position, rng)
    }
}

impl From<f32> for PropertyWrapper {
    fn from(value: f32) -> Self {
        Self::constant(value)
    }
}

impl From<Property> for PropertyWrapper {
    fn from(property: Property) -> Self {
        Self { property }
    }
}

impl From<ConstantProperty> for PropertyWrapper {
    fn from(p: ConstantProperty) -> Self {
        Self::new(p)
    }
}

impl From<RandomProperty> for PropertyWrapper {
    fn from(p: RandomProperty) -> Self {
        Self::new(p)
    }
}

impl From<SimpleCurveProperty> for PropertyWrapper {
    fn from(p: SimpleCurveProperty) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_ignores_position_and_rng() {
        let mut rng = SimpleRng::new(1);
        let p = PropertyWrapper::constant(2.5);
        assert_eq!(p.evaluate(0.0, &mut rng), 2.5);
        assert_eq!(p.evaluate(1.0, &mut rng), 2.5);
    }

    #[test]
    fn test_default_wrapper_is_zero() {
        let mut rng = SimpleRng::new(1);
        assert_eq!(PropertyWrapper::default().evaluate(0.5, &mut rng), 0.0);
    }

    #[test]
    fn test_random_in_range_and_deterministic() {
        let p = PropertyWrapper::new(RandomProperty::new(2.0, 3.0));
        let mut a = SimpleRng::from_seed(9);
        let mut b = SimpleRng::from_seed(9);
        for _ in 0..100 {
            let va = p.evaluate(0.3, &mut a);
            assert!((2.0..=3.0).contains(&va));
            assert_eq!(va, p.evaluate(0.3, &mut b));
        }
    }

    #[test]
    fn test_curve_endpoints_and_clamp() {
        let mut rng = SimpleRng::new(0);
        let p = PropertyWrapper::new(SimpleCurveProperty::new(1.0, 3.0, 2.0));
        assert_eq!(p.evaluate(0.0, &mut rng), 1.0);
        assert_eq!(p.evaluate(1.0, &mut rng), 3.0);
        assert!((p.evaluate(0.5, &mut rng) - 1.5).abs() < 1e-6);
        assert_eq!(p.evaluate(-4.0, &mut rng), 1.0);
        assert_eq!(p.evaluate(7.0, &mut rng), 3.0);
    }

    #[test]
    fn test_curve_zero_power_is_step() {
        let mut rng = SimpleRng::new(0);
        let p = PropertyWrapper::new(SimpleCurveProperty::new(0.0, 1.0, 0.0));
        assert_eq!(p.evaluate(0.0, &mut rng), 1.0);
        assert_eq!(p.evaluate(0.01, &mut rng), 1.0);
    }

    #[test]
    fn test_set_property_replaces_value() {
        let mut rng = SimpleRng::new(0);
        let mut p: PropertyWrapper = 1.0.into();
        p.set_constant_property(ConstantProperty::new(4.0));
        assert_eq!(p.evaluate(0.0, &mut rng), 4.0);
        p.set_property(SimpleCurveProperty::new(0.0, 2.0, 1.0));
        assert_eq!(p.evaluate(0.5, &mut rng), 1.0);
    }
}
