//! Mapping between OpenType `wght` axis values and the internal weight
//! codes used by patterns, piecewise-linear between fixed anchors.

use std::sync::LazyLock;

use ordered_float::OrderedFloat;

/// Remaps values using a series of linear mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiecewiseLinearMap {
    // these two have identical lengths, by construction
    from: Vec<OrderedFloat<f64>>,
    to: Vec<OrderedFloat<f64>>,
}

impl PiecewiseLinearMap {
    /// Create a new map from a series of (from, to) values.
    pub fn new(mut mappings: Vec<(OrderedFloat<f64>, OrderedFloat<f64>)>) -> PiecewiseLinearMap {
        mappings.sort();
        let (from, to): (Vec<_>, Vec<_>) = mappings.into_iter().unzip();
        PiecewiseLinearMap { from, to }
    }

    pub fn map(&self, value: f64) -> f64 {
        let value = OrderedFloat(value);
        match self.from.binary_search(&value) {
            Ok(idx) => self.to[idx].into_inner(),
            Err(idx) => {
                let value = value.into_inner();
                // off either end: clamp to the boundary value
                if idx == 0 {
                    return self.to[0].into_inner();
                }
                if idx == self.from.len() {
                    return self.to[idx - 1].into_inner();
                }
                let from_lhs = self.from[idx - 1].into_inner();
                let from_rhs = self.from[idx].into_inner();
                lerp(
                    self.to[idx - 1].into_inner(),
                    self.to[idx].into_inner(),
                    (value - from_lhs) / (from_rhs - from_lhs),
                )
            }
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

// OpenType wght anchors paired with internal weight codes, thin through
// extrablack
const WEIGHT_ANCHORS: &[(f64, f64)] = &[
    (0.0, 0.0),
    (100.0, 0.0),
    (200.0, 40.0),
    (300.0, 50.0),
    (350.0, 55.0),
    (380.0, 75.0),
    (400.0, 80.0),
    (500.0, 100.0),
    (600.0, 180.0),
    (700.0, 200.0),
    (800.0, 205.0),
    (900.0, 210.0),
    (1000.0, 215.0),
];

static OT_TO_CODE: LazyLock<PiecewiseLinearMap> = LazyLock::new(|| {
    PiecewiseLinearMap::new(
        WEIGHT_ANCHORS
            .iter()
            .map(|(ot, code)| (OrderedFloat(*ot), OrderedFloat(*code)))
            .collect(),
    )
});

static CODE_TO_OT: LazyLock<PiecewiseLinearMap> = LazyLock::new(|| {
    PiecewiseLinearMap::new(
        WEIGHT_ANCHORS
            .iter()
            // the duplicate code-0 anchor would fold the map back on itself
            .filter(|(ot, _)| *ot != 0.0)
            .map(|(ot, code)| (OrderedFloat(*code), OrderedFloat(*ot)))
            .collect(),
    )
});

/// OpenType `wght` value to internal weight code.
pub fn weight_from_opentype(ot: f64) -> f64 {
    OT_TO_CODE.map(ot)
}

/// Internal weight code to OpenType `wght` value.
pub fn weight_to_opentype(code: f64) -> f64 {
    CODE_TO_OT.map(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_round_trip() {
        for (ot, code) in WEIGHT_ANCHORS.iter().skip(1) {
            assert_eq!(weight_from_opentype(*ot), *code, "ot {ot}");
            assert_eq!(weight_to_opentype(*code), *ot, "code {code}");
        }
    }

    #[test]
    fn bold_is_700() {
        assert_eq!(weight_to_opentype(200.0), 700.0);
        assert_eq!(weight_from_opentype(700.0), 200.0);
    }

    #[test]
    fn lerps_between_anchors() {
        // halfway between regular (400 -> 80) and medium (500 -> 100)
        assert_eq!(weight_from_opentype(450.0), 90.0);
        assert_eq!(weight_to_opentype(90.0), 450.0);
    }

    #[test]
    fn clamps_off_the_ends() {
        assert_eq!(weight_from_opentype(-5.0), 0.0);
        assert_eq!(weight_from_opentype(1200.0), 215.0);
        assert_eq!(weight_to_opentype(500.0), 1000.0);
    }
}
