//! Colour scales for hierarchy nodes.
//!
//! Colormaps are piecewise-linear over evenly spaced anchors and sampled through a 256-entry
//! lookup table, so the same value always yields the same hex code.

const LUT_SIZE: usize = 256;

/// Neutral grey for GSEA nodes that do not pass the significance threshold.
pub const NOT_SIGNIFICANT_GRAY: &str = "#b4b4b4";
/// Lighter grey for GSEA nodes without a result.
pub const UNMAPPED_GRAY: &str = "#dadada";
/// Grey for ORA nodes that are unmapped or not significant.
pub const ORA_GRAY: &str = "#94989c";

/// Fixed q-value window of the ORA scale.
pub const ORA_NORM_MIN: f64 = -0.01;
pub const ORA_NORM_MAX: f64 = 0.05;

/// Blue (negative) to red (positive) diverging scale used for GSEA scores.
const DIVERGING_ANCHORS: [(f64, f64, f64); 9] = [
    (0.2519971417644415, 0.4987337088076726, 0.5751602783606602),
    (0.43026136111758173, 0.6200066482697917, 0.6787801878373952),
    (0.6085255804707219, 0.7412795877319109, 0.7824000973141302),
    (0.786789799823862, 0.86255252719403, 0.8860200067908652),
    (0.95, 0.95, 0.95),
    (0.954577257933482, 0.7665309859226215, 0.7803256889894359),
    (0.9197182699854205, 0.5873587656270927, 0.6117400023569117),
    (0.884859282037359, 0.40818654533156384, 0.4431543157243877),
    (0.8510408608937171, 0.23436274952246883, 0.2796010376480583),
];

/// ColorBrewer sequential reds, light to dark.
const REDS_ANCHORS: [(f64, f64, f64); 9] = [
    (1.0, 0.960_784_313_725_490_2, 0.941_176_470_588_235_3),
    (0.996_078_431_372_549, 0.878_431_372_549_019_6, 0.823_529_411_764_705_8),
    (0.988_235_294_117_647_1, 0.733_333_333_333_333_3, 0.631_372_549_019_607_8),
    (0.988_235_294_117_647_1, 0.572_549_019_607_843_1, 0.447_058_823_529_411_8),
    (0.984_313_725_490_196, 0.415_686_274_509_803_94, 0.290_196_078_431_372_57),
    (0.937_254_901_960_784_3, 0.231_372_549_019_607_85, 0.172_549_019_607_843_13),
    (0.796_078_431_372_549, 0.094_117_647_058_823_53, 0.113_725_490_196_078_43),
    (0.647_058_823_529_411_8, 0.058_823_529_411_764_705, 0.082_352_941_176_470_58),
    (0.403_921_568_627_451, 0.0, 0.050_980_392_156_862_74),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub fn to_hex(self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.0),
            channel(self.1),
            channel(self.2)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Colormap {
    anchors: Vec<Rgb>,
}

impl Colormap {
    pub fn from_anchors(anchors: &[(f64, f64, f64)]) -> Self {
        Colormap {
            anchors: anchors.iter().map(|&(r, g, b)| Rgb(r, g, b)).collect(),
        }
    }

    pub fn diverging() -> Self {
        Self::from_anchors(&DIVERGING_ANCHORS)
    }

    pub fn reds() -> Self {
        Self::from_anchors(&REDS_ANCHORS)
    }

    pub fn reversed(mut self) -> Self {
        self.anchors.reverse();
        self
    }

    /// Colour at `x` in `[0, 1]`; values outside the interval take the end colours.
    pub fn sample(&self, x: f64) -> Rgb {
        match self.anchors.len() {
            0 => return Rgb(0.0, 0.0, 0.0),
            1 => return self.anchors[0],
            _ => {}
        }

        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        let lut_index = ((x * LUT_SIZE as f64) as usize).min(LUT_SIZE - 1);
        let t = lut_index as f64 / (LUT_SIZE - 1) as f64;

        let segments = (self.anchors.len() - 1) as f64;
        let position = t * segments;
        let lower = (position.floor() as usize).min(self.anchors.len() - 2);
        let frac = position - lower as f64;

        let Rgb(r0, g0, b0) = self.anchors[lower];
        let Rgb(r1, g1, b1) = self.anchors[lower + 1];
        Rgb(
            r0 + (r1 - r0) * frac,
            g0 + (g1 - g0) * frac,
            b0 + (b1 - b0) * frac,
        )
    }
}

/// Linear map of `[vmin, vmax]` onto `[0, 1]`. A degenerate range maps everything to 0.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Normalize { vmin, vmax }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.vmax == self.vmin {
            0.0
        } else {
            (value - self.vmin) / (self.vmax - self.vmin)
        }
    }
}
