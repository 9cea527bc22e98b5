use palette::{Hsv, IntoColor, Srgb};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeodesyError, Result};
use crate::geo::{nm_to_km, GeoPoint};
use crate::geometry::circle::{generate_circle, DEFAULT_SEGMENTS};

/// Hue of the innermost bound of the gradient (green).
const GRADIENT_START_HUE: f64 = 120.0;
const GRADIENT_SATURATION: u8 = 180;
const GRADIENT_VALUE: u8 = 200;
const GRADIENT_ALPHA: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RingOptions {
    #[serde(default)]
    pub gradient: bool,
    #[serde(default)]
    pub labels: bool,
}

/// Gradient color of one ring, HSV components on the 0..=255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingColor {
    pub hue: f64,
    pub saturation: u8,
    pub value: u8,
    pub alpha: u8,
    pub rgb: (u8, u8, u8),
}

impl RingColor {
    /// Color of ring `index` out of `ring_count`: green towards the center,
    /// red on the outermost ring.
    pub fn for_ring(index: u32, ring_count: u32) -> Self {
        let hue = GRADIENT_START_HUE - (index as f64 * GRADIENT_START_HUE / ring_count as f64);

        // Integer-degree hue, as the host color API receives it.
        let hsv: Hsv = Hsv::new(
            hue.trunc() as f32,
            GRADIENT_SATURATION as f32 / 255.0,
            GRADIENT_VALUE as f32 / 255.0,
        );
        let rgb: Srgb = hsv.into_color();
        let rgb: Srgb<u8> = rgb.into_format();

        Self {
            hue,
            saturation: GRADIENT_SATURATION,
            value: GRADIENT_VALUE,
            alpha: GRADIENT_ALPHA,
            rgb: (rgb.red, rgb.green, rgb.blue),
        }
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.rgb.0, self.rgb.1, self.rgb.2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSpec {
    pub index: u32,
    pub distance_nm: f64,
    pub distance_km: f64,
    pub color: Option<RingColor>,
    pub label: Option<String>,
}

impl RingSpec {
    /// Legend caption for the ring's style category.
    pub fn caption(&self) -> String {
        ring_caption(self.distance_nm)
    }
}

pub fn ring_caption(distance_nm: f64) -> String {
    format!("{} NM", distance_nm)
}

pub fn ring_label(index: u32, distance_nm: f64) -> String {
    format!("Ring {} ({} NM)", index, distance_nm)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub spec: RingSpec,
    pub polygon: Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSet {
    pub center: GeoPoint,
    pub interval_nm: f64,
    pub options: RingOptions,
    pub rings: Vec<Ring>,
}

impl RingSet {
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn outer_distance_km(&self) -> Option<f64> {
        self.rings.last().map(|r| r.spec.distance_km)
    }
}

/// Concentric range rings every `interval_nm`, innermost first.
pub fn build_rings(
    center: GeoPoint,
    ring_count: u32,
    interval_nm: f64,
    options: RingOptions,
) -> Result<RingSet> {
    if ring_count == 0 {
        return Err(GeodesyError::invalid(
            "ring_count",
            ring_count as f64,
            "at least one ring is required",
        ));
    }
    if !interval_nm.is_finite() || interval_nm <= 0.0 {
        return Err(GeodesyError::invalid(
            "interval_nm",
            interval_nm,
            "ring spacing must be positive",
        ));
    }

    let rings = (1..=ring_count)
        .map(|index| {
            let distance_nm = index as f64 * interval_nm;
            let distance_km = nm_to_km(distance_nm);
            let polygon = generate_circle(center, distance_km, DEFAULT_SEGMENTS)?;
            let spec = RingSpec {
                index,
                distance_nm,
                distance_km,
                color: options.gradient.then(|| RingColor::for_ring(index, ring_count)),
                label: options.labels.then(|| ring_label(index, distance_nm)),
            };
            Ok(Ring { spec, polygon })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Built {} rings every {} NM around {}",
        rings.len(),
        interval_nm,
        center
    );

    Ok(RingSet {
        center,
        interval_nm,
        options,
        rings,
    })
}
