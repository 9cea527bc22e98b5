use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::feature::{Extent, FeatureBatch, FeatureKind, FeatureLayer};
use crate::rings::{ring_caption, RingColor};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

pub const CYAN: Rgba = Rgba::rgb(0x00, 0xFF, 0xF5);
pub const ORANGE: Rgba = Rgba::rgb(0xFF, 0x6B, 0x35);
pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Style {
    Fill {
        fill: Rgba,
        outline: Rgba,
        outline_width: f64,
        dashed: bool,
    },
    Line {
        color: Rgba,
        width: f64,
        dashed: bool,
    },
    Marker {
        color: Rgba,
        size: f64,
        outline: Rgba,
        outline_width: f64,
    },
}

impl Style {
    /// Stroke or marker color, the one a legend would show.
    pub fn primary_color(&self) -> Rgba {
        match self {
            Style::Fill { outline, .. } => *outline,
            Style::Line { color, .. } => *color,
            Style::Marker { color, .. } => *color,
        }
    }
}

fn marker(color: Rgba) -> Style {
    Style::Marker {
        color,
        size: 3.0,
        outline: WHITE,
        outline_width: 0.5,
    }
}

/// Symbology for a feature kind. Rings take their gradient color when one
/// was assigned.
pub fn style_for(kind: FeatureKind, ring_color: Option<&RingColor>) -> Style {
    match kind {
        FeatureKind::Observer | FeatureKind::RingCenter => marker(CYAN),
        FeatureKind::ProjectionPoint => marker(ORANGE),
        FeatureKind::Horizon => Style::Fill {
            fill: CYAN.with_alpha(30),
            outline: CYAN,
            outline_width: 0.5,
            dashed: false,
        },
        FeatureKind::ObjectVisible => Style::Fill {
            fill: ORANGE.with_alpha(30),
            outline: ORANGE,
            outline_width: 0.5,
            dashed: true,
        },
        FeatureKind::ProjectionLine => Style::Line {
            color: ORANGE,
            width: 1.0,
            dashed: true,
        },
        FeatureKind::Ring => match ring_color {
            Some(color) => {
                let (r, g, b) = color.rgb;
                Style::Fill {
                    fill: Rgba::rgb(r, g, b).with_alpha(30),
                    outline: Rgba::rgb(r, g, b),
                    outline_width: 0.3,
                    dashed: false,
                }
            }
            None => Style::Fill {
                fill: CYAN.with_alpha(20),
                outline: CYAN,
                outline_width: 0.3,
                dashed: false,
            },
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub font_size_pt: f64,
    pub bold: bool,
    pub color: Rgba,
    pub buffer_size: f64,
    pub buffer_color: Rgba,
}

pub const RING_LABEL_STYLE: LabelStyle = LabelStyle {
    font_size_pt: 8.0,
    bold: true,
    color: CYAN,
    buffer_size: 0.5,
    buffer_color: BLACK,
};

/// One entry of a categorized renderer: features whose `ring` attribute
/// equals `value` are drawn with `style` and listed in the legend as
/// `caption`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCategory {
    pub value: u32,
    pub style: Style,
    pub caption: String,
}

/// The map canvas / layer registry of the hosting application.
pub trait MapHost {
    /// Registers a layer. `style` applies to every feature in it unless
    /// `categories` is non-empty (gradient rings).
    fn add_layer(&mut self, layer: &FeatureLayer, style: Style, categories: &[StyleCategory], labels: Option<LabelStyle>);
    fn zoom_to(&mut self, extent: Extent);
    fn remove_layer(&mut self, name: &str);
}

fn layer_styles(layer: &FeatureLayer) -> (Style, Vec<StyleCategory>) {
    let Some(first) = layer.features().first() else {
        return (marker(CYAN), Vec::new());
    };
    if first.kind() != FeatureKind::Ring || first.attribute("color").is_none() {
        return (style_for(first.kind(), None), Vec::new());
    }

    let count = layer.features().len() as u32;
    let categories = layer
        .features()
        .iter()
        .map(|f| {
            let value = f.real("ring").map(|i| i as u32).unwrap_or(1);
            let distance_nm = f.real("distance_nm").unwrap_or_default();
            StyleCategory {
                value,
                style: style_for(FeatureKind::Ring, Some(&RingColor::for_ring(value, count))),
                caption: ring_caption(distance_nm),
            }
        })
        .collect();
    (style_for(FeatureKind::Ring, None), categories)
}

/// Hands a batch to the host: one styled layer each, then a zoom to the
/// combined extent. The batch is recorded in `session` afterwards.
pub fn present<H: MapHost>(host: &mut H, session: &mut Session, batch: &FeatureBatch) {
    for layer in batch.layers() {
        let (style, categories) = layer_styles(layer);
        let labels = (batch.labels_enabled() && layer.features().iter().any(|f| f.attribute("label").is_some()))
            .then_some(RING_LABEL_STYLE);
        host.add_layer(layer, style, &categories, labels);
    }
    if let Some(extent) = batch.extent() {
        host.zoom_to(extent);
    }
    session.record(batch);
    debug!("Presented {} layers, session holds {}", batch.layers().len(), session.len());
}

/// Unregisters every session layer from the host. Returns how many went.
pub fn clear<H: MapHost>(host: &mut H, session: &mut Session) -> usize {
    let layers = session.clear();
    for layer in &layers {
        host.remove_layer(layer.name());
    }
    layers.len()
}
