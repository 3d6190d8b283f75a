//! Weighted-centroid position estimation
//!
//! Aggregated scan readings are matched against the surveyed access points,
//! weighted by the active [`SignalModel`], and averaged in pixel space. The
//! estimator never draws or logs above `debug`; it returns values that the
//! presentation layer renders however it likes.

use crate::core::{
    AggregatedSample, ApId, ApRegistry, EstimatedPosition, ImageDimensions, WeightedAnchor,
};
use crate::processing::SignalModel;
use nalgebra::{Point2, Vector2};
use std::collections::HashMap;
use tracing::debug;

/// Surveyed access point scaled into pixel space
#[derive(Debug, Clone, PartialEq)]
struct SurveyedAnchor {
    label: String,
    position: Point2<f64>,
}

/// Output of one estimation cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Estimation {
    /// Weighted centroid, `None` when no reading matched a usable anchor
    pub position: Option<EstimatedPosition>,
    /// Anchors that contributed, in survey order
    pub anchors: Vec<WeightedAnchor>,
    /// Anchor with the strongest raw RSSI
    pub strongest: Option<WeightedAnchor>,
    /// Readings that matched a surveyed access point before weighting
    pub matched: usize,
}

/// Weighted-centroid estimator over a fixed survey
#[derive(Debug, Clone)]
pub struct PositionEstimator {
    survey: Vec<SurveyedAnchor>,
    index: HashMap<ApId, usize>,
    model: SignalModel,
    min_weight: f64,
    dimensions: ImageDimensions,
}

impl PositionEstimator {
    /// Scale the survey into pixel space once and fix the signal model
    pub fn new(registry: &ApRegistry, dimensions: ImageDimensions, model: SignalModel) -> Self {
        let mut survey = Vec::with_capacity(registry.len());
        let mut index = HashMap::with_capacity(registry.len());

        for record in registry.records() {
            index.insert(record.id.clone(), survey.len());
            survey.push(SurveyedAnchor {
                label: record.label.clone(),
                position: dimensions.scale(record.x, record.y),
            });
        }

        Self {
            survey,
            index,
            model,
            min_weight: 0.0,
            dimensions,
        }
    }

    /// Drop anchors whose weight is not above this threshold
    pub fn with_min_weight(mut self, min_weight: f64) -> Self {
        self.min_weight = if min_weight.is_finite() { min_weight.max(0.0) } else { 0.0 };
        self
    }

    pub fn model(&self) -> &SignalModel {
        &self.model
    }

    pub fn dimensions(&self) -> ImageDimensions {
        self.dimensions
    }

    pub fn survey_len(&self) -> usize {
        self.survey.len()
    }

    /// Estimate the device position from aggregated readings
    pub fn estimate(&self, samples: &[AggregatedSample]) -> Estimation {
        let mut matched = 0;
        let mut seen = vec![false; self.survey.len()];
        let mut contributions: Vec<(usize, WeightedAnchor)> = Vec::new();

        for sample in samples {
            let Some(&survey_index) = self.index.get(&sample.ap) else {
                continue;
            };
            // Only the first reading per access point counts, usable or not
            if std::mem::replace(&mut seen[survey_index], true) {
                continue;
            }
            matched += 1;

            let Some(signal) = self.model.evaluate(sample.rssi) else {
                debug!(ap = %sample.ap, rssi = sample.rssi, model = self.model.name(), "reading excluded by signal model");
                continue;
            };
            if signal.weight <= self.min_weight {
                debug!(ap = %sample.ap, weight = signal.weight, min_weight = self.min_weight, "reading below minimum weight");
                continue;
            }

            let anchor = &self.survey[survey_index];
            contributions.push((
                survey_index,
                WeightedAnchor {
                    label: anchor.label.clone(),
                    x: anchor.position.x,
                    y: anchor.position.y,
                    weight: signal.weight,
                    rssi: sample.rssi,
                    distance_m: signal.distance_m,
                },
            ));
        }

        contributions.sort_by_key(|(survey_index, _)| *survey_index);
        let anchors: Vec<WeightedAnchor> = contributions.into_iter().map(|(_, a)| a).collect();

        Estimation {
            position: weighted_centroid(&anchors).map(EstimatedPosition::from),
            strongest: strongest_anchor(&anchors).cloned(),
            anchors,
            matched,
        }
    }
}

/// `Σ(p·w) / Σw` over the anchors, `None` for an empty or weightless set
///
/// The result is clamped to the anchors' bounding box so floating-point
/// rounding can never move it outside the convex hull's extent.
pub fn weighted_centroid(anchors: &[WeightedAnchor]) -> Option<Point2<f64>> {
    let total: f64 = anchors.iter().map(|a| a.weight).sum();
    if anchors.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }

    let weighted = anchors
        .iter()
        .fold(Vector2::zeros(), |acc, a| acc + a.position().coords * a.weight);
    let centroid = weighted / total;

    let (mut min, mut max) = (Vector2::repeat(f64::INFINITY), Vector2::repeat(f64::NEG_INFINITY));
    for anchor in anchors {
        let p = anchor.position().coords;
        min = min.inf(&p);
        max = max.sup(&p);
    }

    Some(Point2::from(centroid.sup(&min).inf(&max)))
}

/// Anchor with the greatest raw RSSI; the first one wins a tie
pub fn strongest_anchor(anchors: &[WeightedAnchor]) -> Option<&WeightedAnchor> {
    anchors.iter().fold(None, |best: Option<&WeightedAnchor>, anchor| match best {
        Some(current) if anchor.rssi <= current.rssi => Some(current),
        _ => Some(anchor),
    })
}
