//! Robust SED template matching.
//!
//! For each template we form per-band differences `observed - template`. Their
//! median estimates the brightness offset between the star and the template;
//! residuals around that median measure how well the template's *shape* fits.
//!
//! A template is accepted when all but one or two bands (one for up to five
//! bands, two above that) fall within `tolerance` of the median offset. The
//! survivors are ranked by mean residual, best first.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{Band, ReferenceEntry, SedBestMatch, is_measured};
use crate::error::AppError;
use crate::lookup::distance_from_modulus;
use crate::math::{mean, median};

/// Fewest shared bands needed to judge a template.
const MIN_BANDS: usize = 4;
/// Up to this many bands, one outlier is allowed; above it, two.
const SMALL_SAMPLE: usize = 5;
/// Matches returned when not asking for the single best.
const TOP_MATCHES: usize = 3;

#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Residual (mag) below which a band counts as consistent.
    pub tolerance: f64,
    /// Return only the best template instead of the top three.
    pub best_only: bool,
}

/// Score every template against the observation and return the best match(es).
///
/// Templates are scored in parallel; ties keep the templates' original order.
pub fn match_templates(
    observed: &BTreeMap<Band, f64>,
    templates: &[ReferenceEntry],
    opts: &MatchOptions,
) -> Result<Vec<SedBestMatch>, AppError> {
    if !(opts.tolerance.is_finite() && opts.tolerance > 0.0) {
        return Err(AppError::input(format!(
            "Invalid SED tolerance {} (must be finite and > 0).",
            opts.tolerance
        )));
    }

    let scored: Vec<Option<SedBestMatch>> = templates
        .par_iter()
        .map(|template| score_template(observed, template, opts.tolerance))
        .collect::<Result<_, _>>()?;

    let mut accepted: Vec<SedBestMatch> = scored.into_iter().flatten().collect();
    debug!(
        templates = templates.len(),
        accepted = accepted.len(),
        "SED templates scored"
    );

    // `sort_by` is stable, so equal scores keep grid order.
    accepted.sort_by(|a, b| {
        a.mean_diff_mag
            .partial_cmp(&b.mean_diff_mag)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    accepted.truncate(if opts.best_only { 1 } else { TOP_MATCHES });

    Ok(accepted)
}

/// Score one template. `Ok(None)` means the template was rejected.
pub fn score_template(
    observed: &BTreeMap<Band, f64>,
    template: &ReferenceEntry,
    tolerance: f64,
) -> Result<Option<SedBestMatch>, AppError> {
    let diff_mags: Vec<f64> = observed
        .iter()
        .filter(|(_, m)| is_measured(**m))
        .filter_map(|(&band, &m)| template.magnitude(band).map(|t| m - t))
        .collect();

    let total = diff_mags.len();
    if total < MIN_BANDS {
        return Ok(None);
    }

    let median_diff_mag = median(&diff_mags)?;
    let corrected: Vec<f64> = diff_mags
        .iter()
        .map(|d| (d - median_diff_mag).abs())
        .collect();
    let selected = corrected.iter().filter(|&&c| c < tolerance).count();

    let allowance = if total <= SMALL_SAMPLE { 1 } else { 2 };
    if selected + allowance < total {
        debug!(
            spt = template.label.as_str(),
            bands = total,
            outliers = total - selected,
            "SED template rejected"
        );
        return Ok(None);
    }

    Ok(Some(SedBestMatch {
        spt: template.label.clone(),
        median_diff_mag,
        mean_diff_mag: mean(&corrected)?,
        bands: total,
        outliers: total - selected,
    }))
}

/// Template magnitudes shifted onto the observed brightness scale.
///
/// With `overplot`, the template is returned at its native brightness.
pub fn align_template(
    template: &ReferenceEntry,
    best: &SedBestMatch,
    overplot: bool,
) -> BTreeMap<Band, f64> {
    let offset = if overplot { 0.0 } else { best.median_diff_mag };
    template
        .magnitudes
        .iter()
        .filter(|(_, m)| is_measured(**m))
        .map(|(&band, &m)| (band, m + offset))
        .collect()
}

impl SedBestMatch {
    /// Distance (pc) implied by the offset, for templates in absolute magnitudes.
    pub fn photometric_distance(&self) -> f64 {
        distance_from_modulus(self.median_diff_mag, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    const BANDS: [Band; 8] = [
        Band::G,
        Band::Bp,
        Band::Rp,
        Band::J,
        Band::H,
        Band::K,
        Band::W1,
        Band::W2,
    ];

    fn template(label: &str, mags: &[f64]) -> ReferenceEntry {
        ReferenceEntry {
            label: label.to_string(),
            magnitudes: BANDS.iter().copied().zip(mags.iter().copied()).collect(),
            ..ReferenceEntry::default()
        }
    }

    fn shifted(t: &ReferenceEntry, offset: f64) -> BTreeMap<Band, f64> {
        t.magnitudes.iter().map(|(&b, &m)| (b, m + offset)).collect()
    }

    fn opts(best_only: bool) -> MatchOptions {
        MatchOptions {
            tolerance: 0.2,
            best_only,
        }
    }

    #[test]
    fn single_outlier_is_tolerated() {
        let t = template("M6V", &[14.71, 17.3, 13.2, 10.6, 10.0, 9.59]);
        let mut observed = shifted(&t, 3.0);
        *observed.get_mut(&Band::J).unwrap() += 2.0;

        let matches = match_templates(&observed, &[t], &opts(true)).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert!((m.median_diff_mag - 3.0).abs() < 1e-9);
        assert_eq!(m.bands, 6);
        assert_eq!(m.outliers, 1);
    }

    #[test]
    fn five_bands_allow_one_outlier_only() {
        let t = template("L0", &[18.0, 20.5, 16.3, 12.1, 11.4]);
        let mut one_bad = shifted(&t, 1.5);
        *one_bad.get_mut(&Band::G).unwrap() += 2.0;
        assert!(score_template(&one_bad, &t, 0.2).unwrap().is_some());

        let mut two_bad = one_bad.clone();
        *two_bad.get_mut(&Band::J).unwrap() -= 1.0;
        assert!(score_template(&two_bad, &t, 0.2).unwrap().is_none());

        // A residual equal to the tolerance counts as an outlier.
        let exact = template("L1", &[18.0, 20.0, 16.0, 12.0, 11.0]);
        let mut one_at_edge = shifted(&exact, 1.0);
        *one_at_edge.get_mut(&Band::G).unwrap() += 0.5;
        let m = score_template(&one_at_edge, &exact, 0.5).unwrap().unwrap();
        assert_eq!(m.median_diff_mag, 1.0);
        assert_eq!(m.outliers, 1);

        let mut two_at_edge = one_at_edge.clone();
        *two_at_edge.get_mut(&Band::J).unwrap() -= 0.5;
        assert!(score_template(&two_at_edge, &exact, 0.5).unwrap().is_none());
    }

    #[test]
    fn too_few_bands_discards_template() {
        let t = template("L0", &[18.0, 20.5, 16.3, 12.1, 11.4]);
        let observed: BTreeMap<Band, f64> = [(Band::G, 20.0), (Band::Bp, 22.5), (Band::Rp, 18.3)]
            .into_iter()
            .collect();
        assert!(score_template(&observed, &t, 0.2).unwrap().is_none());

        // Zero-valued observations do not count as overlap.
        let mut padded = observed.clone();
        padded.insert(Band::J, 0.0);
        assert!(score_template(&padded, &t, 0.2).unwrap().is_none());
    }

    #[test]
    fn ranks_by_mean_residual_and_keeps_top_three() {
        let base = [12.0, 13.0, 11.5, 10.0, 9.5, 9.3, 9.2, 9.1];
        let exact = template("exact", &base);
        let near = template(
            "near",
            &base.iter().enumerate().map(|(i, m)| m + if i % 2 == 0 { 0.05 } else { 0.0 }).collect::<Vec<_>>(),
        );
        let looser = template(
            "looser",
            &base.iter().enumerate().map(|(i, m)| m + if i % 2 == 0 { 0.1 } else { 0.0 }).collect::<Vec<_>>(),
        );
        let loosest = template(
            "loosest",
            &base.iter().enumerate().map(|(i, m)| m + if i % 2 == 0 { 0.15 } else { 0.0 }).collect::<Vec<_>>(),
        );
        let observed = shifted(&exact, 2.0);
        let templates = vec![loosest, looser, near, exact];

        let top = match_templates(&observed, &templates, &opts(false)).unwrap();
        let labels: Vec<&str> = top.iter().map(|m| m.spt.as_str()).collect();
        assert_eq!(labels, vec!["exact", "near", "looser"]);

        let best = match_templates(&observed, &templates, &opts(true)).unwrap();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].spt, "exact");
    }

    #[test]
    fn ties_keep_grid_order() {
        let mags = [12.0, 13.0, 11.5, 10.0, 9.5, 9.3];
        let templates = vec![template("first", &mags), template("second", &mags)];
        let observed = shifted(&templates[0], 1.0);
        let top = match_templates(&observed, &templates, &opts(false)).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].spt, "first");
        assert_eq!(top[1].spt, "second");
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let bad = MatchOptions {
            tolerance: 0.0,
            best_only: false,
        };
        let err = match_templates(&BTreeMap::new(), &[], &bad).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn recovers_template_under_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 0.03).unwrap();

        let templates: Vec<ReferenceEntry> = (0..6)
            .map(|k| {
                // Each step reddens the SED: bluer bands fade faster than red ones.
                let mags: Vec<f64> = (0..BANDS.len())
                    .map(|i| 10.0 + k as f64 * (BANDS.len() - i) as f64 / BANDS.len() as f64)
                    .collect();
                template(&format!("T{k}"), &mags)
            })
            .collect();

        let truth = &templates[3];
        let mut observed: BTreeMap<Band, f64> = truth
            .magnitudes
            .iter()
            .map(|(&b, &m)| (b, m + 4.0 + noise.sample(&mut rng)))
            .collect();
        *observed.get_mut(&Band::W2).unwrap() += 1.5;

        let best = match_templates(&observed, &templates, &opts(true)).unwrap();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].spt, "T3");
        assert!((best[0].median_diff_mag - 4.0).abs() < 0.1);
    }

    #[test]
    fn alignment_applies_offset_unless_overplotting() {
        let t = template("M6V", &[14.71, 17.3, 13.2, 10.6]);
        let best = SedBestMatch {
            spt: "M6V".to_string(),
            median_diff_mag: 5.0,
            mean_diff_mag: 0.0,
            bands: 4,
            outliers: 0,
        };
        let aligned = align_template(&t, &best, false);
        assert!((aligned[&Band::G] - 19.71).abs() < 1e-9);
        let native = align_template(&t, &best, true);
        assert_eq!(native[&Band::G], 14.71);
        assert!((best.photometric_distance() - 100.0).abs() < 1e-9);
    }
}
