//! Formatted terminal output for lookup, distance and SED results.
//!
//! Formatting lives in one place so the lookup code stays free of presentation
//! concerns and output changes stay localized.

use std::collections::BTreeMap;

use crate::domain::{
    Band, DistanceLookupResult, GridKind, LookupResult, ResultsFile, SedBestMatch,
};
use crate::report::{DistanceSummary, LookupSummary, summarize_distances, summarize_lookup};

/// Header line naming the tool and grid.
pub fn format_banner(grid: GridKind) -> String {
    format!("=== spt - spectral type lookup ({} grid) ===\n", grid.display_name())
}

/// Table of bracket lookup results followed by their summary.
pub fn format_lookup(results: &[LookupResult]) -> String {
    let mut out = String::new();
    if results.is_empty() {
        out.push_str("No grid bracket contains the observed colors.\n");
        return out;
    }

    push_row(
        &mut out,
        format!(
            "{:<8} {:>9} {:<8} {:>6} {:>7} {:>7} {:>5} {:<10} {:>9} {:>8}",
            "color", "observed", "spt", "teff", "rsun", "msun", "logg", "age", "nearest", "gap"
        ),
    );
    push_row(
        &mut out,
        format!(
            "{:-<8} {:-<9} {:-<8} {:-<6} {:-<7} {:-<7} {:-<5} {:-<10} {:-<9} {:-<8}",
            "", "", "", "", "", "", "", "", "", ""
        ),
    );
    for r in results {
        push_row(
            &mut out,
            format!(
                "{:<8} {:>9.4} {:<8} {:>6} {:>7} {:>7} {:>5} {:<10} {:>9.4} {:>8.4}",
                r.color_key.key(),
                r.color_value,
                truncate(&r.spt, 8),
                fmt_opt(r.teff.map(|t| t.to_string())),
                fmt_opt(r.rsun.map(|v| format!("{v:.3}"))),
                fmt_opt(r.msun.map(|v| format!("{v:.3}"))),
                fmt_opt(r.log_g.map(|v| format!("{v:.2}"))),
                truncate(r.age.as_deref().unwrap_or("-"), 10),
                r.nearest,
                r.gap,
            ),
        );
    }

    if let Some(summary) = summarize_lookup(results) {
        out.push('\n');
        out.push_str(&format_lookup_summary(&summary));
    }
    out
}

pub fn format_lookup_summary(s: &LookupSummary) -> String {
    let mut out = format!("Summary: n={}", s.count);
    if let Some(label) = &s.median_spt {
        out.push_str(&format!(" | median SpT={label}"));
    }
    if let Some(teff) = &s.teff {
        out.push_str(&format!(
            " | Teff={:.0} ± {:.0} K (se {:.0})",
            teff.mean, teff.std_dev, teff.std_err
        ));
    }
    out.push_str(&format!(" | mean gap={:.4}\n", s.mean_gap));
    out
}

/// Table of per-band distances followed by their summary.
pub fn format_distances(spt: &str, results: &[DistanceLookupResult]) -> String {
    let mut out = String::new();
    if results.is_empty() {
        out.push_str(&format!(
            "No distance: `{spt}` is not in the grid or shares no band with the input.\n"
        ));
        return out;
    }

    out.push_str(&format!("Spectral type: {spt}\n"));
    push_row(
        &mut out,
        format!("{:<5} {:>9} {:>12} {:>10}", "band", "m", "d [pc]", "err [pc]"),
    );
    push_row(&mut out, format!("{:-<5} {:-<9} {:-<12} {:-<10}", "", "", "", ""));
    for r in results {
        push_row(
            &mut out,
            format!(
                "{:<5} {:>9.3} {:>12.2} {:>10}",
                r.band.key(),
                r.band_value,
                r.distance,
                fmt_opt(r.distance_error.map(|e| format!("{e:.2}"))),
            ),
        );
    }

    if let Some(summary) = summarize_distances(results) {
        out.push('\n');
        out.push_str(&format_distance_summary(&summary));
    }
    out
}

pub fn format_distance_summary(s: &DistanceSummary) -> String {
    format!(
        "Distance: median={:.2} pc | mean={:.2} ± {:.2} pc (se {:.2}) | n={}\n",
        s.median, s.mean, s.std_dev, s.std_err, s.count
    )
}

/// Ranked SED matches, plus a band-by-band comparison against the aligned winner.
pub fn format_matches(
    matches: &[SedBestMatch],
    observed: &BTreeMap<Band, f64>,
    aligned_best: Option<&BTreeMap<Band, f64>>,
) -> String {
    let mut out = String::new();
    if matches.is_empty() {
        out.push_str("No template fits the observed SED within tolerance.\n");
        return out;
    }

    push_row(
        &mut out,
        format!(
            "{:>4} {:<8} {:>10} {:>10} {:>6} {:>8} {:>10}",
            "rank", "spt", "offset", "residual", "bands", "outliers", "d [pc]"
        ),
    );
    push_row(
        &mut out,
        format!("{:-<4} {:-<8} {:-<10} {:-<10} {:-<6} {:-<8} {:-<10}", "", "", "", "", "", "", ""),
    );
    for (i, m) in matches.iter().enumerate() {
        push_row(
            &mut out,
            format!(
                "{:>4} {:<8} {:>10.3} {:>10.4} {:>6} {:>8} {:>10.1}",
                i + 1,
                truncate(&m.spt, 8),
                m.median_diff_mag,
                m.mean_diff_mag,
                m.bands,
                m.outliers,
                m.photometric_distance(),
            ),
        );
    }

    if let Some(aligned) = aligned_best {
        out.push_str(&format!("\nBest template ({}) vs observed:\n", matches[0].spt));
        push_row(&mut out, format!("{:<5} {:>9} {:>9} {:>8}", "band", "observed", "template", "diff"));
        for (band, &obs) in observed {
            let Some(&tpl) = aligned.get(band) else {
                continue;
            };
            push_row(
                &mut out,
                format!("{:<5} {:>9.3} {:>9.3} {:>8.3}", band.key(), obs, tpl, obs - tpl),
            );
        }
    }
    out
}

/// Re-render a saved results file.
pub fn format_results_file(file: &ResultsFile) -> String {
    let mut out = format_banner(file.grid);
    out.push_str(&format!(
        "Saved by {} at {}\n\n",
        file.tool,
        file.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if file.lookup.is_empty() && file.distances.is_empty() && file.matches.is_empty() {
        out.push_str("(no results)\n");
        return out;
    }
    if !file.lookup.is_empty() {
        out.push_str(&format_lookup(&file.lookup));
    }
    if let Some(first) = file.distances.first() {
        out.push_str(&format_distances(&first.spt, &file.distances));
    }
    if !file.matches.is_empty() {
        out.push_str(&format_matches(&file.matches, &BTreeMap::new(), None));
    }
    out
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn fmt_opt(v: Option<String>) -> String {
    v.unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
