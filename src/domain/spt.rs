//! Numeric encoding of spectral types.
//!
//! Each class letter maps to a decade (`O` = 0, `B` = 10, ... `Y` = 90) and the
//! numeric subclass is added on top, so `M5.5V` becomes `65.5`. The encoding is
//! only used for sorting, plotting and summary statistics.

const CLASSES: [char; 10] = ['O', 'B', 'A', 'F', 'G', 'K', 'M', 'L', 'T', 'Y'];

/// Encode a spectral-type label. Returns `None` when no class letter leads the label.
pub fn spt_to_num(label: &str) -> Option<f64> {
    let label = label.trim();
    let mut chars = label.chars();
    let class = chars.next()?;
    let decade = CLASSES.iter().position(|&c| c == class)?;

    let rest = chars.as_str();
    let subclass_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let subclass = match &rest[..subclass_len] {
        "" => 0.0,
        digits => digits.parse::<f64>().ok()?,
    };

    Some(decade as f64 * 10.0 + subclass)
}

/// Render a numeric code back to a label such as `M5.5`, rounded to half subclasses.
pub fn num_to_spt(num: f64) -> Option<String> {
    if !num.is_finite() || num < 0.0 {
        return None;
    }
    let rounded = (num * 2.0).round() / 2.0;
    let decade = (rounded / 10.0).floor() as usize;
    let class = CLASSES.get(decade)?;
    let subclass = rounded - decade as f64 * 10.0;

    if subclass.fract() == 0.0 {
        Some(format!("{class}{subclass:.0}"))
    } else {
        Some(format!("{class}{subclass:.1}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_luminosity_class_labels() {
        assert_eq!(spt_to_num("M5.5V"), Some(65.5));
        assert_eq!(spt_to_num("G2V"), Some(42.0));
        assert_eq!(spt_to_num("T8"), Some(88.0));
        assert_eq!(spt_to_num("L"), Some(70.0));
    }

    #[test]
    fn rejects_unclassified_labels() {
        assert_eq!(spt_to_num(""), None);
        assert_eq!(spt_to_num("DA"), None);
        assert_eq!(spt_to_num("m5V"), None);
    }

    #[test]
    fn renders_half_subclasses() {
        assert_eq!(num_to_spt(65.5).as_deref(), Some("M5.5"));
        assert_eq!(num_to_spt(60.0).as_deref(), Some("M0"));
        assert_eq!(num_to_spt(71.2).as_deref(), Some("L1"));
        assert_eq!(num_to_spt(120.0), None);
    }
}
