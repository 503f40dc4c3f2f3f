use crate::core::engine::RunOutput;
use anyhow::Result;
use std::io::Write;

const SIGNIFICANT_DIGITS: i32 = 12;

/// One line per k-mer: the raw k bytes, a space, the frequency.
pub fn write(w: &mut dyn Write, output: &RunOutput) -> Result<()> {
    for entry in &output.entries {
        w.write_all(output.kmer(entry))?;
        writeln!(w, " {}", fmt_frequency(output.frequency(entry)))?;
    }
    Ok(())
}

/// Renders like printf's `%.12g`: twelve significant digits, trailing zeros
/// dropped, exponent notation outside `[1e-4, 1e12)`.
pub fn fmt_frequency(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let sci = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if exp < -4 || exp >= SIGNIFICANT_DIGITS {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exp) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_printf_g() {
        assert_eq!(fmt_frequency(1.0), "1");
        assert_eq!(fmt_frequency(0.5), "0.5");
        assert_eq!(fmt_frequency(0.25), "0.25");
        assert_eq!(fmt_frequency(1.0 / 3.0), "0.333333333333");
        assert_eq!(fmt_frequency(2.0 / 3.0), "0.666666666667");
        assert_eq!(fmt_frequency(0.0001), "0.0001");
        assert_eq!(fmt_frequency(0.00001), "1e-05");
        assert_eq!(fmt_frequency(1.0 / 30_000_000.0), "3.33333333333e-08");
        assert_eq!(fmt_frequency(0.0), "0");
    }

    #[test]
    fn rounding_carries_into_next_decade() {
        assert_eq!(fmt_frequency(0.9999999999999), "1");
        assert_eq!(fmt_frequency(0.000099999999999999), "0.0001");
    }
}
