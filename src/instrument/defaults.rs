//! Sample commodity futures shipped as default configuration

use super::{Instrument, PriceBounds, PriceFormat};

/// (symbol, name, base, min, max, format)
const SAMPLE: &[(&str, &str, f64, f64, f64, PriceFormat)] = &[
    ("CL=F", "Crude Oil", 78.45, 70.0, 90.0, PriceFormat::Plain),
    ("GC=F", "Gold", 2341.50, 2200.0, 2500.0, PriceFormat::Grouped),
    ("SI=F", "Silver", 28.12, 25.0, 32.0, PriceFormat::Plain),
    ("NG=F", "Natural Gas", 1.92, 1.5, 2.5, PriceFormat::Plain),
    ("ZC=F", "Corn", 442.25, 400.0, 500.0, PriceFormat::Plain),
    ("ZS=F", "Soybeans", 1165.00, 1100.0, 1300.0, PriceFormat::Grouped),
    ("ZW=F", "Wheat", 598.50, 550.0, 650.0, PriceFormat::Plain),
    ("HG=F", "Copper", 4.35, 3.8, 5.0, PriceFormat::Plain),
    ("RB=F", "RBOB Gasoline", 2.54, 2.2, 3.0, PriceFormat::Plain),
];

/// The default instrument set, in display order
pub fn default_instruments() -> Vec<Instrument> {
    SAMPLE
        .iter()
        .map(|&(symbol, name, base, min, max, format)| {
            Instrument::new(symbol, name, PriceBounds::new(base, min, max), format)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_instruments_order() {
        let instruments = default_instruments();
        assert_eq!(instruments.len(), 9);
        assert_eq!(instruments[0].symbol, "CL=F");
        assert_eq!(instruments[8].symbol, "RB=F");
    }

    #[test]
    fn test_default_bases_within_bounds() {
        for instrument in default_instruments() {
            assert!(
                instrument.bounds.contains(instrument.bounds.base),
                "{} base outside bounds",
                instrument.symbol
            );
        }
    }
}
