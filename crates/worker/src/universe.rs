use screener_core::config::parse_env;
use screener_core::domain::contract::normalize_symbol;
use std::collections::HashSet;

/// NIFTY large caps screened when nothing else is configured.
const DEFAULT_UNIVERSE: &[&str] = &[
    "RELIANCE", "TCS", "HDFCBANK", "ICICIBANK", "INFY", "HINDUNILVR", "ITC", "SBIN",
    "BHARTIARTL", "KOTAKBANK", "LT", "AXISBANK", "ASIANPAINT", "MARUTI", "SUNPHARMA",
    "TITAN", "BAJFINANCE", "ULTRACEMCO", "WIPRO", "NESTLEIND", "HCLTECH", "M&M",
    "POWERGRID", "NTPC", "TATAMOTORS",
];

#[derive(Debug, Clone)]
pub struct UniverseOptions {
    /// Explicit symbol list; replaces the default universe.
    pub symbols: Option<Vec<String>>,

    /// Upper bound on the number of symbols screened in one run.
    pub max_size: usize,
}

impl Default for UniverseOptions {
    fn default() -> Self {
        Self {
            symbols: None,
            max_size: 200,
        }
    }
}

impl UniverseOptions {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("UNIVERSE_SYMBOLS") {
            let symbols: Vec<String> = s.split(',').map(str::to_string).collect();
            if symbols.iter().any(|s| !s.trim().is_empty()) {
                out.symbols = Some(symbols);
            }
        }

        out.max_size = parse_env("UNIVERSE_MAX_SIZE", out.max_size)?;

        Ok(out)
    }
}

/// Normalized, de-duplicated symbol list in input order, ETFs removed.
pub fn build_universe(cli_symbols: &[String], opts: &UniverseOptions) -> anyhow::Result<Vec<String>> {
    anyhow::ensure!(opts.max_size >= 1, "UNIVERSE_MAX_SIZE must be >= 1");

    let raw: Vec<String> = if !cli_symbols.is_empty() {
        cli_symbols.to_vec()
    } else if let Some(symbols) = &opts.symbols {
        symbols.clone()
    } else {
        DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect()
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for symbol in raw.iter().filter_map(|s| normalize_symbol(s)) {
        if is_etf_symbol(&symbol) {
            tracing::debug!(%symbol, "excluding exchange-traded fund from universe");
            continue;
        }
        if seen.insert(symbol.clone()) {
            out.push(symbol);
        }
    }

    anyhow::ensure!(!out.is_empty(), "symbol universe is empty");
    if out.len() > opts.max_size {
        tracing::warn!(requested = out.len(), max = opts.max_size, "truncating symbol universe");
        out.truncate(opts.max_size);
    }
    Ok(out)
}

fn is_etf_symbol(symbol: &str) -> bool {
    // NSE ETF tickers conventionally end in BEES (NIFTYBEES, GOLDBEES) or carry ETF.
    symbol.ends_with("BEES") || symbol.contains("ETF")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_and_dedupes_in_order() {
        let out = build_universe(
            &strings(&[" infy.ns", "TCS", "INFY", "reliance.BO", ""]),
            &UniverseOptions::default(),
        )
        .unwrap();
        assert_eq!(out, strings(&["INFY", "TCS", "RELIANCE"]));
    }

    #[test]
    fn excludes_obvious_etfs() {
        assert!(is_etf_symbol("NIFTYBEES"));
        assert!(is_etf_symbol("GOLDBEES"));
        assert!(is_etf_symbol("MON100ETF"));
        assert!(!is_etf_symbol("BEL"));

        let out = build_universe(&strings(&["NIFTYBEES", "ITC"]), &UniverseOptions::default()).unwrap();
        assert_eq!(out, strings(&["ITC"]));
    }

    #[test]
    fn falls_back_to_default_universe_and_truncates() {
        let opts = UniverseOptions {
            symbols: None,
            max_size: 3,
        };
        let out = build_universe(&[], &opts).unwrap();
        assert_eq!(out, strings(&["RELIANCE", "TCS", "HDFCBANK"]));
    }

    #[test]
    fn config_list_used_when_cli_is_empty() {
        let opts = UniverseOptions {
            symbols: Some(strings(&["sbin", "lt"])),
            max_size: 10,
        };
        assert_eq!(build_universe(&[], &opts).unwrap(), strings(&["SBIN", "LT"]));
        assert!(build_universe(&strings(&["  "]), &opts).is_err());
    }

    #[test]
    fn malformed_max_size_is_a_config_error() {
        std::env::set_var("UNIVERSE_MAX_SIZE", "lots");
        let res = UniverseOptions::from_env();
        std::env::remove_var("UNIVERSE_MAX_SIZE");
        assert!(res.is_err());

        assert_eq!(UniverseOptions::from_env().unwrap().max_size, 200);
    }
}
