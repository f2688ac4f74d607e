/// Current UTC timestamp (milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format minor currency units for humans: `5000, "EUR"` -> `"50.00 €"`
pub fn format_money(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let amount = format!("{sign}{}.{:02}", abs / 100, abs % 100);
    if currency.eq_ignore_ascii_case("EUR") {
        format!("{amount} €")
    } else {
        format!("{amount} {}", currency.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(5000, "EUR"), "50.00 €");
        assert_eq!(format_money(10_005, "eur"), "100.05 €");
        assert_eq!(format_money(99, "usd"), "0.99 USD");
        assert_eq!(format_money(-250, "EUR"), "-2.50 €");
    }
}
