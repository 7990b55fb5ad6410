use serde::Serialize;

use crate::synth::StockRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStyle {
    Plain,
    /// Sub-dollar names get the gray backdrop.
    SubDollar,
    /// Tight-float movers in the $2-$20 band with hot relative volume get
    /// bolded. Checked second, so a sub-dollar row never lands here.
    Momentum,
}

pub fn style_for(row: &StockRow) -> RowStyle {
    if row.price < 1.0 {
        RowStyle::SubDollar
    } else if row.float_m < 20.0
        && row.price >= 2.0
        && row.price <= 20.0
        && row.relative_volume > 500.0
    {
        RowStyle::Momentum
    } else {
        RowStyle::Plain
    }
}

/// One table row as the page shows it: fixed two-decimal formatting with the
/// board's unit suffixes, plus the raw values the action buttons close over.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow {
    pub symbol: String,
    pub gap_percent: String,
    pub price: String,
    pub float_m: String,
    pub relative_volume: String,
    pub volume: String,
    pub news_alert: &'static str,
    pub spread: String,
    pub easy_to_borrow: &'static str,
    pub short_interest: String,
    pub short_borrow_rate: String,
    pub halt_levels: String,
    pub style: RowStyle,
    pub raw_price: f64,
}

pub fn display_row(row: &StockRow) -> DisplayRow {
    DisplayRow {
        symbol: row.symbol.clone(),
        gap_percent: format!("{:.2}%", row.gap_percent),
        price: format!("${:.2}", row.price),
        float_m: format!("{:.2}M", row.float_m),
        relative_volume: format!("{:.2}%", row.relative_volume),
        volume: row.volume.to_string(),
        news_alert: row.news_alert.as_str(),
        spread: format!("{:.2}", row.spread),
        easy_to_borrow: if row.easy_to_borrow { "Yes" } else { "No" },
        short_interest: format!("{:.2}%", row.short_interest),
        short_borrow_rate: format!("{:.2}%", row.short_borrow_rate),
        halt_levels: format!("{:.2}%", row.halt_levels),
        style: style_for(row),
        raw_price: row.price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::NewsAlert;

    fn row(price: f64, float_m: f64, relative_volume: f64) -> StockRow {
        StockRow {
            symbol: "TEST".into(),
            price,
            gap_percent: 1.234,
            float_m,
            relative_volume,
            volume: 4321,
            news_alert: NewsAlert::Negative,
            spread: 0.5,
            easy_to_borrow: false,
            short_interest: 12.3,
            short_borrow_rate: 4.5,
            halt_levels: 2.0,
        }
    }

    #[test]
    fn sub_dollar_rows_get_the_gray_backdrop() {
        assert_eq!(style_for(&row(0.5, 10.0, 600.0)), RowStyle::SubDollar);
    }

    #[test]
    fn tight_float_movers_get_bolded() {
        assert_eq!(style_for(&row(5.0, 10.0, 600.0)), RowStyle::Momentum);
    }

    #[test]
    fn momentum_requires_every_condition() {
        assert_eq!(style_for(&row(5.0, 25.0, 600.0)), RowStyle::Plain);
        assert_eq!(style_for(&row(25.0, 10.0, 600.0)), RowStyle::Plain);
        assert_eq!(style_for(&row(5.0, 10.0, 400.0)), RowStyle::Plain);
        assert_eq!(style_for(&row(1.5, 10.0, 600.0)), RowStyle::Plain);
    }

    #[test]
    fn sub_dollar_wins_over_momentum() {
        // price < 1 also fails the $2 floor, but the ordering is what keeps
        // the two stylings mutually exclusive.
        assert_eq!(style_for(&row(0.9, 10.0, 600.0)), RowStyle::SubDollar);
    }

    #[test]
    fn formats_with_fixed_decimals_and_suffixes() {
        let d = display_row(&row(0.5, 10.0, 600.0));
        assert_eq!(d.gap_percent, "1.23%");
        assert_eq!(d.price, "$0.50");
        assert_eq!(d.float_m, "10.00M");
        assert_eq!(d.relative_volume, "600.00%");
        assert_eq!(d.volume, "4321");
        assert_eq!(d.news_alert, "Negative");
        assert_eq!(d.easy_to_borrow, "No");
        assert_eq!(d.short_interest, "12.30%");
        assert_eq!(d.raw_price, 0.5);
    }
}
