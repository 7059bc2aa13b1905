use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;

/// A single quote as rendered to the user. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub name: String,
    /// Local time of the instrument's market.
    pub timestamp: DateTime<Tz>,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
}

impl fmt::Display for QuoteSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", self.timestamp.format("%Y-%m-%d %H:%M"))?;
        writeln!(f, "現\u{3000}價: {:.2}", self.price)?;
        writeln!(
            f,
            "漲\u{3000}跌: {:.2} ({:.2} %)",
            self.change, self.change_percent
        )?;
        write!(f, "成交量: {}", self.volume)
    }
}
