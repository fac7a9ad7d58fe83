//! Boolean query construction and length-bounded partitioning.
//!
//! A full harvest query is `(device₁ OR device₂ OR …) AND (indicator₁ OR …)
//! [AND date]`. Encoded whole, it far exceeds what the API accepts in one
//! request URL, so [`partition`] splits the two term sets into a sequence of
//! smaller queries of the same shape, each guaranteed to fit the configured
//! encoding ceiling.

use crate::error::HarvestError;

/// Publication-date filter rendered into the query string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl DateRange {
    /// Date range between two years, either end open
    pub fn years(start: Option<i32>, end: Option<i32>) -> Self {
        Self { start, end }
    }

    /// Render the `[PDAT]` clause, or `None` when both ends are open
    pub fn clause(&self) -> Option<String> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(format!("{}[PDAT]:{}[PDAT]", start, end)),
            (Some(start), None) => Some(format!("{}[PDAT]", start)),
            (None, Some(end)) => Some(format!("{}[PDAT]", end)),
            (None, None) => None,
        }
    }
}

/// Build one boolean query from device and indicator terms.
///
/// Terms are phrase-quoted so multi-word names search as units.
pub fn build_query(devices: &[&str], indicators: &[&str], date: Option<&DateRange>) -> String {
    let mut query = format!(
        "({}) AND ({})",
        quoted_disjunction(devices),
        quoted_disjunction(indicators)
    );
    if let Some(clause) = date.and_then(|d| d.clause()) {
        query.push_str(" AND ");
        query.push_str(&clause);
    }
    query
}

/// URL-encoded byte length of a query string; the length the ceiling bounds
pub fn encoded_len(query: &str) -> usize {
    urlencoding::encode(query).len()
}

fn quoted_disjunction(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Partition two term sets into an ordered sequence of bounded queries.
///
/// Terms are interleaved device/indicator round-robin into a growing batch;
/// a term is admitted only while the rebuilt candidate query stays at or
/// under `ceiling` encoded bytes. When a term would overflow, the batch is
/// closed and a new one opened with that term as its first member. Every
/// input term appears in the output, and every produced query keeps the
/// `(devices) AND (indicators)` shape: a batch missing one side (possible
/// once the shorter term list is exhausted) is re-seeded with the first
/// term of that side, which is covered elsewhere anyway.
///
/// Errors: an empty term set on either side is [`HarvestError::InvalidQuery`];
/// a term that cannot fit a minimal query under the ceiling is
/// [`HarvestError::TermTooLong`] — terms are the smallest partitioning unit.
pub fn partition(
    devices: &[&str],
    indicators: &[&str],
    date: Option<&DateRange>,
    ceiling: usize,
) -> Result<Vec<String>, HarvestError> {
    if devices.is_empty() {
        return Err(HarvestError::InvalidQuery(
            "device term set is empty".to_string(),
        ));
    }
    if indicators.is_empty() {
        return Err(HarvestError::InvalidQuery(
            "indicator term set is empty".to_string(),
        ));
    }

    let mut partitioner = Partitioner {
        device_seed: devices[0],
        indicator_seed: indicators[0],
        date,
        ceiling,
        batch_devices: Vec::new(),
        batch_indicators: Vec::new(),
        queries: Vec::new(),
    };

    let rounds = devices.len().max(indicators.len());
    for i in 0..rounds {
        if let Some(&term) = devices.get(i) {
            partitioner.place(Side::Device, term)?;
        }
        if let Some(&term) = indicators.get(i) {
            partitioner.place(Side::Indicator, term)?;
        }
    }
    partitioner.finish()
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Device,
    Indicator,
}

struct Partitioner<'a> {
    device_seed: &'a str,
    indicator_seed: &'a str,
    date: Option<&'a DateRange>,
    ceiling: usize,
    batch_devices: Vec<&'a str>,
    batch_indicators: Vec<&'a str>,
    queries: Vec<String>,
}

impl<'a> Partitioner<'a> {
    /// Admit one term into the current batch, closing it first if the term
    /// would push the batch query over the ceiling.
    fn place(&mut self, side: Side, term: &'a str) -> Result<(), HarvestError> {
        self.push(side, term);
        if encoded_len(&self.render()) <= self.ceiling {
            return Ok(());
        }
        self.pop(side);

        if !self.is_empty() {
            let query = self.close();
            self.queries.push(query);
        }

        self.push(side, term);
        let minimal = self.render();
        let encoded = encoded_len(&minimal);
        if encoded > self.ceiling {
            // even alone with a pairing seed the term does not fit
            return Err(HarvestError::TermTooLong {
                term: term.to_string(),
                encoded,
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<String>, HarvestError> {
        if !self.is_empty() {
            let query = self.close();
            self.queries.push(query);
        }
        tracing::debug!(queries = self.queries.len(), "partitioned term sets");
        Ok(self.queries)
    }

    /// Render the current batch as it would be closed, seeding an empty
    /// side so the measured length matches the final query exactly.
    fn render(&self) -> String {
        let devices: &[&str] = if self.batch_devices.is_empty() {
            std::slice::from_ref(&self.device_seed)
        } else {
            &self.batch_devices
        };
        let indicators: &[&str] = if self.batch_indicators.is_empty() {
            std::slice::from_ref(&self.indicator_seed)
        } else {
            &self.batch_indicators
        };
        build_query(devices, indicators, self.date)
    }

    fn close(&mut self) -> String {
        let query = self.render();
        self.batch_devices.clear();
        self.batch_indicators.clear();
        query
    }

    fn is_empty(&self) -> bool {
        self.batch_devices.is_empty() && self.batch_indicators.is_empty()
    }

    fn push(&mut self, side: Side, term: &'a str) {
        match side {
            Side::Device => self.batch_devices.push(term),
            Side::Indicator => self.batch_indicators.push(term),
        }
    }

    fn pop(&mut self, side: Side) {
        match side {
            Side::Device => self.batch_devices.pop(),
            Side::Indicator => self.batch_indicators.pop(),
        };
    }
}
