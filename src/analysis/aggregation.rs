use crate::models::{IndustryAggregate, SecurityRecord};

/// Summarize the persisted records of one industry.
///
/// Averages only count records where the ratio is present; revenue is summed
/// with missing values as 0. Returns `None` when there are no records.
pub fn summarize_industry(industry: &str, records: &[SecurityRecord]) -> Option<IndustryAggregate> {
    let members: Vec<&SecurityRecord> = records.iter().filter(|r| r.industry == industry).collect();
    if members.is_empty() {
        return None;
    }

    Some(IndustryAggregate {
        industry: industry.to_string(),
        avg_pe_ratio: mean(members.iter().filter_map(|r| r.pe_ratio)),
        avg_revenue_growth: mean(members.iter().filter_map(|r| r.revenue_growth)),
        sum_revenue: members.iter().map(|r| r.revenue.unwrap_or(0.0)).sum(),
        security_count: members.len(),
    })
}

fn mean<I>(values: I) -> Option<f64>
where
    I: Iterator<Item = f64>,
{
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
