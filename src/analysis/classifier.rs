use crate::models::{ClassifiedSeries, StatementRow};

/// Split statement rows into quarterly and yearly series, newest first.
///
/// An absent collection is treated as empty. Rows whose period is not one of
/// Q1..Q4 or FY are dropped. The sort is stable, so rows sharing a date keep
/// their delivery order, and rows without a date end up at the tail.
pub fn classify(rows: Option<Vec<StatementRow>>) -> ClassifiedSeries {
    let mut series = ClassifiedSeries::default();

    for row in rows.unwrap_or_default() {
        match row.period() {
            Some(period) if period.is_quarter() => series.quarterly.push(row),
            Some(_) => series.yearly.push(row),
            None => {}
        }
    }

    sort_newest_first(&mut series.quarterly);
    sort_newest_first(&mut series.yearly);
    series
}

fn sort_newest_first(rows: &mut [StatementRow]) {
    rows.sort_by(|a, b| b.date_key().cmp(a.date_key()));
}
