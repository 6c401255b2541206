//! Recency/Frequency/Monetary segmentation.
//!
//! Scores are quintiles relative to the whole current customer population,
//! so every run recomputes them from scratch.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Display, Formatter};

use serde::Serialize;
use time::Date;
use tpch_warehouse::catalog::{CUSTOMER_RFM_SCORES, RFM_SEGMENT_SUMMARY};
use tpch_warehouse::{CellValue, CustomerRecord, OrderFact, TableSpec};

use crate::report::ReportRow;

/// Number of buckets used for every score.
pub const SCORE_BUCKETS: u8 = 5;

/// Segment labels, in decision-tree priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Segment {
    #[serde(rename = "Champion")]
    Champion,
    #[serde(rename = "Loyal")]
    Loyal,
    #[serde(rename = "Promising")]
    Promising,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Lost")]
    Lost,
    #[serde(rename = "Need Attention")]
    NeedAttention,
}

impl Segment {
    pub const ALL: [Self; 6] = [
        Self::Champion,
        Self::Loyal,
        Self::Promising,
        Self::AtRisk,
        Self::Lost,
        Self::NeedAttention,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Champion => "Champion",
            Self::Loyal => "Loyal",
            Self::Promising => "Promising",
            Self::AtRisk => "At Risk",
            Self::Lost => "Lost",
            Self::NeedAttention => "Need Attention",
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw R/F/M measures for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerMeasures {
    pub customer: CustomerRecord,
    pub last_order_date: Option<Date>,
    pub first_order_date: Option<Date>,
    /// Days between the as-of date and the last order, floored at zero.
    pub recency_days: Option<i64>,
    /// Distinct orders.
    pub frequency: i64,
    /// Sum of line revenue.
    pub monetary: f64,
}

impl CustomerMeasures {
    #[must_use]
    pub fn has_purchase_history(&self) -> bool {
        self.frequency > 0
    }
}

#[derive(Default)]
struct CustomerAccumulator {
    orders: HashSet<i64>,
    monetary: f64,
    first: Option<Date>,
    last: Option<Date>,
}

/// Left-join customers to their order facts.
///
/// Output follows the order of `customers`. Facts for unknown customers are
/// ignored.
pub fn customer_measures(
    customers: &[CustomerRecord],
    facts: &[OrderFact],
    as_of: Date,
) -> Vec<CustomerMeasures> {
    let mut by_customer: HashMap<i64, CustomerAccumulator> = HashMap::new();
    for fact in facts {
        let entry = by_customer.entry(fact.custkey).or_default();
        entry.orders.insert(fact.orderkey);
        entry.monetary += fact.total_amount;
        entry.first = Some(entry.first.map_or(fact.order_date, |d| d.min(fact.order_date)));
        entry.last = Some(entry.last.map_or(fact.order_date, |d| d.max(fact.order_date)));
    }

    customers
        .iter()
        .map(|customer| match by_customer.get(&customer.custkey) {
            Some(acc) => CustomerMeasures {
                customer: customer.clone(),
                last_order_date: acc.last,
                first_order_date: acc.first,
                recency_days: acc.last.map(|last| (as_of - last).whole_days().max(0)),
                frequency: i64::try_from(acc.orders.len()).unwrap_or(i64::MAX),
                monetary: acc.monetary,
            },
            None => CustomerMeasures {
                customer: customer.clone(),
                last_order_date: None,
                first_order_date: None,
                recency_days: None,
                frequency: 0,
                monetary: 0.0,
            },
        })
        .collect()
}

/// SQL `NTILE` bucket (1-based) for the row at `row_index` of `row_count`
/// sorted rows.
///
/// The first `row_count % buckets` buckets hold one extra row.
#[must_use]
pub fn ntile(row_index: usize, row_count: usize, buckets: u8) -> u8 {
    let buckets = usize::from(buckets.max(1));
    let base = row_count / buckets;
    let remainder = row_count % buckets;
    let large_span = remainder * (base + 1);

    let bucket = if row_index < large_span {
        row_index / (base + 1)
    } else {
        remainder + (row_index - large_span) / base.max(1)
    };
    u8::try_from(bucket.min(buckets - 1) + 1).unwrap_or(u8::MAX)
}

/// The decision tree. The first matching rule wins.
#[must_use]
pub fn assign_segment(r: u8, f: u8, m: u8) -> Segment {
    if r >= 4 && f >= 4 && m >= 4 {
        Segment::Champion
    } else if r >= 3 && f >= 3 && m >= 3 {
        Segment::Loyal
    } else if r >= 4 && f <= 2 {
        Segment::Promising
    } else if r <= 2 && f >= 3 {
        Segment::AtRisk
    } else if r <= 2 && f <= 2 {
        Segment::Lost
    } else {
        Segment::NeedAttention
    }
}

/// A scored customer, one row of `customer_rfm_scores`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmScore {
    pub measures: CustomerMeasures,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub segment: Segment,
}

impl RfmScore {
    #[must_use]
    pub fn custkey(&self) -> i64 {
        self.measures.customer.custkey
    }

    /// Concatenated scores, e.g. `"545"`.
    #[must_use]
    pub fn rfm_score(&self) -> String {
        format!("{}{}{}", self.r_score, self.f_score, self.m_score)
    }

    #[must_use]
    pub fn lifetime_value(&self) -> f64 {
        self.measures.monetary
    }

    #[must_use]
    pub fn avg_order_value(&self) -> f64 {
        if self.measures.frequency == 0 {
            0.0
        } else {
            self.measures.monetary / self.measures.frequency as f64
        }
    }
}

impl ReportRow for RfmScore {
    fn spec() -> &'static TableSpec {
        &CUSTOMER_RFM_SCORES
    }

    fn cells(&self) -> Vec<CellValue> {
        let m = &self.measures;
        vec![
            m.customer.custkey.into(),
            m.customer.name.as_str().into(),
            m.customer.nation.as_str().into(),
            m.customer.region.as_str().into(),
            m.customer.market_segment.as_str().into(),
            m.last_order_date.into(),
            m.first_order_date.into(),
            m.recency_days.into(),
            m.frequency.into(),
            m.monetary.into(),
            self.r_score.into(),
            self.f_score.into(),
            self.m_score.into(),
            self.rfm_score().into(),
            self.segment.label().into(),
            self.lifetime_value().into(),
            self.avg_order_value().into(),
            m.has_purchase_history().into(),
        ]
    }
}

/// Buckets per position of `order`, written back by original index.
fn rank_buckets(order: &[usize]) -> Vec<u8> {
    let mut buckets = vec![0; order.len()];
    for (position, &index) in order.iter().enumerate() {
        buckets[index] = ntile(position, order.len(), SCORE_BUCKETS);
    }
    buckets
}

/// Score every customer against the whole population.
///
/// Output follows the order of `measures`.
pub fn score_customers(measures: Vec<CustomerMeasures>) -> Vec<RfmScore> {
    let custkey = |index: usize| measures[index].customer.custkey;
    let mut order: Vec<usize> = (0..measures.len()).collect();

    // Missing recency sorts last, i.e. oldest.
    order.sort_by(|&a, &b| {
        let recency = match (measures[a].recency_days, measures[b].recency_days) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        recency.then_with(|| custkey(a).cmp(&custkey(b)))
    });
    let recency = rank_buckets(&order);

    order.sort_by(|&a, &b| {
        measures[a]
            .frequency
            .cmp(&measures[b].frequency)
            .then_with(|| custkey(a).cmp(&custkey(b)))
    });
    let frequency = rank_buckets(&order);

    order.sort_by(|&a, &b| {
        measures[a]
            .monetary
            .total_cmp(&measures[b].monetary)
            .then_with(|| custkey(a).cmp(&custkey(b)))
    });
    let monetary = rank_buckets(&order);

    measures
        .into_iter()
        .enumerate()
        .map(|(index, measures)| {
            let r_score = SCORE_BUCKETS + 1 - recency[index];
            let f_score = frequency[index];
            let m_score = monetary[index];
            RfmScore {
                measures,
                r_score,
                f_score,
                m_score,
                segment: assign_segment(r_score, f_score, m_score),
            }
        })
        .collect()
}

/// Aggregate view of one segment, one row of `rfm_segment_summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customer_count: i64,
    /// Average over customers that have a recency.
    pub avg_recency: Option<f64>,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
}

impl ReportRow for SegmentSummary {
    fn spec() -> &'static TableSpec {
        &RFM_SEGMENT_SUMMARY
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.segment.label().into(),
            self.customer_count.into(),
            self.avg_recency.into(),
            self.avg_frequency.into(),
            self.avg_monetary.into(),
        ]
    }
}

/// Per-segment counts and averages, largest segment first.
pub fn segment_summary(scores: &[RfmScore]) -> Vec<SegmentSummary> {
    #[derive(Default)]
    struct Acc {
        count: i64,
        recency_sum: f64,
        recency_count: i64,
        frequency_sum: f64,
        monetary_sum: f64,
    }

    let mut groups: BTreeMap<Segment, Acc> = BTreeMap::new();
    for score in scores {
        let acc = groups.entry(score.segment).or_default();
        acc.count += 1;
        if let Some(recency) = score.measures.recency_days {
            acc.recency_sum += recency as f64;
            acc.recency_count += 1;
        }
        acc.frequency_sum += score.measures.frequency as f64;
        acc.monetary_sum += score.measures.monetary;
    }

    let mut summary: Vec<SegmentSummary> = groups
        .into_iter()
        .map(|(segment, acc)| SegmentSummary {
            segment,
            customer_count: acc.count,
            avg_recency: (acc.recency_count > 0)
                .then(|| acc.recency_sum / acc.recency_count as f64),
            avg_frequency: acc.frequency_sum / acc.count as f64,
            avg_monetary: acc.monetary_sum / acc.count as f64,
        })
        .collect();
    summary.sort_by(|a, b| {
        b.customer_count
            .cmp(&a.customer_count)
            .then_with(|| a.segment.label().cmp(b.segment.label()))
    });
    summary
}

/// Champion customers by monetary value, highest first.
pub fn top_champions(scores: &[RfmScore], limit: usize) -> Vec<&RfmScore> {
    let mut champions: Vec<&RfmScore> = scores
        .iter()
        .filter(|score| score.segment == Segment::Champion)
        .collect();
    champions.sort_by(|a, b| {
        b.measures
            .monetary
            .total_cmp(&a.measures.monetary)
            .then_with(|| a.custkey().cmp(&b.custkey()))
    });
    champions.truncate(limit);
    champions
}
