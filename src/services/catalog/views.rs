//! Response shapes that decorate books with ratings and access control.

use crate::entities::book;
use sea_orm::JsonValue;
use serde::Serialize;

/// Rating aggregate for a single book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub total: u64,
    pub average: f64,
}

impl RatingSummary {
    pub fn from_rates<I: IntoIterator<Item = i32>>(rates: I) -> Self {
        let (total, sum) = rates
            .into_iter()
            .fold((0u64, 0i64), |(n, s), r| (n + 1, s + i64::from(r)));
        if total == 0 {
            return Self::default();
        }
        let average = (sum as f64 / total as f64 * 100.0).round() / 100.0;
        Self { total, average }
    }
}

/// A book as shown to a caller, with its rating aggregate.
///
/// The `pdf` field is nulled unless the caller may read the book.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    #[serde(flatten)]
    pub book: book::Model,
    pub total_rating: u64,
    pub average_rating: f64,
}

impl BookView {
    pub fn new(mut book: book::Model, rating: RatingSummary, readable: bool) -> Self {
        if !readable {
            book.pdf = JsonValue::Null;
        }
        Self {
            book,
            total_rating: rating.total,
            average_rating: rating.average,
        }
    }

    pub fn public(book: book::Model, rating: RatingSummary) -> Self {
        Self::new(book, rating, false)
    }

    pub fn owned(book: book::Model, rating: RatingSummary) -> Self {
        Self::new(book, rating, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample_book() -> book::Model {
        book::Model {
            id: 7,
            name: "Dune".into(),
            author_id: 1,
            image: json!(["/uploads/dune.png"]),
            sample: json!([]),
            pdf: json!(["/uploads/dune.pdf"]),
            tag: json!(["sci-fi"]),
            description: "Spice".into(),
            price: dec!(20),
            sell_price: dec!(15),
            is_trending: true,
            is_recommended: false,
            is_premium: false,
            subscription_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_averages_and_rounds() {
        let summary = RatingSummary::from_rates([5, 4, 4]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.average, 4.33);
        assert_eq!(RatingSummary::from_rates([]), RatingSummary::default());
    }

    #[test]
    fn public_view_hides_pdf_and_flattens() {
        let view = BookView::public(sample_book(), RatingSummary::from_rates([4]));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["pdf"], JsonValue::Null);
        assert_eq!(json["name"], "Dune");
        assert_eq!(json["totalRating"], 1);
        assert_eq!(json["averageRating"], 4.0);

        let owned = serde_json::to_value(BookView::owned(sample_book(), RatingSummary::default())).unwrap();
        assert_eq!(owned["pdf"][0], "/uploads/dune.pdf");
    }
}
