use crate::domain::listing::CanonicalListing;

// Signal weights. Only signals both listings can speak to are counted, and
// the sum is normalized by the weight of those signals.
const ADDRESS_WEIGHT: f64 = 0.45;
const PRICE_WEIGHT: f64 = 0.20;
const SQFT_WEIGHT: f64 = 0.15;
const BEDS_WEIGHT: f64 = 0.10;
const BATHS_WEIGHT: f64 = 0.10;
const GEO_WEIGHT: f64 = 0.10;

/// Score multiplier when both listings carry different MLS numbers.
const CONFLICTING_MLS_PENALTY: f64 = 0.5;

/// Ceiling when both prices are known and more than 10% apart. Two units
/// behind one street address agree on the key and often on beds; the price
/// is what tells them apart.
const PRICE_CONFLICT_CAP: f64 = 0.6;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn relative_diff(a: f64, b: f64) -> f64 {
    let max = a.abs().max(b.abs());
    if max == 0.0 {
        0.0
    } else {
        (a - b).abs() / max
    }
}

fn price_similarity(a: i64, b: i64) -> f64 {
    match relative_diff(a as f64, b as f64) {
        d if d <= 0.02 => 1.0,
        d if d <= 0.05 => 0.75,
        d if d <= 0.10 => 0.25,
        _ => 0.0,
    }
}

fn sqft_similarity(a: f64, b: f64) -> f64 {
    match relative_diff(a, b) {
        d if d <= 0.03 => 1.0,
        d if d <= 0.10 => 0.5,
        _ => 0.0,
    }
}

fn key_tokens(key: &str) -> Vec<&str> {
    key.split(|c: char| c == '|' || c == ' ')
        .filter(|t| !t.is_empty())
        .collect()
}

/// 1.0 on exact key equality, otherwise token Jaccard similarity.
fn address_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let ta = key_tokens(a);
    let tb = key_tokens(b);
    let shared = ta.iter().filter(|t| tb.contains(*t)).count() as f64;
    let union = (ta.len() + tb.len()) as f64 - shared;
    if union == 0.0 {
        0.0
    } else {
        shared / union
    }
}

pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
    let dp = (lat2 - lat1).to_radians();
    let dl = (lon2 - lon1).to_radians();
    let h = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn geo_similarity(meters: f64) -> f64 {
    if meters <= 50.0 {
        1.0
    } else if meters <= 200.0 {
        0.5
    } else {
        0.0
    }
}

/// Similarity in `[0, 1]` between two listings.
///
/// A shared MLS number (case-insensitive) is decisive and scores 1.0. Without
/// one, the score blends address-key, price, living area, bed/bath and
/// coordinate agreement. Prices more than 10% apart cap the blend below the
/// default merge threshold, and two different MLS numbers halve it.
pub fn calculate_duplicate_score(a: &CanonicalListing, b: &CanonicalListing) -> f64 {
    let (mls_a, mls_b) = (a.mls_key(), b.mls_key());
    if let (Some(x), Some(y)) = (&mls_a, &mls_b) {
        if x == y {
            return 1.0;
        }
    }

    let mut total = 0.0;
    let mut weight = 0.0;
    let mut signal = |w: f64, similarity: Option<f64>| {
        if let Some(s) = similarity {
            total += w * s;
            weight += w;
        }
    };

    let (key_a, key_b) = (&a.address.normalized_key, &b.address.normalized_key);
    signal(
        ADDRESS_WEIGHT,
        (!key_a.is_empty() && !key_b.is_empty()).then(|| address_similarity(key_a, key_b)),
    );
    let price = a
        .comparable_price()
        .zip(b.comparable_price())
        .map(|(x, y)| price_similarity(x, y));
    signal(PRICE_WEIGHT, price);
    signal(
        SQFT_WEIGHT,
        a.living_area_sqft
            .zip(b.living_area_sqft)
            .map(|(x, y)| sqft_similarity(x, y)),
    );
    signal(
        BEDS_WEIGHT,
        a.beds.zip(b.beds).map(|(x, y)| if x == y { 1.0 } else { 0.0 }),
    );
    signal(
        BATHS_WEIGHT,
        a.baths
            .zip(b.baths)
            .map(|(x, y)| if (x - y).abs() <= 0.5 { 1.0 } else { 0.0 }),
    );
    let coords = |l: &CanonicalListing| l.latitude.zip(l.longitude);
    signal(
        GEO_WEIGHT,
        coords(a)
            .zip(coords(b))
            .map(|((la, lo), (lb, lob))| geo_similarity(distance_meters(la, lo, lb, lob))),
    );

    if weight == 0.0 {
        return 0.0;
    }

    let mut score = total / weight;
    if price == Some(0.0) {
        score = score.min(PRICE_CONFLICT_CAP);
    }
    if mls_a.is_some() && mls_b.is_some() {
        score *= CONFLICTING_MLS_PENALTY;
    }
    score.clamp(0.0, 1.0)
}
