// City to region classification.
//
// Exemplar lists are lowercase and mutually exclusive; they are checked in
// AMER, APAC, EMEA order and the first list with a containing match wins.
use crate::types::Region;
use once_cell::sync::Lazy;

static EXEMPLARS: Lazy<Vec<(Region, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (
            Region::Amer,
            &["new york", "san francisco", "chicago", "toronto", "boston", "austin", "seattle"][..],
        ),
        (
            Region::Apac,
            &[
                "bengaluru", "bangalore", "delhi", "mumbai", "pune", "singapore", "sydney",
                "melbourne", "tokyo", "brisbane",
            ][..],
        ),
        (
            Region::Emea,
            &["london", "paris", "berlin", "amsterdam", "madrid", "barcelona"][..],
        ),
    ]
});

/// Classify a free-text city. Never fails; unmatched input is `Region::Unknown`.
pub fn classify(city: &str) -> Region {
    let city = city.to_lowercase();
    Region::KNOWN
        .into_iter()
        .find(|region| exemplars(*region).iter().any(|c| city.contains(c)))
        .unwrap_or(Region::Unknown)
}

/// Exemplar cities for a region. Empty for `Region::Unknown`.
pub fn exemplars(region: Region) -> &'static [&'static str] {
    EXEMPLARS
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, cities)| *cities)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_exemplar_maps_to_its_region() {
        for region in Region::KNOWN {
            let cities = exemplars(region);
            assert!(!cities.is_empty());
            for city in cities {
                assert_eq!(classify(city), region, "{city}");
                assert_eq!(classify(&city.to_uppercase()), region, "{city}");
            }
        }
    }

    #[test]
    fn substring_and_unknown() {
        assert_eq!(classify("Greater London, UK"), Region::Emea);
        assert_eq!(classify("New York City"), Region::Amer);
        assert_eq!(classify("Bengaluru, Karnataka"), Region::Apac);
        assert_eq!(classify("Nowhereville"), Region::Unknown);
        assert_eq!(classify(""), Region::Unknown);
    }

    #[test]
    fn unknown_has_no_exemplars() {
        assert!(exemplars(Region::Unknown).is_empty());
    }
}
