use std::collections::HashMap;

use tracing::{debug, info, warn};

/// Calculate string similarity on a 0-100 scale using Levenshtein distance.
/// Equal strings score 100; strings sharing nothing score near 0.
pub fn similarity(s1: &str, s2: &str) -> f64 {
    if s1 == s2 {
        return 100.0;
    }

    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    let max_len = len1.max(len2);
    let distance = levenshtein_distance(s1, s2);

    100.0 * (1.0 - (distance as f64 / max_len as f64))
}

/// Calculate Levenshtein distance between two strings
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let chars1: Vec<char> = s1.chars().collect();
    let chars2: Vec<char> = s2.chars().collect();
    let len1 = chars1.len();
    let len2 = chars2.len();

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if chars1[i - 1] == chars2[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len1][len2]
}

/// Outcome counts for one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionSummary {
    pub distinct_cities: usize,
    pub matched: usize,
    pub unmatched: Vec<String>,
}

/// Resolves listing city names against census town names by fuzzy matching.
///
/// The mapping is built once per run. It is deliberately not injective: two
/// listing spellings may land on the same census town, matching how the
/// merge has always behaved. Candidates are scanned in their stable input
/// order and the first maximal score wins, so runs are deterministic.
pub struct TownNameResolver {
    threshold: f64,
}

impl TownNameResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Find the best census town for one city. `None` when the best score
    /// falls below the threshold or there are no candidates.
    pub fn best_match<'a>(&self, city: &str, towns: &'a [String]) -> Option<&'a str> {
        let mut best: Option<(&str, f64)> = None;
        for town in towns {
            let score = similarity(city, town);
            let improves = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if improves {
                best = Some((town, score));
            }
        }
        match best {
            Some((town, score)) if score >= self.threshold => Some(town),
            _ => None,
        }
    }

    /// Build the city-to-town mapping for every distinct listing city.
    ///
    /// An empty census set is not an error; every city simply resolves to
    /// `None` and the merge carries no demographic fields.
    pub fn resolve(
        &self,
        cities: &[String],
        towns: &[String],
    ) -> (HashMap<String, Option<String>>, ResolutionSummary) {
        if towns.is_empty() {
            warn!("census town set is empty; no city will resolve");
        }

        let mut mapping = HashMap::new();
        let mut summary = ResolutionSummary::default();

        for city in cities {
            if mapping.contains_key(city) {
                continue;
            }
            summary.distinct_cities += 1;
            let resolved = self.best_match(city, towns).map(|town| town.to_string());
            match &resolved {
                Some(town) => {
                    summary.matched += 1;
                    debug!(city = %city, town = %town, "resolved");
                }
                None => summary.unmatched.push(city.clone()),
            }
            mapping.insert(city.clone(), resolved);
        }

        info!(
            distinct = summary.distinct_cities,
            matched = summary.matched,
            unmatched = summary.unmatched.len(),
            "town resolution complete"
        );
        (mapping, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn towns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(similarity("Boston", "Boston"), 100.0);
    }

    #[test]
    fn disjoint_strings_score_low() {
        assert!(similarity("Boston", "zzzzzz") < 20.0);
        assert_eq!(similarity("", "Boston"), 0.0);
    }

    #[test]
    fn single_edit_scores_proportionally() {
        // One substitution across ten characters: 100 * (1 - 1/10).
        assert_eq!(similarity("Somerville", "Sommrville"), 90.0);
    }

    #[test]
    fn misspelled_city_resolves_to_closest_town() {
        let resolver = TownNameResolver::new(85.0);
        let census = towns(&["Somerville", "Boston"]);
        assert_eq!(resolver.best_match("Sommerville", &census), Some("Somerville"));
    }

    #[test]
    fn score_exactly_at_threshold_matches() {
        // "aaaaaaaaaaaaaaaaaaab" vs 20 a's: 1 edit / 20 chars = 95.
        // Use a 3-edit / 20-char pair for exactly 85.
        let resolver = TownNameResolver::new(85.0);
        let city = "aaaaaaaaaaaaaaaaabbb";
        let census = towns(&["aaaaaaaaaaaaaaaaaaaa"]);
        assert_eq!(similarity(city, &census[0]), 85.0);
        assert_eq!(resolver.best_match(city, &census), Some("aaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn score_just_below_threshold_does_not_match() {
        // 3 edits over 19 chars ≈ 84.2.
        let resolver = TownNameResolver::new(85.0);
        let city = "aaaaaaaaaaaaaaaabbb";
        let census = towns(&["aaaaaaaaaaaaaaaaaaa"]);
        assert!(similarity(city, &census[0]) < 85.0);
        assert_eq!(resolver.best_match(city, &census), None);
    }

    #[test]
    fn ties_break_to_the_first_candidate_in_input_order() {
        let resolver = TownNameResolver::new(50.0);
        // Both candidates are one edit away from the query.
        let census = towns(&["Newtan", "Newtin"]);
        assert_eq!(resolver.best_match("Newton", &census), Some("Newtan"));

        let reversed = towns(&["Newtin", "Newtan"]);
        assert_eq!(resolver.best_match("Newton", &reversed), Some("Newtin"));
    }

    #[test]
    fn empty_census_set_resolves_everything_to_none() {
        let resolver = TownNameResolver::new(85.0);
        let cities = towns(&["Boston", "Worcester"]);
        let (mapping, summary) = resolver.resolve(&cities, &[]);
        assert_eq!(mapping.len(), 2);
        assert!(mapping.values().all(|v| v.is_none()));
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.unmatched.len(), 2);
    }

    #[test]
    fn mapping_covers_each_distinct_city_once() {
        let resolver = TownNameResolver::new(85.0);
        let cities = towns(&["Boston", "Boston", "Somerville"]);
        let census = towns(&["Boston", "Somerville"]);
        let (mapping, summary) = resolver.resolve(&cities, &census);
        assert_eq!(mapping.len(), 2);
        assert_eq!(summary.distinct_cities, 2);
        assert_eq!(summary.matched, 2);
    }

    #[test]
    fn two_spellings_may_collapse_onto_one_town() {
        let resolver = TownNameResolver::new(85.0);
        let cities = towns(&["Somerville", "Sommerville"]);
        let census = towns(&["Somerville"]);
        let (mapping, _) = resolver.resolve(&cities, &census);
        assert_eq!(
            mapping.get("Somerville").cloned().flatten().as_deref(),
            Some("Somerville")
        );
        assert_eq!(
            mapping.get("Sommerville").cloned().flatten().as_deref(),
            Some("Somerville")
        );
    }
}
