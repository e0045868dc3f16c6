//! Named rule strings for known uniform tilings.
//!
//! Names and Cundy–Rollett notation follow the usual tables of k-uniform
//! tilings. Entries without a common name use their notation as name, or
//! their table number when the notation is not known.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    RegularOneUniform,
    SemiregularOneUniform,
    TwoUniform,
}

impl Group {
    pub fn title(self) -> &'static str {
        match self {
            Group::RegularOneUniform => "1-Uniform (Regular)",
            Group::SemiregularOneUniform => "1-Uniform (Semiregular)",
            Group::TwoUniform => "2-Uniform",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub group: Group,
    pub name: &'static str,
    /// Cundy–Rollett vertex notation.
    pub notation: &'static str,
    pub rule: &'static str,
    pub dual_name: Option<&'static str>,
}

impl CatalogEntry {
    /// Name to show for the tiling, or for its dual.
    pub fn display_name(&self, dual: bool) -> &'static str {
        if dual { self.dual_name.unwrap_or(self.name) } else { self.name }
    }
}

const fn entry(
    group: Group,
    name: &'static str,
    notation: &'static str,
    rule: &'static str,
    dual_name: Option<&'static str>,
) -> CatalogEntry {
    CatalogEntry { group, name, notation, rule, dual_name }
}

use Group::*;

pub static CATALOG: &[CatalogEntry] = &[
    entry(RegularOneUniform, "triangular", "3^6", "3/r60/r(h2)", Some("hexagonal")),
    entry(RegularOneUniform, "square", "4^4", "4-4-0,4/r90/m(v2)", Some("square")),
    entry(RegularOneUniform, "hexagonal", "6^3", "6/r60/r(h1)", Some("triangular")),
    entry(SemiregularOneUniform, "snub trihexagonal", "3^4.6", "6-3-3/r60/r(h5)", Some("floret pentagonal")),
    entry(SemiregularOneUniform, "elongated triangular", "3^3.4^2", "4-3/m90/r(h2)", Some("prismatic pentagonal")),
    entry(SemiregularOneUniform, "snub square", "3^2.4.3.4", "4-3-3,0,0,0,4/r90/r(h2)", Some("cairo pentagonal")),
    entry(SemiregularOneUniform, "rhombitrihexagonal", "3.4.6.4", "6-4-3/m30/r(c2)", Some("deltoidal trihexagonal")),
    entry(SemiregularOneUniform, "trihexagonal", "(3.6)^2", "6-3-6/m30/r(v4)", Some("rhombille")),
    entry(TwoUniform, "3^6;3^2.4.3.4", "3^6;3^2.4.3.4", "3-0,4-0,3/m30/r(c3)", None),
    entry(TwoUniform, "truncated hexagonal (dissected a)", "3.4.6.4;3^2.4.3.4", "6-4-3,3/m30/r(h1)", None),
    entry(TwoUniform, "truncated hexagonal (dissected b)", "3.4.6.4;3^3.4^2", "6-4-3-3/m30/r(h5)", None),
    entry(TwoUniform, "3.4.6.4;3.4^2.6", "3.4.6.4;3.4^2.6", "6-4-3,4-6/m30/r(c4)", None),
    entry(TwoUniform, "2-uniform #5", "", "6-3/r120/m(h1)", None),
    entry(TwoUniform, "hexagonal (2/3 dissected)", "[3^6;3^4.6]_1", "6-3,3-3/m30/r(h1)", None),
    entry(TwoUniform, "[3^6;3^4.6]_2", "[3^6;3^4.6]_2", "6-3-3,3-0,3/r60/r(h8)", None),
    entry(TwoUniform, "3^2.6^2;3^4.6", "3^2.6^2;3^4.6", "6-3/m90/r(h1)", None),
    entry(TwoUniform, "3.6.3.6;3^2.6^2", "3.6.3.6;3^2.6^2", "6-3,6/m90/r(h3)", None),
    entry(TwoUniform, "[3.4^2.6;3.6.3.6]_2", "[3.4^2.6;3.6.3.6]_2", "6-3,4-6-3,4-6,4/m90/r(c6)", None),
    entry(TwoUniform, "[3.4^2.6;3.6.3.6]_1", "[3.4^2.6;3.6.3.6]_1", "6-3,4/m90/r(h4)", None),
    entry(TwoUniform, "[3^3.4^2;3^2.4.3.4]_1", "[3^3.4^2;3^2.4.3.4]_1", "4-3,3-4,3/r90/m(h3)", None),
    entry(TwoUniform, "[3^3.4^2;3^2.4.3.4]_2", "[3^3.4^2;3^2.4.3.4]_2", "4-3,3,3-4,3/r(c2)/r(h13)/r(h45)", None),
    entry(TwoUniform, "[4^4;3^3.4^2]_1", "[4^4;3^3.4^2]_1", "4-3/m(h4)/m(h3)/r(h2)", None),
    entry(TwoUniform, "[4^4;3^3.4^2]_2", "[4^4;3^3.4^2]_2", "4-4-3-3/m90/r(h3)", None),
    entry(TwoUniform, "[3^6;3^3.4^2]_1", "[3^6;3^3.4^2]_1", "4-3,4-3,3/m90/r(h3)", None),
    entry(TwoUniform, "[3^6;3^3.4^2]_2", "[3^6;3^3.4^2]_2", "4-3-3-3/m90/r(h7)/r(h5)", None),
];

/// Every entry, in table order.
pub fn entries() -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter()
}

/// Entries of one group.
pub fn group(group: Group) -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter().filter(move |e| e.group == group)
}

/// First entry whose name matches, ignoring case.
pub fn find(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(name.trim()))
}

/// Entry whose rule is `rule`, with or without the dual marker.
pub fn find_by_rule(rule: &str) -> Option<&'static CatalogEntry> {
    let rule = rule.trim();
    let base = rule.strip_suffix('*').unwrap_or(rule);
    CATALOG.iter().find(|e| e.rule == base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::parse_rule;
    use std::collections::HashSet;

    #[test]
    fn every_rule_parses() {
        for e in entries() {
            assert!(parse_rule(e.rule).is_ok(), "{} has an invalid rule {}", e.name, e.rule);
        }
    }

    #[test]
    fn rules_are_unique() {
        let rules: HashSet<&str> = entries().map(|e| e.rule).collect();
        assert_eq!(rules.len(), CATALOG.len());
    }

    #[test]
    fn lookup_by_name_and_rule() {
        assert_eq!(find("Square").map(|e| e.rule), Some("4-4-0,4/r90/m(v2)"));
        let hex = find_by_rule("6/r60/r(h1)*").expect("hexagonal is listed");
        assert_eq!(hex.display_name(true), "triangular");
        assert_eq!(hex.display_name(false), "hexagonal");
        assert!(find("no such tiling").is_none());
    }

    #[test]
    fn groups_partition_catalog() {
        let total: usize = [RegularOneUniform, SemiregularOneUniform, TwoUniform]
            .into_iter()
            .map(|g| group(g).count())
            .sum();
        assert_eq!(total, CATALOG.len());
        assert_eq!(group(RegularOneUniform).count(), 3);
        assert_eq!(group(SemiregularOneUniform).count(), 5);
        assert_eq!(group(TwoUniform).count(), 17);
    }

    #[test]
    fn unnamed_two_uniform_row_is_listed() {
        let e = find_by_rule("6-3/r120/m(h1)").expect("listed");
        assert_eq!(e.group, TwoUniform);
        assert_eq!(find("2-uniform #5").map(|e| e.rule), Some("6-3/r120/m(h1)"));
    }
}
