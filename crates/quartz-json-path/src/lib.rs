//! JSON path expressions for the quartzdb JSON column core.
//!
//! A path is a sequence of legs applied left to right against a JSON
//! document: member access, member wildcard, array cell (optionally
//! counted from the end), cell wildcard, inclusive array range, and
//! recursive descent (`..`).
//!
//! # Example
//!
//! ```
//! use quartz_json_path::JsonPath;
//!
//! let path = JsonPath::parse("$.store.books[last-1]").unwrap();
//! assert_eq!(path.legs().len(), 3);
//! assert_eq!(path.to_string(), "$.store.books[last-1]");
//! ```

mod parser;
mod types;

pub use parser::PathParseError;
pub use types::{ArrayIndex, ArrayRange, JsonPath, PathLeg, ResolvedIndex};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_root_only() {
        let path = JsonPath::parse("$").unwrap();
        assert!(path.legs().is_empty());
        assert_eq!(path.to_string(), "$");
    }

    #[test]
    fn parse_members_and_cells() {
        let path = JsonPath::parse("$.a.b[0][last][*]").unwrap();
        assert_eq!(path.legs().len(), 5);
        assert_eq!(path.legs()[0], PathLeg::Member("a".into()));
        assert_eq!(path.legs()[2], PathLeg::Cell(ArrayIndex::forward(0)));
        assert_eq!(path.legs()[3], PathLeg::Cell(ArrayIndex::from_end(0)));
        assert_eq!(path.legs()[4], PathLeg::CellWildcard);
    }

    #[test]
    fn parse_quoted_member() {
        let path = JsonPath::parse(r#"$."a b"."x\"y""#).unwrap();
        assert_eq!(path.legs()[0], PathLeg::Member("a b".into()));
        assert_eq!(path.legs()[1], PathLeg::Member("x\"y".into()));
        assert_eq!(path.to_string(), r#"$."a b"."x\"y""#);
    }

    #[test]
    fn parse_range() {
        let path = JsonPath::parse("$[2 to last-1]").unwrap();
        assert_eq!(
            path.legs()[0],
            PathLeg::Range {
                begin: ArrayIndex::forward(2),
                end: ArrayIndex::from_end(1),
            }
        );
        assert_eq!(path.to_string(), "$[2 to last-1]");
    }

    #[test]
    fn parse_ellipsis() {
        let path = JsonPath::parse("$..name").unwrap();
        assert_eq!(path.legs()[0], PathLeg::Ellipsis);
        assert_eq!(path.legs()[1], PathLeg::Member("name".into()));
        assert!(path.contains_ellipsis());
        assert_eq!(path.to_string(), "$..name");
    }

    #[test]
    fn parse_rejects_trailing_ellipsis() {
        assert!(JsonPath::parse("$..").is_err());
        assert!(JsonPath::parse("$.a..").is_err());
    }

    #[test]
    fn parse_rejects_missing_root() {
        assert!(matches!(
            JsonPath::parse(".a"),
            Err(PathParseError::ExpectedRoot)
        ));
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "$",
            "$.a",
            "$.*",
            "$[*]",
            "$[3]",
            "$[last]",
            "$[last-4]",
            "$[1 to 3]",
            "$..a[0]",
            r#"$."odd key""#,
        ] {
            let path = JsonPath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
            let again = JsonPath::parse(&path.to_string()).unwrap();
            assert_eq!(path, again);
        }
    }

    #[test]
    fn resolve_from_end() {
        let idx = ArrayIndex::from_end(1);
        let r = idx.resolve(3);
        assert!(r.within_bounds());
        assert_eq!(r.position(), 1);

        let r = ArrayIndex::from_end(5).resolve(3);
        assert!(!r.within_bounds());
    }

    #[test]
    fn range_resolution_clamps() {
        let leg = PathLeg::Range {
            begin: ArrayIndex::forward(1),
            end: ArrayIndex::from_end(0),
        };
        assert_eq!(leg.array_range(4), ArrayRange { begin: 1, end: 4 });
        // Empty when begin is past end.
        let leg = PathLeg::Range {
            begin: ArrayIndex::forward(3),
            end: ArrayIndex::forward(1),
        };
        let r = leg.array_range(4);
        assert!(r.begin >= r.end);
    }

    #[test]
    fn autowrap_legs() {
        assert!(PathLeg::Cell(ArrayIndex::forward(0)).is_autowrap());
        assert!(PathLeg::Cell(ArrayIndex::from_end(0)).is_autowrap());
        assert!(!PathLeg::Cell(ArrayIndex::forward(1)).is_autowrap());
        assert!(PathLeg::CellWildcard.is_autowrap());
        assert!(!PathLeg::Member("a".into()).is_autowrap());
    }
}
