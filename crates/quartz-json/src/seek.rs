//! Path evaluation over the wrapper.
//!
//! Without recursive descent, evaluation walks the path leg by leg
//! directly over either representation; nothing is materialized and
//! hits alias the document. A path containing `..` needs duplicate
//! suppression by node identity, which the binary form cannot
//! provide, so the wrapper materializes its DOM first and delegates
//! to the DOM evaluator.

use quartz_json_path::{JsonPath, PathLeg};

use crate::error::JsonError;
use crate::wrapper::{JsonWrapper, View};

impl<'a> JsonWrapper<'a> {
    /// Evaluate `path`, returning matches in document order.
    pub fn seek(
        &mut self,
        path: &JsonPath,
        auto_wrap: bool,
        only_need_one: bool,
    ) -> Result<Vec<JsonWrapper<'_>>, JsonError> {
        if path.contains_ellipsis() {
            self.to_dom()?;
            let root = match self {
                JsonWrapper::Dom(v) => &**v,
                JsonWrapper::DomRef(r) => *r,
                JsonWrapper::Binary(_) => unreachable!(),
            };
            return Ok(quartz_json_dom::seek(root, path, auto_wrap, only_need_one)
                .into_iter()
                .map(JsonWrapper::DomRef)
                .collect());
        }
        let mut hits = Vec::new();
        seek_no_ellipsis(
            self.view(),
            path.legs(),
            auto_wrap,
            only_need_one,
            &mut hits,
        )?;
        Ok(hits.into_iter().map(JsonWrapper::from_view).collect())
    }
}

/// Recursive leg-by-leg walk for paths without recursive descent. No
/// duplicate tracking is needed: without `..` the walk cannot visit a
/// node twice.
pub(crate) fn seek_no_ellipsis<'v>(
    value: View<'v>,
    legs: &[PathLeg],
    auto_wrap: bool,
    only_need_one: bool,
    hits: &mut Vec<View<'v>>,
) -> Result<(), JsonError> {
    let Some((leg, rest)) = legs.split_first() else {
        hits.push(value);
        return Ok(());
    };

    if seek_done(hits, only_need_one) {
        return Ok(());
    }

    if auto_wrap
        && value.json_type() != quartz_json_dom::JsonType::Array
        && leg.is_autowrap()
    {
        return seek_no_ellipsis(value, rest, auto_wrap, only_need_one, hits);
    }

    match leg {
        PathLeg::Member(name) => {
            if let Some(child) = value.lookup(name)? {
                seek_no_ellipsis(child, rest, auto_wrap, only_need_one, hits)?;
            }
        }
        PathLeg::MemberWildcard => {
            for (_, child) in value.members()? {
                if seek_done(hits, only_need_one) {
                    return Ok(());
                }
                seek_no_ellipsis(child, rest, auto_wrap, only_need_one, hits)?;
            }
        }
        PathLeg::Cell(_) | PathLeg::CellWildcard | PathLeg::Range { .. } => {
            let range = leg.array_range(value.length());
            for i in range.begin..range.end {
                if seek_done(hits, only_need_one) {
                    return Ok(());
                }
                if let Some(child) = value.element(i)? {
                    seek_no_ellipsis(child, rest, auto_wrap, only_need_one, hits)?;
                }
            }
        }
        PathLeg::Ellipsis => unreachable!("caller routes ellipsis paths through the DOM"),
    }
    Ok(())
}

fn seek_done(hits: &[View<'_>], only_need_one: bool) -> bool {
    only_need_one && !hits.is_empty()
}
