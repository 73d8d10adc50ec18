//! Segment comparisons used to detect competing templates.

pub(crate) use hermes_core::{parse_template, PathSegment as Segment};

/// Two segments are compatible when some path component could match both.
pub(crate) fn overlaps(a: &Segment, b: &Segment) -> bool {
    match (a, b) {
        (Segment::Literal(a), Segment::Literal(b)) => a == b,
        _ => true,
    }
}

/// Two segments have the same shape when they are equal literals or both placeholders.
pub(crate) fn same_shape(a: &Segment, b: &Segment) -> bool {
    match (a, b) {
        (Segment::Literal(a), Segment::Literal(b)) => a == b,
        (Segment::Param(_), Segment::Param(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let lit = Segment::Literal("x".into());
        let other = Segment::Literal("y".into());
        let param = Segment::Param("id".into());
        assert!(overlaps(&lit, &param));
        assert!(!overlaps(&lit, &other));
        assert!(same_shape(&param, &Segment::Param("other".into())));
        assert!(!same_shape(&param, &lit));
    }

    #[test]
    fn test_invalid_template_is_a_router_error() {
        let err: crate::RouterError = parse_template("/api/file-{id}").unwrap_err().into();
        assert!(matches!(err, crate::RouterError::InvalidTemplate(_)));
    }
}
