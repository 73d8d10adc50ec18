//! Radix tree node implementation.
//!
//! Each node represents one path segment. Static children are kept sorted so
//! lookups can binary search; all placeholders at a position share a single
//! parameter child, whatever their names.

use crate::method_router::MethodRouter;
use crate::template::Segment;

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: String,
    methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
}

/// A leaf reached while matching, with the raw values its placeholders captured.
pub(crate) type Candidate<'a, T> = (&'a MethodRouter<T>, Vec<String>);

impl<T> Node<T> {
    fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            methods: None,
            static_children: Vec::new(),
            param_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    /// Returns the method table for `segments`, creating nodes on the way.
    pub(crate) fn leaf_mut(&mut self, segments: &[Segment]) -> &mut MethodRouter<T> {
        let Some((first, rest)) = segments.split_first() else {
            return self.methods.get_or_insert_with(MethodRouter::new);
        };

        match first {
            Segment::Literal(literal) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(literal))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new(literal.clone()));
                        index
                    }
                };
                self.static_children[index].leaf_mut(rest)
            }
            Segment::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new("{}")))
                .leaf_mut(rest),
        }
    }

    /// Collects every leaf whose template matches `segments`.
    ///
    /// Unlike a first-match walk, both the static and the parameter branch are
    /// explored, so the caller can apply a global specificity rule.
    pub(crate) fn collect<'a>(
        &'a self,
        segments: &[&str],
        captured: &mut Vec<String>,
        out: &mut Vec<Candidate<'a, T>>,
    ) {
        let Some((first, rest)) = segments.split_first() else {
            if let Some(methods) = &self.methods {
                out.push((methods, captured.clone()));
            }
            return;
        };

        if let Some(child) = self.find_static_child(first) {
            child.collect(rest, captured, out);
        }

        if let Some(child) = &self.param_child {
            captured.push((*first).to_string());
            child.collect(rest, captured, out);
            captured.pop();
        }
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method_router::Endpoint;
    use crate::template::parse_template;
    use http::Method;

    fn insert(root: &mut Node<&'static str>, template: &str, value: &'static str) {
        let segments = parse_template(template).unwrap();
        let param_names = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();
        root.leaf_mut(&segments)
            .set(
                &Method::GET,
                Endpoint {
                    value,
                    template: template.to_string(),
                    param_names,
                    order: 0,
                },
            )
            .unwrap();
    }

    fn matches(root: &Node<&'static str>, path: &str) -> Vec<(&'static str, Vec<String>)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut out = Vec::new();
        root.collect(&segments, &mut Vec::new(), &mut out);
        out.into_iter()
            .filter_map(|(m, values)| m.endpoint(&Method::GET).map(|e| (e.value, values)))
            .collect()
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        insert(&mut root, "/c", "c");
        insert(&mut root, "/a", "a");
        insert(&mut root, "/b", "b");

        let order: Vec<_> = root.static_children.iter().map(|c| c.segment.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_collects_both_branches() {
        let mut root = Node::root();
        insert(&mut root, "/x/{id}", "param");
        insert(&mut root, "/x/literal", "literal");

        let found = matches(&root, "/x/literal");
        assert_eq!(found.len(), 2);
        assert!(found.contains(&("literal", vec![])));
        assert!(found.contains(&("param", vec!["literal".to_string()])));
    }

    #[test]
    fn test_backtracking_restores_captures() {
        let mut root = Node::root();
        insert(&mut root, "/a/{x}/c", "first");
        insert(&mut root, "/a/b/{y}", "second");

        let found = matches(&root, "/a/b/c");
        assert!(found.contains(&("first", vec!["b".to_string()])));
        assert!(found.contains(&("second", vec!["c".to_string()])));
    }

    #[test]
    fn test_no_match() {
        let mut root = Node::root();
        insert(&mut root, "/users", "users");
        assert!(matches(&root, "/posts").is_empty());
        assert!(matches(&root, "/users/1").is_empty());
    }
}
